//! Response DTOs
//!
//! Data structures returned by service reads. Identifiers are rendered as
//! strings; audit columns are flattened into each record.

use serde::Serialize;

use crate::domain::{Attachment, Audit, Author, Image, ReferenceEntity, ReferenceKind};

/// Audit columns as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditDto {
    pub version: i32,
    pub created: String,
    pub changed: String,
    pub creator_id: String,
    pub changed_user: String,
}

impl From<Audit> for AuditDto {
    fn from(audit: Audit) -> Self {
        Self {
            version: audit.version,
            created: audit.created.to_rfc3339(),
            changed: audit.changed.to_rfc3339(),
            creator_id: audit.creator_id.to_string(),
            changed_user: audit.changed_user.to_string(),
        }
    }
}

/// Reference entity response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceDto {
    pub id: String,
    pub kind: ReferenceKind,
    pub name: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<ReferenceEntity> for ReferenceDto {
    fn from(entity: ReferenceEntity) -> Self {
        Self {
            id: entity.id.to_string(),
            kind: entity.kind,
            name: entity.name,
            description: entity.description,
            audit: entity.audit.into(),
        }
    }
}

/// Author response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorDto {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub bio: Option<String>,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<Author> for AuthorDto {
    fn from(author: Author) -> Self {
        Self {
            id: author.id.to_string(),
            name: author.name,
            email: author.email,
            bio: author.bio,
            audit: author.audit.into(),
        }
    }
}

/// Image response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDto {
    pub id: String,
    pub url: String,
    pub alt_text: Option<String>,
    pub title: Option<String>,
    pub extension: Option<String>,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<Image> for ImageDto {
    fn from(image: Image) -> Self {
        Self {
            extension: image.extension().map(str::to_string),
            id: image.id.to_string(),
            url: image.url,
            alt_text: image.alt_text,
            title: image.title,
            audit: image.audit.into(),
        }
    }
}

/// Attachment response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentDto {
    pub id: String,
    pub file_name: String,
    pub url: String,
    pub content_type: Option<String>,
    pub size_bytes: Option<i64>,
    /// e.g. "1.5 MB"
    pub size_label: Option<String>,
    #[serde(flatten)]
    pub audit: AuditDto,
}

impl From<Attachment> for AttachmentDto {
    fn from(attachment: Attachment) -> Self {
        let size_label = attachment.human_size();
        Self {
            id: attachment.id.to_string(),
            file_name: attachment.file_name,
            url: attachment.url,
            content_type: attachment.content_type,
            size_bytes: attachment.size_bytes,
            size_label,
            audit: attachment.audit.into(),
        }
    }
}

/// Article with its related data resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleDto {
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub author: AuthorDto,
    pub image: Option<ImageDto>,
    pub attachment: Option<AttachmentDto>,
    pub blog_categories: Vec<ReferenceDto>,
    pub blog_tags: Vec<ReferenceDto>,
    #[serde(flatten)]
    pub audit: AuditDto,
}

/// API endpoint with its related data resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiEndpointDto {
    pub id: String,
    pub name: String,
    pub route: String,
    pub http_method: String,
    pub description: Option<String>,
    pub environment: ReferenceDto,
    pub attachment: Option<AttachmentDto>,
    pub api_tags: Vec<ReferenceDto>,
    #[serde(flatten)]
    pub audit: AuditDto,
}
