//! Request DTOs
//!
//! Inbound shapes for every service operation. Optional identifiers mirror
//! what a caller may omit; services reject a missing one before any I/O.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::MAX_ATTACHMENT_SIZE;
use crate::shared::error::AppError;
use crate::shared::pagination::ListRequest;
use crate::shared::validation::{not_blank, validate};

/// Identifies a single entity for get/delete.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityIdDto {
    pub id: Option<Uuid>,
}

impl EntityIdDto {
    pub fn new(id: Uuid) -> Self {
        Self { id: Some(id) }
    }
}

// ---------------------------------------------------------------------------
// Reference entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateReferenceDto {
    #[validate(
        length(max = 200, message = "Name must be at most 200 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

impl CreateReferenceDto {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// Lookup by id or by exact name; exactly one must be given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetReferenceDto {
    pub id: Option<Uuid>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateReferenceDto {
    pub id: Option<Uuid>,
    pub expected_version: Option<i32>,

    #[validate(
        length(max = 200, message = "Name must be at most 200 characters"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Authors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateAuthorDto {
    #[validate(
        length(max = 200, message = "Name must be at most 200 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 4000, message = "Bio must be at most 4000 characters"))]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetAuthorDto {
    pub id: Option<Uuid>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAuthorDto {
    pub id: Option<Uuid>,
    pub expected_version: Option<i32>,

    #[validate(
        length(max = 200, message = "Name must be at most 200 characters"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 4000, message = "Bio must be at most 4000 characters"))]
    pub bio: Option<String>,
}

// ---------------------------------------------------------------------------
// Images and attachments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateImageDto {
    #[validate(
        length(max = 2048, message = "URL must be at most 2048 characters"),
        custom(function = "not_blank")
    )]
    pub url: String,

    #[validate(length(max = 500, message = "Alt text must be at most 500 characters"))]
    pub alt_text: Option<String>,

    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateImageDto {
    pub id: Option<Uuid>,
    pub expected_version: Option<i32>,

    #[validate(
        length(max = 2048, message = "URL must be at most 2048 characters"),
        custom(function = "not_blank")
    )]
    pub url: Option<String>,

    #[validate(length(max = 500, message = "Alt text must be at most 500 characters"))]
    pub alt_text: Option<String>,

    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateAttachmentDto {
    #[validate(
        length(max = 255, message = "File name must be at most 255 characters"),
        custom(function = "not_blank")
    )]
    pub file_name: String,

    #[validate(
        length(max = 2048, message = "URL must be at most 2048 characters"),
        custom(function = "not_blank")
    )]
    pub url: String,

    #[validate(length(max = 100, message = "Content type must be at most 100 characters"))]
    pub content_type: Option<String>,

    #[validate(range(min = 0, max = MAX_ATTACHMENT_SIZE, message = "Size must be between 0 and 25MB"))]
    pub size_bytes: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAttachmentDto {
    pub id: Option<Uuid>,
    pub expected_version: Option<i32>,

    #[validate(
        length(max = 255, message = "File name must be at most 255 characters"),
        custom(function = "not_blank")
    )]
    pub file_name: Option<String>,

    #[validate(
        length(max = 2048, message = "URL must be at most 2048 characters"),
        custom(function = "not_blank")
    )]
    pub url: Option<String>,

    #[validate(length(max = 100, message = "Content type must be at most 100 characters"))]
    pub content_type: Option<String>,

    #[validate(range(min = 0, max = MAX_ATTACHMENT_SIZE, message = "Size must be between 0 and 25MB"))]
    pub size_bytes: Option<i64>,
}

/// What an aggregate does with an owned sub-resource payload.
#[derive(Debug, Clone)]
pub enum OwnedPayload<C, U> {
    /// No id supplied: create a new sub-resource.
    Create(C),
    /// Id supplied: update that sub-resource in place.
    Update(Uuid, U),
}

impl<C, U> OwnedPayload<C, U> {
    /// Id of the sub-resource to update, if any.
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Self::Create(_) => None,
            Self::Update(id, _) => Some(*id),
        }
    }
}

pub type ImageChange = OwnedPayload<CreateImageDto, UpdateImageDto>;
pub type AttachmentChange = OwnedPayload<CreateAttachmentDto, UpdateAttachmentDto>;

/// Image data embedded in an aggregate request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImagePayload {
    pub id: Option<Uuid>,
    pub url: Option<String>,
    pub alt_text: Option<String>,
    pub title: Option<String>,
}

impl ImagePayload {
    pub fn into_owned(self) -> Result<ImageChange, AppError> {
        match self.id {
            None => {
                let create = CreateImageDto {
                    url: self
                        .url
                        .ok_or_else(|| AppError::Validation("image.url: is required".into()))?,
                    alt_text: self.alt_text,
                    title: self.title,
                };
                validate(&create)?;
                Ok(OwnedPayload::Create(create))
            }
            Some(id) => {
                let update = UpdateImageDto {
                    id: Some(id),
                    expected_version: None,
                    url: self.url,
                    alt_text: self.alt_text,
                    title: self.title,
                };
                validate(&update)?;
                Ok(OwnedPayload::Update(id, update))
            }
        }
    }
}

/// Attachment data embedded in an aggregate request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentPayload {
    pub id: Option<Uuid>,
    pub file_name: Option<String>,
    pub url: Option<String>,
    pub content_type: Option<String>,
    pub size_bytes: Option<i64>,
}

impl AttachmentPayload {
    pub fn into_owned(self) -> Result<AttachmentChange, AppError> {
        match self.id {
            None => {
                let create = CreateAttachmentDto {
                    file_name: self.file_name.ok_or_else(|| {
                        AppError::Validation("attachment.file_name: is required".into())
                    })?,
                    url: self
                        .url
                        .ok_or_else(|| AppError::Validation("attachment.url: is required".into()))?,
                    content_type: self.content_type,
                    size_bytes: self.size_bytes,
                };
                validate(&create)?;
                Ok(OwnedPayload::Create(create))
            }
            Some(id) => {
                let update = UpdateAttachmentDto {
                    id: Some(id),
                    expected_version: None,
                    file_name: self.file_name,
                    url: self.url,
                    content_type: self.content_type,
                    size_bytes: self.size_bytes,
                };
                validate(&update)?;
                Ok(OwnedPayload::Update(id, update))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateArticleDto {
    #[validate(
        length(max = 300, message = "Title must be at most 300 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,

    #[validate(length(max = 2000, message = "Summary must be at most 2000 characters"))]
    pub summary: Option<String>,

    pub content: Option<String>,

    pub author_id: Option<Uuid>,

    pub image: Option<ImagePayload>,

    pub attachment: Option<AttachmentPayload>,

    #[serde(default)]
    pub blog_category_ids: Vec<Uuid>,

    #[serde(default)]
    pub blog_tags: Vec<String>,
}

/// Lookup by id or, failing that, by title.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetArticleDto {
    pub id: Option<Uuid>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateArticleDto {
    pub id: Option<Uuid>,
    pub expected_version: Option<i32>,

    #[validate(
        length(max = 300, message = "Title must be at most 300 characters"),
        custom(function = "not_blank")
    )]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Summary must be at most 2000 characters"))]
    pub summary: Option<String>,

    pub content: Option<String>,

    pub author_id: Option<Uuid>,

    pub image: Option<ImagePayload>,

    pub attachment: Option<AttachmentPayload>,

    /// `None` keeps the current categories; `Some` replaces the set.
    pub blog_category_ids: Option<Vec<Uuid>>,

    /// `None` keeps the current tags; `Some` replaces the set.
    pub blog_tags: Option<Vec<String>>,
}

/// Full delete, or field clearing when `fields_to_delete` is non-empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteArticleDto {
    pub id: Option<Uuid>,
    #[serde(default)]
    pub fields_to_delete: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListArticlesDto {
    #[serde(flatten)]
    pub page: ListRequest,
    pub author_id: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// API endpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateApiEndpointDto {
    #[validate(
        length(max = 200, message = "Name must be at most 200 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,

    #[validate(
        length(max = 2048, message = "Route must be at most 2048 characters"),
        custom(function = "not_blank")
    )]
    pub route: String,

    #[validate(custom(function = "not_blank"))]
    pub http_method: String,

    pub description: Option<String>,

    pub environment_id: Option<Uuid>,

    pub attachment: Option<AttachmentPayload>,

    #[serde(default)]
    pub api_tags: Vec<String>,
}

/// Lookup by id or, failing that, by name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetApiEndpointDto {
    pub id: Option<Uuid>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateApiEndpointDto {
    pub id: Option<Uuid>,
    pub expected_version: Option<i32>,

    #[validate(
        length(max = 200, message = "Name must be at most 200 characters"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,

    #[validate(
        length(max = 2048, message = "Route must be at most 2048 characters"),
        custom(function = "not_blank")
    )]
    pub route: Option<String>,

    pub http_method: Option<String>,

    pub description: Option<String>,

    pub environment_id: Option<Uuid>,

    pub attachment: Option<AttachmentPayload>,

    /// `None` keeps the current tags; `Some` replaces the set.
    pub api_tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteApiEndpointDto {
    pub id: Option<Uuid>,
    #[serde(default)]
    pub fields_to_delete: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListApiEndpointsDto {
    #[serde(flatten)]
    pub page: ListRequest,
    pub environment_id: Option<Uuid>,
}
