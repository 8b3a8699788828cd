//! Attachment entity and repository trait.
//!
//! Maps to the `attachments` table. Like images, attachments are owned by
//! the aggregate that references them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit::Audit;
use crate::shared::error::AppError;
use crate::shared::pagination::{ListQuery, SortKey};

/// Maximum file size in bytes (25MB).
pub const MAX_ATTACHMENT_SIZE: i64 = 26_214_400;

/// Represents a downloadable file.
///
/// Maps to the `attachments` table:
/// - id: UUID PRIMARY KEY
/// - file_name: VARCHAR(255) NOT NULL
/// - url: TEXT NOT NULL
/// - content_type: VARCHAR(100) NULL (MIME type)
/// - size_bytes: BIGINT NULL
/// - audit columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,

    /// Original filename
    pub file_name: String,

    /// Where the file can be fetched
    pub url: String,

    /// MIME type (e.g., "application/pdf")
    pub content_type: Option<String>,

    /// File size in bytes
    pub size_bytes: Option<i64>,

    pub audit: Audit,
}

impl Attachment {
    /// Get human-readable file size.
    pub fn human_size(&self) -> Option<String> {
        let bytes = self.size_bytes?;
        let size = bytes as f64;
        Some(if size < 1024.0 {
            format!("{} B", bytes)
        } else if size < 1024.0 * 1024.0 {
            format!("{:.1} KB", size / 1024.0)
        } else {
            format!("{:.1} MB", size / (1024.0 * 1024.0))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentSortKey {
    Id,
    FileName,
    Created,
    Changed,
}

impl SortKey for AttachmentSortKey {
    const DEFAULT: Self = Self::Id;

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Some(Self::Id),
            "file_name" | "filename" => Some(Self::FileName),
            "created" => Some(Self::Created),
            "changed" => Some(Self::Changed),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::FileName => "file_name",
            Self::Created => "created",
            Self::Changed => "changed",
        }
    }
}

/// Repository trait for Attachment data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attachment>, AppError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Attachment>, AppError>;

    async fn list(&self, query: &ListQuery<AttachmentSortKey>)
        -> Result<Vec<Attachment>, AppError>;

    async fn create(&self, attachment: &Attachment) -> Result<(), AppError>;

    async fn update(&self, attachment: &Attachment, expected_version: i32)
        -> Result<(), AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}
