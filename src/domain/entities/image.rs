//! Image entity and repository trait.
//!
//! Maps to the `images` table. Images are owned sub-resources of
//! aggregates: created, replaced and deleted through the owner.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit::Audit;
use crate::shared::error::AppError;
use crate::shared::pagination::{ListQuery, SortKey};

/// Represents a stored image reference.
///
/// Maps to the `images` table:
/// - id: UUID PRIMARY KEY
/// - url: TEXT NOT NULL
/// - alt_text: TEXT NULL
/// - title: VARCHAR(200) NULL
/// - audit columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: Uuid,
    pub url: String,
    pub alt_text: Option<String>,
    pub title: Option<String>,
    pub audit: Audit,
}

impl Image {
    /// File extension taken from the URL path, if any.
    pub fn extension(&self) -> Option<&str> {
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        let file = path.rsplit('/').next()?;
        file.rsplit_once('.').map(|(_, ext)| ext)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSortKey {
    Id,
    Title,
    Created,
    Changed,
}

impl SortKey for ImageSortKey {
    const DEFAULT: Self = Self::Id;

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Some(Self::Id),
            "title" => Some(Self::Title),
            "created" => Some(Self::Created),
            "changed" => Some(Self::Changed),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Created => "created",
            Self::Changed => "changed",
        }
    }
}

/// Repository trait for Image data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Image>, AppError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Image>, AppError>;

    async fn list(&self, query: &ListQuery<ImageSortKey>) -> Result<Vec<Image>, AppError>;

    async fn create(&self, image: &Image) -> Result<(), AppError>;

    async fn update(&self, image: &Image, expected_version: i32) -> Result<(), AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}
