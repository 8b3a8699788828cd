//! Author entity and repository trait.
//!
//! Maps to the `authors` table.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit::Audit;
use crate::shared::error::AppError;
use crate::shared::pagination::{ListQuery, SortKey};

/// Writer credited on articles.
///
/// Maps to the `authors` table:
/// - id: UUID PRIMARY KEY
/// - name: VARCHAR(200) NOT NULL
/// - email: VARCHAR(320) NULL
/// - bio: TEXT NULL
/// - audit columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub audit: Audit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorSortKey {
    Id,
    Name,
    Created,
    Changed,
}

impl SortKey for AuthorSortKey {
    const DEFAULT: Self = Self::Id;

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "created" => Some(Self::Created),
            "changed" => Some(Self::Changed),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Created => "created",
            Self::Changed => "changed",
        }
    }
}

/// Repository trait for Author data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Author>, AppError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Author>, AppError>;

    /// First author (oldest) with exactly this name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Author>, AppError>;

    async fn list(&self, query: &ListQuery<AuthorSortKey>) -> Result<Vec<Author>, AppError>;

    async fn create(&self, author: &Author) -> Result<(), AppError>;

    /// Overwrite if the stored version is still `expected_version`.
    async fn update(&self, author: &Author, expected_version: i32) -> Result<(), AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}
