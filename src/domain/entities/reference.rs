//! Reference entities and repository trait.
//!
//! A reference entity is a standalone named record (tag, category, status,
//! environment...). Every kind has its own table with the same shape:
//! - id: UUID PRIMARY KEY
//! - name: VARCHAR(200) NOT NULL
//! - description: TEXT NULL
//! - audit columns (see `Audit`)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit::Audit;
use crate::shared::error::AppError;
use crate::shared::pagination::{ListQuery, SortKey};

/// The kinds of reference entity, each backed by its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    ApiTag,
    AppTag,
    AllowedGrantType,
    Severity,
    Status,
    ProductCategory,
    AppEnvironment,
    BlogCategory,
    BlogTag,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 9] = [
        Self::ApiTag,
        Self::AppTag,
        Self::AllowedGrantType,
        Self::Severity,
        Self::Status,
        Self::ProductCategory,
        Self::AppEnvironment,
        Self::BlogCategory,
        Self::BlogTag,
    ];

    /// Table backing this kind.
    pub fn table(&self) -> &'static str {
        match self {
            Self::ApiTag => "api_tags",
            Self::AppTag => "app_tags",
            Self::AllowedGrantType => "allowed_grant_types",
            Self::Severity => "severities",
            Self::Status => "statuses",
            Self::ProductCategory => "product_categories",
            Self::AppEnvironment => "app_environments",
            Self::BlogCategory => "blog_categories",
            Self::BlogTag => "blog_tags",
        }
    }

    /// Human-readable entity name for messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ApiTag => "ApiTag",
            Self::AppTag => "AppTag",
            Self::AllowedGrantType => "AllowedGrantType",
            Self::Severity => "Severity",
            Self::Status => "Status",
            Self::ProductCategory => "ProductCategory",
            Self::AppEnvironment => "AppEnvironment",
            Self::BlogCategory => "BlogCategory",
            Self::BlogTag => "BlogTag",
        }
    }

    /// Resolve a kind from its table name.
    pub fn from_table(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.table() == s)
    }

    /// Tags are attached to aggregates by name rather than by id.
    pub fn is_tag_like(&self) -> bool {
        matches!(self, Self::ApiTag | Self::AppTag | Self::BlogTag)
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A row of any reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntity {
    pub id: Uuid,
    pub kind: ReferenceKind,
    pub name: String,
    pub description: Option<String>,
    pub audit: Audit,
}

/// Sortable reference columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSortKey {
    Id,
    Name,
    Created,
    Changed,
}

impl SortKey for ReferenceSortKey {
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

/// Repository trait for reference entities of every kind.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    /// Find one entity by id.
    async fn find_by_id(&self, kind: ReferenceKind, id: Uuid)
        -> Result<Option<ReferenceEntity>, AppError>;

    /// Find every entity whose id is in `ids`, in one query.
    async fn find_by_ids(
        &self,
        kind: ReferenceKind,
        ids: &[Uuid],
    ) -> Result<Vec<ReferenceEntity>, AppError>;

    /// First entity (oldest) with exactly this name.
    async fn find_by_name(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> Result<Option<ReferenceEntity>, AppError>;

    /// Every entity whose name is in `names`, in one query.
    async fn find_by_names(
        &self,
        kind: ReferenceKind,
        names: &[String],
    ) -> Result<Vec<ReferenceEntity>, AppError>;

    /// One page of entities.
    async fn list(
        &self,
        kind: ReferenceKind,
        query: &ListQuery<ReferenceSortKey>,
    ) -> Result<Vec<ReferenceEntity>, AppError>;

    /// Insert a new entity.
    async fn create(&self, entity: &ReferenceEntity) -> Result<(), AppError>;

    /// Overwrite an entity if its stored version is still `expected_version`.
    async fn update(&self, entity: &ReferenceEntity, expected_version: i32)
        -> Result<(), AppError>;

    /// Remove an entity.
    async fn delete(&self, kind: ReferenceKind, id: Uuid) -> Result<(), AppError>;
}
