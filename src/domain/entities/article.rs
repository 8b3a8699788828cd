//! Article aggregate and repository trait.
//!
//! Maps to the `articles` table plus its join tables
//! `article_blog_categories` and `article_blog_tags`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit::Audit;
use super::link::{Link, LinkDiff, LinkTable};
use crate::shared::error::AppError;
use crate::shared::pagination::{ListQuery, SortKey};

/// A blog article.
///
/// Maps to the `articles` table:
/// - id: UUID PRIMARY KEY
/// - title: VARCHAR(300) NOT NULL
/// - summary: TEXT NULL
/// - content: TEXT NULL
/// - author_id: UUID NOT NULL REFERENCES authors(id)
/// - image_id: UUID NULL REFERENCES images(id)
/// - attachment_id: UUID NULL REFERENCES attachments(id)
/// - audit columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub author_id: Uuid,
    pub image_id: Option<Uuid>,
    pub attachment_id: Option<Uuid>,
    pub audit: Audit,
}

impl Article {
    /// Null out one optional column.
    pub fn clear(&mut self, field: ArticleField) {
        match field {
            ArticleField::Summary => self.summary = None,
            ArticleField::Content => self.content = None,
            ArticleField::ImageId => self.image_id = None,
            ArticleField::AttachmentId => self.attachment_id = None,
        }
    }
}

/// Article columns that a field-clearing delete may null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArticleField {
    Summary,
    Content,
    ImageId,
    AttachmentId,
}

impl ArticleField {
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "content" => Ok(Self::Content),
            "image" | "image_id" => Ok(Self::ImageId),
            "attachment" | "attachment_id" => Ok(Self::AttachmentId),
            "id" | "title" | "author" | "author_id" | "version" | "created" | "changed" => Err(
                AppError::Validation(format!("fields_to_delete: '{}' is required and cannot be cleared", s)),
            ),
            _ => Err(AppError::Validation(format!(
                "fields_to_delete: unknown article field '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleSortKey {
    Id,
    Title,
    Created,
    Changed,
}

impl SortKey for ArticleSortKey {
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

/// Equality filters for article listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub author_id: Option<Uuid>,
}

/// Related ids written alongside a new article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleLinks {
    pub categories: Vec<Uuid>,
    pub tags: Vec<Uuid>,
}

/// Link changes applied alongside an article update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleLinkChanges {
    pub categories: LinkDiff,
    pub tags: LinkDiff,
}

/// Repository trait for the Article aggregate.
///
/// Every write method is atomic: the primary row and its join rows are
/// committed together or not at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, AppError>;

    /// First article (oldest) with exactly this title.
    async fn find_by_title(&self, title: &str) -> Result<Option<Article>, AppError>;

    async fn list(
        &self,
        query: &ListQuery<ArticleSortKey>,
        filter: &ArticleFilter,
    ) -> Result<Vec<Article>, AppError>;

    /// Join rows of `table` for all the given articles, in one query.
    async fn find_links(&self, table: LinkTable, article_ids: &[Uuid])
        -> Result<Vec<Link>, AppError>;

    async fn create(&self, article: &Article, links: &ArticleLinks) -> Result<(), AppError>;

    /// Overwrite the row (version compare-and-swap) and apply link changes.
    async fn update(
        &self,
        article: &Article,
        expected_version: i32,
        changes: &ArticleLinkChanges,
    ) -> Result<(), AppError>;

    /// Remove the row and all its join rows.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}
