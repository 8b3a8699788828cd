//! Author Service
//!
//! Handles author management. Articles reference authors by id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::application::dto::{
    AuthorDto, CreateAuthorDto, EntityIdDto, GetAuthorDto, UpdateAuthorDto,
};
use crate::domain::{Audit, Author, AuthorRepository, AuthorSortKey};
use crate::shared::error::AppError;
use crate::shared::pagination::ListRequest;
use crate::shared::validation::{require_id, validate};
use crate::shared::RequestContext;

/// Author service trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorService: Send + Sync {
    /// Create a new author
    async fn create_author(
        &self,
        ctx: &RequestContext,
        request: CreateAuthorDto,
    ) -> Result<String, AppError>;

    /// Get author by id or exact name
    async fn get_author(&self, request: GetAuthorDto) -> Result<AuthorDto, AppError>;

    /// Update author
    async fn update_author(
        &self,
        ctx: &RequestContext,
        request: UpdateAuthorDto,
    ) -> Result<String, AppError>;

    /// Delete author
    async fn delete_author(&self, request: EntityIdDto) -> Result<bool, AppError>;

    /// List authors
    async fn list_authors(&self, request: ListRequest) -> Result<Vec<AuthorDto>, AppError>;

    /// Get several authors at once; every id must exist
    async fn get_authors(&self, ids: &[Uuid]) -> Result<Vec<AuthorDto>, AppError>;
}

/// AuthorService implementation
pub struct AuthorServiceImpl<R>
where
    R: AuthorRepository,
{
    author_repo: Arc<R>,
    max_page_limit: i64,
}

impl<R> AuthorServiceImpl<R>
where
    R: AuthorRepository,
{
    pub fn new(author_repo: Arc<R>, max_page_limit: i64) -> Self {
        Self {
            author_repo,
            max_page_limit,
        }
    }

    async fn fetch(&self, id: Uuid) -> Result<Author, AppError> {
        self.author_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Author", id))
    }
}

#[async_trait]
impl<R> AuthorService for AuthorServiceImpl<R>
where
    R: AuthorRepository + 'static,
{
    #[tracing::instrument(skip(self, ctx, request))]
    async fn create_author(
        &self,
        ctx: &RequestContext,
        request: CreateAuthorDto,
    ) -> Result<String, AppError> {
        validate(&request)?;

        let author = Author {
            id: Uuid::now_v7(),
            name: request.name.trim().to_string(),
            email: request.email,
            bio: request.bio,
            audit: Audit::new(ctx),
        };
        self.author_repo.create(&author).await?;

        info!(id = %author.id, "Author created");
        Ok(author.id.to_string())
    }

    async fn get_author(&self, request: GetAuthorDto) -> Result<AuthorDto, AppError> {
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let author = match (request.id, name) {
            (Some(_), Some(_)) => {
                return Err(AppError::Validation(
                    "id, name: supply exactly one of id or name".into(),
                ))
            }
            (None, None) => {
                return Err(AppError::Validation("id, name: id or name is required".into()))
            }
            (Some(id), None) => self.fetch(id).await?,
            (None, Some(name)) => self
                .author_repo
                .find_by_name(name)
                .await?
                .ok_or_else(|| AppError::not_found("Author", name))?,
        };

        Ok(author.into())
    }

    #[tracing::instrument(skip(self, ctx, request))]
    async fn update_author(
        &self,
        ctx: &RequestContext,
        request: UpdateAuthorDto,
    ) -> Result<String, AppError> {
        validate(&request)?;
        let id = require_id(request.id, "id")?;

        let mut author = self.fetch(id).await?;
        author.audit.check_expected(request.expected_version, "Author")?;

        if let Some(name) = request.name {
            author.name = name.trim().to_string();
        }
        if let Some(email) = request.email {
            author.email = Some(email);
        }
        if let Some(bio) = request.bio {
            author.bio = Some(bio);
        }

        let expected = author.audit.touch(ctx);
        self.author_repo.update(&author, expected).await?;

        info!(id = %id, version = author.audit.version, "Author updated");
        Ok(id.to_string())
    }

    #[tracing::instrument(skip(self, request))]
    async fn delete_author(&self, request: EntityIdDto) -> Result<bool, AppError> {
        let id = require_id(request.id, "id")?;
        self.fetch(id).await?;
        self.author_repo.delete(id).await?;

        info!(id = %id, "Author deleted");
        Ok(true)
    }

    async fn list_authors(&self, request: ListRequest) -> Result<Vec<AuthorDto>, AppError> {
        let query = request.validate::<AuthorSortKey>(self.max_page_limit)?;
        let authors = self.author_repo.list(&query).await?;
        Ok(authors.into_iter().map(AuthorDto::from).collect())
    }

    async fn get_authors(&self, ids: &[Uuid]) -> Result<Vec<AuthorDto>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: HashMap<Uuid, Author> = self
            .author_repo
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        ids.iter()
            .map(|id| {
                found
                    .get(id)
                    .cloned()
                    .map(AuthorDto::from)
                    .ok_or_else(|| AppError::not_found("Author", id))
            })
            .collect()
    }
}
