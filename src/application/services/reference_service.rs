//! Reference Service
//!
//! Generic CRUD over every single-table reference kind (tags, categories,
//! statuses, environments). One implementation serves all kinds; the kind
//! selects the table.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::dto::{
    CreateReferenceDto, EntityIdDto, GetReferenceDto, ReferenceDto, UpdateReferenceDto,
};
use crate::domain::{Audit, ReferenceEntity, ReferenceKind, ReferenceRepository, ReferenceSortKey};
use crate::shared::error::AppError;
use crate::shared::pagination::ListRequest;
use crate::shared::validation::{require_id, validate};
use crate::shared::RequestContext;

/// Reference kinds whose create returns the existing id on an exact name match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupePolicy {
    kinds: HashSet<ReferenceKind>,
}

impl DedupePolicy {
    pub fn new(kinds: impl IntoIterator<Item = ReferenceKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    pub fn none() -> Self {
        Self::new([])
    }

    /// Build from table names, e.g. `["blog_tags"]`.
    pub fn from_tables<S: AsRef<str>>(tables: &[S]) -> Result<Self, AppError> {
        let kinds = tables
            .iter()
            .map(|t| {
                ReferenceKind::from_table(t.as_ref()).ok_or_else(|| {
                    AppError::Validation(format!(
                        "references.dedupe_by_name: unknown reference kind '{}'",
                        t.as_ref()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(kinds))
    }

    pub fn dedupes(&self, kind: ReferenceKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Table names in a stable order, for logging.
    pub fn tables(&self) -> Vec<&'static str> {
        let mut tables: Vec<_> = self.kinds.iter().map(|k| k.table()).collect();
        tables.sort_unstable();
        tables
    }
}

impl Default for DedupePolicy {
    fn default() -> Self {
        Self::new([ReferenceKind::BlogTag])
    }
}

/// Reference service trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceService: Send + Sync {
    /// Create a reference entity, returning its id
    async fn create_reference(
        &self,
        ctx: &RequestContext,
        kind: ReferenceKind,
        request: CreateReferenceDto,
    ) -> Result<String, AppError>;

    /// Get by id or by exact name
    async fn get_reference(
        &self,
        kind: ReferenceKind,
        request: GetReferenceDto,
    ) -> Result<ReferenceDto, AppError>;

    /// Update supplied fields, returning the id
    async fn update_reference(
        &self,
        ctx: &RequestContext,
        kind: ReferenceKind,
        request: UpdateReferenceDto,
    ) -> Result<String, AppError>;

    /// Delete by id
    async fn delete_reference(
        &self,
        kind: ReferenceKind,
        request: EntityIdDto,
    ) -> Result<bool, AppError>;

    /// Paged listing
    async fn list_references(
        &self,
        kind: ReferenceKind,
        request: ListRequest,
    ) -> Result<Vec<ReferenceDto>, AppError>;

    /// Batched lookup; every id must exist
    async fn get_references(
        &self,
        kind: ReferenceKind,
        ids: &[Uuid],
    ) -> Result<Vec<ReferenceDto>, AppError>;

    /// Batched exact-name lookup; absent names are simply not returned
    async fn find_references_by_names(
        &self,
        kind: ReferenceKind,
        names: &[String],
    ) -> Result<Vec<ReferenceDto>, AppError>;
}

/// ReferenceService implementation
pub struct ReferenceServiceImpl<R>
where
    R: ReferenceRepository,
{
    reference_repo: Arc<R>,
    dedupe: DedupePolicy,
    max_page_limit: i64,
}

impl<R> ReferenceServiceImpl<R>
where
    R: ReferenceRepository,
{
    pub fn new(reference_repo: Arc<R>, dedupe: DedupePolicy, max_page_limit: i64) -> Self {
        Self {
            reference_repo,
            dedupe,
            max_page_limit,
        }
    }

    async fn fetch(&self, kind: ReferenceKind, id: Uuid) -> Result<ReferenceEntity, AppError> {
        self.reference_repo
            .find_by_id(kind, id)
            .await?
            .ok_or_else(|| AppError::not_found(kind.label(), id))
    }
}

#[async_trait]
impl<R> ReferenceService for ReferenceServiceImpl<R>
where
    R: ReferenceRepository + 'static,
{
    #[tracing::instrument(skip(self, ctx, request), fields(kind = %kind))]
    async fn create_reference(
        &self,
        ctx: &RequestContext,
        kind: ReferenceKind,
        request: CreateReferenceDto,
    ) -> Result<String, AppError> {
        validate(&request)?;
        let name = request.name.trim().to_string();

        if self.dedupe.dedupes(kind) {
            if let Some(existing) = self.reference_repo.find_by_name(kind, &name).await? {
                debug!(id = %existing.id, "Reusing existing {} by name", kind);
                return Ok(existing.id.to_string());
            }
        }

        let entity = ReferenceEntity {
            id: Uuid::now_v7(),
            kind,
            name,
            description: request.description,
            audit: Audit::new(ctx),
        };
        self.reference_repo.create(&entity).await?;

        info!(id = %entity.id, "{} created", kind);
        Ok(entity.id.to_string())
    }

    async fn get_reference(
        &self,
        kind: ReferenceKind,
        request: GetReferenceDto,
    ) -> Result<ReferenceDto, AppError> {
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let entity = match (request.id, name) {
            (Some(_), Some(_)) => {
                return Err(AppError::Validation(
                    "id, name: supply exactly one of id or name".into(),
                ))
            }
            (None, None) => {
                return Err(AppError::Validation("id, name: id or name is required".into()))
            }
            (Some(id), None) => self.fetch(kind, id).await?,
            (None, Some(name)) => self
                .reference_repo
                .find_by_name(kind, name)
                .await?
                .ok_or_else(|| AppError::not_found(kind.label(), name))?,
        };

        Ok(entity.into())
    }

    #[tracing::instrument(skip(self, ctx, request), fields(kind = %kind))]
    async fn update_reference(
        &self,
        ctx: &RequestContext,
        kind: ReferenceKind,
        request: UpdateReferenceDto,
    ) -> Result<String, AppError> {
        validate(&request)?;
        let id = require_id(request.id, "id")?;

        let mut entity = self.fetch(kind, id).await?;
        entity.audit.check_expected(request.expected_version, kind.label())?;

        if let Some(name) = request.name {
            entity.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            entity.description = Some(description);
        }

        let expected = entity.audit.touch(ctx);
        self.reference_repo.update(&entity, expected).await?;

        info!(id = %id, version = entity.audit.version, "{} updated", kind);
        Ok(id.to_string())
    }

    #[tracing::instrument(skip(self, request), fields(kind = %kind))]
    async fn delete_reference(
        &self,
        kind: ReferenceKind,
        request: EntityIdDto,
    ) -> Result<bool, AppError> {
        let id = require_id(request.id, "id")?;
        self.fetch(kind, id).await?;
        self.reference_repo.delete(kind, id).await?;

        info!(id = %id, "{} deleted", kind);
        Ok(true)
    }

    async fn list_references(
        &self,
        kind: ReferenceKind,
        request: ListRequest,
    ) -> Result<Vec<ReferenceDto>, AppError> {
        let query = request.validate::<ReferenceSortKey>(self.max_page_limit)?;
        let entities = self.reference_repo.list(kind, &query).await?;
        Ok(entities.into_iter().map(ReferenceDto::from).collect())
    }

    async fn get_references(
        &self,
        kind: ReferenceKind,
        ids: &[Uuid],
    ) -> Result<Vec<ReferenceDto>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: HashMap<Uuid, ReferenceEntity> = self
            .reference_repo
            .find_by_ids(kind, ids)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        ids.iter()
            .map(|id| {
                found
                    .get(id)
                    .cloned()
                    .map(ReferenceDto::from)
                    .ok_or_else(|| AppError::not_found(kind.label(), id))
            })
            .collect()
    }

    async fn find_references_by_names(
        &self,
        kind: ReferenceKind,
        names: &[String],
    ) -> Result<Vec<ReferenceDto>, AppError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let entities = self.reference_repo.find_by_names(kind, names).await?;
        Ok(entities.into_iter().map(ReferenceDto::from).collect())
    }
}
