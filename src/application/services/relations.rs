//! Relation Helpers
//!
//! Fan-out used by the aggregate services: resolving linked reference
//! entities by id or by name, and deciding what to do with owned
//! sub-resources on update.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::reference_service::ReferenceService;
use crate::application::dto::CreateReferenceDto;
use crate::domain::ReferenceKind;
use crate::shared::error::AppError;
use crate::shared::validation::validate;
use crate::shared::RequestContext;

/// Parse an identifier returned by a collaborator service.
pub fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|e| AppError::Internal(format!("invalid identifier '{}': {}", id, e)))
}

/// Drop repeated ids, keeping first occurrence order.
pub fn unique_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Trim and dedupe requested names.
///
/// Each name must pass the rules a created reference entity is held to, so
/// nothing is looked up or written for a request that would fail later.
pub fn normalize_names(names: &[String], field: &str) -> Result<Vec<String>, AppError> {
    let mut seen = HashSet::with_capacity(names.len());
    let mut normalized = Vec::with_capacity(names.len());

    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(format!(
                "{}: names must not be empty",
                field
            )));
        }
        validate(&CreateReferenceDto::named(trimmed)).map_err(|e| match e {
            AppError::Validation(msg) => AppError::Validation(format!("{}.{}", field, msg)),
            other => other,
        })?;
        if seen.insert(trimmed.to_string()) {
            normalized.push(trimmed.to_string());
        }
    }

    Ok(normalized)
}

/// Check that every referenced id exists, returning them deduplicated.
///
/// One batched lookup; the first missing id is reported as NotFound.
pub async fn resolve_references(
    references: &dyn ReferenceService,
    kind: ReferenceKind,
    ids: &[Uuid],
) -> Result<Vec<Uuid>, AppError> {
    let ids = unique_ids(ids);
    references.get_references(kind, &ids).await?;
    Ok(ids)
}

/// Resolve names to ids, creating the ones that do not exist yet.
///
/// `names` must already be normalized. Ids come back in request order.
pub async fn resolve_tag_names(
    references: &dyn ReferenceService,
    ctx: &RequestContext,
    kind: ReferenceKind,
    names: &[String],
) -> Result<Vec<Uuid>, AppError> {
    if !kind.is_tag_like() {
        return Err(AppError::Internal(format!("{} is not linked by name", kind)));
    }
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let mut by_name: HashMap<String, Uuid> = HashMap::with_capacity(names.len());
    for existing in references.find_references_by_names(kind, names).await? {
        // Duplicates may exist for kinds that do not dedupe; oldest wins.
        if !by_name.contains_key(&existing.name) {
            by_name.insert(existing.name.clone(), parse_id(&existing.id)?);
        }
    }

    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let id = match by_name.get(name) {
            Some(id) => *id,
            None => {
                let created = references
                    .create_reference(ctx, kind, CreateReferenceDto::named(name.clone()))
                    .await?;
                parse_id(&created)?
            }
        };
        ids.push(id);
    }

    Ok(ids)
}

/// An update may only modify the sub-resource the record already owns.
pub fn ensure_owned(current: Option<Uuid>, id: Uuid, field: &str) -> Result<(), AppError> {
    if current == Some(id) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "{}.id: {} is not owned by this record",
            field, id
        )))
    }
}

/// Index DTOs by their string id.
pub fn index_by_id<T>(items: Vec<T>, id: impl Fn(&T) -> &str) -> HashMap<String, T> {
    items
        .into_iter()
        .map(|item| (id(&item).to_string(), item))
        .collect()
}

/// Take a resolved DTO out of an index built by [`index_by_id`].
pub fn lookup<T: Clone>(index: &HashMap<String, T>, id: Uuid, entity: &str) -> Result<T, AppError> {
    index
        .get(&id.to_string())
        .cloned()
        .ok_or_else(|| AppError::not_found(entity, id))
}
