//! API Endpoint Service
//!
//! Catalogued endpoints belong to an app environment, carry API tags (by
//! name) and may own one attachment.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use super::attachment_service::AttachmentService;
use super::reference_service::ReferenceService;
use super::relations::{
    ensure_owned, index_by_id, lookup, normalize_names, parse_id, resolve_references,
    resolve_tag_names, unique_ids,
};
use crate::application::dto::{
    ApiEndpointDto, AttachmentChange, AttachmentPayload, CreateApiEndpointDto,
    DeleteApiEndpointDto, EntityIdDto, GetApiEndpointDto, ListApiEndpointsDto, OwnedPayload,
    UpdateApiEndpointDto,
};
use crate::domain::{
    group_by_owner, normalize_http_method, ApiEndpoint, ApiEndpointField, ApiEndpointFilter,
    ApiEndpointRepository, ApiEndpointSortKey, Audit, LinkDiff, LinkTable, ReferenceKind,
};
use crate::shared::error::AppError;
use crate::shared::validation::{require_id, validate};
use crate::shared::RequestContext;

/// API endpoint service trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiEndpointService: Send + Sync {
    async fn create_api_endpoint(
        &self,
        ctx: &RequestContext,
        request: CreateApiEndpointDto,
    ) -> Result<String, AppError>;

    /// Get by id, or by name when no id is given
    async fn get_api_endpoint(&self, request: GetApiEndpointDto)
        -> Result<ApiEndpointDto, AppError>;

    async fn update_api_endpoint(
        &self,
        ctx: &RequestContext,
        request: UpdateApiEndpointDto,
    ) -> Result<String, AppError>;

    /// Delete the endpoint, or only clear the listed fields
    async fn delete_api_endpoint(
        &self,
        ctx: &RequestContext,
        request: DeleteApiEndpointDto,
    ) -> Result<bool, AppError>;

    async fn list_api_endpoints(
        &self,
        request: ListApiEndpointsDto,
    ) -> Result<Vec<ApiEndpointDto>, AppError>;
}

/// ApiEndpointService implementation
pub struct ApiEndpointServiceImpl<E>
where
    E: ApiEndpointRepository,
{
    endpoint_repo: Arc<E>,
    references: Arc<dyn ReferenceService>,
    attachments: Arc<dyn AttachmentService>,
    max_page_limit: i64,
}

impl<E> ApiEndpointServiceImpl<E>
where
    E: ApiEndpointRepository,
{
    pub fn new(
        endpoint_repo: Arc<E>,
        references: Arc<dyn ReferenceService>,
        attachments: Arc<dyn AttachmentService>,
        max_page_limit: i64,
    ) -> Self {
        Self {
            endpoint_repo,
            references,
            attachments,
            max_page_limit,
        }
    }

    async fn fetch(&self, id: Uuid) -> Result<ApiEndpoint, AppError> {
        self.endpoint_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("ApiEndpoint", id))
    }

    async fn discard_attachment(&self, id: Option<Uuid>) {
        if let Some(id) = id {
            if let Err(e) = self.attachments.delete_attachment(EntityIdDto::new(id)).await {
                warn!(attachment_id = %id, error = %e, "Failed to delete unreferenced attachment");
            }
        }
    }

    /// Returns `(created, superseded)` attachment ids.
    async fn apply_attachment(
        &self,
        ctx: &RequestContext,
        endpoint: &mut ApiEndpoint,
        attachment: Option<AttachmentChange>,
    ) -> Result<(Option<Uuid>, Option<Uuid>), AppError> {
        match attachment {
            Some(OwnedPayload::Create(create)) => {
                let id = parse_id(&self.attachments.create_attachment(ctx, create).await?)?;
                let superseded = endpoint.attachment_id.replace(id);
                Ok((Some(id), superseded))
            }
            Some(OwnedPayload::Update(_, update)) => {
                self.attachments.update_attachment(ctx, update).await?;
                Ok((None, None))
            }
            None => Ok((None, None)),
        }
    }

    async fn assemble(&self, endpoints: Vec<ApiEndpoint>) -> Result<Vec<ApiEndpointDto>, AppError> {
        if endpoints.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = endpoints.iter().map(|e| e.id).collect();
        let tag_links = self
            .endpoint_repo
            .find_links(LinkTable::ApiEndpointApiTags, &ids)
            .await?;

        let environment_ids =
            unique_ids(&endpoints.iter().map(|e| e.environment_id).collect::<Vec<_>>());
        let attachment_ids =
            unique_ids(&endpoints.iter().filter_map(|e| e.attachment_id).collect::<Vec<_>>());
        let tag_ids = unique_ids(&tag_links.iter().map(|l| l.related_id).collect::<Vec<_>>());

        let (environments, attachments, tags) = futures::try_join!(
            self.references
                .get_references(ReferenceKind::AppEnvironment, &environment_ids),
            self.attachments.get_attachments(&attachment_ids),
            self.references.get_references(ReferenceKind::ApiTag, &tag_ids),
        )?;

        let environments = index_by_id(environments, |e| &e.id);
        let attachments = index_by_id(attachments, |a| &a.id);
        let tags = index_by_id(tags, |t| &t.id);
        let tag_links = group_by_owner(&tag_links);

        endpoints
            .into_iter()
            .map(|endpoint| {
                let api_tags = tag_links
                    .get(&endpoint.id)
                    .map(Vec::as_slice)
                    .unwrap_or_default()
                    .iter()
                    .map(|id| lookup(&tags, *id, "ApiTag"))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ApiEndpointDto {
                    id: endpoint.id.to_string(),
                    name: endpoint.name,
                    route: endpoint.route,
                    http_method: endpoint.http_method,
                    description: endpoint.description,
                    environment: lookup(&environments, endpoint.environment_id, "AppEnvironment")?,
                    attachment: endpoint
                        .attachment_id
                        .map(|id| lookup(&attachments, id, "Attachment"))
                        .transpose()?,
                    api_tags,
                    audit: endpoint.audit.into(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl<E> ApiEndpointService for ApiEndpointServiceImpl<E>
where
    E: ApiEndpointRepository + 'static,
{
    #[tracing::instrument(skip(self, ctx, request))]
    async fn create_api_endpoint(
        &self,
        ctx: &RequestContext,
        request: CreateApiEndpointDto,
    ) -> Result<String, AppError> {
        validate(&request)?;
        let http_method = normalize_http_method(&request.http_method)?;
        let environment_id = require_id(request.environment_id, "environment_id")?;
        let tag_names = normalize_names(&request.api_tags, "api_tags")?;
        let attachment = request
            .attachment
            .map(AttachmentPayload::into_owned)
            .transpose()?;
        if let Some(id) = attachment.as_ref().and_then(OwnedPayload::id) {
            ensure_owned(None, id, "attachment")?;
        }

        resolve_references(
            self.references.as_ref(),
            ReferenceKind::AppEnvironment,
            &[environment_id],
        )
        .await?;
        let tags = resolve_tag_names(
            self.references.as_ref(),
            ctx,
            ReferenceKind::ApiTag,
            &tag_names,
        )
        .await?;

        let mut endpoint = ApiEndpoint {
            id: Uuid::now_v7(),
            name: request.name.trim().to_string(),
            route: request.route.trim().to_string(),
            http_method,
            description: request.description,
            environment_id,
            attachment_id: None,
            audit: Audit::new(ctx),
        };
        let (created, _) = self.apply_attachment(ctx, &mut endpoint, attachment).await?;

        if let Err(e) = self.endpoint_repo.create(&endpoint, &tags).await {
            self.discard_attachment(created).await;
            return Err(e);
        }

        info!(id = %endpoint.id, "ApiEndpoint created");
        Ok(endpoint.id.to_string())
    }

    async fn get_api_endpoint(
        &self,
        request: GetApiEndpointDto,
    ) -> Result<ApiEndpointDto, AppError> {
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let endpoint = match (request.id, name) {
            (Some(id), _) => self.fetch(id).await?,
            (None, Some(name)) => self
                .endpoint_repo
                .find_by_name(name)
                .await?
                .ok_or_else(|| AppError::not_found("ApiEndpoint", name))?,
            (None, None) => {
                return Err(AppError::Validation("id, name: id or name is required".into()))
            }
        };

        self.assemble(vec![endpoint])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("endpoint assembly returned nothing".into()))
    }

    #[tracing::instrument(skip(self, ctx, request))]
    async fn update_api_endpoint(
        &self,
        ctx: &RequestContext,
        request: UpdateApiEndpointDto,
    ) -> Result<String, AppError> {
        validate(&request)?;
        let id = require_id(request.id, "id")?;
        let http_method = request
            .http_method
            .as_deref()
            .map(normalize_http_method)
            .transpose()?;
        let tag_names = request
            .api_tags
            .as_deref()
            .map(|names| normalize_names(names, "api_tags"))
            .transpose()?;
        let attachment = request
            .attachment
            .map(AttachmentPayload::into_owned)
            .transpose()?;

        let mut endpoint = self.fetch(id).await?;
        endpoint
            .audit
            .check_expected(request.expected_version, "ApiEndpoint")?;
        if let Some(attachment_id) = attachment.as_ref().and_then(OwnedPayload::id) {
            ensure_owned(endpoint.attachment_id, attachment_id, "attachment")?;
        }

        if let Some(environment_id) = request.environment_id {
            resolve_references(
                self.references.as_ref(),
                ReferenceKind::AppEnvironment,
                &[environment_id],
            )
            .await?;
            endpoint.environment_id = environment_id;
        }

        let mut tags = LinkDiff::default();
        if let Some(names) = &tag_names {
            let requested = resolve_tag_names(
                self.references.as_ref(),
                ctx,
                ReferenceKind::ApiTag,
                names,
            )
            .await?;
            let current: Vec<Uuid> = self
                .endpoint_repo
                .find_links(LinkTable::ApiEndpointApiTags, &[id])
                .await?
                .into_iter()
                .map(|l| l.related_id)
                .collect();
            tags = LinkDiff::between(&current, &requested);
        }

        let (created, superseded) = self.apply_attachment(ctx, &mut endpoint, attachment).await?;

        if let Some(name) = request.name {
            endpoint.name = name.trim().to_string();
        }
        if let Some(route) = request.route {
            endpoint.route = route.trim().to_string();
        }
        if let Some(http_method) = http_method {
            endpoint.http_method = http_method;
        }
        if let Some(description) = request.description {
            endpoint.description = Some(description);
        }

        let expected = endpoint.audit.touch(ctx);
        if let Err(e) = self.endpoint_repo.update(&endpoint, expected, &tags).await {
            self.discard_attachment(created).await;
            return Err(e);
        }
        self.discard_attachment(superseded).await;

        info!(id = %id, version = endpoint.audit.version, "ApiEndpoint updated");
        Ok(id.to_string())
    }

    #[tracing::instrument(skip(self, ctx, request))]
    async fn delete_api_endpoint(
        &self,
        ctx: &RequestContext,
        request: DeleteApiEndpointDto,
    ) -> Result<bool, AppError> {
        let id = require_id(request.id, "id")?;
        let fields = request
            .fields_to_delete
            .iter()
            .map(|f| ApiEndpointField::parse(f))
            .collect::<Result<Vec<_>, _>>()?;

        let mut endpoint = self.fetch(id).await?;

        if !fields.is_empty() {
            for field in fields {
                endpoint.clear(field);
            }
            let expected = endpoint.audit.touch(ctx);
            self.endpoint_repo
                .update(&endpoint, expected, &LinkDiff::default())
                .await?;

            info!(id = %id, version = endpoint.audit.version, "ApiEndpoint fields cleared");
            return Ok(true);
        }

        if let Some(attachment_id) = endpoint.attachment_id {
            self.attachments
                .delete_attachment(EntityIdDto::new(attachment_id))
                .await?;
        }
        self.endpoint_repo.delete(id).await?;

        info!(id = %id, "ApiEndpoint deleted");
        Ok(true)
    }

    async fn list_api_endpoints(
        &self,
        request: ListApiEndpointsDto,
    ) -> Result<Vec<ApiEndpointDto>, AppError> {
        let query = request
            .page
            .validate::<ApiEndpointSortKey>(self.max_page_limit)?;
        let filter = ApiEndpointFilter {
            environment_id: request.environment_id,
        };

        let endpoints = self.endpoint_repo.list(&query, &filter).await?;
        self.assemble(endpoints).await
    }
}
