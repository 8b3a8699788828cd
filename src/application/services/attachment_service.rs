//! Attachment Service

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::application::dto::{
    AttachmentDto, CreateAttachmentDto, EntityIdDto, UpdateAttachmentDto,
};
use crate::domain::{Attachment, AttachmentRepository, AttachmentSortKey, Audit};
use crate::shared::error::AppError;
use crate::shared::pagination::ListRequest;
use crate::shared::validation::{require_id, validate};
use crate::shared::RequestContext;

/// Attachment service trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentService: Send + Sync {
    async fn create_attachment(
        &self,
        ctx: &RequestContext,
        request: CreateAttachmentDto,
    ) -> Result<String, AppError>;

    async fn get_attachment(&self, request: EntityIdDto) -> Result<AttachmentDto, AppError>;

    async fn update_attachment(
        &self,
        ctx: &RequestContext,
        request: UpdateAttachmentDto,
    ) -> Result<String, AppError>;

    async fn delete_attachment(&self, request: EntityIdDto) -> Result<bool, AppError>;

    async fn list_attachments(&self, request: ListRequest)
        -> Result<Vec<AttachmentDto>, AppError>;

    /// Every id must exist
    async fn get_attachments(&self, ids: &[Uuid]) -> Result<Vec<AttachmentDto>, AppError>;
}

/// AttachmentService implementation
pub struct AttachmentServiceImpl<R>
where
    R: AttachmentRepository,
{
    attachment_repo: Arc<R>,
    max_page_limit: i64,
}

impl<R> AttachmentServiceImpl<R>
where
    R: AttachmentRepository,
{
    pub fn new(attachment_repo: Arc<R>, max_page_limit: i64) -> Self {
        Self {
            attachment_repo,
            max_page_limit,
        }
    }

    async fn fetch(&self, id: Uuid) -> Result<Attachment, AppError> {
        self.attachment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Attachment", id))
    }
}

#[async_trait]
impl<R> AttachmentService for AttachmentServiceImpl<R>
where
    R: AttachmentRepository + 'static,
{
    #[tracing::instrument(skip(self, ctx, request))]
    async fn create_attachment(
        &self,
        ctx: &RequestContext,
        request: CreateAttachmentDto,
    ) -> Result<String, AppError> {
        validate(&request)?;

        let attachment = Attachment {
            id: Uuid::now_v7(),
            file_name: request.file_name.trim().to_string(),
            url: request.url.trim().to_string(),
            content_type: request.content_type,
            size_bytes: request.size_bytes,
            audit: Audit::new(ctx),
        };
        self.attachment_repo.create(&attachment).await?;

        info!(id = %attachment.id, "Attachment created");
        Ok(attachment.id.to_string())
    }

    async fn get_attachment(&self, request: EntityIdDto) -> Result<AttachmentDto, AppError> {
        let id = require_id(request.id, "id")?;
        Ok(self.fetch(id).await?.into())
    }

    #[tracing::instrument(skip(self, ctx, request))]
    async fn update_attachment(
        &self,
        ctx: &RequestContext,
        request: UpdateAttachmentDto,
    ) -> Result<String, AppError> {
        validate(&request)?;
        let id = require_id(request.id, "id")?;

        let mut attachment = self.fetch(id).await?;
        attachment
            .audit
            .check_expected(request.expected_version, "Attachment")?;

        if let Some(file_name) = request.file_name {
            attachment.file_name = file_name.trim().to_string();
        }
        if let Some(url) = request.url {
            attachment.url = url.trim().to_string();
        }
        if let Some(content_type) = request.content_type {
            attachment.content_type = Some(content_type);
        }
        if let Some(size_bytes) = request.size_bytes {
            attachment.size_bytes = Some(size_bytes);
        }

        let expected = attachment.audit.touch(ctx);
        self.attachment_repo.update(&attachment, expected).await?;

        info!(id = %id, version = attachment.audit.version, "Attachment updated");
        Ok(id.to_string())
    }

    #[tracing::instrument(skip(self, request))]
    async fn delete_attachment(&self, request: EntityIdDto) -> Result<bool, AppError> {
        let id = require_id(request.id, "id")?;
        self.fetch(id).await?;
        self.attachment_repo.delete(id).await?;

        info!(id = %id, "Attachment deleted");
        Ok(true)
    }

    async fn list_attachments(
        &self,
        request: ListRequest,
    ) -> Result<Vec<AttachmentDto>, AppError> {
        let query = request.validate::<AttachmentSortKey>(self.max_page_limit)?;
        let attachments = self.attachment_repo.list(&query).await?;
        Ok(attachments.into_iter().map(AttachmentDto::from).collect())
    }

    async fn get_attachments(&self, ids: &[Uuid]) -> Result<Vec<AttachmentDto>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: HashMap<Uuid, Attachment> = self
            .attachment_repo
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
                    .map(AttachmentDto::from)
                    .ok_or_else(|| AppError::not_found("Attachment", id))
            })
            .collect()
    }
}
