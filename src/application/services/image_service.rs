//! Image Service
//!
//! Images are owned by the aggregate that created them; aggregates call
//! into this service to create, update and delete them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::application::dto::{CreateImageDto, EntityIdDto, ImageDto, UpdateImageDto};
use crate::domain::{Audit, Image, ImageRepository, ImageSortKey};
use crate::shared::error::AppError;
use crate::shared::pagination::ListRequest;
use crate::shared::validation::{require_id, validate};
use crate::shared::RequestContext;

/// Image service trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageService: Send + Sync {
    async fn create_image(
        &self,
        ctx: &RequestContext,
        request: CreateImageDto,
    ) -> Result<String, AppError>;

    async fn get_image(&self, request: EntityIdDto) -> Result<ImageDto, AppError>;

    async fn update_image(
        &self,
        ctx: &RequestContext,
        request: UpdateImageDto,
    ) -> Result<String, AppError>;

    async fn delete_image(&self, request: EntityIdDto) -> Result<bool, AppError>;

    async fn list_images(&self, request: ListRequest) -> Result<Vec<ImageDto>, AppError>;

    /// Every id must exist
    async fn get_images(&self, ids: &[Uuid]) -> Result<Vec<ImageDto>, AppError>;
}

/// ImageService implementation
pub struct ImageServiceImpl<R>
where
    R: ImageRepository,
{
    image_repo: Arc<R>,
    max_page_limit: i64,
}

impl<R> ImageServiceImpl<R>
where
    R: ImageRepository,
{
    pub fn new(image_repo: Arc<R>, max_page_limit: i64) -> Self {
        Self {
            image_repo,
            max_page_limit,
        }
    }

    async fn fetch(&self, id: Uuid) -> Result<Image, AppError> {
        self.image_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Image", id))
    }
}

#[async_trait]
impl<R> ImageService for ImageServiceImpl<R>
where
    R: ImageRepository + 'static,
{
    #[tracing::instrument(skip(self, ctx, request))]
    async fn create_image(
        &self,
        ctx: &RequestContext,
        request: CreateImageDto,
    ) -> Result<String, AppError> {
        validate(&request)?;

        let image = Image {
            id: Uuid::now_v7(),
            url: request.url.trim().to_string(),
            alt_text: request.alt_text,
            title: request.title,
            audit: Audit::new(ctx),
        };
        self.image_repo.create(&image).await?;

        info!(id = %image.id, "Image created");
        Ok(image.id.to_string())
    }

    async fn get_image(&self, request: EntityIdDto) -> Result<ImageDto, AppError> {
        let id = require_id(request.id, "id")?;
        Ok(self.fetch(id).await?.into())
    }

    #[tracing::instrument(skip(self, ctx, request))]
    async fn update_image(
        &self,
        ctx: &RequestContext,
        request: UpdateImageDto,
    ) -> Result<String, AppError> {
        validate(&request)?;
        let id = require_id(request.id, "id")?;

        let mut image = self.fetch(id).await?;
        image.audit.check_expected(request.expected_version, "Image")?;

        if let Some(url) = request.url {
            image.url = url.trim().to_string();
        }
        if let Some(alt_text) = request.alt_text {
            image.alt_text = Some(alt_text);
        }
        if let Some(title) = request.title {
            image.title = Some(title);
        }

        let expected = image.audit.touch(ctx);
        self.image_repo.update(&image, expected).await?;

        info!(id = %id, version = image.audit.version, "Image updated");
        Ok(id.to_string())
    }

    #[tracing::instrument(skip(self, request))]
    async fn delete_image(&self, request: EntityIdDto) -> Result<bool, AppError> {
        let id = require_id(request.id, "id")?;
        self.fetch(id).await?;
        self.image_repo.delete(id).await?;

        info!(id = %id, "Image deleted");
        Ok(true)
    }

    async fn list_images(&self, request: ListRequest) -> Result<Vec<ImageDto>, AppError> {
        let query = request.validate::<ImageSortKey>(self.max_page_limit)?;
        let images = self.image_repo.list(&query).await?;
        Ok(images.into_iter().map(ImageDto::from).collect())
    }

    async fn get_images(&self, ids: &[Uuid]) -> Result<Vec<ImageDto>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: HashMap<Uuid, Image> = self
            .image_repo
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        ids.iter()
            .map(|id| {
                found
                    .get(id)
                    .cloned()
                    .map(ImageDto::from)
                    .ok_or_else(|| AppError::not_found("Image", id))
            })
            .collect()
    }
}
