//! Application Startup
//!
//! Composition root: builds the pool, applies migrations and wires the
//! PostgreSQL repositories into the services.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::application::services::{
    ApiEndpointService, ApiEndpointServiceImpl, ArticleService, ArticleServiceImpl,
    AttachmentService, AttachmentServiceImpl, AuthorService, AuthorServiceImpl, DedupePolicy,
    ImageService, ImageServiceImpl, ReferenceService, ReferenceServiceImpl,
};
use crate::config::Settings;
use crate::domain::{
    ApiEndpointRepository, ArticleRepository, AttachmentRepository, AuthorRepository,
    ImageRepository, ReferenceRepository,
};
use crate::infrastructure::database;
use crate::infrastructure::repositories::{
    PgApiEndpointRepository, PgArticleRepository, PgAttachmentRepository, PgAuthorRepository,
    PgImageRepository, PgReferenceRepository,
};
use crate::shared::error::AppError;
use crate::shared::pagination::DEFAULT_MAX_PAGE_LIMIT;

/// Behaviour knobs shared by every service.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub dedupe: DedupePolicy,
    pub max_page_limit: i64,
}

impl ServiceOptions {
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        Ok(Self {
            dedupe: DedupePolicy::from_tables(&settings.references.dedupe_by_name)?,
            max_page_limit: settings.pagination.max_page_limit,
        })
    }
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            dedupe: DedupePolicy::default(),
            max_page_limit: DEFAULT_MAX_PAGE_LIMIT,
        }
    }
}

/// Every service, behind its trait.
#[derive(Clone)]
pub struct Services {
    pub references: Arc<dyn ReferenceService>,
    pub authors: Arc<dyn AuthorService>,
    pub images: Arc<dyn ImageService>,
    pub attachments: Arc<dyn AttachmentService>,
    pub articles: Arc<dyn ArticleService>,
    pub api_endpoints: Arc<dyn ApiEndpointService>,
}

impl Services {
    /// Wire services over any repository implementations.
    pub fn wire<R, Au, I, At, Ar, E>(
        reference_repo: Arc<R>,
        author_repo: Arc<Au>,
        image_repo: Arc<I>,
        attachment_repo: Arc<At>,
        article_repo: Arc<Ar>,
        endpoint_repo: Arc<E>,
        options: ServiceOptions,
    ) -> Self
    where
        R: ReferenceRepository + 'static,
        Au: AuthorRepository + 'static,
        I: ImageRepository + 'static,
        At: AttachmentRepository + 'static,
        Ar: ArticleRepository + 'static,
        E: ApiEndpointRepository + 'static,
    {
        let limit = options.max_page_limit;

        let references: Arc<dyn ReferenceService> =
            Arc::new(ReferenceServiceImpl::new(reference_repo, options.dedupe, limit));
        let authors: Arc<dyn AuthorService> = Arc::new(AuthorServiceImpl::new(author_repo, limit));
        let images: Arc<dyn ImageService> = Arc::new(ImageServiceImpl::new(image_repo, limit));
        let attachments: Arc<dyn AttachmentService> =
            Arc::new(AttachmentServiceImpl::new(attachment_repo, limit));

        let articles: Arc<dyn ArticleService> = Arc::new(ArticleServiceImpl::new(
            article_repo,
            references.clone(),
            authors.clone(),
            images.clone(),
            attachments.clone(),
            limit,
        ));
        let api_endpoints: Arc<dyn ApiEndpointService> = Arc::new(ApiEndpointServiceImpl::new(
            endpoint_repo,
            references.clone(),
            attachments.clone(),
            limit,
        ));

        Self {
            references,
            authors,
            images,
            attachments,
            articles,
            api_endpoints,
        }
    }

    /// Wire services over the PostgreSQL repositories.
    pub fn postgres(pool: PgPool, options: ServiceOptions) -> Self {
        Self::wire(
            Arc::new(PgReferenceRepository::new(pool.clone())),
            Arc::new(PgAuthorRepository::new(pool.clone())),
            Arc::new(PgImageRepository::new(pool.clone())),
            Arc::new(PgAttachmentRepository::new(pool.clone())),
            Arc::new(PgArticleRepository::new(pool.clone())),
            Arc::new(PgApiEndpointRepository::new(pool)),
            options,
        )
    }
}

/// Backend instance
pub struct Backend {
    pub db: PgPool,
    pub services: Services,
    pub settings: Arc<Settings>,
}

impl Backend {
    /// Build the backend from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let options = ServiceOptions::from_settings(&settings)?;

        let db = database::create_pool(&settings.database)
            .await
            .context("failed to connect to PostgreSQL")?;
        tracing::info!("Database connection pool created");

        if settings.database.run_migrations {
            database::run_migrations(&db)
                .await
                .context("failed to apply migrations")?;
            tracing::info!("Database migrations applied");
        }

        tracing::info!(dedupe_by_name = ?options.dedupe.tables(), "Wiring services");
        let services = Services::postgres(db.clone(), options);

        Ok(Self {
            db,
            services,
            settings: Arc::new(settings),
        })
    }

    /// Close the pool, waiting for checked-out connections.
    pub async fn shutdown(self) {
        self.db.close().await;
        tracing::info!("Database connection pool closed");
    }
}
