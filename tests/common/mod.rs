//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.

#![allow(dead_code)]

pub mod memory;

use std::sync::Arc;

use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::Name;
use fake::Fake;
use uuid::Uuid;

use content_backend::application::dto::{
    CreateAuthorDto, CreateReferenceDto,
};
use content_backend::domain::ReferenceKind;
use content_backend::shared::RequestContext;
use content_backend::startup::{ServiceOptions, Services};

pub use memory::*;

/// Services wired over in-memory repositories, with the repositories kept
/// alongside for assertions on stored state.
pub struct TestBackend {
    pub services: Services,
    pub references: Arc<MemoryReferenceRepository>,
    pub authors: Arc<MemoryAuthorRepository>,
    pub images: Arc<MemoryImageRepository>,
    pub attachments: Arc<MemoryAttachmentRepository>,
    pub articles: Arc<MemoryArticleRepository>,
    pub api_endpoints: Arc<MemoryApiEndpointRepository>,
    pub ctx: RequestContext,
}

impl TestBackend {
    /// Backend with default options (BlogTag dedupes by name)
    pub fn new() -> Self {
        Self::with_options(ServiceOptions::default())
    }

    pub fn with_options(options: ServiceOptions) -> Self {
        let references = Arc::new(MemoryReferenceRepository::default());
        let authors = Arc::new(MemoryAuthorRepository::default());
        let images = Arc::new(MemoryImageRepository::default());
        let attachments = Arc::new(MemoryAttachmentRepository::default());
        let articles = Arc::new(MemoryArticleRepository::default());
        let api_endpoints = Arc::new(MemoryApiEndpointRepository::default());

        let services = Services::wire(
            references.clone(),
            authors.clone(),
            images.clone(),
            attachments.clone(),
            articles.clone(),
            api_endpoints.clone(),
            options,
        );

        Self {
            services,
            references,
            authors,
            images,
            attachments,
            articles,
            api_endpoints,
            ctx: RequestContext::new(Uuid::now_v7()),
        }
    }

    /// Create an author with generated data
    pub async fn author(&self) -> Uuid {
        let request = CreateAuthorDto {
            name: Name().fake(),
            email: Some(SafeEmail().fake()),
            bio: Some(Sentence(3..8).fake()),
        };
        let id = self
            .services
            .authors
            .create_author(&self.ctx, request)
            .await
            .unwrap();
        Uuid::parse_str(&id).unwrap()
    }

    /// Create a reference entity of `kind`
    pub async fn reference(&self, kind: ReferenceKind, name: &str) -> Uuid {
        let id = self
            .services
            .references
            .create_reference(&self.ctx, kind, CreateReferenceDto::named(name))
            .await
            .unwrap();
        Uuid::parse_str(&id).unwrap()
    }

    pub async fn category(&self) -> Uuid {
        let name: String = Word().fake();
        self.reference(ReferenceKind::BlogCategory, &format!("{}-{}", name, unique_suffix()))
            .await
    }

    pub async fn environment(&self, name: &str) -> Uuid {
        self.reference(ReferenceKind::AppEnvironment, name).await
    }
}

/// Short random suffix for names that must not collide
pub fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Parse a service-returned id
pub fn id(value: &str) -> Uuid {
    Uuid::parse_str(value).unwrap()
}
