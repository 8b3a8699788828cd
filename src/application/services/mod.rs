//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **ReferenceService**: CRUD for every tag/category/status kind
//! - **AuthorService**, **ImageService**, **AttachmentService**: collaborators
//! - **ArticleService**: article aggregate with categories, tags and owned media
//! - **ApiEndpointService**: endpoint aggregate with API tags and an attachment

pub mod api_endpoint_service;
pub mod article_service;
pub mod attachment_service;
pub mod author_service;
pub mod image_service;
pub mod reference_service;
pub mod relations;

pub use api_endpoint_service::{ApiEndpointService, ApiEndpointServiceImpl};
pub use article_service::{ArticleService, ArticleServiceImpl};
pub use attachment_service::{AttachmentService, AttachmentServiceImpl};
pub use author_service::{AuthorService, AuthorServiceImpl};
pub use image_service::{ImageService, ImageServiceImpl};
pub use reference_service::{DedupePolicy, ReferenceService, ReferenceServiceImpl};
