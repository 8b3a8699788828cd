//! # Domain Entities
//!
//! Core domain entities. All entities map directly to their corresponding
//! database tables and share the `Audit` versioning columns.
//!
//! ## Aggregates
//!
//! - **Article**: blog article with categories, tags, an image and an attachment
//! - **ApiEndpoint**: catalogued endpoint with API tags and an attachment
//!
//! ## Collaborators
//!
//! - **Author**, **Image**, **Attachment**
//!
//! ## Reference Entities
//!
//! - **ReferenceEntity**: one shape for every tag/category/status table,
//!   discriminated by `ReferenceKind`
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod api_endpoint;
mod article;
mod attachment;
mod audit;
mod author;
mod image;
mod link;
mod reference;

pub use audit::{Audit, INITIAL_VERSION};
pub use link::{group_by_owner, Link, LinkDiff, LinkTable};

pub use reference::{ReferenceEntity, ReferenceKind, ReferenceRepository, ReferenceSortKey};

pub use author::{Author, AuthorRepository, AuthorSortKey};
pub use image::{Image, ImageRepository, ImageSortKey};
pub use attachment::{Attachment, AttachmentRepository, AttachmentSortKey, MAX_ATTACHMENT_SIZE};

pub use article::{
    Article, ArticleField, ArticleFilter, ArticleLinkChanges, ArticleLinks, ArticleRepository,
    ArticleSortKey,
};
pub use api_endpoint::{
    normalize_http_method, ApiEndpoint, ApiEndpointField, ApiEndpointFilter,
    ApiEndpointRepository, ApiEndpointSortKey, HTTP_METHODS,
};

#[cfg(test)]
pub use api_endpoint::MockApiEndpointRepository;
#[cfg(test)]
pub use article::MockArticleRepository;
#[cfg(test)]
pub use attachment::MockAttachmentRepository;
#[cfg(test)]
pub use author::MockAuthorRepository;
#[cfg(test)]
pub use image::MockImageRepository;
#[cfg(test)]
pub use reference::MockReferenceRepository;
