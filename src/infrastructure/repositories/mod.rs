//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! ## Available Repositories
//!
//! - **PgReferenceRepository** - every tag/category/status table
//! - **PgAuthorRepository** - article authors
//! - **PgImageRepository** - owned images
//! - **PgAttachmentRepository** - owned file attachments
//! - **PgArticleRepository** - articles with category and tag join rows
//! - **PgApiEndpointRepository** - API endpoints with API tag join rows
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use content_backend::infrastructure::repositories::{
//!     PgArticleRepository, PgReferenceRepository,
//! };
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let reference_repo = PgReferenceRepository::new(pool.clone());
//!     let article_repo = PgArticleRepository::new(pool.clone());
//! }
//! ```

pub mod api_endpoint_repository;
pub mod article_repository;
pub mod attachment_repository;
pub mod author_repository;
pub mod image_repository;
pub mod link_repository;
pub mod reference_repository;

pub use api_endpoint_repository::PgApiEndpointRepository;
pub use article_repository::PgArticleRepository;
pub use attachment_repository::PgAttachmentRepository;
pub use author_repository::PgAuthorRepository;
pub use image_repository::PgImageRepository;
pub use reference_repository::PgReferenceRepository;

use uuid::Uuid;

use crate::shared::error::AppError;

/// Map the affected-row count of a version-guarded `UPDATE` to a result.
///
/// The caller has already loaded the row, so zero rows means another writer
/// bumped the version (or removed the row) in between.
pub(crate) fn ensure_versioned_write(
    rows_affected: u64,
    entity: &str,
    id: Uuid,
) -> Result<(), AppError> {
    if rows_affected == 0 {
        return Err(AppError::Conflict(format!(
            "{} {} was modified concurrently",
            entity, id
        )));
    }
    Ok(())
}
