//! Shared Utilities
//!
//! Common utilities used across all layers.

pub mod context;
pub mod error;
pub mod pagination;
pub mod validation;

pub use context::RequestContext;
pub use error::{AppError, ErrorKind};
pub use pagination::{ListQuery, ListRequest, Sort, SortKey, SortOrder};
