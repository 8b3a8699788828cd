//! # Domain Layer
//!
//! The domain layer contains the entity model and the repository contracts.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or application layers
//! - Repository traits define data access contracts
//! - Sortable columns and clearable fields are closed enums, so nothing a
//!   caller sends is ever spliced into SQL

pub mod entities;

// Re-export commonly used types
pub use entities::*;
