//! # Content Backend Library
//!
//! This crate provides versioned CRUD over a content and API catalogue:
//! - Reference entities (tags, categories, statuses, environments)
//! - Articles with authors, categories, tags, an image and an attachment
//! - API endpoints with environments, API tags and an attachment
//! - PostgreSQL for persistent storage, with optimistic versioning
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core entities and repository traits
//! - **Application Layer**: Business logic services and DTOs
//! - **Infrastructure Layer**: Database pool, transactions and repositories
//!
//! ## Module Structure
//!
//! ```text
//! content_backend/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities and repository traits
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ PostgreSQL implementations
//! +-- shared/         Common utilities (errors, paging, request context)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Shared utilities
pub mod shared;

// Composition root
pub mod startup;

// Telemetry and observability
pub mod telemetry;
