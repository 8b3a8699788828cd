//! # Configuration Module
//!
//! This module handles application configuration loading and management.
//! Configuration can be loaded from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use content_backend::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Pages are capped at {}", settings.pagination.max_page_limit);
//! ```

mod settings;

pub use settings::*;
