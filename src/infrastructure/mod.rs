//! Infrastructure Layer
//!
//! PostgreSQL implementations of the domain repository traits, the
//! connection pool and the transaction boundary.

pub mod database;
pub mod repositories;
