//! Application Layer
//!
//! Contains business logic services and data transfer objects (DTOs).
//! Services validate input, resolve related entities through their
//! collaborators and hand persistence to the repositories.

pub mod dto;
pub mod services;
