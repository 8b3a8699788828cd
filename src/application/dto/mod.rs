//! Data Transfer Objects
//!
//! DTOs for service request/response shapes.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
