//! Data Transfer Objects for REST request parsing.
//!
//! Responses reuse the domain views, which already carry their camelCase
//! serde names and OpenAPI schemas. List filters travel as comma-separated
//! query values.

pub mod common_dto;
pub mod contribution_dto;
pub mod project_dto;

pub use common_dto::*;
pub use contribution_dto::*;
pub use project_dto::*;
