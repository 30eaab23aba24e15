//! Service layer: business rules on top of the storage port.
//!
//! [`PermissionService`] is the only place that decides who leads a
//! project. [`ProjectService`], [`ContributionService`] and [`UserService`]
//! call it (or check recipient identity) before touching storage, and log
//! every mutation.

pub mod contribution_service;
pub mod permission;
pub mod project_service;
pub mod user_service;

pub use contribution_service::ContributionService;
pub use permission::PermissionService;
pub use project_service::ProjectService;
pub use user_service::UserService;
