//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::{ContributionService, PermissionService, ProjectService, UserService};
use crate::storage::Storage;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Catalog, project pages and project administration.
    pub project_service: Arc<ProjectService>,
    /// Contributions and item lookups.
    pub contribution_service: Arc<ContributionService>,
    /// The caller's rewards.
    pub user_service: Arc<UserService>,
    /// Page size used when a listing request does not give one.
    pub default_page_size: i32,
}

impl AppState {
    /// Wires every service over one storage adapter.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, default_page_size: i32) -> Self {
        let permissions = PermissionService::new(Arc::clone(&storage));
        Self {
            project_service: Arc::new(ProjectService::new(
                Arc::clone(&storage),
                permissions.clone(),
            )),
            contribution_service: Arc::new(ContributionService::new(
                Arc::clone(&storage),
                permissions,
            )),
            user_service: Arc::new(UserService::new(storage)),
            default_page_size,
        }
    }
}
