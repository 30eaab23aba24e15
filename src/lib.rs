//! # contribution-marketplace
//!
//! REST backend of an open-source contribution marketplace: project leads
//! list the GitHub contributions made to their repositories and reward
//! contributors out of per-currency budgets.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── ProjectService / ContributionService / UserService (service/)
//!     ├── PermissionService (service/)
//!     │
//!     ├── Storage ports (storage/)
//!     │     ├── MemoryStorage ── query engine (query/)
//!     │     └── PostgresStorage ── query engine (query/)
//!     │
//!     └── Domain views and rules (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod query;
pub mod service;
pub mod storage;
