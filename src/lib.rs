//! # ACL System
//!
//! This crate provides an access-control-list permission store: an
//! authoritative mapping from `(subject, action)` pairs to allow/deny
//! decisions, fronted by a namespaced permission cache that is cleared as a
//! whole on every write. It also includes a theme manifest manager for
//! locating, parsing, activating, and deleting JSON-described themes.
//!
//! ## Features
//!
//! - Subject inheritance (users inherit permissions from roles, roles from
//!   other roles) with cycle detection
//! - Action paths forming a tree, with container-level grants covering
//!   descendants
//! - Nearest-decision resolution: the closest explicit allow/deny along the
//!   inheritance chain wins
//! - Namespace-scoped permission cache, cleared in full on every write
//! - Pluggable edge storage and cache backends
//! - Theme manifest merging with built-in presentation defaults
//!
//! ## Quick Start
//!
//! ```rust
//! use acl_system::{PermissionStore, SubjectRef};
//!
//! let mut store = PermissionStore::new();
//!
//! // Register subjects: two roles and a user belonging to both.
//! store.register_subject(SubjectRef::role(1));
//! store.register_subject(SubjectRef::role(2));
//! store.register_user(3, &[1, 2])?;
//!
//! // Grant and refuse actions.
//! store.allow(&SubjectRef::role(1), "controllers/Posts")?;
//! store.deny(&SubjectRef::role(2), "controllers/Settings")?;
//!
//! // Resolve what the user may invoke.
//! let actions = store.get_allowed_actions_by_user_id(3)?;
//! assert!(actions.iter().any(|a| a.as_str() == "controllers/Posts"));
//! # Ok::<(), acl_system::Error>(())
//! ```
//!
//! ## Audit Logging
//!
//! With the `audit` feature enabled, permission writes and subject graph
//! changes are logged through the standard logging facade:
//!
//! ```rust
//! # #[cfg(feature = "audit")]
//! # {
//! use acl_system::init_audit_logger;
//!
//! // Initialize logging (must be called early in program execution).
//! init_audit_logger();
//! # }
//! ```
//!
//! Cache failures on the write path are logged at `warn` and never fail the
//! authoritative operation.

#[cfg(feature = "audit")]
pub fn init_audit_logger() {
    env_logger::init();
}

pub mod action;
pub mod cache;
pub mod core;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod permission;
pub mod storage;
pub mod subject;
pub mod theme;

#[cfg(test)]
mod property_tests;

// Re-export main types for convenience
pub use crate::{
    action::ActionPath,
    cache::{CacheService, MemoryCache, PERMISSIONS_NAMESPACE},
    core::{AclConfig, PermissionStore},
    error::{Error, Result},
    graph::AccessGraph,
    metrics::{AclMetrics, MetricsSummary},
    permission::{Decision, PermissionEdge},
    storage::{EdgeStorage, MemoryStorage},
    subject::SubjectRef,
    theme::{SettingsStore, ThemeManager, ThemeManifest},
};

#[cfg(feature = "persistence")]
pub use crate::storage::FileStorage;
