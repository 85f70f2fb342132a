//! Persistence for access events and the audit log.
//!
//! ```text
//! HTTP handlers
//!      │
//! services.rs ─ validation, clock stamping, bitácora summary
//!      │
//! repository/ ─ AccessLogRepository + AuditRepository traits
//!      │
//! repositories/ ─ local (in-memory) │ postgres (Diesel)
//! ```
//!
//! Use [`RepositoryFactory`] to build the backend selected by
//! `repository.toml` or the environment.

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod seed;
pub mod services;


// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    AccessLogRepository, AuditRepository, ErrorContext, FullRepository, RepositoryError,
    RepositoryResult,
};
pub use services::{
    audit_statistics, get_access_event, get_audit_event, health_check, list_access_events,
    list_access_events_for_user, list_audit_events, record_access_event,
};
