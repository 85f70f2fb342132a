//! Repository traits.
//!
//! Storage is split by concern:
//! - [`AccessLogRepository`]: gate access events and the grouped counts
//!   behind the heatmap
//! - [`AuditRepository`]: the bitácora
//!
//! [`FullRepository`] is what the application holds; every backend
//! implements both traits.

pub mod access;
pub mod audit;
pub mod error;

pub use access::AccessLogRepository;
pub use audit::AuditRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Every repository capability the application needs.
pub trait FullRepository: AccessLogRepository + AuditRepository {}

impl<T> FullRepository for T where T: AccessLogRepository + AuditRepository {}
