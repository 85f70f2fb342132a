//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::repository::FullRepository;
use crate::services::audit::AuditRecorder;
use crate::services::clock::{Clock, SystemClock};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn FullRepository>,
    pub clock: Arc<dyn Clock>,
    /// Shared so the dedup cache is process-wide.
    pub audit: Arc<AuditRecorder>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(repository: Arc<dyn FullRepository>, config: ServerConfig) -> Self {
        Self::with_clock(repository, Arc::new(SystemClock), config)
    }

    /// State driven by an explicit clock, for tests.
    pub fn with_clock(
        repository: Arc<dyn FullRepository>,
        clock: Arc<dyn Clock>,
        config: ServerConfig,
    ) -> Self {
        let audit = AuditRecorder::new(
            Arc::clone(&repository),
            Arc::clone(&clock),
            config.audit_dedup_cache(),
        );
        Self {
            repository,
            clock,
            audit: Arc::new(audit),
            config: Arc::new(config),
        }
    }
}
