//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::db::ExportSettings;
use crate::services::SchedulingContext;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Commit mode and per-date locks, shared by every scheduling request
    pub scheduling: SchedulingContext,
    pub export: ExportSettings,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn FullRepository>,
        scheduling: SchedulingContext,
        export: ExportSettings,
    ) -> Self {
        Self {
            repository,
            scheduling,
            export,
        }
    }

    /// State with the default commit mode and export settings.
    pub fn with_defaults(repository: Arc<dyn FullRepository>) -> Self {
        Self::new(
            repository,
            SchedulingContext::default(),
            ExportSettings::default(),
        )
    }
}
