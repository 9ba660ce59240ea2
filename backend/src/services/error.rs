use crate::db::repository::RepositoryError;
use crate::scheduler::PlanError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures of a scheduling operation, by what the caller did wrong.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// A referenced exam, schedule or student does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The write would break a scheduling or uniqueness rule.
    #[error("{0}")]
    Conflict(String),

    /// The store failed.
    #[error("Persistence error: {0}")]
    Persistence(#[source] RepositoryError),
}

impl ServiceError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Persistence(e) if e.is_retryable())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { message, .. } => ServiceError::NotFound(message),
            RepositoryError::ConflictError { message, .. } => ServiceError::Conflict(message),
            RepositoryError::ValidationError { message, .. } => ServiceError::Validation(message),
            other => ServiceError::Persistence(other),
        }
    }
}

impl From<PlanError> for ServiceError {
    fn from(err: PlanError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}
