//! Error types for repository operations.
//!
//! Every repository failure carries an [`ErrorContext`] describing the
//! operation and entity involved, so callers can log it or map it to a
//! user-facing outcome without parsing messages.

use std::fmt;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Structured context for repository errors.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "insert_schedules", "move_assignment")
    pub operation: Option<String>,
    /// The entity type involved (e.g., "schedule", "student", "exam")
    pub entity: Option<String>,
    /// The entity ID if applicable
    pub entity_id: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether this error is retryable
    pub retryable: bool,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the entity type.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Set the entity ID.
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Mark this error as retryable.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for repository operations.
///
/// Not-found, conflict and validation failures are caller mistakes and map
/// to 4xx responses upstream; the remaining kinds are store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Pool checkout or store connectivity failed. Always retryable.
    #[error("Connection error: {message} {context}")]
    ConnectionError {
        message: String,
        context: ErrorContext,
    },

    /// A statement failed or a transaction was rolled back.
    #[error("Query error: {message} {context}")]
    QueryError {
        message: String,
        context: ErrorContext,
    },

    /// Unknown student, exam, schedule or assignment.
    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// Write would break a uniqueness rule (e.g. a student booked twice on one date).
    #[error("Conflict: {message} {context}")]
    ConflictError {
        message: String,
        context: ErrorContext,
    },

    #[error("Data validation error: {message} {context}")]
    ValidationError {
        message: String,
        context: ErrorContext,
    },

    /// Bad repository.toml or missing backend feature.
    #[error("Configuration error: {message} {context}")]
    ConfigurationError {
        message: String,
        context: ErrorContext,
    },

    #[error("Internal error: {message} {context}")]
    InternalError {
        message: String,
        context: ErrorContext,
    },
}

impl RepositoryError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::connection_with_context(message, ErrorContext::default())
    }

    /// The context is marked retryable whatever the caller passed.
    pub fn connection_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ConnectionError {
            message: message.into(),
            context: context.retryable(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::QueryError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::not_found_with_context(message, ErrorContext::default())
    }

    pub fn not_found_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    pub fn conflict_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ConflictError {
            message: message.into(),
            context,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::internal_with_context(message, ErrorContext::default())
    }

    pub fn internal_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::InternalError {
            message: message.into(),
            context,
        }
    }

    /// True when replaying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    /// Message without the context suffix.
    pub fn message(&self) -> &str {
        self.parts().0
    }

    pub fn context(&self) -> &ErrorContext {
        self.parts().1
    }

    /// Record which repository call failed, replacing any earlier operation.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    fn parts(&self) -> (&str, &ErrorContext) {
        match self {
            Self::ConnectionError { message, context }
            | Self::QueryError { message, context }
            | Self::NotFound { message, context }
            | Self::ConflictError { message, context }
            | Self::ValidationError { message, context }
            | Self::ConfigurationError { message, context }
            | Self::InternalError { message, context } => (message.as_str(), context),
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::ConnectionError { context, .. }
            | Self::QueryError { context, .. }
            | Self::NotFound { context, .. }
            | Self::ConflictError { context, .. }
            | Self::ValidationError { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. } => context,
        }
    }
}

impl From<String> for RepositoryError {
    fn from(s: String) -> Self {
        RepositoryError::internal(s)
    }
}

impl From<&str> for RepositoryError {
    fn from(s: &str) -> Self {
        RepositoryError::internal(s.to_string())
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::result::Error> for RepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::DatabaseErrorKind;

        match err {
            diesel::result::Error::NotFound => RepositoryError::not_found("Record not found"),
            diesel::result::Error::DatabaseError(kind, info) => {
                let message = info.message().to_string();
                let context =
                    ErrorContext::default().with_details(format!("db_error_kind={:?}", kind));

                match kind {
                    DatabaseErrorKind::UniqueViolation => {
                        RepositoryError::ConflictError { message, context }
                    }
                    DatabaseErrorKind::ForeignKeyViolation => {
                        RepositoryError::NotFound { message, context }
                    }
                    // Serialization failures are retryable; the transaction can be replayed.
                    DatabaseErrorKind::SerializationFailure => RepositoryError::QueryError {
                        message,
                        context: context.retryable(),
                    },
                    _ => RepositoryError::QueryError { message, context },
                }
            }
            diesel::result::Error::QueryBuilderError(e) => {
                RepositoryError::query(format!("Query builder error: {}", e))
            }
            diesel::result::Error::DeserializationError(e) => {
                RepositoryError::internal(format!("Deserialization error: {}", e))
            }
            diesel::result::Error::SerializationError(e) => {
                RepositoryError::internal(format!("Serialization error: {}", e))
            }
            diesel::result::Error::RollbackTransaction => {
                RepositoryError::query("Transaction rolled back")
            }
            other => RepositoryError::query(other.to_string()),
        }
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::r2d2::PoolError> for RepositoryError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        RepositoryError::connection_with_context(
            err.to_string(),
            ErrorContext::default()
                .with_details("pool_error")
                .retryable(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display_lists_populated_fields() {
        let ctx = ErrorContext::new("move_assignment")
            .with_entity("schedule")
            .with_entity_id(12)
            .retryable();
        assert_eq!(
            ctx.to_string(),
            "[operation=move_assignment, entity=schedule, id=12, retryable=true]"
        );
    }

    #[test]
    fn test_connection_errors_are_retryable() {
        assert!(RepositoryError::connection("pool exhausted").is_retryable());
        assert!(!RepositoryError::not_found("schedule 4").is_retryable());
    }

    #[test]
    fn test_retryable_query_error_from_context() {
        let err = RepositoryError::QueryError {
            message: "could not serialize access".to_string(),
            context: ErrorContext::new("move_assignment").retryable(),
        };
        assert!(err.is_retryable());
        assert!(!RepositoryError::query("syntax").is_retryable());
    }

    #[test]
    fn test_connection_with_context_forces_retryable() {
        let err = RepositoryError::connection_with_context(
            "pool timed out",
            ErrorContext::new("list_students"),
        );
        assert!(err.is_retryable());
        assert_eq!(err.context().operation.as_deref(), Some("list_students"));
    }

    #[test]
    fn test_with_operation_overwrites_context() {
        let err = RepositoryError::validation("bad row").with_operation("upsert_students");
        assert_eq!(err.context().operation.as_deref(), Some("upsert_students"));
        assert_eq!(err.message(), "bad row");
    }
}
