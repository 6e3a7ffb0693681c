use thiserror::Error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid reference: {entity} {id} does not exist")]
    InvalidReference { entity: &'static str, id: Uuid },

    #[error("record {0} not found")]
    NotFound(Uuid),

    #[error("permission denied: only the receiver may mark a message read")]
    PermissionDenied,

    #[error("cascade cleanup for user {user_id} failed: {source}")]
    CascadeFailure {
        user_id: Uuid,
        #[source]
        source: sqlx::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Returns whether this error is retryable (e.g., database connection timeout)
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Database(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            // The cascade is idempotent, so the caller may always re-run it.
            AppError::CascadeFailure { .. } => true,
            _ => false,
        }
    }
}
