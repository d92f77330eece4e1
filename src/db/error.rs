use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database not configured")]
    NotConfigured,

    #[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DbError {
    /// Whether the store could not be reached at all, as opposed to failing
    /// while answering.
    pub fn is_unavailable(&self) -> bool {
        match self {
            DbError::NotConfigured => true,
            #[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
            DbError::Sqlx(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            _ => false,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
