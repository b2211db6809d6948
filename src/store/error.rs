use thiserror::Error;

use crate::filter::FilterError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    /// Message reported by the storage backend, passed through unchanged.
    #[error("{0}")]
    Backend(String),

    #[error("JSON object requested, multiple (or no) rows returned ({count} rows in {table})")]
    MultipleRows { table: String, count: usize },

    #[error("Invalid row payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether the failure is about reaching the backend at all rather than
    /// about the statement that was sent.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::ConfigMissing(_)
                | StoreError::InvalidDatabaseUrl
                | StoreError::Sqlx(sqlx::Error::PoolTimedOut)
                | StoreError::Sqlx(sqlx::Error::PoolClosed)
                | StoreError::Sqlx(sqlx::Error::Io(_))
        )
    }
}

/// Failure of a cascading owner purge. Names the table that stopped it.
#[derive(Debug, Error)]
pub enum PurgeError {
    #[error("Failed to delete from {table}: {source}")]
    Owned {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("{0}")]
    Identity(StoreError),
}
