//! Data layer errors

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The store could not be reached while starting up.
    #[error("cannot connect to database: {0}")]
    Connectivity(String),

    /// Every connection stayed leased past the acquire timeout.
    #[error("no database connection available")]
    PoolExhausted,

    /// The pool has been shut down.
    #[error("connection pool is closed")]
    PoolClosed,

    /// A query failed after a connection was obtained.
    #[error("database error: {0}")]
    DataAccess(#[source] sqlx::Error),
}

impl DbError {
    /// Whether the caller may retry the same request later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::PoolExhausted)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => Self::PoolExhausted,
            sqlx::Error::PoolClosed => Self::PoolClosed,
            other => Self::DataAccess(other),
        }
    }
}
