use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Error from date operations
    #[error("Date error: {0}")]
    Date(String),

    /// Error from target resolution
    #[error("Target error: {0}")]
    Target(String),

    /// Error from performance aggregation
    #[error("Performance error: {0}")]
    Performance(String),
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
