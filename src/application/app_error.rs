use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid email")]
    InvalidEmail,

    #[error("Unsupported content-type")]
    UnsupportedMediaType,

    #[error("Database error: {0}")]
    Database(String),

    /// Unique-key conflict on insert. Never surfaces to a client: the signup
    /// flow recovers by re-reading the winning row.
    #[error("Unique constraint violated")]
    UniqueViolation,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;
