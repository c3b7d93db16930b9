use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("Failed to connect to or query the database: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("A stored value could not be decoded into its domain type: {0}")]
    DataCorruption(String),

    #[error("The requested data was not found in the database.")]
    NotFound,
}

impl From<core_types::CoreError> for DbError {
    fn from(e: core_types::CoreError) -> Self {
        DbError::DataCorruption(e.to_string())
    }
}
