use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error(transparent)]
    Db(#[from] database::DbError),

    #[error("An unexpected error occurred during product analysis: {0}")]
    InternalError(String),
}
