use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error(transparent)]
    Db(#[from] database::DbError),

    #[error(transparent)]
    Analyzer(#[from] analyzer::AnalyzerError),

    #[error("A calculation error occurred during diagnosis: {0}")]
    Calculation(String),
}
