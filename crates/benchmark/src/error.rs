use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error(transparent)]
    Db(#[from] database::DbError),

    #[error("Invalid date arithmetic for stat date {0}")]
    InvalidDate(chrono::NaiveDate),
}
