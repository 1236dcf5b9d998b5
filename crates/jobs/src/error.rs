use skillswap_database::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("{0} not found")]
    NotFound(&'static str),
}
