use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object does not exist (id: {0})")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("corrupt store record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
