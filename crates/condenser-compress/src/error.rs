use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("time parse error: {0}")]
    Chrono(#[from] chrono::ParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage task join error: {0}")]
    Task(String),

    #[error("invalid summary data: {0}")]
    InvalidData(String),
}

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("summary model '{0}' not found")]
    ModelNotFound(String),

    #[error("completion response has no choices[0].message.content")]
    MalformedResponse,

    #[error("background task failed: {0}")]
    Task(String),
}
