use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on identity store: {0}")]
    Io(#[from] std::io::Error),

    #[error("identity store file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("email {0} is already registered")]
    DuplicateEmail(String),

    #[error("no identity with email {0}")]
    UnknownEmail(String),
}
