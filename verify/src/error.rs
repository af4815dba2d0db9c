use thiserror::Error;
use wellspring_identity::{PasswordError, StoreError};
use wellspring_types::EmailError;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("candidate code must be exactly {expected} digits")]
    MalformedCandidate { expected: usize },

    #[error("no pending registration for ticket {0}")]
    NoPending(String),

    #[error("pending registration for ticket {0} has expired")]
    Expired(String),

    #[error("verification code does not match")]
    CodeMismatch,

    #[error("too many failed attempts; the code has been discarded")]
    AttemptsExhausted,

    #[error("email delivery failed: {0}")]
    Delivery(String),

    #[error("email {0} is already registered")]
    EmailTaken(String),

    #[error("no account with email {0}")]
    UnknownEmail(String),

    #[error("invalid email or password")]
    BadCredentials,

    #[error("password does not meet the strength requirements")]
    WeakPassword,

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error("credential error: {0}")]
    Password(#[from] PasswordError),

    #[error("identity store error: {0}")]
    Store(#[from] StoreError),
}
