//! Confirmed-identity store, credential hashing, and session tokens.
//!
//! Everything behind the verification flow's "Verified" transition lives
//! here: the append-only identity collection, the salted one-way
//! credential hashes it stores, and the server-issued session tokens
//! handed out on successful verification or login.

pub mod error;
pub mod password;
pub mod session;
pub mod store;

pub use error::StoreError;
pub use password::{hash_password, password_is_strong, verify_password, PasswordError};
pub use session::{AuthSession, SessionClaims, SessionError, SessionSigner};
pub use store::{Identity, IdentityStore};
