//! Email verification code flow.
//!
//! Two-step proof of email ownership:
//! 1. **Issue**: a registration (or password reset) request stores a
//!    pending entry keyed by a server-issued ticket, generates a
//!    6-digit code, and hands it to the mailer.
//! 2. **Confirm**: the user re-enters the code; on exact match the
//!    pending attributes are committed to the identity store and an
//!    authenticated session is opened.
//!
//! Only the latest issued code is ever valid: a resend regenerates the
//! code before the mailer is invoked, so a stale code can never race a
//! newer one.

pub mod code;
pub mod error;
pub mod pending;
pub mod registrar;

pub use code::VerificationCode;
pub use error::VerifyError;
pub use pending::{PendingKind, PendingRegistration, PendingStore, Ticket};
pub use registrar::{RegistrationAttrs, Registrar, SubmitReceipt};
