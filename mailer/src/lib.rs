//! Email delivery boundary.
//!
//! The verification flow treats delivery as an external collaborator:
//! each send is best-effort, with no retries or idempotence guarantees,
//! and failures are surfaced to the caller so the user can choose to
//! resend. Everything upstream depends only on the [`Mailer`] trait.

pub mod client;
pub mod templates;

use std::future::Future;
use std::sync::Mutex;
use thiserror::Error;
use wellspring_types::EmailAddress;

pub use client::HttpMailer;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("mail provider unreachable: {0}")]
    Unreachable(String),

    #[error("mail provider rejected the request: {0}")]
    Rejected(String),

    #[error("mail request failed: {0}")]
    RequestFailed(String),
}

/// A rendered email, ready for delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// The delivery collaborator.
pub trait Mailer: Send + Sync {
    /// Deliver one message to one address. Fire-and-forget semantics:
    /// success means the provider accepted the message, nothing more.
    fn send(
        &self,
        to: &EmailAddress,
        message: &MailMessage,
    ) -> impl Future<Output = Result<(), MailerError>> + Send;
}

/// Test double that records every send and can be told to fail.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(EmailAddress, MailMessage)>>,
    fail_next: Mutex<bool>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `send` call fail with a delivery error.
    pub fn fail_next(&self) {
        *self.fail_next.lock().unwrap() = true;
    }

    /// Every (recipient, message) pair delivered so far.
    pub fn sent(&self) -> Vec<(EmailAddress, MailMessage)> {
        self.sent.lock().unwrap().clone()
    }

    /// The most recently delivered message, if any.
    pub fn last(&self) -> Option<(EmailAddress, MailMessage)> {
        self.sent.lock().unwrap().last().cloned()
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, to: &EmailAddress, message: &MailMessage) -> Result<(), MailerError> {
        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(MailerError::Unreachable("simulated outage".into()));
        }
        drop(fail);
        self.sent
            .lock()
            .unwrap()
            .push((to.clone(), message.clone()));
        Ok(())
    }
}
