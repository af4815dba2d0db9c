//! Registration orchestration.
//!
//! The [`Registrar`] owns the pending store, the identity store, and
//! the session signer, and drives the whole flow: submit issues a code
//! and mails it, verify checks the candidate and finalizes, resend
//! reissues. Finalization happens under the store locks, so a committed
//! identity without its session (or the reverse) is never observable.

use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use wellspring_identity::{
    hash_password, password_is_strong, verify_password, AuthSession, Identity, IdentityStore,
    PasswordError, SessionClaims, SessionError, SessionSigner,
};
use wellspring_mailer::{templates, MailMessage, Mailer};
use wellspring_types::{EmailAddress, ServiceParams, Timestamp};

use crate::code::validate_candidate;
use crate::error::VerifyError;
use crate::pending::{PendingKind, PendingRegistration, PendingStore, Ticket};
use crate::VerificationCode;

/// Attributes supplied with a registration request.
#[derive(Clone, Debug)]
pub struct RegistrationAttrs {
    pub email: EmailAddress,
    pub display_name: String,
    pub password: String,
    pub profile: Map<String, Value>,
}

/// Outcome of a submit or reset-start call. The pending entry exists
/// either way; `delivered` reports whether the notifier accepted the
/// message, so the caller can offer a resend.
#[derive(Clone, Debug)]
pub struct SubmitReceipt {
    pub ticket: Ticket,
    pub delivered: bool,
    pub delivery_error: Option<String>,
}

/// Drives the verification code flow end to end.
pub struct Registrar<M: Mailer> {
    pending: Mutex<PendingStore>,
    identities: Mutex<IdentityStore>,
    signer: SessionSigner,
    mailer: Arc<M>,
}

impl<M: Mailer> Registrar<M> {
    pub fn new(
        identities: IdentityStore,
        signer: SessionSigner,
        mailer: Arc<M>,
        params: ServiceParams,
    ) -> Self {
        Self {
            pending: Mutex::new(PendingStore::new(params)),
            identities: Mutex::new(identities),
            signer,
            mailer,
        }
    }

    /// The mailer, for callers that send non-flow messages directly.
    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Submit a registration: store the pending attributes, issue a
    /// code, and mail it. The entry is kept even when delivery fails,
    /// so the returned ticket stays usable for a resend.
    pub async fn submit_registration(
        &self,
        attrs: RegistrationAttrs,
    ) -> Result<SubmitReceipt, VerifyError> {
        if !password_is_strong(&attrs.password) {
            return Err(VerifyError::WeakPassword);
        }
        if self
            .identities
            .lock()
            .await
            .find_by_email(attrs.email.as_str())
            .is_some()
        {
            return Err(VerifyError::EmailTaken(attrs.email.to_string()));
        }

        let password_hash = hash_blocking(attrs.password).await?;

        let code = VerificationCode::generate();
        let entry = PendingRegistration {
            ticket: Ticket::generate(),
            kind: PendingKind::Registration,
            email: attrs.email.clone(),
            display_name: attrs.display_name,
            profile: attrs.profile,
            password_hash: Some(password_hash),
            code: code.clone(),
            issued_at: Timestamp::now(),
            attempts: 0,
        };
        let ticket = self.pending.lock().await.insert(entry);
        info!(%ticket, email = %attrs.email, "registration submitted, code issued");

        let receipt = self
            .deliver(&attrs.email, &templates::verification_email(code.as_str()), ticket)
            .await;
        Ok(receipt)
    }

    /// Check a submitted candidate against the ticket's issued code and
    /// finalize on match: append the identity and open a session.
    pub async fn verify_code(
        &self,
        ticket: &Ticket,
        candidate: &str,
    ) -> Result<AuthSession, VerifyError> {
        validate_candidate(candidate)?;
        let now = Timestamp::now();

        let mut pending = self.pending.lock().await;
        if pending.get_live(ticket, now)?.kind != PendingKind::Registration {
            return Err(VerifyError::NoPending(ticket.to_string()));
        }
        let entry = pending.check_code(ticket, candidate, now)?;

        // Finalize while still holding the pending lock: the identity
        // append and the session issue are atomic as far as any other
        // caller can observe.
        let mut identities = self.identities.lock().await;
        let identity = Identity {
            id: IdentityStore::next_id(),
            email: entry.email,
            display_name: entry.display_name,
            profile: entry.profile,
            password: entry
                .password_hash
                .expect("registration entries always carry a credential hash"),
            email_verified: true,
            created_at: now,
        };
        let id = identity.id.clone();
        let email = identity.email.clone();
        identities.append(identity)?;
        let session = self.signer.issue(&id, now);
        info!(%email, identity = %id, "registration verified, session established");
        Ok(session)
    }

    /// Reissue the code for a pending attempt and mail it. The previous
    /// code is invalid before the send starts; a delivery failure does
    /// not restore it.
    pub async fn resend(&self, ticket: &Ticket) -> Result<(), VerifyError> {
        let now = Timestamp::now();
        let (email, code, kind) = self.pending.lock().await.reissue_code(ticket, now)?;

        let message = match kind {
            PendingKind::Registration => templates::verification_email(code.as_str()),
            PendingKind::PasswordReset => templates::password_reset_email(code.as_str()),
        };
        self.mailer.send(&email, &message).await.map_err(|e| {
            warn!(%ticket, error = %e, "resend delivery failed");
            VerifyError::Delivery(e.to_string())
        })
    }

    /// Start a password reset for an existing account: issue a code
    /// under a fresh ticket and mail it.
    pub async fn start_password_reset(
        &self,
        email: &EmailAddress,
    ) -> Result<SubmitReceipt, VerifyError> {
        let display_name = {
            let identities = self.identities.lock().await;
            let identity = identities
                .find_by_email(email.as_str())
                .ok_or_else(|| VerifyError::UnknownEmail(email.to_string()))?;
            identity.display_name.clone()
        };

        let code = VerificationCode::generate();
        let entry = PendingRegistration {
            ticket: Ticket::generate(),
            kind: PendingKind::PasswordReset,
            email: email.clone(),
            display_name,
            profile: Map::new(),
            password_hash: None,
            code: code.clone(),
            issued_at: Timestamp::now(),
            attempts: 0,
        };
        let ticket = self.pending.lock().await.insert(entry);
        info!(%ticket, %email, "password reset requested, code issued");

        let receipt = self
            .deliver(email, &templates::password_reset_email(code.as_str()), ticket)
            .await;
        Ok(receipt)
    }

    /// Complete a password reset: on code match, replace the stored
    /// credential and open a session.
    pub async fn confirm_password_reset(
        &self,
        ticket: &Ticket,
        candidate: &str,
        new_password: &str,
    ) -> Result<AuthSession, VerifyError> {
        validate_candidate(candidate)?;
        if !password_is_strong(new_password) {
            return Err(VerifyError::WeakPassword);
        }
        let password_hash = hash_blocking(new_password.to_string()).await?;
        let now = Timestamp::now();

        let mut pending = self.pending.lock().await;
        if pending.get_live(ticket, now)?.kind != PendingKind::PasswordReset {
            return Err(VerifyError::NoPending(ticket.to_string()));
        }
        let entry = pending.check_code(ticket, candidate, now)?;

        let mut identities = self.identities.lock().await;
        identities.set_password(entry.email.as_str(), password_hash)?;
        let id = identities
            .find_by_email(entry.email.as_str())
            .expect("set_password succeeded")
            .id
            .clone();
        let session = self.signer.issue(&id, now);
        info!(email = %entry.email, "password reset completed");
        Ok(session)
    }

    /// Authenticate by email and password, comparing credential hashes.
    pub async fn login(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<AuthSession, VerifyError> {
        let (id, stored) = {
            let identities = self.identities.lock().await;
            match identities.find_by_email(email.as_str()) {
                Some(identity) => (identity.id.clone(), identity.password.clone()),
                None => return Err(VerifyError::BadCredentials),
            }
        };

        let password = password.to_string();
        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| VerifyError::Password(PasswordError::Hash(e.to_string())))??;
        if !ok {
            return Err(VerifyError::BadCredentials);
        }
        Ok(self.signer.issue(&id, Timestamp::now()))
    }

    /// Check a presented session token. Validity is server-verified:
    /// signature plus the fixed window since establishment.
    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, SessionError> {
        self.signer.verify(token, Timestamp::now())
    }

    /// Sweep expired pending entries. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        self.pending.lock().await.purge_expired(Timestamp::now())
    }

    async fn deliver(
        &self,
        email: &EmailAddress,
        message: &MailMessage,
        ticket: Ticket,
    ) -> SubmitReceipt {
        match self.mailer.send(email, message).await {
            Ok(()) => SubmitReceipt {
                ticket,
                delivered: true,
                delivery_error: None,
            },
            Err(e) => {
                warn!(%ticket, error = %e, "code delivery failed");
                SubmitReceipt {
                    ticket,
                    delivered: false,
                    delivery_error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Run Argon2 off the async executor.
async fn hash_blocking(password: String) -> Result<String, VerifyError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| VerifyError::Password(PasswordError::Hash(e.to_string())))?
        .map_err(VerifyError::from)
}
