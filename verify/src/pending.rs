//! Pending registrations awaiting code confirmation.
//!
//! Each in-flight attempt is keyed by a server-issued ticket, so
//! concurrent registrations never collide. An entry exists only between
//! "registration submitted" and "verified or abandoned"; nothing here
//! touches durable storage.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;
use wellspring_types::{EmailAddress, ServiceParams, Timestamp};

use crate::code::VerificationCode;
use crate::error::VerifyError;

/// Opaque per-attempt identifier, returned to the caller at submit time
/// and presented on every subsequent call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket(String);

impl Ticket {
    /// Generate a fresh random ticket (16 bytes, hex).
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ticket {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What a pending entry will do once its code is confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingKind {
    /// Commit a new identity record.
    Registration,
    /// Replace the credential of an existing identity.
    PasswordReset,
}

/// A not-yet-committed set of identity attributes awaiting code
/// confirmation.
#[derive(Clone, Debug)]
pub struct PendingRegistration {
    pub ticket: Ticket,
    pub kind: PendingKind,
    pub email: EmailAddress,
    pub display_name: String,
    /// Arbitrary profile fields carried through to the identity record.
    pub profile: Map<String, Value>,
    /// Credential hash computed at submit time, so the plaintext never
    /// outlives the original request. Absent for password resets.
    pub password_hash: Option<String>,
    pub code: VerificationCode,
    pub issued_at: Timestamp,
    /// Mismatched submissions against the current code.
    pub attempts: u32,
}

/// Keyed store of in-flight attempts. Callers are expected to hold a
/// lock around compound operations; the store itself is single-threaded.
pub struct PendingStore {
    entries: HashMap<Ticket, PendingRegistration>,
    params: ServiceParams,
}

impl PendingStore {
    pub fn new(params: ServiceParams) -> Self {
        Self {
            entries: HashMap::new(),
            params,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a fresh entry and return its ticket.
    pub fn insert(&mut self, entry: PendingRegistration) -> Ticket {
        let ticket = entry.ticket.clone();
        debug!(%ticket, email = %entry.email, "pending registration stored");
        self.entries.insert(ticket.clone(), entry);
        ticket
    }

    /// Look up a live entry, lazily dropping it if its code has expired.
    pub fn get_live(
        &mut self,
        ticket: &Ticket,
        now: Timestamp,
    ) -> Result<&mut PendingRegistration, VerifyError> {
        let ttl = self.params.code_ttl_secs;
        // Split lookup from removal to keep the borrow checker happy.
        let expired = match self.entries.get(ticket) {
            None => return Err(VerifyError::NoPending(ticket.to_string())),
            Some(entry) => entry.issued_at.has_expired(ttl, now),
        };
        if expired {
            self.entries.remove(ticket);
            debug!(%ticket, "pending registration expired");
            return Err(VerifyError::Expired(ticket.to_string()));
        }
        Ok(self.entries.get_mut(ticket).expect("checked above"))
    }

    /// Check a candidate against the entry's code.
    ///
    /// On match the entry is removed and returned; verification can
    /// succeed at most once per issued code. On mismatch the attempt
    /// counter is bumped, and once the bound is hit the entry is
    /// dropped entirely.
    pub fn check_code(
        &mut self,
        ticket: &Ticket,
        candidate: &str,
        now: Timestamp,
    ) -> Result<PendingRegistration, VerifyError> {
        let max_attempts = self.params.max_code_attempts;
        let entry = self.get_live(ticket, now)?;

        if entry.code.matches(candidate) {
            let entry = self.entries.remove(ticket).expect("entry is live");
            return Ok(entry);
        }

        entry.attempts += 1;
        debug!(%ticket, attempts = entry.attempts, "code mismatch");
        if entry.attempts >= max_attempts {
            self.entries.remove(ticket);
            return Err(VerifyError::AttemptsExhausted);
        }
        Err(VerifyError::CodeMismatch)
    }

    /// Replace the entry's code with a fresh one and reset its attempt
    /// counter. The old code is invalid from this point on, before any
    /// delivery is attempted.
    pub fn reissue_code(
        &mut self,
        ticket: &Ticket,
        now: Timestamp,
    ) -> Result<(EmailAddress, VerificationCode, PendingKind), VerifyError> {
        let entry = self.get_live(ticket, now)?;
        entry.code = VerificationCode::generate();
        entry.issued_at = now;
        entry.attempts = 0;
        debug!(%ticket, "verification code reissued");
        Ok((entry.email.clone(), entry.code.clone(), entry.kind))
    }

    /// Drop every expired entry. Called opportunistically; expiry is
    /// also enforced lazily on access.
    pub fn purge_expired(&mut self, now: Timestamp) -> usize {
        let ttl = self.params.code_ttl_secs;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.issued_at.has_expired(ttl, now));
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ticket: Ticket, code: &str, issued_at: Timestamp) -> PendingRegistration {
        PendingRegistration {
            ticket,
            kind: PendingKind::Registration,
            email: EmailAddress::parse("a@b.com").unwrap(),
            display_name: "A".into(),
            profile: Map::new(),
            password_hash: Some("argon2id$00$00".into()),
            code: VerificationCode::known(code),
            issued_at,
            attempts: 0,
        }
    }

    fn store() -> PendingStore {
        PendingStore::new(ServiceParams::default())
    }

    #[test]
    fn correct_code_removes_entry() {
        let mut store = store();
        let t = Ticket::generate();
        store.insert(entry(t.clone(), "482913", Timestamp::new(0)));

        let taken = store.check_code(&t, "482913", Timestamp::new(1)).unwrap();
        assert_eq!(taken.email.as_str(), "a@b.com");
        assert!(store.is_empty());

        // Second submission has no pending state to check against.
        assert!(matches!(
            store.check_code(&t, "482913", Timestamp::new(2)),
            Err(VerifyError::NoPending(_))
        ));
    }

    #[test]
    fn mismatch_keeps_entry_and_counts() {
        let mut store = store();
        let t = Ticket::generate();
        store.insert(entry(t.clone(), "482913", Timestamp::new(0)));

        assert!(matches!(
            store.check_code(&t, "000000", Timestamp::new(1)),
            Err(VerifyError::CodeMismatch)
        ));
        assert_eq!(store.len(), 1);
        // The right code still works afterwards.
        assert!(store.check_code(&t, "482913", Timestamp::new(2)).is_ok());
    }

    #[test]
    fn attempts_are_bounded() {
        let mut store = store();
        let t = Ticket::generate();
        store.insert(entry(t.clone(), "482913", Timestamp::new(0)));

        for _ in 0..4 {
            assert!(matches!(
                store.check_code(&t, "000000", Timestamp::new(1)),
                Err(VerifyError::CodeMismatch)
            ));
        }
        assert!(matches!(
            store.check_code(&t, "000000", Timestamp::new(1)),
            Err(VerifyError::AttemptsExhausted)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn reissue_invalidates_old_code_and_resets_attempts() {
        let mut store = store();
        let t = Ticket::generate();
        store.insert(entry(t.clone(), "482913", Timestamp::new(0)));
        let _ = store.check_code(&t, "000000", Timestamp::new(1));

        let (_, new_code, _) = store.reissue_code(&t, Timestamp::new(2)).unwrap();
        let entry = store.get_live(&t, Timestamp::new(2)).unwrap();
        assert_eq!(entry.attempts, 0);

        if new_code.as_str() != "482913" {
            assert!(matches!(
                store.check_code(&t, "482913", Timestamp::new(3)),
                Err(VerifyError::CodeMismatch)
            ));
        }
        assert!(store
            .check_code(&t, new_code.as_str(), Timestamp::new(3))
            .is_ok());
    }

    #[test]
    fn expired_entries_are_dropped_lazily() {
        let mut store = store();
        let t = Ticket::generate();
        store.insert(entry(t.clone(), "482913", Timestamp::new(0)));

        let late = Timestamp::new(ServiceParams::default().code_ttl_secs);
        assert!(matches!(
            store.check_code(&t, "482913", late),
            Err(VerifyError::Expired(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn purge_expired_sweeps_old_entries() {
        let mut store = store();
        store.insert(entry(Ticket::generate(), "111111", Timestamp::new(0)));
        store.insert(entry(Ticket::generate(), "222222", Timestamp::new(5_000)));

        let purged = store.purge_expired(Timestamp::new(5_100));
        assert_eq!(purged, 1);
        assert_eq!(store.len(), 1);
    }
}
