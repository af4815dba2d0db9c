//! Server-issued, server-verified session tokens.
//!
//! A token is `<identity id>.<established at>.<mac>` where the MAC is
//! HMAC-SHA256 over the first two fields with a server secret. Validity
//! is checked against the establishment time plus a fixed window, so a
//! client can neither forge nor extend a session.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;
use wellspring_types::Timestamp;

type HmacSha256 = Hmac<Sha256>;

/// Length of the server secret in bytes.
pub const SECRET_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session token is malformed")]
    Malformed,

    #[error("session token signature is invalid")]
    BadSignature,

    #[error("session has expired")]
    Expired,
}

/// An authenticated session handed to a client after verification or login.
#[derive(Clone, Debug)]
pub struct AuthSession {
    pub token: String,
    pub identity_id: String,
    pub established_at: Timestamp,
    pub expires_at: Timestamp,
}

/// The verified contents of a presented token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionClaims {
    pub identity_id: String,
    pub established_at: Timestamp,
}

/// Issues and verifies session tokens with a fixed secret and TTL.
pub struct SessionSigner {
    secret: [u8; SECRET_LEN],
    ttl_secs: u64,
}

impl SessionSigner {
    pub fn new(secret: [u8; SECRET_LEN], ttl_secs: u64) -> Self {
        Self { secret, ttl_secs }
    }

    /// Create a signer with a random per-process secret. Sessions issued
    /// with it do not survive a restart.
    pub fn with_random_secret(ttl_secs: u64) -> Self {
        let mut secret = [0u8; SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::new(secret, ttl_secs)
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a fresh session for an identity.
    pub fn issue(&self, identity_id: &str, now: Timestamp) -> AuthSession {
        let mac = self.mac_for(identity_id, now);
        AuthSession {
            token: format!("{identity_id}.{}.{}", now.as_secs(), hex::encode(mac)),
            identity_id: identity_id.to_string(),
            established_at: now,
            expires_at: now.plus_secs(self.ttl_secs),
        }
    }

    /// Verify a presented token and return its claims.
    pub fn verify(&self, token: &str, now: Timestamp) -> Result<SessionClaims, SessionError> {
        let mut parts = token.rsplitn(2, '.');
        let mac_hex = parts.next().ok_or(SessionError::Malformed)?;
        let payload = parts.next().ok_or(SessionError::Malformed)?;

        let (identity_id, established_str) =
            payload.rsplit_once('.').ok_or(SessionError::Malformed)?;
        if identity_id.is_empty() {
            return Err(SessionError::Malformed);
        }
        let established_secs: u64 = established_str
            .parse()
            .map_err(|_| SessionError::Malformed)?;
        let established_at = Timestamp::new(established_secs);

        let presented = hex::decode(mac_hex).map_err(|_| SessionError::Malformed)?;
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(identity_id.as_bytes());
        mac.update(b".");
        mac.update(established_str.as_bytes());
        mac.verify_slice(&presented)
            .map_err(|_| SessionError::BadSignature)?;

        if established_at.has_expired(self.ttl_secs, now) {
            return Err(SessionError::Expired);
        }

        Ok(SessionClaims {
            identity_id: identity_id.to_string(),
            established_at,
        })
    }

    fn mac_for(&self, identity_id: &str, established_at: Timestamp) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(identity_id.as_bytes());
        mac.update(b".");
        mac.update(established_at.as_secs().to_string().as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}
