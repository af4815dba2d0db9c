//! JSON-file-backed identity collection.
//!
//! The store holds every confirmed identity as one JSON document on
//! disk, loaded fully at open and rewritten on change. Append-only from
//! the verification flow's perspective; the only in-place update is a
//! credential replacement after a completed password reset.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use wellspring_types::{EmailAddress, Timestamp};

use crate::error::StoreError;

/// A confirmed identity record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: EmailAddress,
    pub display_name: String,
    /// Arbitrary registration attributes carried through verification.
    #[serde(default)]
    pub profile: Map<String, Value>,
    /// Salted one-way credential record, never plaintext.
    pub password: String,
    /// Set once the email-ownership code has been confirmed. Always true
    /// for records created by this store.
    pub email_verified: bool,
    pub created_at: Timestamp,
}

/// On-disk shape: a single keyed collection, like the rest of the
/// site's JSON data files.
#[derive(Default, Serialize, Deserialize)]
struct IdentityFile {
    identities: Vec<Identity>,
}

pub struct IdentityStore {
    path: PathBuf,
    identities: Vec<Identity>,
}

impl IdentityStore {
    /// Open the store at `path`, creating an empty collection if the
    /// file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let identities = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let file: IdentityFile = serde_json::from_str(&contents)?;
            file.identities
        } else {
            Vec::new()
        };
        info!(
            path = %path.display(),
            count = identities.len(),
            "opened identity store"
        );
        Ok(Self { path, identities })
    }

    /// Generate a fresh random identity id (16 bytes, hex).
    pub fn next_id() -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Append a confirmed identity. Fails if the email is taken.
    pub fn append(&mut self, identity: Identity) -> Result<(), StoreError> {
        if self.find_by_email(identity.email.as_str()).is_some() {
            return Err(StoreError::DuplicateEmail(identity.email.to_string()));
        }
        self.identities.push(identity);
        self.persist()
    }

    /// Replace the credential record for an existing identity.
    pub fn set_password(&mut self, email: &str, password: String) -> Result<(), StoreError> {
        let record = self
            .identities
            .iter_mut()
            .find(|i| i.email.as_str() == email)
            .ok_or_else(|| StoreError::UnknownEmail(email.to_string()))?;
        record.password = password;
        self.persist()
    }

    pub fn find_by_email(&self, email: &str) -> Option<&Identity> {
        self.identities.iter().find(|i| i.email.as_str() == email)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Identity> {
        self.identities.iter().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = IdentityFile {
            identities: self.identities.clone(),
        };
        let contents = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: &str) -> Identity {
        Identity {
            id: IdentityStore::next_id(),
            email: EmailAddress::parse(email).unwrap(),
            display_name: "Test".into(),
            profile: Map::new(),
            password: "argon2id$00$00".into(),
            email_verified: true,
            created_at: Timestamp::new(1),
        }
    }

    #[test]
    fn open_missing_file_gives_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::open(dir.path().join("identities.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn append_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identities.json");

        let mut store = IdentityStore::open(&path).unwrap();
        store.append(identity("a@b.com")).unwrap();

        let reloaded = IdentityStore::open(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.find_by_email("a@b.com").is_some());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = IdentityStore::open(dir.path().join("identities.json")).unwrap();
        store.append(identity("a@b.com")).unwrap();
        assert!(matches!(
            store.append(identity("a@b.com")),
            Err(StoreError::DuplicateEmail(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn set_password_replaces_credential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identities.json");
        let mut store = IdentityStore::open(&path).unwrap();
        store.append(identity("a@b.com")).unwrap();

        store
            .set_password("a@b.com", "argon2id$11$11".into())
            .unwrap();
        let reloaded = IdentityStore::open(&path).unwrap();
        assert_eq!(
            reloaded.find_by_email("a@b.com").unwrap().password,
            "argon2id$11$11"
        );
    }

    #[test]
    fn set_password_for_unknown_email_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = IdentityStore::open(dir.path().join("identities.json")).unwrap();
        assert!(matches!(
            store.set_password("nobody@b.com", "x".into()),
            Err(StoreError::UnknownEmail(_))
        ));
    }
}
