//! The session context: one credential slot shared by the guard, the
//! gateway and the front end.
//!
//! The slot is held in memory and mirrored to a persistence backend so a
//! session survives restarts. Validity is never cached here; callers decode
//! the credential each time they need to know.

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::credentials::CredentialStore;
use super::token::{TokenClaims, TokenError};

/// Session file name in the session directory
const SESSION_FILE: &str = "session.json";

/// Where the credential is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// JSON file in the user cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Not persisted; lost on exit
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub stored_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(token: String) -> Self {
        Self {
            token,
            stored_at: Utc::now(),
        }
    }
}

#[derive(Debug)]
enum Backend {
    File(PathBuf),
    Keyring(CredentialStore),
    Memory,
}

#[derive(Debug)]
pub struct SessionContext {
    backend: Backend,
    slot: RwLock<Option<StoredSession>>,
}

impl SessionContext {
    /// Open a context for `storage`. File storage keeps its entry in `session_dir`.
    pub fn open(storage: TokenStorage, session_dir: PathBuf) -> Self {
        let backend = match storage {
            TokenStorage::File => Backend::File(session_dir.join(SESSION_FILE)),
            TokenStorage::Keyring => Backend::Keyring(CredentialStore::session()),
            TokenStorage::Memory => Backend::Memory,
        };
        Self::with_backend(backend)
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            slot: RwLock::new(None),
        }
    }

    pub fn in_memory() -> Self {
        Self::open(TokenStorage::Memory, PathBuf::new())
    }

    /// Load the persisted entry into the slot.
    ///
    /// Returns whether an entry was found. Expired or malformed credentials
    /// are loaded as-is; the guard decides what to do with them.
    pub fn load(&self) -> Result<bool> {
        let stored = match &self.backend {
            Backend::File(path) => {
                if !path.exists() {
                    return Ok(false);
                }
                let contents =
                    std::fs::read_to_string(path).context("Failed to read session file")?;
                let stored: StoredSession =
                    serde_json::from_str(&contents).context("Failed to parse session file")?;
                Some(stored)
            }
            Backend::Keyring(store) => match store.load()? {
                Some(secret) => Some(
                    serde_json::from_str(&secret)
                        .context("Failed to parse session from keychain")?,
                ),
                None => None,
            },
            Backend::Memory => return Ok(self.token().is_some()),
        };

        let found = stored.is_some();
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = stored;
        debug!(found, "Session loaded");
        Ok(found)
    }

    /// Current credential, if any
    pub fn token(&self) -> Option<String> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.token.clone())
    }

    pub fn stored(&self) -> Option<StoredSession> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Decode the current credential's claims.
    pub fn claims(&self) -> Option<Result<TokenClaims, TokenError>> {
        self.token().map(|t| TokenClaims::decode(&t))
    }

    /// Store a new credential.
    ///
    /// The in-memory slot is updated even when persisting fails.
    pub fn set_token(&self, token: String) -> Result<()> {
        let stored = StoredSession::new(token);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(stored.clone());
        self.persist(&stored)
    }

    /// Remove the credential from memory and from the backend.
    pub fn clear(&self) -> Result<()> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
        match &self.backend {
            Backend::File(path) => {
                if path.exists() {
                    std::fs::remove_file(path).context("Failed to remove session file")?;
                }
                Ok(())
            }
            Backend::Keyring(store) => store.delete(),
            Backend::Memory => Ok(()),
        }
    }

    fn persist(&self, stored: &StoredSession) -> Result<()> {
        match &self.backend {
            Backend::File(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let contents = serde_json::to_string_pretty(stored)?;
                std::fs::write(path, contents).context("Failed to write session file")?;
                Ok(())
            }
            Backend::Keyring(store) => store.store(&serde_json::to_string(stored)?),
            Backend::Memory => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_set_and_clear() {
        let session = SessionContext::in_memory();
        assert_eq!(session.token(), None);

        session.set_token("abc".to_string()).unwrap();
        assert_eq!(session.token().as_deref(), Some("abc"));
        assert!(session.load().unwrap());

        session.clear().unwrap();
        assert_eq!(session.token(), None);
        assert!(session.stored().is_none());
    }

    #[test]
    fn test_file_round_trip_across_contexts() {
        let dir = tempfile::tempdir().unwrap();

        let first = SessionContext::open(TokenStorage::File, dir.path().to_path_buf());
        assert!(!first.load().unwrap());
        first.set_token("persisted".to_string()).unwrap();
        assert!(dir.path().join(SESSION_FILE).exists());

        let second = SessionContext::open(TokenStorage::File, dir.path().to_path_buf());
        assert!(second.load().unwrap());
        assert_eq!(second.token().as_deref(), Some("persisted"));

        second.clear().unwrap();
        assert!(!dir.path().join(SESSION_FILE).exists());

        let third = SessionContext::open(TokenStorage::File, dir.path().to_path_buf());
        assert!(!third.load().unwrap());
    }

    #[test]
    fn test_file_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let session = SessionContext::open(TokenStorage::File, nested.clone());
        session.set_token("t".to_string()).unwrap();
        assert!(nested.join(SESSION_FILE).exists());
    }

    #[test]
    fn test_corrupt_session_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "{not json").unwrap();

        let session = SessionContext::open(TokenStorage::File, dir.path().to_path_buf());
        assert!(session.load().is_err());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn test_clear_without_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionContext::open(TokenStorage::File, dir.path().to_path_buf());
        assert!(session.clear().is_ok());
    }

    #[test]
    fn test_failed_persist_keeps_slot() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        // The session directory is a regular file, so writing the entry fails
        let session = SessionContext::open(TokenStorage::File, blocker);
        assert!(session.set_token("kept".to_string()).is_err());
        assert_eq!(session.token().as_deref(), Some("kept"));
    }

    #[test]
    fn test_keyring_round_trip_across_contexts() {
        let account = format!("session-test-{}", std::process::id());
        let open = || {
            SessionContext::with_backend(Backend::Keyring(CredentialStore::for_account(&account)))
        };

        let first = open();
        if let Err(e) = first.set_token("persisted.token.sig".to_string()) {
            // Headless machines have no secret service to talk to
            eprintln!("skipping keyring round trip: {:#}", e);
            return;
        }

        let second = open();
        assert!(second.load().unwrap(), "a second context must see the stored entry");
        assert_eq!(second.token().as_deref(), Some("persisted.token.sig"));

        second.clear().unwrap();
        assert!(!open().load().unwrap());
    }

    #[test]
    fn test_token_storage_serde() {
        assert_eq!(serde_json::to_string(&TokenStorage::Keyring).unwrap(), "\"keyring\"");
        let parsed: TokenStorage = serde_json::from_str("\"memory\"").unwrap();
        assert_eq!(parsed, TokenStorage::Memory);
        assert_eq!(TokenStorage::default(), TokenStorage::File);
    }
}
