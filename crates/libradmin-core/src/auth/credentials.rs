use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "libradmin";

/// Keychain account under which the session entry is kept
const SESSION_ACCOUNT: &str = "session";

/// OS keychain access for one account of the libradmin service.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    account: String,
}

impl CredentialStore {
    /// The entry holding the persisted session
    pub fn session() -> Self {
        Self::for_account(SESSION_ACCOUNT)
    }

    pub fn for_account(account: &str) -> Self {
        Self {
            account: account.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.account).context("Failed to create keyring entry")
    }

    /// Store the serialized session in the OS keychain
    pub fn store(&self, secret: &str) -> Result<()> {
        self.entry()?
            .set_password(secret)
            .context("Failed to store session in keychain")?;
        Ok(())
    }

    /// Retrieve the serialized session, if one is stored
    pub fn load(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve session from keychain"),
        }
    }

    /// Delete the stored session. Deleting a missing entry is not an error.
    pub fn delete(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete session from keychain"),
        }
    }
}
