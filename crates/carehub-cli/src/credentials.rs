use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "carehub-console";

/// Remembered console passwords, kept in the OS keychain.
pub struct CredentialStore;

impl CredentialStore {
    /// Save or overwrite the password remembered for `email`.
    pub fn store(email: &str, password: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, email)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// `None` when nothing is remembered for this account.
    pub fn get_password(email: &str) -> Option<String> {
        Entry::new(SERVICE_NAME, email)
            .ok()
            .and_then(|entry| entry.get_password().ok())
    }

    /// Forget `email`. Errors if the keychain has no entry for it.
    pub fn delete(email: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, email)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }
}
