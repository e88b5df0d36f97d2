//! Keychain storage for credential passwords.
//!
//! Passwords that are not written inline in the settings file live in the
//! system keychain (macOS Keychain, Linux Secret Service, Windows Credential
//! Manager), keyed by credential name.

use crate::error::{Error, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "xlrelease";

fn keyring_error(e: keyring::Error) -> Error {
    Error::keychain_failed(e.to_string())
}

fn entry(credential: &str) -> Result<Entry> {
    let key = format!("credential:{}", credential);
    Entry::new(SERVICE_NAME, &key).map_err(keyring_error)
}

/// Stores the password for a credential.
pub fn store(credential: &str, password: &str) -> Result<()> {
    entry(credential)?
        .set_password(password)
        .map_err(keyring_error)
}

/// Retrieves the password for a credential.
///
/// Returns `None` if the key doesn't exist.
pub fn get(credential: &str) -> Result<Option<String>> {
    match entry(credential)?.get_password() {
        Ok(value) => Ok(Some(value)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(keyring_error(e)),
    }
}

/// Deletes the password for a credential.
pub fn delete(credential: &str) -> Result<()> {
    match entry(credential)?.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()), // Already deleted
        Err(e) => Err(keyring_error(e)),
    }
}
