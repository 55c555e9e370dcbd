//! Record transforms and the storage collaborator contract.
//!
//! The engine owns how a credential becomes an at-rest record (and back)
//! but not where records live: hosts hand in any [`AccountStore`]. The
//! bundled [`MemoryStore`] covers tests and ephemeral sessions; it keeps
//! nothing across process restarts.

use uuid::Uuid;

use crate::crypto::{self, SigningKey, SALT_LEN};
use crate::types::{OtpEntry, StoredAccount, VaultError, VaultErrorKind};
use crate::uri;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Record transforms
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Encrypt a credential into its at-rest record under the given key.
///
/// The record id is the key's salt read as a UUID, so id, salt, and key
/// derivation are one commitment; re-encrypting under the same key keeps
/// the id stable.
pub fn to_stored_account(
    entry: &OtpEntry,
    signing_key: &SigningKey,
) -> Result<StoredAccount, VaultError> {
    let canonical = uri::build_otpauth_uri(entry);
    let encrypted_payload = crypto::encrypt(&signing_key.key, canonical.as_bytes())?;
    Ok(StoredAccount {
        account_id: Uuid::from_bytes(signing_key.salt),
        label: entry.qualified_label(),
        salt: signing_key.salt.to_vec(),
        encrypted_payload,
    })
}

/// Decrypt an at-rest record back into its credential description.
///
/// A failed tag check means the key does not match the record, which at
/// this boundary is a wrong passphrase.
pub fn to_entry(account: &StoredAccount, signing_key: &SigningKey) -> Result<OtpEntry, VaultError> {
    let plaintext = crypto::decrypt(&signing_key.key, &account.encrypted_payload).map_err(|e| {
        VaultError::new(VaultErrorKind::InvalidPassphrase, "Incorrect passphrase")
            .with_detail(e.message)
    })?;
    let canonical = String::from_utf8(plaintext).map_err(|e| {
        VaultError::new(
            VaultErrorKind::DecryptionFailed,
            "Decrypted payload is not valid UTF-8",
        )
        .with_detail(e.to_string())
    })?;
    uri::parse_otpauth_uri(&canonical)
}

/// The record's salt as a fixed-size array, for key re-derivation.
pub fn record_salt(account: &StoredAccount) -> Result<[u8; SALT_LEN], VaultError> {
    account.salt.as_slice().try_into().map_err(|_| {
        VaultError::new(
            VaultErrorKind::StorageError,
            format!("Record salt must be {SALT_LEN} bytes"),
        )
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Store contract
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where at-rest records live. The engine re-reads through this on
/// every operation and never caches records across calls.
pub trait AccountStore: Send {
    /// Snapshot of all records.
    fn list(&self) -> Vec<StoredAccount>;

    fn get_by_label(&self, label: &str) -> Option<StoredAccount>;

    fn get_by_id(&self, id: &Uuid) -> Option<StoredAccount>;

    /// Insert, or update in place when a record with the same id exists.
    /// Returns `false` when the backend could not persist the record.
    fn save(&mut self, account: StoredAccount) -> bool;
}

/// Vec-backed store holding records for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    accounts: Vec<StoredAccount>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        log::warn!("memory store holds accounts for this process only; nothing persists");
        Self {
            accounts: Vec::new(),
        }
    }
}

impl AccountStore for MemoryStore {
    fn list(&self) -> Vec<StoredAccount> {
        self.accounts.clone()
    }

    fn get_by_label(&self, label: &str) -> Option<StoredAccount> {
        self.accounts.iter().find(|a| a.label == label).cloned()
    }

    fn get_by_id(&self, id: &Uuid) -> Option<StoredAccount> {
        self.accounts.iter().find(|a| &a.account_id == id).cloned()
    }

    fn save(&mut self, account: StoredAccount) -> bool {
        match self
            .accounts
            .iter_mut()
            .find(|a| a.account_id == account.account_id)
        {
            Some(existing) => *existing = account,
            None => self.accounts.push(account),
        }
        true
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
