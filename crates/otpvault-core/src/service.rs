//! Vault session facade.
//!
//! One passphrase guards all accounts; per-account keys are re-derived
//! from it on demand and never cached. Every operation is synchronous
//! and cheap, so hosts share the service behind [`VaultServiceState`],
//! whose single mutex also serializes lock-state changes.

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::crypto;
use crate::import::ImportAdapter;
use crate::otp;
use crate::storage::{self, AccountStore};
use crate::types::{AccountCode, DisplayAccount, ImportResult, VaultError, VaultErrorKind};
use crate::uri;

/// Shared handle for one vault session.
pub type VaultServiceState = Arc<Mutex<VaultService>>;

/// Passphrase-gated session over a storage collaborator.
pub struct VaultService {
    store: Box<dyn AccountStore>,
    /// `Some` while unlocked; the only shared mutable state in the crate.
    passphrase: Option<String>,
}

impl VaultService {
    /// Fresh locked session over the given store.
    pub fn new(store: Box<dyn AccountStore>) -> Self {
        Self {
            store,
            passphrase: None,
        }
    }

    /// Wrap in the shared handle hosts hold on to.
    pub fn into_shared(self) -> VaultServiceState {
        Arc::new(Mutex::new(self))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Session state
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Accept a passphrase for this session. Nothing is verified here:
    /// a wrong passphrase surfaces as `InvalidPassphrase` on the first
    /// record it fails to decrypt.
    pub fn unlock(&mut self, passphrase: &str) -> Result<(), VaultError> {
        if passphrase.trim().is_empty() {
            return Err(VaultError::new(
                VaultErrorKind::InvalidInput,
                "Passphrase cannot be blank",
            ));
        }
        self.passphrase = Some(passphrase.to_string());
        log::debug!("vault unlocked");
        Ok(())
    }

    /// Drop the held passphrase, zeroizing it.
    pub fn lock(&mut self) {
        if let Some(mut passphrase) = self.passphrase.take() {
            passphrase.zeroize();
        }
        log::debug!("vault locked");
    }

    pub fn is_unlocked(&self) -> bool {
        self.passphrase.is_some()
    }

    fn require_unlocked(&self) -> Result<&str, VaultError> {
        self.passphrase
            .as_deref()
            .ok_or_else(|| VaultError::new(VaultErrorKind::VaultLocked, "Vault is locked"))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Accounts
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Label/id projections for every stored account. Allowed while
    /// locked; `next_code_at` is 0 here since no codes are computed.
    pub fn list_accounts(&self) -> Vec<DisplayAccount> {
        self.store.list().iter().map(|a| a.for_display(0)).collect()
    }

    /// Current code for every account, re-deriving each record's key
    /// from the held passphrase.
    pub fn compute_all_codes(&self) -> Result<Vec<AccountCode>, VaultError> {
        let passphrase = self.require_unlocked()?;
        let now = otp::unix_now();

        let mut codes = Vec::new();
        for account in self.store.list() {
            let salt = storage::record_salt(&account)?;
            let signing_key = crypto::derive_signing_key(passphrase, &salt);
            let entry = storage::to_entry(&account, &signing_key)?;
            codes.push(AccountCode {
                code: otp::generate_at(&entry, now),
                account: account.for_display(otp::next_code_at(&entry, now)),
            });
        }
        Ok(codes)
    }

    /// Parse an `otpauth://` URI and store it as a new account under a
    /// fresh salt. Returns the stored projection.
    pub fn add_account(&mut self, uri: &str) -> Result<DisplayAccount, VaultError> {
        self.require_unlocked()?;
        let entry = uri::parse_otpauth_uri(uri)?;
        let signing_key = self.fresh_signing_key()?;
        let account = storage::to_stored_account(&entry, &signing_key)?;
        if !self.store.save(account.clone()) {
            return Err(VaultError::new(
                VaultErrorKind::StorageError,
                "Storage backend rejected the new account",
            ));
        }
        log::info!("stored account {}", account.account_id);
        Ok(account.for_display(0))
    }

    /// Fresh random signing key under the held passphrase whose derived
    /// id is not already taken, keeping the salt-as-id commitment
    /// collision-free.
    fn fresh_signing_key(&self) -> Result<crypto::SigningKey, VaultError> {
        let passphrase = self.require_unlocked()?;
        loop {
            let signing_key = crypto::generate_signing_key(passphrase);
            let id = Uuid::from_bytes(signing_key.salt);
            if self.store.get_by_id(&id).is_none() {
                return Ok(signing_key);
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Import
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Run a third-party export through `adapter` and store every
    /// credential it yields. Adapter-level problems come back as
    /// [`ImportResult::Failure`] values; lock-state and storage problems
    /// are errors. The whole batch is parsed before anything is stored,
    /// so a malformed batch stores nothing.
    pub fn import_accounts(
        &mut self,
        adapter: &dyn ImportAdapter,
        payload: &str,
        password: Option<&str>,
    ) -> Result<ImportResult, VaultError> {
        self.require_unlocked()?;
        if adapter.requires_password() && password.is_none() {
            return Err(VaultError::new(
                VaultErrorKind::ImportFailed,
                format!("{} exports require a password", adapter.name()),
            ));
        }

        let uris = match adapter.parse(payload, password) {
            ImportResult::Success { uris } if uris.is_empty() => {
                return Ok(ImportResult::failure(format!(
                    "{} import produced no accounts",
                    adapter.name()
                )))
            }
            ImportResult::Success { uris } => uris,
            failure => {
                log::warn!("{} import failed", adapter.name());
                return Ok(failure);
            }
        };

        let mut entries = Vec::with_capacity(uris.len());
        for uri_text in &uris {
            match uri::parse_otpauth_uri(uri_text) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    return Ok(ImportResult::failure_with_cause(
                        format!(
                            "{} import produced an unreadable credential",
                            adapter.name()
                        ),
                        e.to_string(),
                    ))
                }
            }
        }

        for entry in &entries {
            let signing_key = self.fresh_signing_key()?;
            let account = storage::to_stored_account(entry, &signing_key)?;
            if !self.store.save(account) {
                return Err(VaultError::new(
                    VaultErrorKind::StorageError,
                    "Storage backend rejected an imported account",
                ));
            }
        }
        log::info!(
            "imported {} accounts via {}",
            entries.len(),
            adapter.name()
        );
        Ok(ImportResult::success(uris))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{AuthyAdapter, EnteAdapter, TwoFasAdapter};
    use crate::storage::MemoryStore;

    const URI: &str = "otpauth://totp/Example:alice@example.com?secret=JBSWY3DPEHPK3PXP";

    fn new_svc() -> VaultService {
        VaultService::new(Box::new(MemoryStore::new()))
    }

    fn unlocked_svc() -> VaultService {
        let mut svc = new_svc();
        svc.unlock("correct horse battery staple").unwrap();
        svc
    }

    /// Test double for adapter-protocol corner cases.
    struct CannedAdapter {
        uris: Vec<String>,
        needs_password: bool,
    }

    impl ImportAdapter for CannedAdapter {
        fn name(&self) -> &'static str {
            "Canned"
        }

        fn requires_password(&self) -> bool {
            self.needs_password
        }

        fn parse(&self, _payload: &str, _password: Option<&str>) -> ImportResult {
            ImportResult::success(self.uris.clone())
        }
    }

    // ── Session state ────────────────────────────────────────────

    #[tokio::test]
    async fn starts_locked() {
        let svc = new_svc();
        assert!(!svc.is_unlocked());
        let err = svc.compute_all_codes().unwrap_err();
        assert_eq!(err.kind, VaultErrorKind::VaultLocked);
    }

    #[tokio::test]
    async fn unlock_rejects_blank_passphrases() {
        for blank in ["", "   ", "\t\n"] {
            let err = new_svc().unlock(blank).unwrap_err();
            assert_eq!(err.kind, VaultErrorKind::InvalidInput, "input {blank:?}");
        }
    }

    #[tokio::test]
    async fn unlock_then_lock_round_trip() {
        let mut svc = new_svc();
        svc.unlock("hunter2 hunter2").unwrap();
        assert!(svc.is_unlocked());
        svc.lock();
        assert!(!svc.is_unlocked());
        assert_eq!(
            svc.compute_all_codes().unwrap_err().kind,
            VaultErrorKind::VaultLocked
        );
    }

    // ── Accounts ─────────────────────────────────────────────────

    #[tokio::test]
    async fn add_account_requires_unlock() {
        let err = new_svc().add_account(URI).unwrap_err();
        assert_eq!(err.kind, VaultErrorKind::VaultLocked);
    }

    #[tokio::test]
    async fn add_account_returns_projection() {
        let mut svc = unlocked_svc();
        let display = svc.add_account(URI).unwrap();
        assert_eq!(display.label, "Example:alice@example.com");
        assert_eq!(display.next_code_at, 0);
        assert_eq!(svc.list_accounts().len(), 1);
    }

    #[tokio::test]
    async fn add_account_rejects_bad_uris() {
        let mut svc = unlocked_svc();
        let err = svc.add_account("otpauth://totp/broken?digits=6").unwrap_err();
        assert_eq!(err.kind, VaultErrorKind::InvalidUri);
        assert!(svc.list_accounts().is_empty());
    }

    #[tokio::test]
    async fn listing_works_while_locked() {
        let mut svc = unlocked_svc();
        svc.add_account(URI).unwrap();
        svc.lock();

        let listing = svc.list_accounts();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].label, "Example:alice@example.com");
        assert_eq!(listing[0].next_code_at, 0);
    }

    #[tokio::test]
    async fn accounts_get_distinct_ids() {
        let mut svc = unlocked_svc();
        let a = svc.add_account(URI).unwrap();
        let b = svc.add_account(URI).unwrap();
        assert_ne!(a.account_id, b.account_id);
        assert_eq!(svc.list_accounts().len(), 2);
    }

    // ── Code computation ─────────────────────────────────────────

    #[tokio::test]
    async fn compute_all_codes_end_to_end() {
        let mut svc = unlocked_svc();
        svc.add_account(URI).unwrap();

        let codes = svc.compute_all_codes().unwrap();
        assert_eq!(codes.len(), 1);
        let row = &codes[0];
        assert_eq!(row.account.label, "Example:alice@example.com");
        assert_eq!(row.code.len(), 6);
        assert!(row.code.chars().all(|c| c.is_ascii_digit()));
        assert!(row.account.next_code_at > 0);

        // The emitted code re-validates against the source credential.
        let entry = uri::parse_otpauth_uri(URI).unwrap();
        assert!(otp::validate_at(&entry, &row.code, otp::unix_now()));
    }

    #[tokio::test]
    async fn hotp_accounts_compute_at_stored_counter() {
        let mut svc = unlocked_svc();
        svc.add_account("otpauth://hotp/rfc?secret=GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ&counter=3")
            .unwrap();

        let codes = svc.compute_all_codes().unwrap();
        assert_eq!(codes[0].code, "969429");
        assert_eq!(codes[0].account.next_code_at, 0);
    }

    #[tokio::test]
    async fn wrong_passphrase_surfaces_on_compute() {
        let mut svc = unlocked_svc();
        svc.add_account(URI).unwrap();
        svc.lock();
        svc.unlock("wrong passphrase").unwrap();

        let err = svc.compute_all_codes().unwrap_err();
        assert_eq!(err.kind, VaultErrorKind::InvalidPassphrase);
    }

    // ── Import ───────────────────────────────────────────────────

    #[tokio::test]
    async fn import_requires_unlock() {
        let mut svc = new_svc();
        let err = svc
            .import_accounts(&EnteAdapter, "otpauth://totp/a?secret=AA", None)
            .unwrap_err();
        assert_eq!(err.kind, VaultErrorKind::VaultLocked);
    }

    #[tokio::test]
    async fn twofas_import_stores_all_accounts() {
        let payload = r#"{"services": [
            {"name": "Example", "secret": "JBSWY3DPEHPK3PXP", "account": "alice"},
            {"name": "Acme", "secret": "GEZDGNBVGY3TQOJQ", "account": "bob"}
        ]}"#;
        let mut svc = unlocked_svc();

        let result = svc.import_accounts(&TwoFasAdapter, payload, None).unwrap();
        match result {
            ImportResult::Success { uris } => assert_eq!(uris.len(), 2),
            _ => panic!("expected success"),
        }
        assert_eq!(svc.list_accounts().len(), 2);
        assert_eq!(svc.compute_all_codes().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn authy_import_uses_qualified_labels() {
        let payload = r#"[{"secret": "JBSWY3DPEHPK3PXP", "name": "alice", "issuer": "Example"}]"#;
        let mut svc = unlocked_svc();
        svc.import_accounts(&AuthyAdapter, payload, None).unwrap();

        let listing = svc.list_accounts();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].label, "Example:alice");
    }

    #[tokio::test]
    async fn adapter_failure_comes_back_as_value() {
        let payload = r#"{"encryptedData": "deadbeef"}"#;
        let mut svc = unlocked_svc();

        let result = svc.import_accounts(&EnteAdapter, payload, None).unwrap();
        assert!(!result.is_success());
        assert!(svc.list_accounts().is_empty());
    }

    #[tokio::test]
    async fn malformed_batch_stores_nothing() {
        let adapter = CannedAdapter {
            uris: vec![URI.to_string(), "otpauth://totp/broken?digits=6".to_string()],
            needs_password: false,
        };
        let mut svc = unlocked_svc();

        let result = svc.import_accounts(&adapter, "", None).unwrap();
        match result {
            ImportResult::Failure { message, cause } => {
                assert!(message.contains("unreadable"));
                assert!(cause.is_some());
            }
            _ => panic!("expected failure"),
        }
        assert!(svc.list_accounts().is_empty());
    }

    #[tokio::test]
    async fn empty_adapter_success_becomes_failure() {
        let adapter = CannedAdapter {
            uris: Vec::new(),
            needs_password: false,
        };
        let mut svc = unlocked_svc();

        let result = svc.import_accounts(&adapter, "", None).unwrap();
        match result {
            ImportResult::Failure { message, .. } => {
                assert!(message.contains("produced no accounts"))
            }
            _ => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn password_requiring_adapter_is_guarded() {
        let adapter = CannedAdapter {
            uris: vec![URI.to_string()],
            needs_password: true,
        };
        let mut svc = unlocked_svc();

        let err = svc.import_accounts(&adapter, "", None).unwrap_err();
        assert_eq!(err.kind, VaultErrorKind::ImportFailed);
        assert!(svc.list_accounts().is_empty());

        let result = svc.import_accounts(&adapter, "", Some("export-pw")).unwrap();
        assert!(result.is_success());
        assert_eq!(svc.list_accounts().len(), 1);
    }

    // ── Shared state ─────────────────────────────────────────────

    #[tokio::test]
    async fn shared_handle_serialises_access() {
        let state = unlocked_svc().into_shared();
        {
            let mut guard = state.lock().await;
            guard.add_account(URI).unwrap();
        }
        let guard = state.lock().await;
        assert_eq!(guard.list_accounts().len(), 1);
        assert!(guard.is_unlocked());
    }
}
