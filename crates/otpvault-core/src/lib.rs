//! Passphrase-locked OTP credential engine.
//!
//! One session passphrase gates every operation; each account is sealed
//! under its own PBKDF2-derived key and kept at rest as an AES-256-GCM
//! blob over its canonical `otpauth://` URI. Codes follow RFC 4226
//! (HOTP) and RFC 6238 (TOTP), and third-party exports come in through
//! pluggable import adapters.
//!
//! Storage is a collaborator, not a built-in: hosts implement
//! [`storage::AccountStore`] (or use [`storage::MemoryStore`]) and
//! drive everything through [`service::VaultService`].

pub mod codec;
pub mod crypto;
pub mod import;
pub mod otp;
pub mod service;
pub mod storage;
pub mod types;
pub mod uri;

pub use import::{AuthyAdapter, EnteAdapter, ImportAdapter, TwoFasAdapter};
pub use service::{VaultService, VaultServiceState};
pub use storage::{AccountStore, MemoryStore};
pub use types::{
    AccountCode, Algorithm, DisplayAccount, ImportResult, OtpEntry, OtpKind, StoredAccount,
    VaultError, VaultErrorKind,
};
