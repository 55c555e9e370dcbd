//! Key derivation and authenticated encryption for secrets at rest.
//!
//! One key per account: PBKDF2-HMAC-SHA256 over the vault passphrase and
//! the account's random salt, then AES-256-GCM over the canonical URI.
//! The nonce is generated per encryption and prepended to the ciphertext
//! so a stored blob is self-describing.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::types::{Algorithm, VaultError, VaultErrorKind};

/// PBKDF2 rounds for per-account key derivation. Part of the stored-data
/// contract: a record decrypts only under the count it was written with.
pub const PBKDF2_ITERATIONS: u32 = 200;
/// Random salt length. Doubles as the account-id source, so it must stay
/// 16 bytes (one UUID).
pub const SALT_LEN: usize = 16;
/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;
/// Derived key length (AES-256).
pub const KEY_LEN: usize = 32;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SigningKey
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-account encryption key plus the salt that reproduces it.
///
/// Zeroed on drop. Carries raw key material, so there is no `Debug`
/// impl and no serde.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey {
    pub key: [u8; KEY_LEN],
    pub salt: [u8; SALT_LEN],
}

/// Derive the signing key for a known salt. Deterministic: the same
/// passphrase and salt always yield the same key.
pub fn derive_signing_key(passphrase: &str, salt: &[u8; SALT_LEN]) -> SigningKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    SigningKey { key, salt: *salt }
}

/// Derive a signing key under a fresh random salt.
pub fn generate_signing_key(passphrase: &str) -> SigningKey {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    derive_signing_key(passphrase, &salt)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AES-256-GCM
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Encrypt under a fresh 96-bit nonce; the returned blob is
/// `nonce || ciphertext`.
pub fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| {
        VaultError::new(VaultErrorKind::EncryptionFailed, "Invalid encryption key")
            .with_detail(e.to_string())
    })?;
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| VaultError::new(VaultErrorKind::EncryptionFailed, "Encryption failed"))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a `nonce || ciphertext` blob. A truncated blob or a failed
/// GCM tag check is an error; tampered data never yields plaintext.
pub fn decrypt(key: &[u8; KEY_LEN], blob: &[u8]) -> Result<Vec<u8>, VaultError> {
    if blob.len() < NONCE_LEN {
        return Err(VaultError::new(
            VaultErrorKind::DecryptionFailed,
            "Encrypted payload is truncated",
        ));
    }
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| {
        VaultError::new(VaultErrorKind::DecryptionFailed, "Invalid decryption key")
            .with_detail(e.to_string())
    })?;
    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| {
            VaultError::new(
                VaultErrorKind::DecryptionFailed,
                "Decryption failed – wrong key or corrupted data",
            )
        })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  HMAC / digest
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Keyed HMAC over `data`; output is 20/32/64 bytes for
/// SHA-1/SHA-256/SHA-512.
pub fn hmac_sha(algorithm: Algorithm, key: &[u8], data: &[u8]) -> Vec<u8> {
    match algorithm {
        Algorithm::Sha1 => {
            let mut mac =
                <Hmac<Sha1> as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha256 => {
            let mut mac =
                <Hmac<Sha256> as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha512 => {
            let mut mac =
                <Hmac<Sha512> as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Unkeyed digest, for passphrase-verification paths hosts build on top.
pub fn sha_digest(algorithm: Algorithm, data: &[u8]) -> Vec<u8> {
    match algorithm {
        Algorithm::Sha1 => Sha1::digest(data).to_vec(),
        Algorithm::Sha256 => Sha256::digest(data).to_vec(),
        Algorithm::Sha512 => Sha512::digest(data).to_vec(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
