//! Core types for the OTP credential vault.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default code length when an `otpauth://` URI or import payload omits it.
pub const DEFAULT_DIGITS: u8 = 6;
/// Default TOTP time-step in seconds.
pub const DEFAULT_PERIOD: u32 = 30;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Hash algorithm used for HMAC-based OTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha512 => write!(f, "SHA512"),
        }
    }
}

impl Algorithm {
    /// Parse from a case-insensitive string.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SHA1" | "SHA-1" | "HMACSHA1" | "HMAC-SHA1" => Some(Self::Sha1),
            "SHA256" | "SHA-256" | "HMACSHA256" | "HMAC-SHA256" => Some(Self::Sha256),
            "SHA512" | "SHA-512" | "HMACSHA512" | "HMAC-SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Canonical name used in `otpauth://` URIs.
    pub fn uri_name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OtpKind
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// OTP flavour together with its flavour-specific parameter.
///
/// A counter-based credential has no period and a time-based one has no
/// counter, so the field lives inside the variant and call sites match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OtpKind {
    Totp { period: u32 },
    Hotp { counter: u64 },
}

impl Default for OtpKind {
    fn default() -> Self {
        Self::Totp {
            period: DEFAULT_PERIOD,
        }
    }
}

impl fmt::Display for OtpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri_type())
    }
}

impl OtpKind {
    /// Type segment used in `otpauth://` URIs.
    pub fn uri_type(&self) -> &'static str {
        match self {
            Self::Totp { .. } => "totp",
            Self::Hotp { .. } => "hotp",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OtpEntry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A fully described OTP credential in its decrypted, working form.
///
/// Carries the raw secret bytes, so it is never serialized and never
/// written anywhere; the at-rest form is [`StoredAccount`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEntry {
    pub kind: OtpKind,
    pub secret: Vec<u8>,
    pub digits: u8,
    pub algorithm: Algorithm,
    /// Account name, e.g. `alice@example.com`.
    pub label: String,
    pub issuer: Option<String>,
}

impl OtpEntry {
    pub fn new(kind: OtpKind, label: impl Into<String>, secret: Vec<u8>) -> Self {
        Self {
            kind,
            secret,
            digits: DEFAULT_DIGITS,
            algorithm: Algorithm::default(),
            label: label.into(),
            issuer: None,
        }
    }

    /// Time-based credential with the default 30-second period.
    pub fn totp(label: impl Into<String>, secret: Vec<u8>) -> Self {
        Self::new(OtpKind::default(), label, secret)
    }

    /// Counter-based credential starting at counter 0.
    pub fn hotp(label: impl Into<String>, secret: Vec<u8>) -> Self {
        Self::new(OtpKind::Hotp { counter: 0 }, label, secret)
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_digits(mut self, digits: u8) -> Self {
        self.digits = digits;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Issuer-qualified label, `issuer:label` when an issuer is present.
    pub fn qualified_label(&self) -> String {
        match &self.issuer {
            Some(issuer) => format!("{}:{}", issuer, self.label),
            None => self.label.clone(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  StoredAccount
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// At-rest form of one account: everything but the label is opaque.
///
/// `account_id` is derived from the record's salt, so the id is stable
/// across re-encryptions that keep the salt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAccount {
    pub account_id: Uuid,
    /// Issuer-qualified display label; kept in the clear for listing.
    pub label: String,
    #[serde(with = "hex_bytes")]
    pub salt: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub encrypted_payload: Vec<u8>,
}

impl StoredAccount {
    /// Ephemeral projection for UI listings; `next_code_at` is 0 when
    /// unknown (listing while locked, or a counter-based credential).
    pub fn for_display(&self, next_code_at: u64) -> DisplayAccount {
        DisplayAccount {
            account_id: self.account_id.to_string(),
            label: self.label.clone(),
            next_code_at,
        }
    }
}

/// Binary fields travel as lowercase hex strings in JSON.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(&text).map_err(serde::de::Error::custom)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DisplayAccount / AccountCode
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What a host UI needs to render an account row without touching secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayAccount {
    pub account_id: String,
    pub label: String,
    /// Unix time at which the next code becomes valid; 0 when unknown.
    pub next_code_at: u64,
}

/// One row of a code refresh: the account projection plus its current code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCode {
    pub account: DisplayAccount,
    pub code: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ImportResult
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Outcome of normalizing a third-party export, never partial: either
/// every usable credential as a canonical `otpauth://` URI, or a failure
/// with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportResult {
    Success {
        uris: Vec<String>,
    },
    Failure {
        message: String,
        cause: Option<String>,
    },
}

impl ImportResult {
    pub fn success(uris: Vec<String>) -> Self {
        Self::Success { uris }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            cause: None,
        }
    }

    pub fn failure_with_cause(message: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultErrorKind {
    /// Caller passed something unusable (blank passphrase, bad hex, …).
    InvalidInput,
    /// Malformed `otpauth://` input.
    InvalidUri,
    /// Operation needs an unlocked vault.
    VaultLocked,
    EncryptionFailed,
    DecryptionFailed,
    /// A record failed to decrypt under the key derived from the held
    /// passphrase.
    InvalidPassphrase,
    ImportFailed,
    /// The storage collaborator reported failure.
    StorageError,
}

/// Crate-wide error: a kind for dispatch, a message for humans, and an
/// optional detail carrying the underlying cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultError {
    pub kind: VaultErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl VaultError {
    pub fn new(kind: VaultErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "[{:?}] {} ({})", self.kind, self.message, detail),
            None => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

impl From<VaultError> for String {
    fn from(err: VaultError) -> Self {
        err.to_string()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
