//! Base32, hex, and percent-encoding primitives.
//!
//! Base32 decoding is deliberately lenient: real-world secrets arrive
//! lowercased, space-grouped, or padded, so everything outside the
//! RFC 4648 alphabet is dropped before decoding and the operation never
//! fails. Hex is strict in both directions.

use crate::types::{VaultError, VaultErrorKind};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Base32 (RFC 4648)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Decode a Base32 secret, ignoring case, padding, whitespace, and any
/// other character outside the RFC 4648 alphabet. Empty input (or input
/// with no alphabet characters at all) decodes to an empty byte string.
pub fn decode_base32(text: &str) -> Vec<u8> {
    let cleaned: String = text
        .to_uppercase()
        .chars()
        .filter(|c| matches!(c, 'A'..='Z' | '2'..='7'))
        .collect();
    base32::decode(base32::Alphabet::Rfc4648 { padding: false }, &cleaned).unwrap_or_default()
}

/// Encode bytes as RFC 4648 Base32, `=`-padded to a multiple of 8.
pub fn encode_base32(bytes: &[u8]) -> String {
    base32::encode(base32::Alphabet::Rfc4648 { padding: true }, bytes)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Hex
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Lowercase hex, two digits per byte.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Strict hex decode: odd length or a non-hex digit is an input error.
pub fn hex_to_bytes(text: &str) -> Result<Vec<u8>, VaultError> {
    hex::decode(text).map_err(|e| {
        VaultError::new(VaultErrorKind::InvalidInput, "Invalid hex input")
            .with_detail(e.to_string())
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  URI components
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Percent-encode exactly the characters that break `otpauth://` labels
/// and query values: space, `:`, `/`, `?`, `&`, `=`, `+`, `#`, `@`.
/// Everything else, including non-ASCII, passes through untouched.
pub fn encode_uri_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' ' => out.push_str("%20"),
            ':' => out.push_str("%3A"),
            '/' => out.push_str("%2F"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            '+' => out.push_str("%2B"),
            '#' => out.push_str("%23"),
            '@' => out.push_str("%40"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse `%XX` escapes, accumulating bytes so multi-byte UTF-8 escape
/// runs decode correctly. Malformed escapes pass through verbatim. No
/// `+`-to-space folding: the encoder above never emits a bare `+`.
pub fn decode_uri_component(text: &str) -> String {
    let mut bytes = Vec::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            let escape: String = chars.by_ref().take(2).collect();
            match u8::from_str_radix(&escape, 16) {
                Ok(byte) if escape.len() == 2 => bytes.push(byte),
                _ => {
                    bytes.push(b'%');
                    bytes.extend_from_slice(escape.as_bytes());
                }
            }
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
