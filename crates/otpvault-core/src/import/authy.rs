//! Authy export adapter.
//!
//! Reads the JSON token array produced by Authy backup extractors. The
//! format is advisory: tokens carry optional `issuer`/`digits`/`period`/
//! `algorithm`/`type` fields, and anything unusable in an individual
//! field falls back to a default rather than sinking the whole import.

use serde::Deserialize;

use crate::codec;
use crate::import::ImportAdapter;
use crate::types::{Algorithm, ImportResult, OtpEntry, OtpKind, DEFAULT_DIGITS, DEFAULT_PERIOD};
use crate::uri;

/// Importer for Authy token-array exports.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthyAdapter;

#[derive(Debug, Deserialize)]
struct AuthyToken {
    secret: String,
    name: String,
    #[serde(default)]
    issuer: Option<String>,
    #[serde(default, rename = "type")]
    token_type: Option<String>,
    #[serde(default)]
    digits: Option<u8>,
    #[serde(default)]
    period: Option<u32>,
    #[serde(default)]
    algorithm: Option<String>,
}

/// One token to one canonical URI; `None` drops tokens with no secret.
fn token_to_uri(token: &AuthyToken) -> Option<String> {
    let secret = codec::decode_base32(&token.secret);
    if secret.is_empty() {
        return None;
    }

    let kind = match token.token_type.as_deref() {
        Some(t) if t.eq_ignore_ascii_case("hotp") => OtpKind::Hotp { counter: 0 },
        _ => OtpKind::Totp {
            period: token.period.filter(|p| *p > 0).unwrap_or(DEFAULT_PERIOD),
        },
    };
    let issuer = token
        .issuer
        .clone()
        .filter(|i| !i.trim().is_empty())
        .unwrap_or_else(|| token.name.clone());

    let entry = OtpEntry::new(kind, token.name.clone(), secret)
        .with_issuer(issuer)
        .with_digits(
            token
                .digits
                .filter(|d| (6..=10).contains(d))
                .unwrap_or(DEFAULT_DIGITS),
        )
        .with_algorithm(
            token
                .algorithm
                .as_deref()
                .and_then(Algorithm::from_str_loose)
                .unwrap_or_default(),
        );
    Some(uri::build_otpauth_uri(&entry))
}

impl ImportAdapter for AuthyAdapter {
    fn name(&self) -> &'static str {
        "Authy"
    }

    fn parse(&self, payload: &str, _password: Option<&str>) -> ImportResult {
        let tokens: Vec<AuthyToken> = match serde_json::from_str(payload) {
            Ok(tokens) => tokens,
            Err(e) => {
                return ImportResult::failure_with_cause(
                    "Failed to parse Authy export file",
                    e.to_string(),
                )
            }
        };

        let uris: Vec<String> = tokens.iter().filter_map(token_to_uri).collect();
        if uris.is_empty() {
            return ImportResult::failure("No valid tokens found in the Authy export file");
        }
        ImportResult::success(uris)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::parse_otpauth_uri;

    fn uris(payload: &str) -> Vec<String> {
        match AuthyAdapter.parse(payload, None) {
            ImportResult::Success { uris } => uris,
            ImportResult::Failure { message, .. } => panic!("unexpected failure: {message}"),
        }
    }

    #[test]
    fn parses_basic_tokens() {
        let payload = r#"[
            {"secret": "JBSWY3DPEHPK3PXP", "name": "alice@example.com", "issuer": "Example"},
            {"secret": "GEZDGNBVGY3TQOJQ", "name": "Cloudy"}
        ]"#;
        let uris = uris(payload);
        assert_eq!(uris.len(), 2);

        let first = parse_otpauth_uri(&uris[0]).unwrap();
        assert_eq!(first.label, "alice@example.com");
        assert_eq!(first.issuer.as_deref(), Some("Example"));
        assert_eq!(first.kind, OtpKind::Totp { period: 30 });

        // Issuer falls back to the token name.
        let second = parse_otpauth_uri(&uris[1]).unwrap();
        assert_eq!(second.label, "Cloudy");
        assert_eq!(second.issuer.as_deref(), Some("Cloudy"));
    }

    #[test]
    fn respects_optional_fields() {
        let payload = r#"[{
            "secret": "JBSWY3DPEHPK3PXP",
            "name": "alice",
            "digits": 8,
            "period": 60,
            "algorithm": "SHA256"
        }]"#;
        let entry = parse_otpauth_uri(&uris(payload)[0]).unwrap();
        assert_eq!(entry.digits, 8);
        assert_eq!(entry.kind, OtpKind::Totp { period: 60 });
        assert_eq!(entry.algorithm, Algorithm::Sha256);
    }

    #[test]
    fn hotp_tokens_start_at_counter_zero() {
        let payload = r#"[{"secret": "JBSWY3DPEHPK3PXP", "name": "alice", "type": "hotp"}]"#;
        let entry = parse_otpauth_uri(&uris(payload)[0]).unwrap();
        assert_eq!(entry.kind, OtpKind::Hotp { counter: 0 });
    }

    #[test]
    fn unknown_algorithm_falls_back_to_sha1() {
        let payload = r#"[{"secret": "JBSWY3DPEHPK3PXP", "name": "a", "algorithm": "OTPX"}]"#;
        let entry = parse_otpauth_uri(&uris(payload)[0]).unwrap();
        assert_eq!(entry.algorithm, Algorithm::Sha1);
    }

    #[test]
    fn blank_secret_tokens_are_skipped() {
        let payload = r#"[
            {"secret": "", "name": "ghost"},
            {"secret": "JBSWY3DPEHPK3PXP", "name": "alice"}
        ]"#;
        assert_eq!(uris(payload).len(), 1);
    }

    #[test]
    fn empty_or_all_blank_exports_fail() {
        for payload in ["[]", r#"[{"secret": "", "name": "ghost"}]"#] {
            match AuthyAdapter.parse(payload, None) {
                ImportResult::Failure { message, .. } => {
                    assert!(message.contains("No valid tokens"))
                }
                _ => panic!("expected failure"),
            }
        }
    }

    #[test]
    fn malformed_json_fails_with_cause() {
        match AuthyAdapter.parse("not json", None) {
            ImportResult::Failure { message, cause } => {
                assert!(message.contains("Failed to parse"));
                assert!(cause.is_some());
            }
            _ => panic!("expected failure"),
        }
    }

    #[test]
    fn missing_required_field_fails_with_cause() {
        match AuthyAdapter.parse(r#"[{"name": "no-secret"}]"#, None) {
            ImportResult::Failure { cause, .. } => assert!(cause.is_some()),
            _ => panic!("expected failure"),
        }
    }
}
