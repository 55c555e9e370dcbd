//! `otpauth://` URI parsing and construction.
//!
//! Parsing is strict about structure (scheme, OTP type, `key=value`
//! query shape, a present secret, a known algorithm) and lenient about
//! optional numeric parameters, which fall back to their defaults when
//! missing or out of range.

use url::Url;

use crate::codec;
use crate::types::{
    Algorithm, OtpEntry, OtpKind, VaultError, VaultErrorKind, DEFAULT_DIGITS, DEFAULT_PERIOD,
};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse a single `otpauth://` URI into a credential description.
///
/// The label is percent-decoded and split on the first `:` into an
/// issuer prefix and the account name; an explicit `issuer` parameter
/// wins over the prefix.
pub fn parse_otpauth_uri(uri: &str) -> Result<OtpEntry, VaultError> {
    let parsed = Url::parse(uri).map_err(|e| {
        VaultError::new(VaultErrorKind::InvalidUri, "Malformed otpauth URI")
            .with_detail(e.to_string())
    })?;

    if parsed.scheme() != "otpauth" {
        return Err(VaultError::new(
            VaultErrorKind::InvalidUri,
            format!("Unsupported scheme '{}'", parsed.scheme()),
        ));
    }

    let decoded_label = codec::decode_uri_component(parsed.path().trim_start_matches('/'));
    let (label_issuer, account_name) = match decoded_label.split_once(':') {
        Some((issuer, account)) => (Some(issuer.trim().to_string()), account.trim().to_string()),
        None => (None, decoded_label.trim().to_string()),
    };

    let mut secret: Option<Vec<u8>> = None;
    let mut issuer_param: Option<String> = None;
    let mut algorithm = Algorithm::default();
    let mut digits = DEFAULT_DIGITS;
    let mut period = DEFAULT_PERIOD;
    let mut counter = 0u64;

    // The raw query is split by hand: `Url::query_pairs` form-decodes
    // values and silently accepts bare tokens, and the pair shape here
    // is part of the contract.
    for pair in parsed
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|p| !p.is_empty())
    {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            VaultError::new(
                VaultErrorKind::InvalidUri,
                format!("Malformed query parameter '{pair}'"),
            )
        })?;
        let value = codec::decode_uri_component(value);
        match key.to_lowercase().as_str() {
            "secret" => secret = Some(codec::decode_base32(&value)),
            "issuer" => issuer_param = Some(value),
            "algorithm" => {
                algorithm = Algorithm::from_str_loose(&value).ok_or_else(|| {
                    VaultError::new(
                        VaultErrorKind::InvalidUri,
                        format!("Unknown algorithm '{value}'"),
                    )
                })?;
            }
            "digits" => {
                if let Ok(d) = value.parse::<u8>() {
                    if (6..=10).contains(&d) {
                        digits = d;
                    }
                }
            }
            "period" => {
                if let Ok(p) = value.parse::<u32>() {
                    if p > 0 {
                        period = p;
                    }
                }
            }
            "counter" => counter = value.parse().unwrap_or(0),
            // Unknown parameters are ignored.
            _ => {}
        }
    }

    let secret = secret.ok_or_else(|| {
        VaultError::new(VaultErrorKind::InvalidUri, "Missing 'secret' parameter")
    })?;

    let kind = match parsed.host_str().unwrap_or_default().to_lowercase().as_str() {
        "totp" => OtpKind::Totp { period },
        "hotp" => OtpKind::Hotp { counter },
        other => {
            return Err(VaultError::new(
                VaultErrorKind::InvalidUri,
                format!("Unsupported OTP type '{other}'"),
            ))
        }
    };

    let mut entry = OtpEntry::new(kind, account_name, secret)
        .with_digits(digits)
        .with_algorithm(algorithm);
    if let Some(issuer) = issuer_param.or(label_issuer) {
        if !issuer.is_empty() {
            entry = entry.with_issuer(issuer);
        }
    }
    Ok(entry)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Construction
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Render a credential as a canonical `otpauth://` URI.
///
/// `secret` is always emitted (unpadded Base32) and so is the
/// type-specific parameter (`counter` / `period`); `issuer` when
/// present; `algorithm` and `digits` only off-default.
pub fn build_otpauth_uri(entry: &OtpEntry) -> String {
    let label = match &entry.issuer {
        Some(issuer) => format!(
            "{}:{}",
            codec::encode_uri_component(issuer),
            codec::encode_uri_component(&entry.label)
        ),
        None => codec::encode_uri_component(&entry.label),
    };

    let secret = codec::encode_base32(&entry.secret);
    let mut params = vec![format!("secret={}", secret.trim_end_matches('='))];
    if let Some(issuer) = &entry.issuer {
        params.push(format!("issuer={}", codec::encode_uri_component(issuer)));
    }
    if entry.algorithm != Algorithm::default() {
        params.push(format!("algorithm={}", entry.algorithm.uri_name()));
    }
    if entry.digits != DEFAULT_DIGITS {
        params.push(format!("digits={}", entry.digits));
    }
    match entry.kind {
        OtpKind::Hotp { counter } => params.push(format!("counter={counter}")),
        OtpKind::Totp { period } => params.push(format!("period={period}")),
    }

    format!(
        "otpauth://{}/{}?{}",
        entry.kind.uri_type(),
        label,
        params.join("&")
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
