//! 2FAS Authenticator export adapter.
//!
//! Reads the JSON backup's `services` list. Newer backups nest the OTP
//! parameters under an `otp` sub-object while older ones keep them on
//! the service itself; service-level fields win when both are present.
//! 2FAS backups describe time-based credentials only.

use serde::Deserialize;

use crate::codec;
use crate::import::ImportAdapter;
use crate::types::{Algorithm, ImportResult, OtpEntry, OtpKind, DEFAULT_DIGITS, DEFAULT_PERIOD};
use crate::uri;

/// Importer for 2FAS Authenticator backups.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoFasAdapter;

#[derive(Debug, Deserialize)]
struct TwoFasExport {
    services: Vec<TwoFasService>,
}

#[derive(Debug, Deserialize)]
struct TwoFasService {
    name: String,
    secret: String,
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    digits: Option<u8>,
    #[serde(default)]
    period: Option<u32>,
    #[serde(default)]
    algorithm: Option<String>,
    #[serde(default)]
    otp: Option<TwoFasOtpSection>,
}

#[derive(Debug, Default, Deserialize)]
struct TwoFasOtpSection {
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    digits: Option<u8>,
    #[serde(default)]
    period: Option<u32>,
    #[serde(default)]
    algorithm: Option<String>,
}

/// One service to one canonical URI; `None` drops services with no
/// secret. The service name becomes the issuer.
fn service_to_uri(service: &TwoFasService) -> Option<String> {
    let secret = codec::decode_base32(&service.secret);
    if secret.is_empty() {
        return None;
    }
    let otp = service.otp.as_ref();

    let account = service
        .account
        .clone()
        .or_else(|| otp.and_then(|o| o.account.clone()))
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    let digits = service
        .digits
        .or_else(|| otp.and_then(|o| o.digits))
        .filter(|d| (6..=10).contains(d))
        .unwrap_or(DEFAULT_DIGITS);
    let period = service
        .period
        .or_else(|| otp.and_then(|o| o.period))
        .filter(|p| *p > 0)
        .unwrap_or(DEFAULT_PERIOD);
    let algorithm = service
        .algorithm
        .clone()
        .or_else(|| otp.and_then(|o| o.algorithm.clone()))
        .as_deref()
        .and_then(Algorithm::from_str_loose)
        .unwrap_or_default();

    let entry = OtpEntry::new(OtpKind::Totp { period }, account, secret)
        .with_issuer(service.name.clone())
        .with_digits(digits)
        .with_algorithm(algorithm);
    Some(uri::build_otpauth_uri(&entry))
}

impl ImportAdapter for TwoFasAdapter {
    fn name(&self) -> &'static str {
        "2FAS Authenticator"
    }

    fn parse(&self, payload: &str, _password: Option<&str>) -> ImportResult {
        let export: TwoFasExport = match serde_json::from_str(payload) {
            Ok(export) => export,
            Err(e) => {
                return ImportResult::failure_with_cause(
                    "Failed to parse 2FAS export file",
                    e.to_string(),
                )
            }
        };

        let uris: Vec<String> = export.services.iter().filter_map(service_to_uri).collect();
        if uris.is_empty() {
            return ImportResult::failure("No valid services found in the 2FAS export file");
        }
        ImportResult::success(uris)
    }
}
