//! Ente Auth export adapter.
//!
//! Plaintext exports are `otpauth://` URIs, one per line. Encrypted
//! exports are a JSON envelope whose payload this engine cannot decrypt
//! (Ente uses its own KDF and cipher); those are detected and refused
//! with a pointer to re-export as plain text.

use serde::Deserialize;

use crate::import::ImportAdapter;
use crate::types::ImportResult;

/// Importer for Ente Auth plaintext exports.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnteAdapter;

/// Just enough of the encrypted-export envelope to recognize it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnteEnvelope {
    #[serde(default)]
    encrypted_data: Option<String>,
}

impl ImportAdapter for EnteAdapter {
    fn name(&self) -> &'static str {
        "Ente Auth"
    }

    fn parse(&self, payload: &str, _password: Option<&str>) -> ImportResult {
        let trimmed = payload.trim_start();
        if trimmed.starts_with('{') {
            return match serde_json::from_str::<EnteEnvelope>(trimmed) {
                Ok(envelope) if envelope.encrypted_data.is_some() => ImportResult::failure(
                    "Encrypted Ente Auth exports are not supported – decrypt the export in \
                     Ente Auth and re-export as plain text (otpauth:// URIs)",
                ),
                Ok(_) => ImportResult::failure("Unrecognized Ente Auth export format"),
                Err(e) => ImportResult::failure_with_cause(
                    "Failed to parse Ente Auth export JSON",
                    e.to_string(),
                ),
            };
        }

        let uris: Vec<String> = payload
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("otpauth://"))
            .map(str::to_string)
            .collect();
        if uris.is_empty() {
            return ImportResult::failure(
                "No otpauth:// URIs found in the Ente Auth plaintext export",
            );
        }
        ImportResult::success(uris)
    }
}
