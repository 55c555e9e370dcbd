//! Import-adapter protocol and the bundled vendor adapters.
//!
//! Each adapter turns one third-party export format into canonical
//! `otpauth://` URIs. Supported out of the box:
//!
//! - Authy (JSON token array)
//! - 2FAS Authenticator (JSON `services` export)
//! - Ente Auth (plaintext `otpauth://` lines; encrypted exports are
//!   detected and refused with guidance)

mod authy;
mod ente;
mod twofas;

pub use authy::AuthyAdapter;
pub use ente::EnteAdapter;
pub use twofas::TwoFasAdapter;

use crate::types::ImportResult;

/// One third-party export format.
///
/// `parse` is total: adapters report problems as [`ImportResult::Failure`]
/// values and never panic. A success is all-or-nothing; adapters do not
/// return partial batches.
pub trait ImportAdapter {
    /// Human-readable source name, e.g. `"Authy"`.
    fn name(&self) -> &'static str;

    /// Whether `parse` needs the export password, so interactive hosts
    /// can prompt before calling. None of the bundled adapters do.
    fn requires_password(&self) -> bool {
        false
    }

    /// Normalize `payload` into canonical `otpauth://` URIs.
    fn parse(&self, payload: &str, password: Option<&str>) -> ImportResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_adapters_are_passwordless_and_distinct() {
        let adapters: [&dyn ImportAdapter; 3] = [&AuthyAdapter, &TwoFasAdapter, &EnteAdapter];
        let mut names = Vec::new();
        for adapter in adapters {
            assert!(!adapter.requires_password());
            names.push(adapter.name());
        }
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 3);
    }
}
