//! HOTP and TOTP code generation (RFC 4226 / RFC 6238).
//!
//! Counter handling is pure: a counter-based entry is computed at its
//! stored counter and never advanced here. Time-based validation accepts
//! exactly one step of drift either side; counter-based validation is an
//! exact match.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::crypto;
use crate::types::{Algorithm, OtpEntry, OtpKind};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Code generation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// RFC 4226 HOTP: HMAC over the big-endian counter, dynamic truncation,
/// decimal reduction, left-padded with zeros to `digits`.
pub fn hotp_raw(key: &[u8], counter: u64, digits: u8, algorithm: Algorithm) -> String {
    let mac = crypto::hmac_sha(algorithm, key, &counter.to_be_bytes());
    truncate(&mac, digits)
}

/// RFC 4226 §5.3 dynamic truncation; works for any digest width.
fn truncate(mac: &[u8], digits: u8) -> String {
    let offset = (mac[mac.len() - 1] & 0x0f) as usize;
    let binary = ((u64::from(mac[offset]) & 0x7f) << 24)
        | (u64::from(mac[offset + 1]) << 16)
        | (u64::from(mac[offset + 2]) << 8)
        | u64::from(mac[offset + 3]);
    // 31-bit value; digit counts past 10 cannot add information.
    let modulus = 10u64.checked_pow(u32::from(digits)).unwrap_or(u64::MAX);
    format!("{:0>width$}", binary % modulus, width = usize::from(digits))
}

/// Time-step index for a unix timestamp (T0 = 0).
pub fn time_step_at(unix_seconds: u64, period: u32) -> u64 {
    unix_seconds / u64::from(period.max(1))
}

/// Current code for an entry at the given time. Counter-based entries
/// ignore the timestamp.
pub fn generate_at(entry: &OtpEntry, unix_seconds: u64) -> String {
    match entry.kind {
        OtpKind::Hotp { counter } => {
            hotp_raw(&entry.secret, counter, entry.digits, entry.algorithm)
        }
        OtpKind::Totp { period } => hotp_raw(
            &entry.secret,
            time_step_at(unix_seconds, period),
            entry.digits,
            entry.algorithm,
        ),
    }
}

/// Check a candidate code. Time-based entries accept the previous,
/// current, and next step; counter-based entries compare at the stored
/// counter only.
pub fn validate_at(entry: &OtpEntry, code: &str, unix_seconds: u64) -> bool {
    match entry.kind {
        OtpKind::Hotp { counter } => constant_time_eq(
            &hotp_raw(&entry.secret, counter, entry.digits, entry.algorithm),
            code,
        ),
        OtpKind::Totp { period } => {
            let step = time_step_at(unix_seconds, period);
            [step.saturating_sub(1), step, step.saturating_add(1)]
                .iter()
                .any(|&s| {
                    constant_time_eq(
                        &hotp_raw(&entry.secret, s, entry.digits, entry.algorithm),
                        code,
                    )
                })
        }
    }
}

/// Unix time at which the entry's next code becomes valid; 0 for
/// counter-based entries, which have no schedule.
pub fn next_code_at(entry: &OtpEntry, unix_seconds: u64) -> u64 {
    match entry.kind {
        OtpKind::Hotp { .. } => 0,
        OtpKind::Totp { period } => {
            (time_step_at(unix_seconds, period) + 1) * u64::from(period)
        }
    }
}

/// Constant-time comparison so code checks leak no prefix timing.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Seconds since the unix epoch.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
