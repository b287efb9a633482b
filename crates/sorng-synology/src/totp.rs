//! One-time codes for the DSM second factor.
//!
//! RFC 6238 TOTP over RFC 4226 HOTP, fixed to HMAC-SHA-1 with 6 digits and
//! 30-second steps.

use crate::error::{SynologyError, SynologyResult};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;
use std::fmt;

pub const TOTP_DIGITS: u32 = 6;
pub const TOTP_PERIOD_SECS: u64 = 30;

/// A freshly computed code. Never cached: a new one is derived for every
/// login attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OneTimeCode {
    /// Zero-padded decimal code.
    pub code: String,
    /// Time-step counter the code was derived from.
    pub counter: u64,
    /// Seconds until the step rolls over.
    pub remaining_seconds: u64,
}

/// Generator bound to a decoded shared secret.
#[derive(Clone)]
pub struct TotpGenerator {
    key: Vec<u8>,
}

impl fmt::Debug for TotpGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TotpGenerator")
            .field("key", &"***")
            .finish()
    }
}

impl TotpGenerator {
    /// Decode a base-32 secret. Fails with `InvalidSecret` when it is empty
    /// or undecodable.
    pub fn new(secret_b32: &str) -> SynologyResult<Self> {
        Ok(Self {
            key: decode_secret(secret_b32)?,
        })
    }

    /// Code for the current wall-clock time.
    pub fn generate(&self) -> SynologyResult<OneTimeCode> {
        self.generate_at(current_unix_time())
    }

    /// Code for an explicit unix timestamp.
    pub fn generate_at(&self, unix_seconds: u64) -> SynologyResult<OneTimeCode> {
        let counter = time_step_at(unix_seconds);
        Ok(OneTimeCode {
            code: hotp(&self.key, counter)?,
            counter,
            remaining_seconds: seconds_remaining_at(unix_seconds),
        })
    }
}

/// `floor(unix / 30)`.
pub fn time_step_at(unix_seconds: u64) -> u64 {
    unix_seconds / TOTP_PERIOD_SECS
}

pub fn seconds_remaining_at(unix_seconds: u64) -> u64 {
    TOTP_PERIOD_SECS - (unix_seconds % TOTP_PERIOD_SECS)
}

/// HOTP with dynamic truncation (RFC 4226 §5.3).
fn hotp(key: &[u8], counter: u64) -> SynologyResult<String> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key)
        .map_err(|e| SynologyError::invalid_secret(format!("Unusable TOTP key: {}", e)))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);
    let code = binary % 10u32.pow(TOTP_DIGITS);
    Ok(format!("{:0>width$}", code, width = TOTP_DIGITS as usize))
}

/// Decode a base-32 secret the way authenticator apps accept it:
/// case-insensitive, spaces and dashes ignored, padding optional.
pub fn decode_secret(b32: &str) -> SynologyResult<Vec<u8>> {
    let cleaned: String = b32
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect::<String>()
        .to_uppercase();
    let cleaned = cleaned.trim_end_matches('=');
    if cleaned.is_empty() {
        return Err(SynologyError::invalid_secret("TOTP secret is empty"));
    }
    match base32::decode(base32::Alphabet::Rfc4648 { padding: false }, cleaned) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(SynologyError::invalid_secret("Invalid base-32 TOTP secret")),
    }
}

fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
