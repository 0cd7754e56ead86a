//! Cryptographic primitives for session tokens
//!
//! - **HMAC-SHA256 signing** of the encoded payload, emitted as URL-safe base64
//!   without padding so the token can travel verbatim in a cookie.
//! - **Constant-time comparison** of signatures so response timing does not reveal
//!   how many leading characters of a forged signature were correct.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Performs constant-time comparison of two byte slices.
///
/// Lengths are compared first; signature lengths are public, so returning early on
/// a length mismatch leaks nothing. Equal-length inputs are compared with
/// `subtle`, which inspects every byte regardless of where the first difference is.
///
/// ```rust
/// use vestibule::constant_time_eq;
///
/// assert!(constant_time_eq(b"abc123", b"abc123"));
/// assert!(!constant_time_eq(b"abc123", b"abc124"));
/// assert!(!constant_time_eq(b"abc", b"abc123"));
/// ```
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Performs constant-time comparison of two strings.
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// HMAC-SHA256 of `message` under `key`, URL-safe base64 encoded without padding.
pub(crate) fn sign(key: &[u8], message: &[u8]) -> String {
    // HMAC is defined for keys of any length, so `new_from_slice` cannot fail here.
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    };
    mac.update(message);
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}
