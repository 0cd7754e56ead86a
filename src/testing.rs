//! Session Testing Utilities
//!
//! Helpers for exercising session handling in application tests: a fixed
//! signing secret, codecs on a controllable clock, tampered and malformed token
//! generators, and cookie jars carrying a given token.
//!
//! # Usage
//!
//! ```ignore
//! use vestibule::testing::{malformed_tokens, test_context};
//! use vestibule::ManualClock;
//!
//! #[tokio::test]
//! async fn test_orders_require_session() {
//!     let context = test_context(ManualClock::new(0));
//!     let app = app(context);
//!
//!     for token in malformed_tokens() {
//!         let response = get(&app, "/orders", &format!("session={}", token)).await;
//!         assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
//!     }
//! }
//! ```

use axum::http::{header, HeaderMap, HeaderValue};
use axum_extra::extract::cookie::CookieJar;

use crate::clock::ManualClock;
use crate::cookie::SessionCookies;
use crate::extract::SessionContext;
use crate::secret::SessionSecret;
use crate::session::SessionCodec;

/// Fixed 40-character signing secret. Never use outside tests.
pub const TEST_SECRET: &str = "test-only-signing-key-0123456789abcdefXY";

/// [`TEST_SECRET`] as a validated secret
pub fn test_secret() -> SessionSecret {
    match SessionSecret::new(TEST_SECRET) {
        Ok(secret) => secret,
        Err(e) => unreachable!("TEST_SECRET is valid: {}", e),
    }
}

/// Codec over [`TEST_SECRET`] reading the wall clock
pub fn test_codec() -> SessionCodec {
    SessionCodec::new(test_secret())
}

/// Extractor state over [`TEST_SECRET`] and `clock`, with the default
/// `session` cookie name and the `Secure` attribute off
pub fn test_context(clock: ManualClock) -> SessionContext {
    SessionContext::new(
        test_codec().with_clock(clock),
        SessionCookies::new(crate::cookie::DEFAULT_COOKIE_NAME, false),
    )
}

/// Replace the character at `index` with a different base64url character.
///
/// Panics if `index` is out of bounds.
pub fn flip_char(token: &str, index: usize) -> String {
    let mut chars: Vec<char> = token.chars().collect();
    chars[index] = match chars[index] {
        'A' => 'B',
        '.' => '_',
        _ => 'A',
    };
    chars.into_iter().collect()
}

/// Token-shaped inputs that must never verify
pub fn malformed_tokens() -> Vec<&'static str> {
    vec![
        // Structure
        "",
        "not-a-token",
        "a.b.c",
        ".",
        "..",
        "abc.",
        ".abc",
        "a..b",
        // Encoding
        "%%%.%%%",
        "eyJ1c2VyIjp7fX0.===",
        "\u{0}.\u{0}",
        "🙂.🙂",
        // Algorithm confusion
        "eyJhbGciOiJub25lIn0.eyJzdWIiOiJhZG1pbiJ9.",
        "eyJhbGciOiJub25lIn0.",
    ]
}

/// Cookie jar as the server would see it for a request carrying `name=value`
pub fn jar_with_cookie(name: &str, value: &str) -> CookieJar {
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = HeaderValue::from_str(&format!("{}={}", name, value)) {
        headers.insert(header::COOKIE, cookie);
    }
    CookieJar::from_headers(&headers)
}
