//! Signed Session Tokens
//!
//! A session token is the whole session: a compact JSON payload carrying the user
//! identity and validity bounds, URL-safe base64 encoded, followed by `.` and an
//! HMAC-SHA256 signature over the encoded payload.
//!
//! ```text
//! eyJ1c2VyIjp7ImlkIjoidS0xIn0sImlzc3VlZEF0IjoxNzAw...  .  Zk3l0x4n0n5...
//! └──────────── base64url(json(SessionPayload)) ──────┘     └ base64url(hmac) ┘
//! ```
//!
//! Tokens are not encrypted; anyone holding one can read the payload. They are
//! tamper-evident: changing any character invalidates the signature.
//!
//! # Validity
//!
//! [`SessionCodec::decode`] accepts a token only when the signature verifies, the
//! payload parses with a non-blank `user.id`, `expiresAt` is in the future, and
//! `version` matches the codec's version. Every other outcome is `None`; callers
//! treat a missing, malformed, forged or expired token the same way, as an
//! unauthenticated request.
//!
//! # Revocation
//!
//! There is no server-side state, so a single token cannot be revoked before it
//! expires. Raising [`CURRENT_VERSION`] (or configuring a codec with
//! [`SessionCodec::with_version`]) invalidates every outstanding token at once.
//!
//! # Usage
//!
//! ```
//! use vestibule::{SessionCodec, SessionSecret, SessionUser};
//!
//! let secret = SessionSecret::new("0123456789abcdef0123456789abcdef").unwrap();
//! let codec = SessionCodec::new(secret);
//!
//! let token = codec.encode(&SessionUser::new("user-42"), None).unwrap();
//! let payload = codec.decode(&token).expect("fresh token verifies");
//! assert_eq!(payload.user.id, "user-42");
//!
//! assert!(codec.decode("not-a-token").is_none());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::clock::{duration_millis, Clock, SystemClock};
use crate::crypto::{constant_time_str_eq, sign};
use crate::observability::SecurityEvent;
use crate::secret::SessionSecret;

/// Payload schema version accepted by default.
///
/// Raise it to invalidate every token minted under the previous value.
pub const CURRENT_VERSION: u32 = 1;

/// Token lifetime when the caller does not pass one (24 hours).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Role tag granting access to admin operations
pub const ADMIN_ROLE: &str = "admin";

// ============================================================================
// Payload
// ============================================================================

/// Identity carried inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Stable account identifier
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Role tags such as `"admin"`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl SessionUser {
    /// User with only an id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
            roles: Vec::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Whether the user carries `role`
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Whether the user carries [`ADMIN_ROLE`]
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Authenticated identity plus validity bounds.
///
/// Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub user: SessionUser,
    pub issued_at: i64,
    pub expires_at: i64,
    pub version: u32,
}

impl SessionPayload {
    /// Milliseconds of validity left at `now_millis`, zero once expired
    pub fn remaining_millis(&self, now_millis: i64) -> i64 {
        (self.expires_at - now_millis).max(0)
    }

    /// Total validity window the token was minted with
    pub fn lifetime(&self) -> Duration {
        Duration::from_millis((self.expires_at - self.issued_at).max(0) as u64)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Invalid arguments to [`SessionCodec::encode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// `user.id` is empty or whitespace
    #[error("session user id must not be empty")]
    EmptyUserId,

    /// A zero lifetime would mint an already-expired token
    #[error("session max age must be positive")]
    NonPositiveMaxAge,

    /// Payload could not be serialized
    #[error("failed to serialize session payload: {0}")]
    Serialize(String),
}

/// Why a token was rejected. Logged, never returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Malformed,
    BadSignature,
    BadPayload,
    MissingUserId,
    Expired,
    VersionMismatch,
}

impl Rejection {
    fn code(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::BadSignature => "bad_signature",
            Self::BadPayload => "bad_payload",
            Self::MissingUserId => "missing_user_id",
            Self::Expired => "expired",
            Self::VersionMismatch => "version_mismatch",
        }
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Mints and verifies session tokens.
///
/// Construction requires a validated [`SessionSecret`], so a codec with a missing
/// or short key cannot exist. Cheap to clone; clones share the clock.
#[derive(Clone)]
pub struct SessionCodec {
    secret: SessionSecret,
    version: u32,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCodec")
            .field("secret", &self.secret)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl SessionCodec {
    /// Codec using the wall clock and [`CURRENT_VERSION`]
    pub fn new(secret: SessionSecret) -> Self {
        Self {
            secret,
            version: CURRENT_VERSION,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Mint and accept a different payload version
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Payload version this codec mints and accepts
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Current time according to the codec's clock
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Mint a token for `user`, valid for `max_age` (default 24 hours).
    pub fn encode(
        &self,
        user: &SessionUser,
        max_age: Option<Duration>,
    ) -> Result<String, SessionError> {
        self.encode_payload(&self.issue(user, max_age)?)
    }

    /// Build the payload [`encode`](Self::encode) would sign.
    pub fn issue(
        &self,
        user: &SessionUser,
        max_age: Option<Duration>,
    ) -> Result<SessionPayload, SessionError> {
        if user.id.trim().is_empty() {
            return Err(SessionError::EmptyUserId);
        }

        let max_age = max_age.unwrap_or(DEFAULT_MAX_AGE);
        if max_age.is_zero() {
            return Err(SessionError::NonPositiveMaxAge);
        }

        let issued_at = self.clock.now_millis();
        Ok(SessionPayload {
            user: user.clone(),
            issued_at,
            expires_at: issued_at.saturating_add(duration_millis(max_age)),
            version: self.version,
        })
    }

    /// Sign an already-built payload.
    pub fn encode_payload(&self, payload: &SessionPayload) -> Result<String, SessionError> {
        let json =
            serde_json::to_vec(payload).map_err(|e| SessionError::Serialize(e.to_string()))?;
        let encoded = URL_SAFE_NO_PAD.encode(json);
        let signature = sign(self.secret.as_bytes(), encoded.as_bytes());
        Ok(format!("{}.{}", encoded, signature))
    }

    /// Mint a new token for the same user with a fresh validity window.
    ///
    /// The old token stays valid until it expires; the caller replaces the cookie.
    pub fn refresh(
        &self,
        payload: &SessionPayload,
        max_age: Option<Duration>,
    ) -> Result<String, SessionError> {
        let token = self.encode(&payload.user, max_age)?;
        crate::security_event!(
            SecurityEvent::SessionRefreshed,
            user_id = %payload.user.id,
            "Session refreshed"
        );
        Ok(token)
    }

    /// Verify a token and recover its payload.
    ///
    /// Returns `None` for anything that is not a currently valid token from this
    /// codec. Never panics on arbitrary input.
    pub fn decode(&self, token: &str) -> Option<SessionPayload> {
        match self.verify(token) {
            Ok(payload) => Some(payload),
            Err(rejection) => {
                crate::security_event!(
                    SecurityEvent::SessionRejected,
                    reason = rejection.code(),
                    "Session token rejected"
                );
                None
            }
        }
    }

    fn verify(&self, token: &str) -> Result<SessionPayload, Rejection> {
        let (encoded, signature) = token.split_once('.').ok_or(Rejection::Malformed)?;
        if encoded.is_empty() || signature.is_empty() || signature.contains('.') {
            return Err(Rejection::Malformed);
        }

        let expected = sign(self.secret.as_bytes(), encoded.as_bytes());
        if !constant_time_str_eq(signature, &expected) {
            return Err(Rejection::BadSignature);
        }

        let json = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| Rejection::BadPayload)?;
        let payload: SessionPayload =
            serde_json::from_slice(&json).map_err(|_| Rejection::BadPayload)?;

        if payload.user.id.trim().is_empty() {
            return Err(Rejection::MissingUserId);
        }
        if payload.expires_at <= self.clock.now_millis() {
            return Err(Rejection::Expired);
        }
        if payload.version != self.version {
            return Err(Rejection::VersionMismatch);
        }

        Ok(payload)
    }
}

// ============================================================================
// Tests
// ============================================================================
