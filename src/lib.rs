//! # Vestibule
//!
//! Stateless session tokens and login throttling for Axum applications.
//!
//! A session is a signed token in a cookie; nothing is stored server-side. A
//! fixed-window rate limiter keeps repeated login attempts in check.
//!
//! ## Features
//!
//! - **Session tokens**: HMAC-SHA256 signed, base64url JSON payloads with expiry
//!   and a schema version for mass revocation
//! - **Rate limiting**: fixed-window per-key counters over a pluggable store
//! - **Extractors**: `CurrentSession`, `MaybeSession` and `AdminSession`
//! - **Login guard**: attempt throttling, session cookie issue and removal
//! - **Structured logging**: security events through `tracing`
//! - **Startup validation**: a missing or short signing secret fails fast
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::{Router, routing::{get, post}};
//! use vestibule::{VestibuleConfig, CurrentSession};
//! use vestibule::observability::{init, ObservabilityConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     init(ObservabilityConfig::from_env())?;
//!
//!     // Fails here, not on the first request, if SESSION_SECRET is unusable
//!     let config = VestibuleConfig::from_env()?;
//!
//!     let app = Router::new()
//!         .route("/me", get(|s: CurrentSession| async move { s.user.id.clone() }))
//!         .with_state(config.session_context());
//!
//!     // Serve...
//!     Ok(())
//! }
//! ```

mod clock;
mod config;
mod cookie;
mod crypto;
mod error;
mod extract;
mod login;
pub mod observability;
mod parse;
mod rate_limit;
pub mod secret;
mod session;
pub mod testing;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Environment, VestibuleConfig, VestibuleConfigBuilder};
pub use cookie::{SessionCookies, DEFAULT_COOKIE_NAME};
pub use crypto::{constant_time_eq, constant_time_str_eq};
pub use error::{AuthError, ConfigError, ErrorResponse};
pub use extract::{AdminSession, CurrentSession, MaybeSession, SessionContext};
pub use login::{attempt_key, normalize_identity, LoginGuard, LoginPolicy};
pub use observability::ObservabilityConfigBuilder;
pub use parse::parse_duration;
pub use rate_limit::{
    MemoryRateLimitStore, RateLimitDecision, RateLimitRecord, RateLimitStore, RateLimiter,
};
pub use secret::{SecretError, SessionSecret, MIN_SECRET_LENGTH};
pub use session::{
    SessionCodec, SessionError, SessionPayload, SessionUser, ADMIN_ROLE, CURRENT_VERSION,
    DEFAULT_MAX_AGE,
};
