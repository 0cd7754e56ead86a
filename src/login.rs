//! Login Throttling and Session Establishment
//!
//! [`LoginGuard`] ties the pieces together for a login handler: it throttles
//! attempts per client IP and identity through the [`RateLimiter`], mints a
//! session token on success, and writes or clears the session cookie.
//!
//! Credential verification is the application's job; the guard only sees the
//! outcome.
//!
//! # Usage
//!
//! ```ignore
//! use vestibule::{AuthError, LoginGuard, SessionUser};
//!
//! async fn login(
//!     State(guard): State<LoginGuard>,
//!     ConnectInfo(addr): ConnectInfo<SocketAddr>,
//!     jar: CookieJar,
//!     Json(form): Json<LoginForm>,
//! ) -> Result<CookieJar, AuthError> {
//!     // Check quota BEFORE touching the password hash
//!     guard.check_attempt(addr.ip(), &form.email)?;
//!
//!     let Some(account) = accounts.verify(&form.email, &form.password).await? else {
//!         guard.record_failure(addr.ip(), &form.email);
//!         return Err(AuthError::Unauthenticated);
//!     };
//!
//!     guard.clear_attempts(addr.ip(), &form.email);
//!     guard.establish(jar, &SessionUser::new(account.id).with_email(account.email))
//! }
//! ```

use std::net::IpAddr;
use std::time::Duration;

use axum_extra::extract::cookie::CookieJar;

use crate::error::AuthError;
use crate::extract::SessionContext;
use crate::observability::SecurityEvent;
use crate::rate_limit::{RateLimitDecision, RateLimiter};
use crate::session::{SessionPayload, SessionUser, DEFAULT_MAX_AGE};

// ============================================================================
// Login Policy
// ============================================================================

/// Login throttling and session lifetime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginPolicy {
    /// Attempts allowed per window for one IP and identity
    pub max_attempts: u32,

    /// Attempt counting window
    pub window: Duration,

    /// Lifetime of sessions established after a successful login
    pub session_max_age: Duration,
}

impl Default for LoginPolicy {
    /// 5 attempts per minute, 24 hour sessions
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(60),
            session_max_age: DEFAULT_MAX_AGE,
        }
    }
}

/// Canonical form of a login identity: trimmed and lowercased.
pub fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}

/// Rate limit key for login attempts from `ip` against `identity`
pub fn attempt_key(ip: IpAddr, identity: &str) -> String {
    format!("login:{}:{}", ip, normalize_identity(identity))
}

// ============================================================================
// Login Guard
// ============================================================================

/// Login handler helper. Cheap to clone; use it as axum state.
#[derive(Debug, Clone)]
pub struct LoginGuard {
    context: SessionContext,
    limiter: RateLimiter,
    policy: LoginPolicy,
}

impl LoginGuard {
    pub fn new(context: SessionContext, limiter: RateLimiter) -> Self {
        Self {
            context,
            limiter,
            policy: LoginPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: LoginPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &LoginPolicy {
        &self.policy
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Spend one login attempt for `ip` and `identity`.
    ///
    /// Call before verifying credentials. Every attempt counts, successful or not.
    pub fn check_attempt(&self, ip: IpAddr, identity: &str) -> Result<RateLimitDecision, AuthError> {
        let decision = self.limiter.consume(
            &attempt_key(ip, identity),
            self.policy.max_attempts,
            self.policy.window,
        );

        match decision.retry_after_secs {
            Some(retry_after_secs) if !decision.allowed => {
                Err(AuthError::RateLimited { retry_after_secs })
            }
            _ => Ok(decision),
        }
    }

    /// Log a rejected credential check
    pub fn record_failure(&self, ip: IpAddr, identity: &str) {
        crate::security_event!(
            SecurityEvent::AuthenticationFailure,
            client_ip = %ip,
            identity = %normalize_identity(identity),
            "Login failed"
        );
    }

    /// Forget the attempt counter for `ip` and `identity`, typically after a success
    pub fn clear_attempts(&self, ip: IpAddr, identity: &str) {
        self.limiter.reset(&attempt_key(ip, identity));
    }

    /// Mint a session for `user` and attach its cookie.
    pub fn establish(&self, jar: CookieJar, user: &SessionUser) -> Result<CookieJar, AuthError> {
        let max_age = self.policy.session_max_age;
        let token = self.context.codec.encode(user, Some(max_age))?;

        crate::security_event!(
            SecurityEvent::AuthenticationSuccess,
            user_id = %user.id,
            "Login succeeded"
        );
        crate::security_event!(
            SecurityEvent::SessionCreated,
            user_id = %user.id,
            max_age_secs = max_age.as_secs(),
            "Session created"
        );

        Ok(self.context.cookies.set(jar, token, max_age))
    }

    /// Replace the session cookie with a fresh token for the same user.
    pub fn refresh(&self, jar: CookieJar, payload: &SessionPayload) -> Result<CookieJar, AuthError> {
        let max_age = self.policy.session_max_age;
        let token = self.context.codec.refresh(payload, Some(max_age))?;
        Ok(self.context.cookies.set(jar, token, max_age))
    }

    /// Expire the session cookie.
    ///
    /// The token itself stays valid until it expires.
    pub fn logout(&self, jar: CookieJar) -> CookieJar {
        let user_id = self
            .context
            .cookies
            .token(&jar)
            .and_then(|token| self.context.codec.decode(token))
            .map(|payload| payload.user.id);

        crate::security_event!(
            SecurityEvent::Logout,
            user_id = user_id.as_deref().unwrap_or("-"),
            "Session cookie cleared"
        );

        self.context.cookies.clear(jar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::testing::{jar_with_cookie, test_context};
    use std::net::Ipv4Addr;

    const T0: i64 = 1_700_000_000_000;
    const CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7));

    fn guard_at(clock: &ManualClock) -> LoginGuard {
        LoginGuard::new(
            test_context(clock.clone()),
            RateLimiter::in_memory().with_clock(clock.clone()),
        )
    }

    #[test]
    fn test_attempt_key_normalizes_identity() {
        assert_eq!(
            attempt_key(CLIENT, "  Ada@Example.COM "),
            "login:203.0.113.7:ada@example.com"
        );
        assert_eq!(normalize_identity("\tBOB\n"), "bob");
    }

    #[test]
    fn test_check_attempt_throttles() {
        let clock = ManualClock::new(T0);
        let guard = guard_at(&clock);

        for expected_remaining in (0..5).rev() {
            let decision = guard.check_attempt(CLIENT, "ada@example.com").unwrap();
            assert_eq!(decision.remaining, expected_remaining);
        }

        match guard.check_attempt(CLIENT, "ADA@example.com ") {
            Err(AuthError::RateLimited { retry_after_secs }) => assert_eq!(retry_after_secs, 60),
            other => panic!("expected rate limit, got {:?}", other),
        }

        // Other identities and addresses are unaffected
        assert!(guard.check_attempt(CLIENT, "bob@example.com").is_ok());
        assert!(guard
            .check_attempt(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 1)), "ada@example.com")
            .is_ok());

        clock.advance(Duration::from_secs(60));
        assert!(guard.check_attempt(CLIENT, "ada@example.com").is_ok());
    }

    #[test]
    fn test_clear_attempts() {
        let clock = ManualClock::new(T0);
        let guard = guard_at(&clock).with_policy(LoginPolicy {
            max_attempts: 1,
            ..LoginPolicy::default()
        });

        guard.check_attempt(CLIENT, "ada").unwrap();
        guard.record_failure(CLIENT, "ada");
        assert!(guard.check_attempt(CLIENT, "ada").is_err());

        guard.clear_attempts(CLIENT, " ADA ");
        assert!(guard.check_attempt(CLIENT, "ada").is_ok());
    }

    #[test]
    fn test_establish_sets_verifiable_cookie() {
        let clock = ManualClock::new(T0);
        let guard = guard_at(&clock);
        let user = SessionUser::new("usr_1").with_email("ada@example.com");

        let jar = guard.establish(CookieJar::new(), &user).unwrap();
        let cookie = jar.get("session").unwrap();
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(86_400)));

        let payload = guard.context().codec.decode(cookie.value()).unwrap();
        assert_eq!(payload.user, user);
    }

    #[test]
    fn test_establish_rejects_blank_user() {
        let guard = guard_at(&ManualClock::new(T0));
        assert!(matches!(
            guard.establish(CookieJar::new(), &SessionUser::new(" ")),
            Err(AuthError::Internal(_))
        ));
    }

    #[test]
    fn test_refresh_replaces_token() {
        let clock = ManualClock::new(T0);
        let guard = guard_at(&clock);

        let jar = guard.establish(CookieJar::new(), &SessionUser::new("usr_1")).unwrap();
        let original = jar.get("session").unwrap().value().to_string();
        let payload = guard.context().codec.decode(&original).unwrap();

        clock.advance(Duration::from_secs(3600));
        let jar = guard.refresh(jar, &payload).unwrap();
        let refreshed = jar.get("session").unwrap().value().to_string();
        assert_ne!(original, refreshed);

        let renewed = guard.context().codec.decode(&refreshed).unwrap();
        assert_eq!(renewed.issued_at, T0 + 3_600_000);
    }

    #[test]
    fn test_logout_removes_cookie() {
        let clock = ManualClock::new(T0);
        let guard = guard_at(&clock);
        let token = guard
            .context()
            .codec
            .encode(&SessionUser::new("usr_1"), None)
            .unwrap();

        let jar = guard.logout(jar_with_cookie("session", &token));
        assert!(jar.get("session").is_none());
    }
}
