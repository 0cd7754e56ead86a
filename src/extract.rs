//! Axum extractors for the caller's session.
//!
//! Handlers declare what they need and the extractor rejects early:
//!
//! ```rust,ignore
//! async fn profile(session: CurrentSession) -> impl IntoResponse {
//!     format!("Hello, {}", session.user.id)
//! }
//!
//! async fn landing(MaybeSession(session): MaybeSession) -> impl IntoResponse {
//!     match session {
//!         Some(s) => format!("Welcome back, {}", s.user.id),
//!         None => "Welcome".to_string(),
//!     }
//! }
//!
//! async fn refunds(admin: AdminSession) -> impl IntoResponse { /* ... */ }
//! ```
//!
//! The router state must provide a [`SessionContext`] through `FromRef`.

use std::convert::Infallible;
use std::ops::Deref;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{request::Parts, HeaderMap};
use axum_extra::extract::cookie::CookieJar;

use crate::cookie::SessionCookies;
use crate::error::AuthError;
use crate::observability::SecurityEvent;
use crate::session::{SessionCodec, SessionPayload, ADMIN_ROLE};

/// Codec and cookie settings shared by the extractors.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub codec: SessionCodec,
    pub cookies: SessionCookies,
}

impl SessionContext {
    pub fn new(codec: SessionCodec, cookies: SessionCookies) -> Self {
        Self { codec, cookies }
    }

    /// Decode the session cookie carried in `headers`, if any.
    pub fn session_from_headers(&self, headers: &HeaderMap) -> Option<SessionPayload> {
        let jar = CookieJar::from_headers(headers);
        self.cookies
            .token(&jar)
            .and_then(|token| self.codec.decode(token))
    }
}

/// Valid session of the caller. Rejects with 401 when absent or invalid.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionPayload);

impl Deref for CurrentSession {
    type Target = SessionPayload;

    fn deref(&self) -> &SessionPayload {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    SessionContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        SessionContext::from_ref(state)
            .session_from_headers(&parts.headers)
            .map(CurrentSession)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Session of the caller if there is a valid one. Never rejects.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<SessionPayload>);

impl<S> FromRequestParts<S> for MaybeSession
where
    SessionContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(
            SessionContext::from_ref(state).session_from_headers(&parts.headers),
        ))
    }
}

/// Valid session carrying the `admin` role.
///
/// 401 without a valid session, 403 when the user is not an admin.
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionPayload);

impl Deref for AdminSession {
    type Target = SessionPayload;

    fn deref(&self) -> &SessionPayload {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AdminSession
where
    SessionContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentSession(payload) = CurrentSession::from_request_parts(parts, state).await?;

        if !payload.user.is_admin() {
            crate::security_event!(
                SecurityEvent::AccessDenied,
                user_id = %payload.user.id,
                required_role = ADMIN_ROLE,
                path = %parts.uri.path(),
                "Admin role required"
            );
            return Err(AuthError::Forbidden);
        }

        Ok(AdminSession(payload))
    }
}
