//! Session cookie construction.
//!
//! The token travels as the verbatim value of one cookie:
//! `HttpOnly`, `SameSite=Lax`, `Path=/`, `Max-Age` equal to the token lifetime,
//! and `Secure` everywhere except local development.

use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Default session cookie name
pub const DEFAULT_COOKIE_NAME: &str = "session";

/// Builds and reads the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookies {
    name: String,
    secure: bool,
}

impl Default for SessionCookies {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_NAME, true)
    }
}

impl SessionCookies {
    pub fn new(name: impl Into<String>, secure: bool) -> Self {
        Self {
            name: name.into(),
            secure,
        }
    }

    /// Cookie name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether cookies carry the `Secure` attribute
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Cookie carrying `token`, expiring with it.
    ///
    /// `Max-Age` has whole-second resolution; a fractional lifetime rounds up so
    /// the cookie never disappears while the token is still valid.
    pub fn session_cookie(&self, token: impl Into<String>, max_age: Duration) -> Cookie<'static> {
        let secs = max_age.as_millis().div_ceil(1000);
        let max_age = time::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX));

        Cookie::build((self.name.clone(), token.into()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(max_age)
            .build()
    }

    /// Cookie that identifies the session cookie for removal
    pub fn removal(&self) -> Cookie<'static> {
        Cookie::build((self.name.clone(), ""))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .build()
    }

    /// Token value from the jar, if the cookie is present and non-empty
    pub fn token<'a>(&self, jar: &'a CookieJar) -> Option<&'a str> {
        jar.get(&self.name)
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
    }

    /// Add the session cookie for `token` to `jar`
    pub fn set(&self, jar: CookieJar, token: impl Into<String>, max_age: Duration) -> CookieJar {
        jar.add(self.session_cookie(token, max_age))
    }

    /// Expire the session cookie in `jar`
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(self.removal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};
    use axum::response::IntoResponse;

    #[test]
    fn test_session_cookie_attributes() {
        let cookies = SessionCookies::new("sid", true);
        let cookie = cookies.session_cookie("abc.def", Duration::from_secs(3600));

        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.value(), "abc.def");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
    }

    #[test]
    fn test_fractional_lifetime_rounds_up() {
        let cookies = SessionCookies::default();

        let cookie = cookies.session_cookie("t", Duration::from_millis(500));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(1)));

        let cookie = cookies.session_cookie("t", Duration::from_millis(1500));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(2)));

        let cookie = cookies.session_cookie("t", Duration::from_millis(2000));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(2)));
    }

    #[test]
    fn test_development_cookie_not_secure() {
        let cookie = SessionCookies::new("session", false).session_cookie("t", Duration::from_secs(60));
        assert_eq!(cookie.secure(), Some(false));

        let header = cookie.to_string();
        assert!(header.contains("HttpOnly"));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn test_token_from_jar() {
        let cookies = SessionCookies::default();

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=abc.def"));
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(cookies.token(&jar), Some("abc.def"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session="));
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(cookies.token(&jar), None);

        assert_eq!(cookies.token(&CookieJar::new()), None);
    }

    #[test]
    fn test_clear_emits_expired_cookie() {
        let cookies = SessionCookies::default();
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session=abc.def"));
        let jar = cookies.clear(CookieJar::from_headers(&headers));

        let response = jar.into_response();
        let set_cookie: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();

        assert_eq!(set_cookie.len(), 1);
        assert!(set_cookie[0].starts_with("session=;"));
        assert!(set_cookie[0].contains("Max-Age=0"));
        assert!(set_cookie[0].contains("Path=/"));
    }
}
