//! Session configuration
//!
//! Everything the session layer needs from the environment, validated once at
//! startup. A missing or short `SESSION_SECRET` fails here, before the server
//! accepts a request.

use std::time::Duration;

use crate::cookie::{SessionCookies, DEFAULT_COOKIE_NAME};
use crate::error::ConfigError;
use crate::extract::SessionContext;
use crate::login::{LoginGuard, LoginPolicy};
use crate::parse::parse_duration;
use crate::rate_limit::RateLimiter;
use crate::secret::{SecretError, SecretPolicy, SessionSecret};
use crate::session::{SessionCodec, DEFAULT_MAX_AGE};

/// Deployment environment.
///
/// Only [`Environment::Development`] drops the `Secure` cookie attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    /// Parse an environment name. `staging` counts as production.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Some(Self::Development),
            "test" | "testing" => Some(Self::Test),
            "production" | "prod" | "staging" | "stage" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }

    /// Whether session cookies carry `Secure`
    pub fn secure_cookies(&self) -> bool {
        !matches!(self, Self::Development)
    }
}

/// Session layer configuration.
///
/// # Example
///
/// ```ignore
/// use vestibule::VestibuleConfig;
///
/// // Load from environment variables, failing fast on a bad secret
/// let config = VestibuleConfig::from_env()?;
///
/// // Or build programmatically
/// let config = VestibuleConfig::builder(SessionSecret::new(secret)?)
///     .environment(Environment::Production)
///     .session_max_age(Duration::from_secs(8 * 60 * 60))
///     .login_rate_limit(10, Duration::from_secs(300))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct VestibuleConfig {
    /// Token signing key
    pub secret: SessionSecret,

    /// Deployment environment
    pub environment: Environment,

    /// Session cookie name
    pub cookie_name: String,

    /// Session token lifetime
    pub session_max_age: Duration,

    /// Login attempts allowed per window, per client IP and identity
    pub login_rate_limit: u32,

    /// Login attempt window
    pub login_rate_window: Duration,
}

impl VestibuleConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SESSION_SECRET`: signing key, at least 32 characters (required)
    /// - `APP_ENV` or `RUST_ENV`: "development", "test", "production" (default: "development")
    /// - `SESSION_COOKIE_NAME`: cookie name (default: "session")
    /// - `SESSION_MAX_AGE`: e.g., "8h", "1d" (default: "24h")
    /// - `LOGIN_RATE_LIMIT`: attempts per window (default: 5)
    /// - `LOGIN_RATE_WINDOW`: e.g., "60s", "5m" (default: "60s")
    ///
    /// Advisory secret findings are logged, not returned.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = SessionSecret::new(lookup("SESSION_SECRET").ok_or(SecretError::Missing)?)?;

        let environment = match lookup("APP_ENV").or_else(|| lookup("RUST_ENV")) {
            Some(name) => Environment::from_name(&name).ok_or_else(|| {
                ConfigError::invalid("APP_ENV", name, "expected development, test or production")
            })?,
            None => Environment::default(),
        };

        let cookie_name = lookup("SESSION_COOKIE_NAME")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());

        let session_max_age = match lookup("SESSION_MAX_AGE") {
            Some(value) => whole_seconds("SESSION_MAX_AGE", value)?,
            None => DEFAULT_MAX_AGE,
        };

        let login_rate_limit = match lookup("LOGIN_RATE_LIMIT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("LOGIN_RATE_LIMIT", value, "expected a whole number"))?,
            None => LoginPolicy::default().max_attempts,
        };

        let login_rate_window = match lookup("LOGIN_RATE_WINDOW") {
            Some(value) => positive_duration("LOGIN_RATE_WINDOW", value)?,
            None => LoginPolicy::default().window,
        };

        SecretPolicy::for_environment(environment.as_str()).review_and_log(&secret);

        tracing::debug!(
            environment = environment.as_str(),
            cookie_name = %cookie_name,
            session_max_age_secs = session_max_age.as_secs(),
            login_rate_limit,
            login_rate_window_secs = login_rate_window.as_secs(),
            "Session configuration loaded"
        );

        Ok(Self {
            secret,
            environment,
            cookie_name,
            session_max_age,
            login_rate_limit,
            login_rate_window,
        })
    }

    /// Create a new builder for programmatic configuration.
    pub fn builder(secret: SessionSecret) -> VestibuleConfigBuilder {
        VestibuleConfigBuilder {
            config: Self {
                secret,
                environment: Environment::default(),
                cookie_name: DEFAULT_COOKIE_NAME.to_string(),
                session_max_age: DEFAULT_MAX_AGE,
                login_rate_limit: LoginPolicy::default().max_attempts,
                login_rate_window: LoginPolicy::default().window,
            },
        }
    }

    /// Codec signing with the configured secret
    pub fn codec(&self) -> SessionCodec {
        SessionCodec::new(self.secret.clone())
    }

    /// Cookie settings for the configured environment
    pub fn cookies(&self) -> SessionCookies {
        SessionCookies::new(self.cookie_name.clone(), self.environment.secure_cookies())
    }

    /// Extractor state
    pub fn session_context(&self) -> SessionContext {
        SessionContext::new(self.codec(), self.cookies())
    }

    /// Login policy from the configured limits
    pub fn login_policy(&self) -> LoginPolicy {
        LoginPolicy {
            max_attempts: self.login_rate_limit,
            window: self.login_rate_window,
            session_max_age: self.session_max_age,
        }
    }

    /// Login guard with the configured policy, counting attempts in `limiter`.
    ///
    /// Attempt counters live in the limiter's store. Build the limiter once and
    /// pass clones of it (or clone the guard) wherever logins are handled; guards
    /// over separate limiters each allow the full attempt budget.
    pub fn login_guard(&self, limiter: RateLimiter) -> LoginGuard {
        LoginGuard::new(self.session_context(), limiter).with_policy(self.login_policy())
    }
}

fn positive_duration(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    match parse_duration(&value) {
        Some(d) if !d.is_zero() => Ok(d),
        _ => Err(ConfigError::invalid(key, value, "expected a positive duration like 30s, 5m or 24h")),
    }
}

/// Cookie `Max-Age` counts whole seconds, so session lifetimes must too.
fn whole_seconds(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    let duration = positive_duration(key, value.clone())?;
    if duration.subsec_nanos() != 0 {
        return Err(ConfigError::invalid(key, value, "expected whole seconds like 30s, 5m or 24h"));
    }
    Ok(duration)
}

/// Builder for VestibuleConfig
#[derive(Debug, Clone)]
pub struct VestibuleConfigBuilder {
    config: VestibuleConfig,
}

impl VestibuleConfigBuilder {
    /// Set the deployment environment.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self
    }

    /// Set the session cookie name.
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.config.cookie_name = name.into();
        self
    }

    /// Set the session token lifetime.
    pub fn session_max_age(mut self, max_age: Duration) -> Self {
        self.config.session_max_age = max_age;
        self
    }

    /// Set login throttling parameters.
    pub fn login_rate_limit(mut self, attempts: u32, window: Duration) -> Self {
        self.config.login_rate_limit = attempts;
        self.config.login_rate_window = window;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> VestibuleConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TEST_SECRET;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<VestibuleConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        VestibuleConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("SESSION_SECRET", TEST_SECRET)]).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.cookie_name, "session");
        assert_eq!(config.session_max_age, Duration::from_secs(86_400));
        assert_eq!(config.login_rate_limit, 5);
        assert_eq!(config.login_rate_window, Duration::from_secs(60));
        assert!(!config.cookies().is_secure());
    }

    #[test]
    fn test_missing_secret_fails() {
        assert!(matches!(
            load(&[]),
            Err(ConfigError::Secret(SecretError::Missing))
        ));
        assert!(matches!(
            load(&[("SESSION_SECRET", "   ")]),
            Err(ConfigError::Secret(SecretError::Missing))
        ));
    }

    #[test]
    fn test_short_secret_fails() {
        let result = load(&[("SESSION_SECRET", "only-twenty-chars-xx")]);
        assert!(matches!(
            result,
            Err(ConfigError::Secret(SecretError::TooShort { actual: 20, minimum: 32 }))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("SESSION_SECRET", TEST_SECRET),
            ("APP_ENV", "production"),
            ("SESSION_COOKIE_NAME", "__Host-sid"),
            ("SESSION_MAX_AGE", "8h"),
            ("LOGIN_RATE_LIMIT", "10"),
            ("LOGIN_RATE_WINDOW", "5m"),
        ])
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.cookie_name, "__Host-sid");
        assert_eq!(config.session_max_age, Duration::from_secs(8 * 3600));
        assert_eq!(config.login_rate_limit, 10);
        assert_eq!(config.login_rate_window, Duration::from_secs(300));
        assert!(config.cookies().is_secure());
    }

    #[test]
    fn test_rust_env_fallback() {
        let config = load(&[("SESSION_SECRET", TEST_SECRET), ("RUST_ENV", "test")]).unwrap();
        assert_eq!(config.environment, Environment::Test);

        let config = load(&[
            ("SESSION_SECRET", TEST_SECRET),
            ("APP_ENV", "staging"),
            ("RUST_ENV", "development"),
        ])
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("APP_ENV", "qa-cluster"),
            ("SESSION_MAX_AGE", "forever"),
            ("SESSION_MAX_AGE", "0s"),
            ("SESSION_MAX_AGE", "500ms"),
            ("SESSION_MAX_AGE", "1500ms"),
            ("LOGIN_RATE_LIMIT", "-1"),
            ("LOGIN_RATE_WINDOW", "soon"),
        ] {
            let result = load(&[("SESSION_SECRET", TEST_SECRET), (key, value)]);
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { .. })),
                "{}={} accepted",
                key,
                value
            );
        }
    }

    #[test]
    fn test_session_max_age_whole_seconds_in_millis() {
        let config = load(&[("SESSION_SECRET", TEST_SECRET), ("SESSION_MAX_AGE", "3000ms")]).unwrap();
        assert_eq!(config.session_max_age, Duration::from_secs(3));

        // Windows have no cookie attached and may be fractional
        let config = load(&[("SESSION_SECRET", TEST_SECRET), ("LOGIN_RATE_WINDOW", "1500ms")]).unwrap();
        assert_eq!(config.login_rate_window, Duration::from_millis(1500));
    }

    #[test]
    fn test_builder() {
        let secret = SessionSecret::new(TEST_SECRET).unwrap();
        let config = VestibuleConfig::builder(secret)
            .environment(Environment::Test)
            .cookie_name("sid")
            .session_max_age(Duration::from_secs(600))
            .login_rate_limit(3, Duration::from_secs(30))
            .build();

        assert_eq!(config.cookies(), SessionCookies::new("sid", true));
        let policy = config.login_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.window, Duration::from_secs(30));
        assert_eq!(policy.session_max_age, Duration::from_secs(600));
    }

    #[test]
    fn test_codec_uses_configured_secret() {
        let config = load(&[("SESSION_SECRET", TEST_SECRET)]).unwrap();
        let token = config
            .codec()
            .encode(&crate::SessionUser::new("u-1"), None)
            .unwrap();
        assert!(crate::testing::test_codec().decode(&token).is_some());
    }

    #[test]
    fn test_login_guards_share_limiter() {
        let config = load(&[
            ("SESSION_SECRET", TEST_SECRET),
            ("LOGIN_RATE_LIMIT", "3"),
        ])
        .unwrap();
        let limiter = RateLimiter::in_memory();
        let api = config.login_guard(limiter.clone());
        let form = config.login_guard(limiter);
        let ip = "203.0.113.9".parse().unwrap();

        assert!(api.check_attempt(ip, "ada@example.com").is_ok());
        assert!(form.check_attempt(ip, "ada@example.com").is_ok());
        assert!(api.check_attempt(ip, "ada@example.com").is_ok());

        assert!(matches!(
            form.check_attempt(ip, "Ada@Example.com"),
            Err(crate::AuthError::RateLimited { .. })
        ));

        form.clear_attempts(ip, "ada@example.com");
        assert!(api.check_attempt(ip, "ada@example.com").is_ok());
    }

    #[test]
    fn test_environment_names() {
        assert_eq!(Environment::from_name("DEV"), Some(Environment::Development));
        assert_eq!(Environment::from_name(" prod "), Some(Environment::Production));
        assert_eq!(Environment::from_name("testing"), Some(Environment::Test));
        assert_eq!(Environment::from_name("mars"), None);
        assert!(Environment::Test.secure_cookies());
    }
}
