//! Session Secret Validation and Generation
//!
//! The signing key for session tokens is read once from configuration. A key that
//! is missing or shorter than [`MIN_SECRET_LENGTH`] characters is a startup error:
//! a [`SessionSecret`] cannot be constructed from it, and therefore no codec can
//! exist that would mint weakly signed tokens.
//!
//! On top of that hard minimum, [`SecretPolicy`] runs advisory checks (common
//! words, low entropy) whose findings are logged but never reject a key.
//!
//! # Example
//!
//! ```
//! use vestibule::secret::{generate_secret, SessionSecret};
//!
//! let secret = SessionSecret::new(generate_secret(64)).unwrap();
//! assert_eq!(secret.len(), 64);
//!
//! assert!(SessionSecret::new("too-short").is_err());
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::observability::SecurityEvent;

/// Minimum accepted secret length, in characters.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Error type for secret validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SecretError {
    /// No secret configured
    #[error("session secret is not configured")]
    Missing,

    /// Secret is below the hard minimum
    #[error("session secret is {actual} characters, at least {minimum} are required")]
    TooShort { actual: usize, minimum: usize },
}

/// Validated signing key for session tokens.
///
/// The key material never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSecret(String);

impl SessionSecret {
    /// Validate and wrap a secret.
    ///
    /// Blank input is reported as [`SecretError::Missing`] so an empty
    /// `SESSION_SECRET=` reads the same as an unset one.
    pub fn new(secret: impl Into<String>) -> Result<Self, SecretError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(SecretError::Missing);
        }

        let actual = secret.chars().count();
        if actual < MIN_SECRET_LENGTH {
            return Err(SecretError::TooShort {
                actual,
                minimum: MIN_SECRET_LENGTH,
            });
        }

        Ok(Self(secret))
    }

    /// Raw key bytes for HMAC
    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Always false; an empty secret cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionSecret([REDACTED; {} chars])", self.len())
    }
}

// ============================================================================
// Advisory policy
// ============================================================================

/// Advisory finding about a secret that passed the hard minimum.
#[derive(Debug, Clone, PartialEq)]
pub enum SecretWarning {
    /// Secret contains a common word or keyboard pattern
    WeakPattern { pattern: &'static str },
    /// Shannon entropy below the environment's recommendation
    LowEntropy { actual: f64, recommended: f64 },
}

impl fmt::Display for SecretWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WeakPattern { pattern } => {
                write!(f, "secret contains weak pattern '{}'", pattern)
            }
            Self::LowEntropy {
                actual,
                recommended,
            } => write!(
                f,
                "secret entropy ({:.1} bits) is below the recommended {:.1} bits",
                actual, recommended
            ),
        }
    }
}

/// Recommendations applied on top of [`SessionSecret::new`].
#[derive(Debug, Clone)]
pub struct SecretPolicy {
    /// Recommended minimum Shannon entropy in bits
    pub min_entropy: f64,
    /// Whether to look for common words and patterns
    pub check_weak_patterns: bool,
}

impl Default for SecretPolicy {
    fn default() -> Self {
        Self::for_environment("development")
    }
}

impl SecretPolicy {
    /// Recommendations per environment.
    ///
    /// - `production`: 128-bit entropy, weak patterns checked
    /// - `staging`: 96-bit entropy, weak patterns checked
    /// - anything else: 32-bit entropy, weak patterns checked
    pub fn for_environment(environment: &str) -> Self {
        let min_entropy = match environment.to_lowercase().as_str() {
            "production" | "prod" => 128.0,
            "staging" | "stage" => 96.0,
            _ => 32.0,
        };
        Self {
            min_entropy,
            check_weak_patterns: true,
        }
    }

    /// Collect advisory findings for a validated secret.
    pub fn review(&self, secret: &SessionSecret) -> Vec<SecretWarning> {
        let mut warnings = Vec::new();

        if self.check_weak_patterns {
            if let Some(pattern) = find_weak_pattern(&secret.0) {
                warnings.push(SecretWarning::WeakPattern { pattern });
            }
        }

        let entropy = shannon_entropy(&secret.0);
        if entropy < self.min_entropy {
            warnings.push(SecretWarning::LowEntropy {
                actual: entropy,
                recommended: self.min_entropy,
            });
        }

        warnings
    }

    /// Review a secret and log each finding as a security event.
    pub fn review_and_log(&self, secret: &SessionSecret) -> Vec<SecretWarning> {
        let warnings = self.review(secret);
        for warning in &warnings {
            crate::security_event!(
                SecurityEvent::WeakSecret,
                finding = %warning,
                "Session secret accepted with advisory warning"
            );
        }
        warnings
    }
}

fn find_weak_pattern(secret: &str) -> Option<&'static str> {
    const WEAK_PATTERNS: &[&str] = &[
        "secret", "password", "admin", "123456", "qwerty", "default", "example",
        "changeme", "letmein", "welcome", "session",
    ];

    let lower = secret.to_lowercase();
    WEAK_PATTERNS.iter().copied().find(|p| lower.contains(p))
}

/// Total Shannon entropy of a string in bits (per-character entropy times length).
pub fn shannon_entropy(s: &str) -> f64 {
    let total = s.chars().count();
    if total == 0 {
        return 0.0;
    }

    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }

    let total = total as f64;
    let per_char: f64 = counts
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum();

    per_char * total
}

/// Generate a random secret of `length` characters (at least [`MIN_SECRET_LENGTH`]).
///
/// Uses the thread-local CSPRNG and an alphabet of letters, digits and symbols that
/// survive shell quoting inside double quotes.
pub fn generate_secret(length: usize) -> String {
    use rand::Rng;

    const CHARSET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_.~+=:,";

    let length = length.max(MIN_SECRET_LENGTH);
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}
