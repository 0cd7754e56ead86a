//! Security Event Logging
//!
//! Structured audit records for authentication, session and throttling decisions.
//!
//! # Usage
//!
//! ```ignore
//! use vestibule::observability::SecurityEvent;
//!
//! vestibule::security_event!(
//!     SecurityEvent::AuthenticationFailure,
//!     client_ip = %ip,
//!     "Login rejected"
//! );
//! ```

use std::fmt;

/// Security event categories for audit logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    /// Credentials accepted by the login handler
    AuthenticationSuccess,
    /// Credentials rejected by the login handler
    AuthenticationFailure,
    /// Session cookie cleared on request
    Logout,
    /// New session token minted
    SessionCreated,
    /// Existing session replaced with a fresh token
    SessionRefreshed,
    /// Presented token failed verification
    SessionRejected,
    /// Authenticated caller lacks a required role
    AccessDenied,
    /// Request throttled by the rate limiter
    RateLimitExceeded,
    /// Signing secret accepted but flagged by the advisory policy
    WeakSecret,
}

impl SecurityEvent {
    /// Get the event category for filtering/grouping
    pub fn category(&self) -> &'static str {
        match self {
            Self::AuthenticationSuccess | Self::AuthenticationFailure | Self::Logout => {
                "authentication"
            }
            Self::SessionCreated | Self::SessionRefreshed | Self::SessionRejected => "session",
            Self::AccessDenied => "authorization",
            Self::RateLimitExceeded => "security",
            Self::WeakSecret => "configuration",
        }
    }

    /// Get the severity level for the event
    pub fn severity(&self) -> Severity {
        match self {
            Self::AuthenticationFailure | Self::AccessDenied | Self::RateLimitExceeded => {
                Severity::High
            }
            Self::AuthenticationSuccess | Self::WeakSecret => Severity::Medium,
            Self::Logout
            | Self::SessionCreated
            | Self::SessionRefreshed
            | Self::SessionRejected => Severity::Low,
        }
    }

    /// Get the event name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthenticationSuccess => "authentication_success",
            Self::AuthenticationFailure => "authentication_failure",
            Self::Logout => "logout",
            Self::SessionCreated => "session_created",
            Self::SessionRefreshed => "session_refreshed",
            Self::SessionRejected => "session_rejected",
            Self::AccessDenied => "access_denied",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::WeakSecret => "weak_secret",
        }
    }
}

impl fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Routine operations
    Low,
    /// Important state changes
    Medium,
    /// Security-relevant failures
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Log a security event with structured fields.
///
/// Adds `security_event`, `category` and `severity` fields and picks the tracing
/// level from the severity: high is `warn`, medium is `info`, low is `debug`.
#[macro_export]
macro_rules! security_event {
    ($event:expr, $($field:tt)*) => {{
        let event = $event;
        let category = event.category();
        let event_name = event.name();

        match event.severity() {
            $crate::observability::Severity::High => {
                ::tracing::warn!(
                    security_event = event_name,
                    category = category,
                    severity = "high",
                    $($field)*
                );
            }
            $crate::observability::Severity::Medium => {
                ::tracing::info!(
                    security_event = event_name,
                    category = category,
                    severity = "medium",
                    $($field)*
                );
            }
            $crate::observability::Severity::Low => {
                ::tracing::debug!(
                    security_event = event_name,
                    category = category,
                    severity = "low",
                    $($field)*
                );
            }
        }
    }};
}

pub use crate::security_event;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_categories() {
        assert_eq!(SecurityEvent::AuthenticationSuccess.category(), "authentication");
        assert_eq!(SecurityEvent::SessionRejected.category(), "session");
        assert_eq!(SecurityEvent::AccessDenied.category(), "authorization");
        assert_eq!(SecurityEvent::RateLimitExceeded.category(), "security");
        assert_eq!(SecurityEvent::WeakSecret.category(), "configuration");
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(SecurityEvent::RateLimitExceeded.severity(), Severity::High);
        assert_eq!(SecurityEvent::AuthenticationSuccess.severity(), Severity::Medium);
        assert_eq!(SecurityEvent::SessionCreated.severity(), Severity::Low);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn test_macro_expands_without_subscriber() {
        crate::security_event!(
            SecurityEvent::SessionCreated,
            user_id = "user-1",
            "Session created"
        );
    }
}
