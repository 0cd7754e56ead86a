//! Observability
//!
//! Library code logs through plain `tracing` macros and the [`security_event!`]
//! audit macro; the host application decides where records go by calling [`init`]
//! once at startup, or by installing its own subscriber instead.
//!
//! ```ignore
//! use vestibule::observability::{init, ObservabilityConfig};
//!
//! init(ObservabilityConfig::from_env())?;
//! ```
//!
//! [`security_event!`]: crate::security_event

mod config;
mod events;
mod providers;

pub use config::{LogFormat, ObservabilityConfig, ObservabilityConfigBuilder};
pub use events::{security_event, SecurityEvent, Severity};

use tracing::info;

/// Install the tracing subscriber described by `config`.
///
/// Fails if the filter directive does not parse or a global subscriber is
/// already installed.
pub fn init(config: ObservabilityConfig) -> Result<(), ObservabilityError> {
    providers::init_tracing(&config)?;

    info!(
        log_format = ?config.log_format,
        log_filter = %config.log_filter,
        "Observability initialized"
    );

    Ok(())
}

/// Observability initialization errors
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    /// Invalid configuration
    #[error("observability config error: {0}")]
    Config(String),
    /// Subscriber installation failed
    #[error("provider error: {0}")]
    Provider(String),
}
