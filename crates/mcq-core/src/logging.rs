#![forbid(unsafe_code)]

//! JSON log output for hosts that embed mcq in production.
//!
//! The runtime emits `tracing` events under the `mcq` targets. This module
//! installs a global JSON subscriber filtered by an `EnvFilter` directive
//! string (for example `"mcq_runtime=debug"`). Hosts that already install
//! their own subscriber should not call it.

use std::fmt;

use tracing_subscriber::EnvFilter;

/// Environment variable consulted before the fallback directive.
pub const LOG_ENV: &str = "MCQ_LOG";

/// Errors from logging initialization.
#[derive(Debug)]
pub enum LoggingError {
    /// The filter directive could not be parsed.
    InvalidFilter(String),
    /// A global subscriber is already installed.
    AlreadyInstalled,
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFilter(msg) => write!(f, "invalid log filter: {msg}"),
            Self::AlreadyInstalled => write!(f, "a global tracing subscriber is already installed"),
        }
    }
}

impl std::error::Error for LoggingError {}

/// Build the filter: `MCQ_LOG` wins when set, otherwise `fallback`.
pub fn filter_from_env(fallback: &str) -> Result<EnvFilter, LoggingError> {
    match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => parse_filter(&directives),
        _ => parse_filter(fallback),
    }
}

fn parse_filter(directives: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directives).map_err(|e| LoggingError::InvalidFilter(e.to_string()))
}

/// Install a global JSON subscriber.
pub fn init_json(fallback: &str) -> Result<(), LoggingError> {
    let filter = filter_from_env(fallback)?;
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)?;
    tracing::debug!(target: "mcq", env = LOG_ENV, "json logging installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_directive_is_reported() {
        let err = parse_filter("mcq_runtime=notalevel").unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFilter(_)));
        assert!(err.to_string().starts_with("invalid log filter"));
    }

    #[test]
    fn good_directive_parses() {
        assert!(parse_filter("mcq_runtime=debug,warn").is_ok());
    }
}
