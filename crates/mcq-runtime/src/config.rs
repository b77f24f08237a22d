#![forbid(unsafe_code)]

//! Binding policy.
//!
//! Two behaviors are host choices rather than fixed semantics:
//!
//! - what the match vector holds after detach ([`DetachPolicy`]);
//! - whether session setup emits one snapshot or one per query
//!   ([`EmitPolicy`]).
//!
//! With the `policy-config` feature the policy can be loaded from TOML or
//! JSON:
//!
//! ```toml
//! detach = "reset-to-false"
//! emit = "per-index"
//! rebind-on-ready = true
//! ```
//!
//! Missing keys take their defaults.

#[cfg(feature = "policy-config")]
use std::path::{Path, PathBuf};

/// Match-vector contents after a session is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum DetachPolicy {
    /// Keep the last observed values until the next attach overwrites them.
    #[default]
    PreserveLastKnown,
    /// Clear every entry to `false`, keeping the length.
    ResetToFalse,
}

/// How session setup reports initial match state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum EmitPolicy {
    /// One snapshot after every query has been initialized.
    #[default]
    Batched,
    /// One snapshot per initialized query that changed.
    PerIndex,
}

/// Policy for a [`QueryBindingController`](crate::QueryBindingController).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "kebab-case", deny_unknown_fields)
)]
pub struct BindingConfig {
    /// Vector contents after detach.
    pub detach: DetachPolicy,
    /// Initial snapshot emission.
    pub emit: EmitPolicy,
    /// Rebind an attached session once when the engine becomes ready, if
    /// the session was created without it.
    pub rebind_on_ready: bool,
}

impl BindingConfig {
    /// Default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the detach policy.
    #[must_use]
    pub fn detach(mut self, policy: DetachPolicy) -> Self {
        self.detach = policy;
        self
    }

    /// Set the emit policy.
    #[must_use]
    pub fn emit(mut self, policy: EmitPolicy) -> Self {
        self.emit = policy;
        self
    }

    /// Enable or disable rebinding when the engine becomes ready.
    #[must_use]
    pub fn rebind_on_ready(mut self, enabled: bool) -> Self {
        self.rebind_on_ready = enabled;
        self
    }
}

/// Errors from loading a [`BindingConfig`].
#[cfg(feature = "policy-config")]
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// TOML input was malformed.
    Toml(String),
    /// JSON input was malformed.
    Json(String),
    /// The file extension is neither `.toml` nor `.json`.
    UnknownFormat(PathBuf),
}

#[cfg(feature = "policy-config")]
impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            Self::Toml(msg) => write!(f, "invalid TOML binding config: {msg}"),
            Self::Json(msg) => write!(f, "invalid JSON binding config: {msg}"),
            Self::UnknownFormat(path) => {
                write!(f, "unsupported config format: {}", path.display())
            }
        }
    }
}

#[cfg(feature = "policy-config")]
impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(feature = "policy-config")]
impl BindingConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Toml(e.to_string()))
    }

    /// Parse a JSON document.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(input).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// Load from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, ConfigError> = match extension.as_deref() {
            Some("toml") => Self::from_toml_str,
            Some("json") => Self::from_json_str,
            _ => return Err(ConfigError::UnknownFormat(path.to_path_buf())),
        };
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = parse(&input)?;
        tracing::debug!(path = %path.display(), ?config, "binding config loaded");
        Ok(config)
    }
}
