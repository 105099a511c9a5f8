//! Error taxonomy for the runner, lab configuration and the progress store.
//!
//! Runner errors are caller contract violations. They are reported, never
//! recovered from, and never leave a session half-updated.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunnerError {
  #[error("invalid challenge: {0}")]
  InvalidChallenge(String),

  #[error("cannot {op} while {state}")]
  InvalidStateTransition { op: &'static str, state: &'static str },

  #[error("step cursor {cursor} out of range for {len} steps")]
  OutOfRange { cursor: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("progress file I/O failed: {0}")]
  Io(#[from] std::io::Error),

  #[error("progress JSON is malformed: {0}")]
  Json(#[from] serde_json::Error),

  #[error("progress store lock poisoned")]
  Poisoned,
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("TOML parse error: {0}")]
  Toml(#[from] toml::de::Error),

  #[error("invalid drill setting `{field}`: {reason}")]
  Drill { field: &'static str, reason: String },
}
