//! Opsdrill · scripted terminal challenge engine and its host server.
//!
//! Engine (pure, synchronous):
//!   - `matcher`: normalized command comparison
//!   - `sequencer`: forward-only step cursor
//!   - `scoring`: equal-split and flat-plus-streak reward policies
//!   - `runner`: the Selecting -> Active -> Finished session state machine
//!
//! Host (axum + tokio): catalog, progress persistence, HTTP and WebSocket routes.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod matcher;
pub mod progress;
pub mod protocol;
pub mod routes;
pub mod runner;
pub mod scoring;
pub mod seeds;
pub mod sequencer;
pub mod state;
pub mod telemetry;
pub mod util;

pub use domain::{Category, Challenge, CommandCard, Difficulty, Step};
pub use error::{ConfigError, RunnerError, StoreError};
pub use runner::{ChallengeRunner, DrillRules, LogEntry, LogKind, Phase, SessionSummary, Variant, VariantKind, Verdict};
pub use scoring::{RewardPolicy, StreakBonus};
