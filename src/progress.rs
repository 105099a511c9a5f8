//! Player progress and the persistence port it is saved through.
//!
//! The host picks a store at construction time: `JsonFileStore` when
//! PROGRESS_PATH is set, `MemoryStore` otherwise.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::runner::{FinishReason, SessionSummary, VariantKind};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
  pub total_xp: u64,
  pub sessions_played: u32,
  pub completed_scenarios: BTreeSet<String>,
  pub drill_high_score: u32,
}

impl Progress {
  /// Points sink. Call once per summary; applying the same summary twice counts it twice.
  pub fn apply(&mut self, summary: &SessionSummary) {
    self.total_xp = self.total_xp.saturating_add(u64::from(summary.credited_xp()));
    self.sessions_played = self.sessions_played.saturating_add(1);
    match summary.variant {
      VariantKind::Scenario => {
        if summary.reason == FinishReason::Completed {
          self.completed_scenarios.insert(summary.challenge_id.clone());
        }
      }
      VariantKind::Drill => self.drill_high_score = self.drill_high_score.max(summary.points),
    }
  }
}

pub trait ProgressStore: Send + Sync {
  fn load(&self) -> Result<Progress, StoreError>;
  fn save(&self, progress: &Progress) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  inner: Mutex<Progress>,
}

impl ProgressStore for MemoryStore {
  fn load(&self) -> Result<Progress, StoreError> {
    self.inner.lock().map(|p| p.clone()).map_err(|_| StoreError::Poisoned)
  }

  fn save(&self, progress: &Progress) -> Result<(), StoreError> {
    let mut guard = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
    *guard = progress.clone();
    Ok(())
  }
}

/// Pretty JSON on disk. A missing file loads as fresh progress.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
  path: PathBuf,
}

impl JsonFileStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }
}

impl ProgressStore for JsonFileStore {
  #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
  fn load(&self) -> Result<Progress, StoreError> {
    match std::fs::read_to_string(&self.path) {
      Ok(s) => Ok(serde_json::from_str(&s)?),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        debug!(target: "progress", "No progress file yet; starting fresh");
        Ok(Progress::default())
      }
      Err(e) => Err(e.into()),
    }
  }

  #[instrument(level = "debug", skip(self, progress), fields(path = %self.path.display()))]
  fn save(&self, progress: &Progress) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(progress)?;
    // atomic replace
    let tmp = self.path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, &self.path)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  fn summary(variant: VariantKind, reason: FinishReason, points: u32, bonus: u32) -> SessionSummary {
    SessionSummary {
      session_id: Uuid::new_v4(),
      challenge_id: format!("{}-x", variant.as_str()),
      variant,
      reason,
      points,
      bonus,
      steps_solved: 1,
      steps_total: 2,
    }
  }

  #[test]
  fn apply_credits_points_and_bonus() {
    let mut p = Progress::default();
    p.apply(&summary(VariantKind::Drill, FinishReason::TimeExpired, 40, 20));
    p.apply(&summary(VariantKind::Drill, FinishReason::Completed, 30, 15));
    assert_eq!(p.total_xp, 105);
    assert_eq!(p.drill_high_score, 40);
    assert_eq!(p.sessions_played, 2);
    assert!(p.completed_scenarios.is_empty());
  }

  #[test]
  fn only_completed_scenarios_are_recorded() {
    let mut p = Progress::default();
    p.apply(&summary(VariantKind::Scenario, FinishReason::Completed, 75, 0));
    assert!(p.completed_scenarios.contains("scenario-x"));
    assert_eq!(p.total_xp, 75);
  }

  #[test]
  fn timed_out_scenario_is_not_marked_complete() {
    let mut p = Progress::default();
    p.apply(&summary(VariantKind::Scenario, FinishReason::TimeExpired, 30, 0));
    assert!(p.completed_scenarios.is_empty());
    assert_eq!(p.drill_high_score, 0);
    assert_eq!(p.total_xp, 30);
  }

  #[test]
  fn summary_variant_serializes_snake_case() {
    let v = serde_json::to_value(summary(VariantKind::Drill, FinishReason::Completed, 1, 0)).unwrap();
    assert_eq!(v["variant"], "drill");
    assert_eq!(v["reason"], "completed");
    let bad = v.to_string().replace("\"drill\"", "\"dril\"");
    assert!(serde_json::from_str::<SessionSummary>(&bad).is_err());
  }

  #[test]
  fn memory_store_round_trip() {
    let store = MemoryStore::default();
    assert_eq!(store.load().unwrap(), Progress::default());
    let mut p = Progress::default();
    p.total_xp = 9;
    store.save(&p).unwrap();
    assert_eq!(store.load().unwrap().total_xp, 9);
  }

  #[test]
  fn json_store_missing_file_is_fresh_and_saves() {
    let path = std::env::temp_dir().join(format!("opsdrill-progress-{}.json", Uuid::new_v4()));
    let store = JsonFileStore::new(&path);
    assert_eq!(store.load().unwrap(), Progress::default());

    let mut p = Progress::default();
    p.apply(&summary(VariantKind::Scenario, FinishReason::Completed, 100, 0));
    store.save(&p).unwrap();
    assert_eq!(store.load().unwrap(), p);
    std::fs::remove_file(&path).ok();
  }

  #[test]
  fn json_store_reports_corrupt_file() {
    let path = std::env::temp_dir().join(format!("opsdrill-progress-{}.json", Uuid::new_v4()));
    std::fs::write(&path, "{not json").unwrap();
    let err = JsonFileStore::new(&path).load().unwrap_err();
    assert!(matches!(err, StoreError::Json(_)));
    std::fs::remove_file(&path).ok();
  }
}
