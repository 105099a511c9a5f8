//! Loading lab configuration (drill rules + optional scenario/command bank) from TOML.
//!
//! Example:
//!
//! ```toml
//! [drill]
//! time_budget_secs = 90
//! streak_bonus_rate = 0.25
//! streak_multiplier_cap = 3.0
//!
//! [[scenarios]]
//! id = "scenario-nginx-502"
//! title = "Nginx returns 502"
//! category = "linux"
//! difficulty = "medium"
//! reward_points = 60
//!
//! [[scenarios.steps]]
//! instruction = "Check whether the upstream is listening."
//! expected_answer = "ss -tlnp"
//! alternate_answers = ["netstat -tlnp"]
//!
//! [[commands]]
//! id = "ss-1"
//! description = "List listening TCP sockets"
//! command = "ss -tln"
//! category = "linux"
//! xp = 10
//! ```

use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{Category, Challenge, CommandCard, Difficulty, Step};
use crate::error::ConfigError;
use crate::runner::DrillRules;
use crate::scoring::StreakBonus;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct LabConfig {
  #[serde(default)]
  pub drill: DrillCfg,
  #[serde(default)]
  pub scenarios: Vec<ScenarioCfg>,
  #[serde(default)]
  pub commands: Vec<CommandCard>,
}

/// Drill tuning. `time_budget_secs = 0` plays untimed.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DrillCfg {
  pub time_budget_secs: u32,
  pub streak_bonus_rate: f64,
  pub streak_multiplier_cap: Option<f64>,
  pub completion_bonus_rate: f64,
}

impl Default for DrillCfg {
  fn default() -> Self {
    Self {
      time_budget_secs: 120,
      streak_bonus_rate: 0.1,
      streak_multiplier_cap: None,
      completion_bonus_rate: 0.5,
    }
  }
}

/// Upper bound for `streak_bonus_rate` and `completion_bonus_rate`.
pub const MAX_RATE: f64 = 100.0;

impl DrillCfg {
  /// Rates must be finite and within `0..=MAX_RATE`; a cap must be at least 1.
  pub fn validate(&self) -> Result<(), ConfigError> {
    check_rate("streak_bonus_rate", self.streak_bonus_rate)?;
    check_rate("completion_bonus_rate", self.completion_bonus_rate)?;
    if let Some(cap) = self.streak_multiplier_cap {
      if !cap.is_finite() || !(1.0..=MAX_RATE).contains(&cap) {
        return Err(ConfigError::Drill {
          field: "streak_multiplier_cap",
          reason: format!("{cap} is outside 1..={MAX_RATE}"),
        });
      }
    }
    Ok(())
  }

  pub fn rules(&self) -> DrillRules {
    DrillRules {
      time_budget_secs: (self.time_budget_secs > 0).then_some(self.time_budget_secs),
      streak: StreakBonus { rate: self.streak_bonus_rate, cap: self.streak_multiplier_cap },
      completion_bonus_rate: self.completion_bonus_rate,
    }
  }
}

fn check_rate(field: &'static str, rate: f64) -> Result<(), ConfigError> {
  if rate.is_finite() && (0.0..=MAX_RATE).contains(&rate) {
    Ok(())
  } else {
    Err(ConfigError::Drill { field, reason: format!("{rate} is outside 0..={MAX_RATE}") })
  }
}

/// Scenario entry accepted in TOML configuration. Missing ids get a fresh uuid.
#[derive(Clone, Debug, Deserialize)]
pub struct ScenarioCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  #[serde(default)] pub description: String,
  pub category: Category,
  #[serde(default)] pub difficulty: Difficulty,
  #[serde(default)] pub reward_points: u32,
  #[serde(default)] pub steps: Vec<Step>,
}

impl ScenarioCfg {
  pub fn into_challenge(self) -> Challenge {
    Challenge {
      id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
      title: self.title,
      description: self.description,
      category: self.category,
      difficulty: self.difficulty,
      reward_points: self.reward_points,
      steps: self.steps,
    }
  }
}

pub fn parse_lab_config(s: &str) -> Result<LabConfig, ConfigError> {
  let cfg = toml::from_str::<LabConfig>(s)?;
  cfg.drill.validate()?;
  Ok(cfg)
}

/// Attempt to load `LabConfig` from LAB_CONFIG_PATH. On any IO, parse or validation error, returns None.
pub fn load_lab_config_from_env() -> Option<LabConfig> {
  let path = std::env::var("LAB_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_lab_config(&s) {
      Ok(cfg) => {
        info!(target: "opsdrill", %path, scenarios = cfg.scenarios.len(), commands = cfg.commands.len(), "Loaded lab config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "opsdrill", %path, error = %e, "Failed to load TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "opsdrill", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
