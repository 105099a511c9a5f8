//! Domain models: categories, difficulty tiers, steps, challenges and drill cards.

use serde::{Deserialize, Serialize};

use crate::error::RunnerError;

/// Which toolchain a challenge exercises.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Kubernetes,
  Docker,
  Linux,
  Git,
}

impl Category {
  pub fn as_str(&self) -> &'static str {
    match self {
      Category::Kubernetes => "kubernetes",
      Category::Docker => "docker",
      Category::Linux => "linux",
      Category::Git => "git",
    }
  }
}

/// Ordered difficulty tier: easy < medium < hard < evil.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
  Evil,
}

impl Default for Difficulty {
  fn default() -> Self { Difficulty::Medium }
}

/// One prompt/expected-answer unit within a challenge.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
  pub instruction: String,
  pub expected_answer: String,
  #[serde(default)] pub alternate_answers: Vec<String>,
  #[serde(default)] pub success_output: String,
  #[serde(default)] pub note: String,
  #[serde(default)] pub hint: String,
  /// Flat award for drill play. Falls back to the challenge reward when absent.
  #[serde(default)] pub reward_points: Option<u32>,
}

impl Step {
  pub fn new(instruction: impl Into<String>, expected_answer: impl Into<String>) -> Self {
    Self {
      instruction: instruction.into(),
      expected_answer: expected_answer.into(),
      alternate_answers: Vec::new(),
      success_output: String::new(),
      note: String::new(),
      hint: String::new(),
      reward_points: None,
    }
  }

  pub fn with_alternates<I, S>(mut self, alternates: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.alternate_answers = alternates.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_output(mut self, output: impl Into<String>) -> Self {
    self.success_output = output.into();
    self
  }

  pub fn with_note(mut self, note: impl Into<String>) -> Self {
    self.note = note.into();
    self
  }

  pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
    self.hint = hint.into();
    self
  }

  pub fn with_reward(mut self, points: u32) -> Self {
    self.reward_points = Some(points);
    self
  }
}

/// A named, ordered sequence of steps with a total point reward.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Challenge {
  pub id: String,
  pub title: String,
  #[serde(default)] pub description: String,
  pub category: Category,
  #[serde(default)] pub difficulty: Difficulty,
  #[serde(default)] pub reward_points: u32,
  pub steps: Vec<Step>,
}

impl Challenge {
  /// Reject degenerate challenges before a session is built around them.
  pub fn validate(&self) -> Result<(), RunnerError> {
    if self.steps.is_empty() {
      return Err(RunnerError::InvalidChallenge(format!("challenge '{}' has no steps", self.id)));
    }
    if let Some(idx) = self.steps.iter().position(|s| s.expected_answer.trim().is_empty()) {
      return Err(RunnerError::InvalidChallenge(format!(
        "challenge '{}' step {} has an empty expected answer",
        self.id,
        idx + 1
      )));
    }
    Ok(())
  }
}

/// Single-command drill entry. A drill session strings several of these together.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandCard {
  pub id: String,
  pub description: String,
  pub command: String,
  #[serde(default)] pub alternates: Vec<String>,
  #[serde(default)] pub hint: String,
  pub category: Category,
  #[serde(default)] pub difficulty: Difficulty,
  pub xp: u32,
}

impl CommandCard {
  pub fn to_step(&self) -> Step {
    Step::new(&self.description, &self.command)
      .with_alternates(self.alternates.iter().cloned())
      .with_hint(&self.hint)
      .with_reward(self.xp)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample(steps: Vec<Step>) -> Challenge {
    Challenge {
      id: "t".into(),
      title: "T".into(),
      description: String::new(),
      category: Category::Linux,
      difficulty: Difficulty::Easy,
      reward_points: 10,
      steps,
    }
  }

  #[test]
  fn difficulty_is_ordered() {
    assert!(Difficulty::Easy < Difficulty::Medium);
    assert!(Difficulty::Medium < Difficulty::Hard);
    assert!(Difficulty::Hard < Difficulty::Evil);
  }

  #[test]
  fn empty_challenge_is_rejected() {
    let err = sample(vec![]).validate().unwrap_err();
    assert!(matches!(err, RunnerError::InvalidChallenge(_)));
  }

  #[test]
  fn blank_expected_answer_is_rejected() {
    let err = sample(vec![Step::new("a", "ls"), Step::new("b", "   ")]).validate().unwrap_err();
    assert!(err.to_string().contains("step 2"), "{err}");
  }

  #[test]
  fn card_becomes_single_rewarded_step() {
    let card = CommandCard {
      id: "ps-1".into(),
      description: "Show all running processes".into(),
      command: "ps aux".into(),
      alternates: vec!["ps -ef".into()],
      hint: "ps with aux".into(),
      category: Category::Linux,
      difficulty: Difficulty::Easy,
      xp: 10,
    };
    let step = card.to_step();
    assert_eq!(step.expected_answer, "ps aux");
    assert_eq!(step.alternate_answers, vec!["ps -ef".to_string()]);
    assert_eq!(step.reward_points, Some(10));
  }

  #[test]
  fn category_deserializes_snake_case() {
    let c: Category = serde_json::from_str("\"kubernetes\"").unwrap();
    assert_eq!(c, Category::Kubernetes);
    assert_eq!(c.as_str(), "kubernetes");
  }
}
