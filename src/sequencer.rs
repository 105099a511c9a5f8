//! Forward-only cursor over a challenge's steps.

use std::sync::Arc;

use crate::domain::{Challenge, Step};
use crate::error::RunnerError;

#[derive(Clone, Debug)]
pub struct StepSequencer {
  challenge: Arc<Challenge>,
  cursor: usize,
}

impl StepSequencer {
  pub fn new(challenge: Arc<Challenge>) -> Self {
    Self { challenge, cursor: 0 }
  }

  pub fn challenge(&self) -> &Arc<Challenge> {
    &self.challenge
  }

  pub fn cursor(&self) -> usize {
    self.cursor
  }

  pub fn len(&self) -> usize {
    self.challenge.steps.len()
  }

  pub fn is_complete(&self) -> bool {
    self.cursor == self.len()
  }

  pub fn current(&self) -> Result<&Step, RunnerError> {
    self.challenge
      .steps
      .get(self.cursor)
      .ok_or(RunnerError::OutOfRange { cursor: self.cursor, len: self.len() })
  }

  /// Move to the next step. Never skips more than one, never goes back.
  pub fn advance(&mut self) -> Result<(), RunnerError> {
    if self.is_complete() {
      return Err(RunnerError::OutOfRange { cursor: self.cursor, len: self.len() });
    }
    self.cursor += 1;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Category, Difficulty};

  fn challenge(n: usize) -> Arc<Challenge> {
    Arc::new(Challenge {
      id: "seq".into(),
      title: "Seq".into(),
      description: String::new(),
      category: Category::Git,
      difficulty: Difficulty::Easy,
      reward_points: 0,
      steps: (0..n).map(|i| Step::new(format!("step {i}"), format!("cmd {i}"))).collect(),
    })
  }

  #[test]
  fn walks_every_step_once() {
    let mut seq = StepSequencer::new(challenge(3));
    for i in 0..3 {
      assert!(!seq.is_complete());
      assert_eq!(seq.current().unwrap().expected_answer, format!("cmd {i}"));
      seq.advance().unwrap();
    }
    assert!(seq.is_complete());
    assert_eq!(seq.cursor(), 3);
  }

  #[test]
  fn complete_sequencer_refuses_to_move() {
    let mut seq = StepSequencer::new(challenge(1));
    seq.advance().unwrap();
    assert_eq!(seq.current().unwrap_err(), RunnerError::OutOfRange { cursor: 1, len: 1 });
    assert_eq!(seq.advance().unwrap_err(), RunnerError::OutOfRange { cursor: 1, len: 1 });
    assert_eq!(seq.cursor(), 1);
  }
}
