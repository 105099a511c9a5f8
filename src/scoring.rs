//! Reward policies.
//!
//! - Equal split: a challenge's reward is spread over its steps; the last step
//!   absorbs rounding so a full run pays out exactly `reward_points`.
//! - Flat plus streak: each step pays its flat reward times
//!   `min(1 + streak * rate, cap)`, floored.
//!
//! Multipliers are evaluated in thousandths so flooring is exact
//! (10 x 1.3 is 13, not 12).

use serde::{Deserialize, Serialize};

use crate::domain::Challenge;
use crate::error::RunnerError;

const MILLI: u64 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreakBonus {
  /// Multiplier growth per consecutive correct answer (0.1 = +10%).
  pub rate: f64,
  /// Optional ceiling on the multiplier itself (e.g. 3.0).
  #[serde(default)]
  pub cap: Option<f64>,
}

impl Default for StreakBonus {
  fn default() -> Self {
    Self { rate: 0.1, cap: None }
  }
}

impl StreakBonus {
  /// Multiplier in thousandths for a given streak.
  pub fn multiplier_milli(&self, streak: u32) -> u64 {
    let rate = to_milli(self.rate);
    let raw = MILLI.saturating_add(rate.saturating_mul(u64::from(streak)));
    match self.cap {
      Some(cap) => raw.min(to_milli(cap).max(MILLI)),
      None => raw,
    }
  }

  pub fn apply(&self, base: u32, streak: u32) -> u32 {
    scale_milli(base, self.multiplier_milli(streak))
  }
}

/// `floor(value * milli / 1000)`, saturating at `u32::MAX`.
fn scale_milli(value: u32, milli: u64) -> u32 {
  let scaled = u128::from(value) * u128::from(milli) / u128::from(MILLI);
  u32::try_from(scaled).unwrap_or(u32::MAX)
}

fn to_milli(v: f64) -> u64 {
  if v.is_finite() && v > 0.0 { (v * MILLI as f64).round() as u64 } else { 0 }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RewardPolicy {
  EqualSplit,
  FlatStreak(StreakBonus),
}

/// Per-submission context the runner supplies. The scorer keeps no state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepContext {
  /// Consecutive correct answers immediately preceding this one.
  pub streak: u32,
}

pub fn points_for_step(
  policy: &RewardPolicy,
  challenge: &Challenge,
  step_index: usize,
  ctx: StepContext,
) -> Result<u32, RunnerError> {
  let len = challenge.steps.len();
  let step = challenge
    .steps
    .get(step_index)
    .ok_or(RunnerError::OutOfRange { cursor: step_index, len })?;

  Ok(match policy {
    RewardPolicy::EqualSplit => {
      let reward = challenge.reward_points;
      equal_split_cumulative(reward, len, step_index + 1) - equal_split_cumulative(reward, len, step_index)
    }
    RewardPolicy::FlatStreak(bonus) => {
      let base = step.reward_points.unwrap_or(challenge.reward_points);
      bonus.apply(base, ctx.streak)
    }
  })
}

/// Total paid out after the first `k` steps.
fn equal_split_cumulative(reward: u32, len: usize, k: usize) -> u32 {
  if k >= len {
    return reward;
  }
  let (reward, n) = (u64::from(reward), len as u64);
  // round-half-up of reward / n
  let base = (2 * reward + n) / (2 * n);
  (base * k as u64).min(reward) as u32
}

/// End-of-drill bonus: `floor(points * rate)`.
pub fn completion_bonus(points: u32, rate: f64) -> u32 {
  scale_milli(points, to_milli(rate))
}

/// Session total. Equal-split sessions pay exactly `reward_points` once complete.
pub fn final_tally(policy: &RewardPolicy, challenge: &Challenge, earned: u32, complete: bool) -> u32 {
  match policy {
    RewardPolicy::EqualSplit if complete => challenge.reward_points,
    _ => earned,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Category, Difficulty, Step};

  fn challenge(reward: u32, n: usize) -> Challenge {
    Challenge {
      id: "score".into(),
      title: "Score".into(),
      description: String::new(),
      category: Category::Docker,
      difficulty: Difficulty::Medium,
      reward_points: reward,
      steps: (0..n).map(|i| Step::new(format!("s{i}"), format!("c{i}"))).collect(),
    }
  }

  fn split(reward: u32, n: usize) -> Vec<u32> {
    let c = challenge(reward, n);
    (0..n)
      .map(|i| points_for_step(&RewardPolicy::EqualSplit, &c, i, StepContext::default()).unwrap())
      .collect()
  }

  #[test]
  fn equal_split_even() {
    assert_eq!(split(10, 2), vec![5, 5]);
    assert_eq!(split(100, 4), vec![25, 25, 25, 25]);
  }

  #[test]
  fn equal_split_last_step_absorbs_remainder() {
    assert_eq!(split(75, 6), vec![13, 13, 13, 13, 13, 10]);
    assert_eq!(split(100, 6).iter().sum::<u32>(), 100);
    assert_eq!(split(6, 4).iter().sum::<u32>(), 6);
  }

  #[test]
  fn equal_split_never_overpays_when_rounding_up() {
    // round(7/10) = 1, nine steps of 1 would leave -2 for the last one.
    let awards = split(7, 10);
    assert_eq!(awards.iter().sum::<u32>(), 7);
    assert_eq!(awards[9], 0);
  }

  #[test]
  fn streak_multiplier_floors() {
    let bonus = StreakBonus { rate: 0.1, cap: None };
    assert_eq!(bonus.apply(1, 0), 1);
    assert_eq!(bonus.apply(1, 1), 1);
    assert_eq!(bonus.apply(1, 2), 1);
    assert_eq!(bonus.apply(10, 3), 13);
    assert_eq!(bonus.apply(15, 1), 16);
  }

  #[test]
  fn streak_multiplier_respects_cap() {
    let bonus = StreakBonus { rate: 0.25, cap: Some(3.0) };
    assert_eq!(bonus.multiplier_milli(4), 2000);
    assert_eq!(bonus.multiplier_milli(8), 3000);
    assert_eq!(bonus.multiplier_milli(40), 3000);
    assert_eq!(bonus.apply(10, 40), 30);
  }

  #[test]
  fn flat_streak_prefers_step_reward() {
    let mut c = challenge(5, 2);
    c.steps[1].reward_points = Some(20);
    let policy = RewardPolicy::FlatStreak(StreakBonus::default());
    assert_eq!(points_for_step(&policy, &c, 0, StepContext { streak: 0 }).unwrap(), 5);
    assert_eq!(points_for_step(&policy, &c, 1, StepContext { streak: 1 }).unwrap(), 22);
  }

  #[test]
  fn out_of_range_step_is_an_error() {
    let c = challenge(10, 2);
    let err = points_for_step(&RewardPolicy::EqualSplit, &c, 2, StepContext::default()).unwrap_err();
    assert_eq!(err, RunnerError::OutOfRange { cursor: 2, len: 2 });
  }

  #[test]
  fn huge_rates_saturate_instead_of_overflowing() {
    let bonus = StreakBonus { rate: 1e20, cap: None };
    assert_eq!(bonus.apply(25, 1), u32::MAX);
    assert_eq!(bonus.apply(0, 5), 0);
    assert_eq!(completion_bonus(1000, 1e17), u32::MAX);
    assert_eq!(completion_bonus(1000, f64::INFINITY), 0);
  }

  #[test]
  fn completion_bonus_floors() {
    assert_eq!(completion_bonus(41, 0.5), 20);
    assert_eq!(completion_bonus(0, 0.5), 0);
    assert_eq!(completion_bonus(41, 0.0), 0);
  }

  #[test]
  fn final_tally_by_policy() {
    let c = challenge(10, 2);
    assert_eq!(final_tally(&RewardPolicy::EqualSplit, &c, 10, true), 10);
    assert_eq!(final_tally(&RewardPolicy::EqualSplit, &c, 5, false), 5);
    let streak = RewardPolicy::FlatStreak(StreakBonus::default());
    assert_eq!(final_tally(&streak, &c, 37, true), 37);
  }
}
