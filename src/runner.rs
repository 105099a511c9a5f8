//! Challenge runner: the session state machine.
//!
//! ```text
//! Selecting --select_challenge--> Active --(last step solved | clock hits 0)--> Finished
//!     ^                             |                                             |
//!     +------------reset------------+--------------------reset--------------------+
//! ```
//!
//! Every mutating operation checks the phase and the current step before it
//! touches the session, so an `Err` always leaves the runner as it was.
//! Transitions that end a session hand back a `SessionSummary` exactly once;
//! the host credits XP from that and nothing else.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::Challenge;
use crate::error::RunnerError;
use crate::matcher;
use crate::scoring::{self, RewardPolicy, StepContext, StreakBonus};
use crate::sequencer::StepSequencer;
use crate::util::trunc_for_log;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
  Prompt,
  Echo,
  Success,
  Failure,
  Info,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
  pub kind: LogKind,
  pub text: String,
}

impl LogEntry {
  fn new(kind: LogKind, text: impl Into<String>) -> Self {
    Self { kind, text: text.into() }
  }
}

/// Rules for the timed command drill.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrillRules {
  /// Seconds on the clock; `None` plays untimed.
  pub time_budget_secs: Option<u32>,
  pub streak: StreakBonus,
  /// Share of the final score paid again as a bonus when the drill ends.
  pub completion_bonus_rate: f64,
}

impl Default for DrillRules {
  fn default() -> Self {
    Self {
      time_budget_secs: Some(120),
      streak: StreakBonus::default(),
      completion_bonus_rate: 0.5,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum Variant {
  /// Narrative lab: equal-split rewards, no skipping, hint after every miss.
  Scenario,
  /// Command drill: flat rewards with a streak multiplier, skippable, optionally timed.
  Drill(DrillRules),
}

/// Which kind of session produced a summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
  Scenario,
  Drill,
}

impl VariantKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      VariantKind::Scenario => "scenario",
      VariantKind::Drill => "drill",
    }
  }
}

impl Variant {
  pub fn kind(&self) -> VariantKind {
    match self {
      Variant::Scenario => VariantKind::Scenario,
      Variant::Drill(_) => VariantKind::Drill,
    }
  }

  pub fn policy(&self) -> RewardPolicy {
    match self {
      Variant::Scenario => RewardPolicy::EqualSplit,
      Variant::Drill(rules) => RewardPolicy::FlatStreak(rules.streak),
    }
  }

  fn allows_skip(&self) -> bool {
    matches!(self, Variant::Drill(_))
  }

  fn hint_on_failure(&self) -> bool {
    matches!(self, Variant::Scenario)
  }

  fn time_budget(&self) -> Option<u32> {
    match self {
      Variant::Scenario => None,
      Variant::Drill(rules) => rules.time_budget_secs,
    }
  }

  fn bonus_for(&self, points: u32) -> u32 {
    match self {
      Variant::Scenario => 0,
      Variant::Drill(rules) => scoring::completion_bonus(points, rules.completion_bonus_rate),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Selecting,
  Active,
  Finished,
}

impl Phase {
  pub fn as_str(&self) -> &'static str {
    match self {
      Phase::Selecting => "selecting",
      Phase::Active => "active",
      Phase::Finished => "finished",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
  Completed,
  TimeExpired,
}

/// What a finished session is worth. Produced once, when the session finishes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
  pub session_id: Uuid,
  pub challenge_id: String,
  pub variant: VariantKind,
  pub reason: FinishReason,
  pub points: u32,
  pub bonus: u32,
  pub steps_solved: usize,
  pub steps_total: usize,
}

impl SessionSummary {
  pub fn credited_xp(&self) -> u32 {
    self.points.saturating_add(self.bonus)
  }
}

/// Outcome of one `submit`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
  pub correct: bool,
  pub awarded: u32,
  pub summary: Option<SessionSummary>,
}

/// One play-through of a challenge.
#[derive(Clone, Debug)]
pub struct Session {
  id: Uuid,
  variant: Variant,
  sequencer: StepSequencer,
  points_earned: u32,
  streak: u32,
  log: Vec<LogEntry>,
  remaining_time: Option<u32>,
  finish: Option<FinishReason>,
}

impl Session {
  fn new(challenge: Arc<Challenge>, variant: Variant) -> Self {
    let mut session = Self {
      id: Uuid::new_v4(),
      variant,
      sequencer: StepSequencer::new(challenge),
      points_earned: 0,
      streak: 0,
      log: Vec::new(),
      remaining_time: variant.time_budget(),
      finish: None,
    };
    let challenge = Arc::clone(session.sequencer.challenge());
    if !challenge.description.is_empty() {
      session.push(LogKind::Info, challenge.description.clone());
    }
    session.push(LogKind::Prompt, challenge.steps[0].instruction.clone());
    session
  }

  pub fn id(&self) -> Uuid { self.id }
  pub fn challenge(&self) -> &Challenge { self.sequencer.challenge() }
  pub fn variant(&self) -> &Variant { &self.variant }
  pub fn cursor(&self) -> usize { self.sequencer.cursor() }
  pub fn step_count(&self) -> usize { self.sequencer.len() }
  pub fn points_earned(&self) -> u32 { self.points_earned }
  pub fn streak(&self) -> u32 { self.streak }
  pub fn remaining_time(&self) -> Option<u32> { self.remaining_time }
  pub fn event_log(&self) -> &[LogEntry] { &self.log }

  /// Summary of a finished session; `None` while still in play.
  pub fn summary(&self) -> Option<SessionSummary> {
    self.finish.map(|reason| self.tally(reason))
  }

  fn tally(&self, reason: FinishReason) -> SessionSummary {
    let policy = self.variant.policy();
    let points = scoring::final_tally(&policy, self.challenge(), self.points_earned, self.sequencer.is_complete());
    SessionSummary {
      session_id: self.id,
      challenge_id: self.challenge().id.clone(),
      variant: self.variant.kind(),
      reason,
      points,
      bonus: self.variant.bonus_for(points),
      steps_solved: self.sequencer.cursor(),
      steps_total: self.sequencer.len(),
    }
  }

  fn push(&mut self, kind: LogKind, text: impl Into<String>) {
    self.log.push(LogEntry::new(kind, text));
  }

  /// After the cursor moved: either close the session or prompt for the next step.
  fn after_advance(&mut self) -> Option<SessionSummary> {
    match self.sequencer.current() {
      Ok(next) => {
        let instruction = next.instruction.clone();
        self.push(LogKind::Prompt, instruction);
        None
      }
      Err(_) => Some(self.close(FinishReason::Completed)),
    }
  }

  fn close(&mut self, reason: FinishReason) -> SessionSummary {
    self.finish = Some(reason);
    let summary = self.tally(reason);
    let bonus = if summary.bonus > 0 { format!(", bonus +{} XP", summary.bonus) } else { String::new() };
    match reason {
      FinishReason::Completed => {
        self.push(LogKind::Success, format!("Challenge complete! +{} XP{}", summary.points, bonus))
      }
      FinishReason::TimeExpired => self.push(
        LogKind::Info,
        format!(
          "Time's up! Solved {}/{} steps. +{} XP{}",
          summary.steps_solved, summary.steps_total, summary.points, bonus
        ),
      ),
    }
    info!(target: "runner", session = %self.id, challenge = %summary.challenge_id, ?reason, points = summary.points, bonus = summary.bonus, "Session finished");
    summary
  }
}

#[derive(Clone, Debug)]
pub enum RunnerState {
  Selecting,
  Active(Session),
  Finished(Session),
}

impl RunnerState {
  pub fn phase(&self) -> Phase {
    match self {
      RunnerState::Selecting => Phase::Selecting,
      RunnerState::Active(_) => Phase::Active,
      RunnerState::Finished(_) => Phase::Finished,
    }
  }
}

/// Drives one player through one challenge at a time.
#[derive(Clone, Debug)]
pub struct ChallengeRunner {
  state: RunnerState,
}

impl Default for ChallengeRunner {
  fn default() -> Self { Self::new() }
}

impl ChallengeRunner {
  pub fn new() -> Self {
    Self { state: RunnerState::Selecting }
  }

  pub fn phase(&self) -> Phase { self.state.phase() }

  /// The active or finished session, if any.
  pub fn session(&self) -> Option<&Session> {
    match &self.state {
      RunnerState::Selecting => None,
      RunnerState::Active(s) | RunnerState::Finished(s) => Some(s),
    }
  }

  pub fn cursor(&self) -> usize {
    self.session().map(Session::cursor).unwrap_or(0)
  }

  pub fn points_earned(&self) -> u32 {
    self.session().map(Session::points_earned).unwrap_or(0)
  }

  pub fn remaining_time(&self) -> Option<u32> {
    self.session().and_then(Session::remaining_time)
  }

  pub fn event_log(&self) -> &[LogEntry] {
    self.session().map(Session::event_log).unwrap_or(&[])
  }

  /// True while an active session has a running clock.
  pub fn is_ticking(&self) -> bool {
    matches!(&self.state, RunnerState::Active(s) if s.remaining_time.is_some())
  }

  pub fn select_challenge(&mut self, challenge: Arc<Challenge>, variant: Variant) -> Result<(), RunnerError> {
    if !matches!(self.state, RunnerState::Selecting) {
      return Err(self.reject("select a challenge"));
    }
    challenge.validate()?;
    if variant.time_budget() == Some(0) {
      return Err(RunnerError::InvalidChallenge("time budget must be at least one second".into()));
    }

    let session = Session::new(challenge, variant);
    debug!(target: "runner", session = %session.id, challenge = %session.challenge().id, variant = variant.kind().as_str(), steps = session.step_count(), "Session started");
    self.state = RunnerState::Active(session);
    Ok(())
  }

  pub fn submit(&mut self, input: &str) -> Result<Verdict, RunnerError> {
    let session = self.active_mut("submit")?;
    let index = session.cursor();
    let step = session.sequencer.current()?.clone();
    let correct = matcher::matches(input, &step);
    let awarded = if correct {
      let policy = session.variant.policy();
      scoring::points_for_step(&policy, session.challenge(), index, StepContext { streak: session.streak })?
    } else {
      0
    };

    session.push(LogKind::Echo, input);
    debug!(target: "runner", session = %session.id, step = index, %correct, input = %trunc_for_log(input, 80), "Answer submitted");

    if !correct {
      session.streak = 0;
      session.push(LogKind::Failure, "Incorrect. Try again!");
      if session.variant.hint_on_failure() && !step.hint.is_empty() {
        session.push(LogKind::Info, format!("Hint: {}", step.hint));
      }
      return Ok(Verdict { correct, awarded, summary: None });
    }

    let streak_before = session.streak;
    session.points_earned = session.points_earned.saturating_add(awarded);
    session.streak += 1;
    let streak_note = match session.variant {
      Variant::Drill(_) if streak_before > 0 => format!(" ({}x streak)", session.streak),
      _ => String::new(),
    };
    session.push(LogKind::Success, format!("Correct! +{awarded} XP{streak_note}"));
    if !step.success_output.is_empty() {
      session.push(LogKind::Info, step.success_output.clone());
    }
    if !step.note.is_empty() {
      session.push(LogKind::Info, step.note.clone());
    }
    session.sequencer.advance()?;
    let summary = session.after_advance();
    self.settle(&summary);
    Ok(Verdict { correct, awarded, summary })
  }

  /// Appends the current step's hint. Score and cursor are untouched.
  pub fn request_hint(&mut self) -> Result<(), RunnerError> {
    let session = self.active_mut("request a hint")?;
    let hint = session.sequencer.current()?.hint.clone();
    let text = if hint.is_empty() { "No hint for this step.".to_string() } else { format!("Hint: {hint}") };
    session.push(LogKind::Info, text);
    Ok(())
  }

  /// Reveal the answer and move on without points. Drill only.
  pub fn skip(&mut self) -> Result<Option<SessionSummary>, RunnerError> {
    let session = self.active_mut("skip")?;
    if !session.variant.allows_skip() {
      warn!(target: "runner", session = %session.id, "Skip rejected: scenario sessions cannot skip");
      return Err(RunnerError::InvalidStateTransition { op: "skip", state: "playing a scenario" });
    }
    let expected = session.sequencer.current()?.expected_answer.clone();
    session.push(LogKind::Info, format!("Skipped. The answer was: {expected}"));
    session.streak = 0;
    session.sequencer.advance()?;
    let summary = session.after_advance();
    self.settle(&summary);
    Ok(summary)
  }

  /// One second of wall clock. Reaching zero finishes the session wherever it is.
  pub fn tick(&mut self) -> Result<Option<SessionSummary>, RunnerError> {
    let session = self.active_mut("tick")?;
    let remaining = match session.remaining_time {
      Some(t) => t,
      None => return Err(RunnerError::InvalidStateTransition { op: "tick", state: "untimed" }),
    };
    let remaining = remaining.saturating_sub(1);
    session.remaining_time = Some(remaining);
    let summary = (remaining == 0).then(|| session.close(FinishReason::TimeExpired));
    self.settle(&summary);
    Ok(summary)
  }

  /// Discard the current session and go back to selecting.
  pub fn reset(&mut self) -> Result<(), RunnerError> {
    if matches!(self.state, RunnerState::Selecting) {
      return Err(self.reject("reset"));
    }
    if let Some(s) = self.session() {
      debug!(target: "runner", session = %s.id, phase = self.phase().as_str(), "Session discarded");
    }
    self.state = RunnerState::Selecting;
    Ok(())
  }

  fn active_mut(&mut self, op: &'static str) -> Result<&mut Session, RunnerError> {
    let phase = self.phase();
    match &mut self.state {
      RunnerState::Active(s) => Ok(s),
      _ => Err(rejected(op, phase)),
    }
  }

  fn reject(&self, op: &'static str) -> RunnerError {
    rejected(op, self.phase())
  }

  /// Move a closed session from Active to Finished.
  fn settle(&mut self, summary: &Option<SessionSummary>) {
    if summary.is_none() {
      return;
    }
    self.state = match std::mem::replace(&mut self.state, RunnerState::Selecting) {
      RunnerState::Active(s) => RunnerState::Finished(s),
      other => other,
    };
  }
}

fn rejected(op: &'static str, phase: Phase) -> RunnerError {
  let state = phase.as_str();
  warn!(target: "runner", op, state, "Rejected transition");
  RunnerError::InvalidStateTransition { op, state }
}
