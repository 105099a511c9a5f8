//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Category, Challenge, CommandCard, Difficulty};
use crate::progress::Progress;
use crate::runner::{ChallengeRunner, LogEntry, Phase, SessionSummary, VariantKind};
use crate::util::format_clock;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartScenario {
        #[serde(rename = "scenarioId")]
        scenario_id: String,
    },
    StartDrill {
        #[serde(default)]
        category: Option<Category>,
    },
    Submit {
        input: String,
    },
    Hint,
    Skip,
    Reset,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Snapshot(SessionSnapshot),
    Finished {
        summary: SessionSummary,
        progress: Progress,
    },
    Error {
        message: String,
    },
}

/// What the client renders after every transition. `entries` holds only the
/// log lines not yet sent on this connection, oldest first.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    #[serde(rename = "challengeId", skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantKind>,
    pub cursor: usize,
    #[serde(rename = "stepCount")]
    pub step_count: usize,
    #[serde(rename = "pointsEarned")]
    pub points_earned: u32,
    pub streak: u32,
    #[serde(rename = "remainingTime", skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock: Option<String>,
    pub entries: Vec<LogEntry>,
}

impl SessionSnapshot {
    /// Snapshot with log entries from index `since` onward.
    pub fn of(runner: &ChallengeRunner, since: usize) -> Self {
        let session = runner.session();
        let log = runner.event_log();
        Self {
            phase: runner.phase(),
            challenge_id: session.map(|s| s.challenge().id.clone()),
            variant: session.map(|s| s.variant().kind()),
            cursor: runner.cursor(),
            step_count: session.map(|s| s.step_count()).unwrap_or(0),
            points_earned: runner.points_earned(),
            streak: session.map(|s| s.streak()).unwrap_or(0),
            remaining_time: runner.remaining_time(),
            clock: runner.remaining_time().map(format_clock),
            entries: log.get(since..).unwrap_or(&[]).to_vec(),
        }
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Serialize)]
pub struct ScenarioOut {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub difficulty: Difficulty,
    #[serde(rename = "rewardPoints")]
    pub reward_points: u32,
    #[serde(rename = "stepCount")]
    pub step_count: usize,
}

/// Listing view: no answers leak to the client.
pub fn to_scenario_out(c: &Challenge) -> ScenarioOut {
    ScenarioOut {
        id: c.id.clone(),
        title: c.title.clone(),
        description: c.description.clone(),
        category: c.category,
        difficulty: c.difficulty,
        reward_points: c.reward_points,
        step_count: c.steps.len(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CommandQuery {
    pub category: Option<Category>,
}

#[derive(Debug, Serialize)]
pub struct CommandOut {
    pub id: String,
    pub description: String,
    pub category: Category,
    pub difficulty: Difficulty,
    pub xp: u32,
}

pub fn to_command_out(c: &CommandCard) -> CommandOut {
    CommandOut {
        id: c.id.clone(),
        description: c.description.clone(),
        category: c.category,
        difficulty: c.difficulty,
        xp: c.xp,
    }
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: String,
}
