//! WebSocket upgrade + play loop.
//!
//! Each connection owns one `ChallengeRunner`. Client messages and the
//! one-second drill clock are multiplexed with `select!`, so exactly one
//! transition runs at a time and a tick that ends the drill always lands
//! before any later submit.

use std::sync::Arc;
use std::time::Duration;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use crate::error::RunnerError;
use crate::protocol::{ClientWsMessage, ServerWsMessage, SessionSnapshot};
use crate::runner::{ChallengeRunner, SessionSummary, Variant};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "opsdrill", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "opsdrill", "WebSocket connected");
  let mut conn = Connection::default();
  let mut clock = tokio::time::interval(Duration::from_secs(1));
  clock.set_missed_tick_behavior(MissedTickBehavior::Delay);

  'session: loop {
    let was_ticking = conn.runner.is_ticking();
    let replies = tokio::select! {
      msg = socket.recv() => match msg {
        Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "opsdrill", "WS received: {:?}", &incoming);
            conn.handle(incoming, &state).await
          }
          Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
        },
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
          continue;
        }
        Some(Ok(Message::Close(_))) | None => break,
        Some(Ok(_)) => continue,
        Some(Err(e)) => {
          warn!(target: "opsdrill", error = %e, "WS receive error");
          break;
        }
      },
      _ = clock.tick(), if was_ticking => conn.on_tick(&state).await,
    };

    // A freshly started drill gets a full first second.
    if !was_ticking && conn.runner.is_ticking() {
      clock.reset();
    }

    for reply in replies {
      let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
        serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
      });
      if let Err(e) = socket.send(Message::Text(out)).await {
        error!(target: "opsdrill", error = %e, "WS send error");
        break 'session;
      }
    }
  }
  info!(target: "opsdrill", "WebSocket disconnected");
}

/// Per-connection play state: the runner plus how much of its log the client has seen.
#[derive(Default)]
struct Connection {
  runner: ChallengeRunner,
  sent: usize,
}

impl Connection {
  async fn handle(&mut self, msg: ClientWsMessage, state: &AppState) -> Vec<ServerWsMessage> {
    let result = match msg {
      ClientWsMessage::Ping => return vec![ServerWsMessage::Pong],

      ClientWsMessage::StartScenario { scenario_id } => match state.catalog.scenario(&scenario_id) {
        Some(challenge) => self.runner.select_challenge(challenge, Variant::Scenario).map(|_| None),
        None => return vec![ServerWsMessage::Error { message: format!("Unknown scenarioId: {}", scenario_id) }],
      },

      ClientWsMessage::StartDrill { category } => {
        let drill = {
          let mut rng = rand::thread_rng();
          state.catalog.build_drill(category, &mut rng)
        };
        match drill {
          Some(challenge) => self
            .runner
            .select_challenge(Arc::new(challenge), Variant::Drill(state.drill_rules))
            .map(|_| None),
          None => return vec![ServerWsMessage::Error { message: "No commands available for that category.".into() }],
        }
      }

      ClientWsMessage::Submit { input } => self.runner.submit(&input).map(|v| v.summary),
      ClientWsMessage::Hint => self.runner.request_hint().map(|_| None),
      ClientWsMessage::Skip => self.runner.skip(),
      ClientWsMessage::Reset => self.runner.reset().map(|_| None),
    };
    self.respond(result, state).await
  }

  async fn on_tick(&mut self, state: &AppState) -> Vec<ServerWsMessage> {
    let result = self.runner.tick();
    self.respond(result, state).await
  }

  async fn respond(
    &mut self,
    result: Result<Option<SessionSummary>, RunnerError>,
    state: &AppState,
  ) -> Vec<ServerWsMessage> {
    let summary = match result {
      Ok(summary) => summary,
      Err(e) => return vec![ServerWsMessage::Error { message: e.to_string() }],
    };

    // Selecting has an empty log; start counting again from zero.
    self.sent = self.sent.min(self.runner.event_log().len());
    let mut replies = vec![ServerWsMessage::Snapshot(SessionSnapshot::of(&self.runner, self.sent))];
    self.sent = self.runner.event_log().len();

    if let Some(summary) = summary {
      let progress = state.record_summary(&summary).await;
      replies.push(ServerWsMessage::Finished { summary, progress });
    }
    replies
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::progress::MemoryStore;
  use crate::runner::Phase;

  fn state() -> AppState {
    AppState::new(None, Arc::new(MemoryStore::default()))
  }

  fn submit(input: &str) -> ClientWsMessage {
    ClientWsMessage::Submit { input: input.into() }
  }

  #[tokio::test]
  async fn scenario_play_credits_once() {
    let state = state();
    let mut conn = Connection::default();
    conn
      .handle(ClientWsMessage::StartScenario { scenario_id: "scenario-git-revert".into() }, &state)
      .await;
    for answer in ["git log --oneline -5", "git revert 7h8i9j0", "git log --oneline -3"] {
      let replies = conn.handle(submit(answer), &state).await;
      assert_eq!(replies.len(), 1);
    }
    let replies = conn.handle(submit("git push origin main"), &state).await;
    assert!(matches!(&replies[1], ServerWsMessage::Finished { summary, .. } if summary.points == 100));
    assert_eq!(state.progress_snapshot().await.total_xp, 100);

    let replies = conn.handle(submit("git push origin main"), &state).await;
    assert!(matches!(&replies[0], ServerWsMessage::Error { .. }));
    assert_eq!(state.progress_snapshot().await.total_xp, 100);
  }

  #[tokio::test]
  async fn snapshots_carry_only_new_entries() {
    let state = state();
    let mut conn = Connection::default();
    let first = conn
      .handle(ClientWsMessage::StartScenario { scenario_id: "scenario-docker-debug".into() }, &state)
      .await;
    let ServerWsMessage::Snapshot(snap) = &first[0] else { panic!("expected snapshot") };
    assert_eq!(snap.entries.len(), 2);

    let second = conn.handle(ClientWsMessage::Hint, &state).await;
    let ServerWsMessage::Snapshot(snap) = &second[0] else { panic!("expected snapshot") };
    assert_eq!(snap.entries.len(), 1);

    conn.handle(ClientWsMessage::Reset, &state).await;
    assert_eq!(conn.runner.phase(), Phase::Selecting);
    let third = conn
      .handle(ClientWsMessage::StartScenario { scenario_id: "scenario-docker-debug".into() }, &state)
      .await;
    let ServerWsMessage::Snapshot(snap) = &third[0] else { panic!("expected snapshot") };
    assert_eq!(snap.entries.len(), 2);
  }

  #[tokio::test]
  async fn drill_expires_on_ticks() {
    let mut state = state();
    state.drill_rules.time_budget_secs = Some(2);
    let mut conn = Connection::default();
    conn.handle(ClientWsMessage::StartDrill { category: Some(crate::domain::Category::Git) }, &state).await;
    assert!(conn.runner.is_ticking());
    assert_eq!(conn.on_tick(&state).await.len(), 1);
    let replies = conn.on_tick(&state).await;
    assert!(matches!(&replies[1], ServerWsMessage::Finished { summary, .. } if summary.points == 0));
    assert_eq!(state.progress_snapshot().await.sessions_played, 1);
  }

  #[tokio::test]
  async fn unknown_scenario_is_reported() {
    let state = state();
    let mut conn = Connection::default();
    let replies = conn.handle(ClientWsMessage::StartScenario { scenario_id: "nope".into() }, &state).await;
    assert!(matches!(&replies[0], ServerWsMessage::Error { message } if message.contains("nope")));
  }
}
