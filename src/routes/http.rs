//! HTTP endpoint handlers. Read-only views over the catalog and progress;
//! play happens over the WebSocket.

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, http::StatusCode, Json, response::IntoResponse};
use tracing::{debug, instrument};

use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_scenarios(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let out: Vec<ScenarioOut> = state.catalog.scenarios().iter().map(|c| to_scenario_out(c)).collect();
  debug!(target: "opsdrill", count = out.len(), "HTTP scenarios listed");
  Json(out)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_scenario(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<ScenarioOut>, (StatusCode, Json<ErrorOut>)> {
  match state.catalog.scenario(&id) {
    Some(c) => Ok(Json(to_scenario_out(&c))),
    None => {
      debug!(target: "opsdrill", %id, "HTTP scenario not found");
      Err((StatusCode::NOT_FOUND, Json(ErrorOut { error: format!("unknown scenario: {id}") })))
    }
  }
}

#[instrument(level = "info", skip(state), fields(category = ?q.category))]
pub async fn http_list_commands(
  State(state): State<Arc<AppState>>,
  Query(q): Query<CommandQuery>,
) -> impl IntoResponse {
  let out: Vec<CommandOut> = state.catalog.commands(q.category).into_iter().map(to_command_out).collect();
  debug!(target: "opsdrill", count = out.len(), "HTTP commands listed");
  Json(out)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_progress(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.progress_snapshot().await)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::progress::MemoryStore;
  use crate::routes::build_router;
  use axum::body::{to_bytes, Body};
  use axum::http::{Request, StatusCode};
  use tower::ServiceExt;

  fn app() -> axum::Router {
    build_router(Arc::new(AppState::new(None, Arc::new(MemoryStore::default()))))
  }

  async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
    let res = app().oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn health_is_ok() {
    let (status, v) = get_json("/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["ok"], true);
  }

  #[tokio::test]
  async fn scenarios_are_listed() {
    let (_, v) = get_json("/api/v1/scenarios").await;
    let list = v.as_array().unwrap();
    assert_eq!(list.len(), 4);
    assert!(list.iter().all(|s| s.get("steps").is_none()));
  }

  #[tokio::test]
  async fn commands_filter_by_category() {
    let (_, v) = get_json("/api/v1/commands?category=kubernetes").await;
    let list = v.as_array().unwrap();
    assert_eq!(list.len(), 6);
    assert!(list.iter().all(|c| c["category"] == "kubernetes"));
    assert!(list.iter().all(|c| c.get("command").is_none()));
  }

  #[tokio::test]
  async fn single_scenario_or_404() {
    let (status, v) = get_json("/api/v1/scenarios/scenario-linux-diskfull").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["rewardPoints"], 75);

    let (status, v) = get_json("/api/v1/scenarios/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(v["error"].as_str().unwrap().contains("missing"));
  }

  #[tokio::test]
  async fn fresh_progress_is_zero() {
    let (_, v) = get_json("/api/v1/progress").await;
    assert_eq!(v["total_xp"], 0);
  }
}
