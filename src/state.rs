//! Application state shared by HTTP and WebSocket handlers.
//!
//! This module owns:
//!   - the read-only content catalog (config bank + built-in seeds)
//!   - the drill rules (from TOML or defaults)
//!   - the progress cache and the store it is persisted through
//!
//! Sessions are NOT kept here: each WebSocket connection owns its own runner.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument, warn};

use crate::catalog::Catalog;
use crate::config::{load_lab_config_from_env, LabConfig};
use crate::progress::{JsonFileStore, MemoryStore, Progress, ProgressStore};
use crate::runner::{DrillRules, SessionSummary};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub drill_rules: DrillRules,
    pub progress: Arc<RwLock<Progress>>,
    store: Arc<dyn ProgressStore>,
    persist_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Build state from env: load config, build the catalog, pick a progress store.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Self {
        let cfg = load_lab_config_from_env();

        let store: Arc<dyn ProgressStore> = match std::env::var("PROGRESS_PATH") {
            Ok(path) => {
                info!(target: "opsdrill", %path, "Persisting progress to JSON file.");
                Arc::new(JsonFileStore::new(path))
            }
            Err(_) => {
                info!(target: "opsdrill", "PROGRESS_PATH not set; progress lives in memory only.");
                Arc::new(MemoryStore::default())
            }
        };

        Self::new(cfg.as_ref(), store)
    }

    /// Explicit construction; the store is injected, never looked up.
    pub fn new(cfg: Option<&LabConfig>, store: Arc<dyn ProgressStore>) -> Self {
        let catalog = Catalog::build(cfg);
        let drill_rules = cfg.map(|c| c.drill.rules()).unwrap_or_default();

        let progress = match store.load() {
            Ok(p) => p,
            Err(e) => {
                error!(target: "progress", error = %e, "Failed to load progress; starting fresh");
                Progress::default()
            }
        };
        info!(target: "progress", total_xp = progress.total_xp, sessions = progress.sessions_played, "Progress loaded");

        Self {
            catalog: Arc::new(catalog),
            drill_rules,
            progress: Arc::new(RwLock::new(progress)),
            store,
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Credit a finished session and persist. Call exactly once per summary.
    /// Store failures are logged; the in-memory total stays credited.
    #[instrument(level = "info", skip(self, summary), fields(session = %summary.session_id, challenge = %summary.challenge_id))]
    pub async fn record_summary(&self, summary: &SessionSummary) -> Progress {
        let credited = {
            let mut progress = self.progress.write().await;
            progress.apply(summary);
            progress.clone()
        };
        info!(target: "progress", credited = summary.credited_xp(), total_xp = credited.total_xp, "Session credited");
        self.persist().await;
        credited
    }

    /// Write the latest progress through the store off the async workers.
    /// Writers queue on `persist_lock`, so the last save always carries the newest totals.
    async fn persist(&self) {
        let _turn = self.persist_lock.lock().await;
        let latest = self.progress.read().await.clone();
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.save(&latest)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(target: "progress", error = %e, "Failed to persist progress"),
            Err(e) => error!(target: "progress", error = %e, "Progress save task failed"),
        }
    }

    pub async fn progress_snapshot(&self) -> Progress {
        self.progress.read().await.clone()
    }
}
