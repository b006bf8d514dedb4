//! In-process session store for wizard state.
//!
//! Entries are keyed by the fixed storage key plus the session id and expire
//! after an idle TTL (24h unless configured). The store is the explicit
//! load/save boundary: the session handler loads on connect, saves after each
//! mutating action and on disconnect, and clears on reset. Expired entries are
//! invisible to `load` and are swept on the next `save`.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{sync::RwLock, time::Instant};
use tracing::{debug, info, instrument};

use crate::wizard::WizardState;

pub const STORAGE_KEY: &str = "canvas-course-wizard-storage";

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct Entry {
    state: WizardState,
    touched: Instant,
}

#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries untouched for longer than `ttl` are dropped.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())), ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(session_id: &str) -> String {
        format!("{}/{}", STORAGE_KEY, session_id)
    }

    fn is_live(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.touched) <= self.ttl
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn load(&self, session_id: &str) -> Option<WizardState> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        entries
            .get(&Self::key(session_id))
            .filter(|e| self.is_live(e, now))
            .map(|e| e.state.clone())
    }

    #[instrument(level = "debug", skip(self, state), fields(section = state.current_section_index, answers = state.answers.len()))]
    pub async fn save(&self, session_id: &str, state: &WizardState) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| self.is_live(e, now));
        let expired = before - entries.len();
        if expired > 0 {
            info!(target: "wizard", expired, "Expired sessions dropped");
        }
        entries.insert(Self::key(session_id), Entry { state: state.clone(), touched: now });
        debug!(target: "wizard", %session_id, "Session saved");
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn clear(&self, session_id: &str) {
        self.entries.write().await.remove(&Self::key(session_id));
    }

    /// Live (unexpired) sessions.
    pub async fn session_count(&self) -> usize {
        let now = Instant::now();
        self.entries.read().await.values().filter(|e| self.is_live(e, now)).count()
    }
}
