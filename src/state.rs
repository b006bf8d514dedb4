//! Application state: catalog, prompts, the evaluation service client, and the
//! session store.
//!
//! This module owns:
//!   - the question/checkpoint catalog (from TOML or built-in)
//!   - the prompts struct (from TOML or defaults)
//!   - the optional text generator (OpenAI when OPENAI_API_KEY is set)
//!   - the in-process wizard session store
//!
//! Without a generator, evaluation and course generation fail with
//! `LlmError::NotConfigured`; the wizard itself keeps working.

use std::{sync::Arc, time::Duration};

use tracing::{info, instrument, warn};

use crate::catalog::Catalog;
use crate::config::{load_wizard_config_from_env, ConfigError, Prompts};
use crate::error::LlmError;
use crate::openai::{OpenAI, TextGenerator};
use crate::store::{SessionStore, DEFAULT_SESSION_TTL};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub prompts: Prompts,
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub sessions: SessionStore,
}

impl AppState {
    /// Build state from env: load config, validate the catalog, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, ConfigError> {
        let cfg = load_wizard_config_from_env().unwrap_or_default();
        let catalog = cfg.catalog()?;

        for s in catalog.sections() {
            info!(
                target: "course_wizard",
                section = %s.id,
                questions = s.questions.len(),
                checkpoint = ?catalog.checkpoint_for_section(&s.id).map(|c| c.id.as_str()),
                "Catalog section"
            );
        }

        let generator: Option<Arc<dyn TextGenerator>> = match OpenAI::from_env() {
            Some(oa) => {
                info!(target: "course_wizard", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
                Some(Arc::new(oa))
            }
            None => {
                warn!(target: "course_wizard", "OpenAI disabled (no OPENAI_API_KEY). Evaluation requests will fail.");
                None
            }
        };

        let ttl = std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SESSION_TTL);
        info!(target: "course_wizard", ttl_secs = ttl.as_secs(), "Session store ready");

        let mut state = Self::with_parts(catalog, cfg.prompts, generator);
        state.sessions = SessionStore::with_ttl(ttl);
        Ok(state)
    }

    pub fn with_parts(catalog: Catalog, prompts: Prompts, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            prompts,
            generator,
            sessions: SessionStore::new(),
        }
    }

    /// The configured text generator, or `NotConfigured`.
    pub fn generator(&self) -> Result<&dyn TextGenerator, LlmError> {
        self.generator.as_deref().ok_or(LlmError::NotConfigured)
    }

    pub fn llm_enabled(&self) -> bool {
        self.generator.is_some()
    }
}
