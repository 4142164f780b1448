//! Application state shared by every handler.
//!
//! Owns:
//!   - the content repository (in-memory by default, any `ContentRepository` in tests)
//!   - the prompts (from TOML or defaults)
//!   - the optional LLM client
//!   - the loaded settings

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::Settings;
use crate::openai::OpenAI;
use crate::prompts::{load_prompts, Prompts};
use crate::store::{ContentRepository, InMemoryContentRepository};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn ContentRepository>,
    pub ai: Option<OpenAI>,
    pub prompts: Prompts,
    pub settings: Settings,
}

impl AppState {
    /// Build state from settings: load prompts, init the LLM client, start an empty store.
    #[instrument(level = "info", skip_all)]
    pub fn from_settings(settings: Settings) -> Self {
        let prompts = load_prompts(settings.prompt_config_path.as_deref());
        let ai = OpenAI::from_settings(&settings.ai);

        if let Some(client) = &ai {
            info!(target: "learnpath", provider = client.provider_name(), model = %client.model(), "AI client enabled.");
        } else {
            warn!(target: "learnpath", "AI client disabled (no API key). Generation endpoints will serve fallback content.");
        }

        Self::new(Arc::new(InMemoryContentRepository::new()), ai, prompts, settings)
    }

    pub fn new(
        repo: Arc<dyn ContentRepository>,
        ai: Option<OpenAI>,
        prompts: Prompts,
        settings: Settings,
    ) -> Self {
        Self { repo, ai, prompts, settings }
    }

    pub fn ai_enabled(&self) -> bool {
        self.ai.is_some()
    }
}
