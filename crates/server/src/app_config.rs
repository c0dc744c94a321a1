//! Application configuration builders.
//!
//! Constructs the upstream client and the user-data stores from `Config`.

use std::sync::Arc;

use tracing::info;

use agentgate_core::{Config, FeedbackStore, TranscriptStore};
use agentgate_llm::AgentClient;

/// Load configuration from `.env` and environment variables.
pub fn load_config() -> Config {
    agentgate_core::config::load_dotenv();
    Config::from_env()
}

/// Build the upstream agent client.
pub fn build_client(config: &Config) -> anyhow::Result<Arc<dyn AgentClient>> {
    let client = agentgate_llm::create_client(&config.upstream)?;
    info!(
        "Upstream client ready (provider: {}, url: {})",
        client.provider_name(),
        config.upstream.url
    );
    Ok(Arc::from(client))
}

pub fn build_transcript_store(config: &Config) -> Option<TranscriptStore> {
    if !config.user_data.transcripts_enabled() {
        info!("Transcript collection disabled");
        return None;
    }
    let dir = config.user_data.transcripts_storage.as_ref()?;
    info!("Transcripts stored under {}", dir.display());
    Some(TranscriptStore::new(dir))
}

pub fn build_feedback_store(config: &Config) -> Option<FeedbackStore> {
    if !config.user_data.feedback_enabled() {
        info!("Feedback collection disabled");
        return None;
    }
    let dir = config.user_data.feedback_storage.as_ref()?;
    info!("Feedback stored under {}", dir.display());
    Some(FeedbackStore::new(dir))
}
