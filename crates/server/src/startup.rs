//! Server startup: shared state initialization.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tracing::info;

use agentgate_agent::ConversationRegistry;
use agentgate_core::{Config, ConfigError};
use agentgate_llm::AgentClient;

use crate::app_config;
use crate::auth::AuthModule;
use crate::metrics::Metrics;
use crate::state::AppState;

/// Build `AppState` around an already constructed upstream client.
pub fn build_app_state(config: Config, client: Arc<dyn AgentClient>) -> anyhow::Result<Arc<AppState>> {
    config.validate()?;
    let auth: AuthModule = config.service.auth_module.parse()?;
    info!("Auth module: {}", auth);

    let capacity = NonZeroUsize::new(config.service.conversation_capacity).ok_or(
        ConfigError::InvalidValue("CONVERSATION_CAPACITY", "must be at least 1".to_string()),
    )?;

    let transcripts = app_config::build_transcript_store(&config);
    let feedback = app_config::build_feedback_store(&config);

    Ok(Arc::new(AppState {
        config: Arc::new(config),
        client,
        auth,
        conversations: ConversationRegistry::new(capacity),
        metrics: Metrics::new(),
        transcripts,
        feedback,
    }))
}
