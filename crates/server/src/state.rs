use std::sync::Arc;

use agentgate_agent::ConversationRegistry;
use agentgate_core::{Config, FeedbackStore, TranscriptStore};
use agentgate_llm::AgentClient;

use crate::auth::AuthModule;
use crate::metrics::Metrics;

pub struct AppState {
    pub config: Arc<Config>,
    pub client: Arc<dyn AgentClient>,
    pub auth: AuthModule,
    pub conversations: ConversationRegistry,
    pub metrics: Metrics,
    /// `None` when transcript collection is disabled.
    pub transcripts: Option<TranscriptStore>,
    /// `None` when feedback collection is disabled.
    pub feedback: Option<FeedbackStore>,
}
