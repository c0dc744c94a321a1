pub mod llama_stack;

use std::time::Duration;

use agentgate_core::config::UpstreamConfig;

use crate::provider::{AgentClient, LlmError};

/// Create the upstream agent client from config.
pub fn create_client(config: &UpstreamConfig) -> Result<Box<dyn AgentClient>, LlmError> {
    if config.url.is_empty() {
        return Err(LlmError::NotConfigured("UPSTREAM_URL not set".into()));
    }
    Ok(Box::new(llama_stack::LlamaStackClient::new(
        config.url.clone(),
        config.api_key.clone(),
        Duration::from_secs(config.timeout_secs),
    )?))
}
