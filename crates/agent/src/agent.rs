use std::sync::Arc;

use tracing::{debug, info};

use agentgate_llm::types::AgentConfig;
use agentgate_llm::AgentClient;

use crate::session::AgentSession;
use crate::AgentError;

/// An upstream agent definition that is registered on first use.
///
/// The agent carries the model, the system instructions and the input
/// shields; every session opened from it shares those settings.
pub struct Agent {
    client: Arc<dyn AgentClient>,
    config: AgentConfig,
    agent_id: Option<String>,
}

impl Agent {
    pub fn new(client: Arc<dyn AgentClient>, model: &str, instructions: &str) -> Self {
        Self {
            client,
            config: AgentConfig {
                model: model.to_string(),
                instructions: instructions.to_string(),
                input_shields: Vec::new(),
                output_shields: Vec::new(),
                toolgroups: Vec::new(),
                client_tools: Vec::new(),
                enable_session_persistence: false,
            },
            agent_id: None,
        }
    }

    pub fn with_input_shields(mut self, shields: Vec<String>) -> Self {
        self.config.input_shields = shields;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Register the agent upstream unless that already happened.
    pub async fn initialize(&mut self) -> Result<&str, AgentError> {
        if self.agent_id.is_none() {
            let agent_id = self.client.create_agent(&self.config).await?;
            info!(agent_id = %agent_id, model = %self.config.model, "agent created");
            self.agent_id = Some(agent_id);
        }
        Ok(self.agent_id.as_deref().unwrap_or_default())
    }

    pub async fn create_session(&mut self, session_name: &str) -> Result<AgentSession, AgentError> {
        let agent_id = self.initialize().await?.to_string();
        let session_id = self.client.create_session(&agent_id, session_name).await?;
        debug!(agent_id = %agent_id, session_id = %session_id, "session created");
        Ok(AgentSession::resume(self.client.clone(), agent_id, session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentgate_llm::mock::MockAgentClient;

    #[tokio::test]
    async fn test_agent_registered_once() {
        let client = Arc::new(MockAgentClient::new());
        let mut agent = Agent::new(client.clone(), "llama3", "Be brief.")
            .with_input_shields(vec!["llama_guard".to_string()]);

        let first = agent.create_session("chat_session").await.unwrap();
        let second = agent.create_session("chat_session").await.unwrap();

        let agents = client.agents.lock().unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].model, "llama3");
        assert_eq!(agents[0].instructions, "Be brief.");
        assert_eq!(agents[0].input_shields, vec!["llama_guard".to_string()]);
        assert!(agents[0].toolgroups.is_empty());

        assert_eq!(first.agent_id(), second.agent_id());
        assert_ne!(first.session_id(), second.session_id());
    }
}
