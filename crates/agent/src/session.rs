use std::sync::Arc;

use serde::{Deserialize, Serialize};

use agentgate_core::Document;
use agentgate_llm::types::{Session, Turn, TurnRequest, UserMessage};
use agentgate_llm::{AgentClient, TurnStream};

use crate::AgentError;

/// Upstream identifiers of one agent session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIds {
    pub agent_id: String,
    pub session_id: String,
}

/// A live session on an upstream agent.
#[derive(Clone)]
pub struct AgentSession {
    client: Arc<dyn AgentClient>,
    ids: SessionIds,
}

impl AgentSession {
    /// Attach to a session that already exists upstream.
    pub fn resume(client: Arc<dyn AgentClient>, agent_id: String, session_id: String) -> Self {
        Self {
            client,
            ids: SessionIds {
                agent_id,
                session_id,
            },
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.ids.agent_id
    }

    pub fn session_id(&self) -> &str {
        &self.ids.session_id
    }

    pub fn ids(&self) -> &SessionIds {
        &self.ids
    }

    fn turn_request(query: &str, documents: Vec<Document>) -> TurnRequest {
        TurnRequest {
            messages: vec![UserMessage::new(query)],
            documents,
        }
    }

    /// Send one user message and wait for the finished turn.
    pub async fn create_turn(&self, query: &str, documents: Vec<Document>) -> Result<Turn, AgentError> {
        let request = Self::turn_request(query, documents);
        Ok(self
            .client
            .create_turn(&self.ids.agent_id, &self.ids.session_id, &request)
            .await?)
    }

    /// Send one user message and stream the turn's events.
    pub async fn create_turn_stream(
        &self,
        query: &str,
        documents: Vec<Document>,
    ) -> Result<TurnStream, AgentError> {
        let request = Self::turn_request(query, documents);
        Ok(self
            .client
            .create_turn_stream(&self.ids.agent_id, &self.ids.session_id, &request)
            .await?)
    }

    pub async fn fetch(&self) -> Result<Session, AgentError> {
        Ok(self
            .client
            .get_session(&self.ids.agent_id, &self.ids.session_id)
            .await?)
    }

    pub async fn delete(&self) -> Result<(), AgentError> {
        Ok(self
            .client
            .delete_session(&self.ids.agent_id, &self.ids.session_id)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Agent;
    use agentgate_llm::mock::MockAgentClient;
    use agentgate_llm::types::content_to_string;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_streamed_turn_carries_query_and_documents() {
        let client = Arc::new(MockAgentClient::new().with_tokens(&["Hi", " there"]));
        let mut agent = Agent::new(client.clone(), "llama3", "sys");
        let session = agent.create_session("chat_session").await.unwrap();

        let docs = vec![Document {
            content: "trace".into(),
            mime_type: "text/plain".into(),
        }];
        let stream = session.create_turn_stream("hello?", docs).await.unwrap();
        let tokens: Vec<String> = stream
            .filter_map(|c| async move { c.ok().and_then(|c| c.text_delta().map(str::to_string)) })
            .collect()
            .await;
        assert_eq!(tokens, vec!["Hi".to_string(), " there".to_string()]);

        let turns = client.turns.lock().unwrap();
        let (agent_id, session_id, request) = &turns[0];
        assert_eq!(agent_id, session.agent_id());
        assert_eq!(session_id, session.session_id());
        assert_eq!(request.messages[0].content, "hello?");
        assert_eq!(request.documents[0].content, "trace");
    }

    #[tokio::test]
    async fn test_fetch_and_delete() {
        let client = Arc::new(MockAgentClient::new().with_answer("42"));
        let mut agent = Agent::new(client.clone(), "llama3", "sys");
        let session = agent.create_session("chat_session").await.unwrap();

        let turn = session.create_turn("answer?", Vec::new()).await.unwrap();
        assert_eq!(content_to_string(&turn.output_message.content), "42");

        let fetched = session.fetch().await.unwrap();
        assert_eq!(fetched.turns.len(), 1);

        session.delete().await.unwrap();
        assert!(session.fetch().await.is_err());
    }
}
