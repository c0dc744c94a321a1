pub mod agent;
pub mod conversation;
pub mod session;

pub use agent::Agent;
pub use conversation::ConversationRegistry;
pub use session::{AgentSession, SessionIds};

use agentgate_llm::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}
