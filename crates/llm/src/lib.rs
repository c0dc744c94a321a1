pub mod provider;
pub mod providers;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use provider::{AgentClient, LlmError, TurnStream};
pub use providers::create_client;
pub use providers::llama_stack::LlamaStackClient;
