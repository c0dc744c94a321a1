pub mod config;
pub mod error;
pub mod feedback;
pub mod request;
pub mod transcript;

pub use config::Config;
pub use error::*;
pub use feedback::{FeedbackRequest, FeedbackStore};
pub use request::{validate_attachments_metadata, Attachment, Document, QueryRequest};
pub use transcript::{TranscriptRecord, TranscriptStore, TurnSummary};
