use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::error::CoreError;

/// User feedback on a single LLM answer.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FeedbackRequest {
    pub conversation_id: String,
    pub user_question: String,
    pub llm_response: String,
    /// -1 (negative) or 1 (positive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<String>,
}

impl FeedbackRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(sentiment) = self.sentiment {
            if sentiment != -1 && sentiment != 1 {
                return Err(CoreError::InvalidRequest(format!(
                    "Improper sentiment value of {}, needs to be -1 or 1",
                    sentiment
                )));
            }
        }
        if self.sentiment.is_none() && self.user_feedback.as_deref().map_or(true, str::is_empty) {
            return Err(CoreError::InvalidRequest(
                "At least one form of feedback must be provided".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub user_id: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub feedback: FeedbackRequest,
}

/// File-based feedback store, one JSON file per submission.
pub struct FeedbackStore {
    dir: PathBuf,
}

impl FeedbackStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn store(&self, user_id: &str, feedback: &FeedbackRequest) -> Result<PathBuf, CoreError> {
        fs::create_dir_all(&self.dir).await?;

        let record = FeedbackRecord {
            user_id: user_id.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            feedback: feedback.clone(),
        };
        let path = self.dir.join(format!("{}.json", Uuid::new_v4()));
        fs::write(&path, serde_json::to_string_pretty(&record)?).await?;

        info!(path = %path.display(), conversation = %feedback.conversation_id, "feedback stored");
        Ok(path)
    }
}
