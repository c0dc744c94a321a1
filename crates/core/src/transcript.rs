//! Per-turn transcript records written to the local filesystem.

use std::path::{Component, Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::error::CoreError;
use crate::request::{Attachment, QueryRequest};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    /// Provider that served the turn.
    pub provider: Option<String>,
    /// Model that served the turn.
    pub model: String,
    pub query_provider: Option<String>,
    pub query_model: Option<String>,
    pub user_id: String,
    pub conversation_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub metadata: TranscriptMetadata,
    pub redacted_query: String,
    pub query_is_valid: bool,
    pub llm_response: String,
    pub rag_chunks: Vec<String>,
    pub truncated: bool,
    pub attachments: Vec<Attachment>,
}

/// Everything known about a finished turn, before it becomes a record.
#[derive(Debug, Clone)]
pub struct TurnSummary<'a> {
    pub user_id: &'a str,
    pub conversation_id: &'a str,
    pub model_id: &'a str,
    pub provider_id: Option<&'a str>,
    pub query_is_valid: bool,
    pub query: &'a str,
    pub query_request: &'a QueryRequest,
    pub response: &'a str,
    pub rag_chunks: Vec<String>,
    pub truncated: bool,
}

impl TranscriptRecord {
    pub fn from_turn(turn: &TurnSummary<'_>) -> Self {
        Self {
            metadata: TranscriptMetadata {
                provider: turn.provider_id.map(str::to_string),
                model: turn.model_id.to_string(),
                query_provider: turn.query_request.provider.clone(),
                query_model: turn.query_request.model.clone(),
                user_id: turn.user_id.to_string(),
                conversation_id: turn.conversation_id.to_string(),
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            },
            redacted_query: turn.query.to_string(),
            query_is_valid: turn.query_is_valid,
            llm_response: turn.response.to_string(),
            rag_chunks: turn.rag_chunks.clone(),
            truncated: turn.truncated,
            attachments: turn.query_request.attachments().to_vec(),
        }
    }
}

/// Normalize an untrusted id as if it were rooted at `/`, then drop the root.
///
/// `..` can climb at most to the virtual root, so the result always stays
/// below whatever directory it is joined onto.
pub fn normalize_component(raw: &str) -> PathBuf {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(raw).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    parts.iter().collect()
}

/// File-based transcript store, one JSON file per turn.
pub struct TranscriptStore {
    dir: PathBuf,
}

impl TranscriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding all transcripts of one user's conversation.
    pub fn conversation_dir(&self, user_id: &str, conversation_id: &str) -> PathBuf {
        self.dir
            .join(normalize_component(user_id))
            .join(normalize_component(conversation_id))
    }

    /// Write the record and return the path it landed at.
    pub async fn store(&self, record: &TranscriptRecord) -> Result<PathBuf, CoreError> {
        let dir = self.conversation_dir(&record.metadata.user_id, &record.metadata.conversation_id);
        fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("{}.json", Uuid::new_v4()));
        let data = serde_json::to_string_pretty(record)?;
        fs::write(&path, data).await?;

        info!(path = %path.display(), "transcript stored");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> QueryRequest {
        QueryRequest {
            query: "How do I scale a deployment?".into(),
            provider: Some("ollama".into()),
            model: Some("llama3".into()),
            attachments: Some(vec![Attachment {
                attachment_type: "log".into(),
                content_type: "text/plain".into(),
                content: "OOMKilled".into(),
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_component() {
        assert_eq!(normalize_component("user-1"), PathBuf::from("user-1"));
        assert_eq!(normalize_component("../../etc"), PathBuf::from("etc"));
        assert_eq!(normalize_component("/abs/../x"), PathBuf::from("x"));
        assert_eq!(normalize_component("a/./b"), PathBuf::from("a/b"));
        assert_eq!(normalize_component(".."), PathBuf::new());
    }

    #[tokio::test]
    async fn test_store_writes_record() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(tmp.path());
        let req = request();

        let record = TranscriptRecord::from_turn(&TurnSummary {
            user_id: "user-1",
            conversation_id: "conv-1",
            model_id: "llama3",
            provider_id: Some("ollama"),
            query_is_valid: true,
            query: &req.query,
            query_request: &req,
            response: "Use kubectl scale.",
            rag_chunks: vec![],
            truncated: false,
        });
        let path = store.store(&record).await.unwrap();

        assert!(path.starts_with(tmp.path().join("user-1").join("conv-1")));
        let stored: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored["metadata"]["conversation_id"], "conv-1");
        assert_eq!(stored["metadata"]["query_model"], "llama3");
        assert_eq!(stored["redacted_query"], "How do I scale a deployment?");
        assert_eq!(stored["llm_response"], "Use kubectl scale.");
        assert_eq!(stored["query_is_valid"], true);
        assert_eq!(stored["truncated"], false);
        assert_eq!(stored["rag_chunks"].as_array().unwrap().len(), 0);
        assert_eq!(stored["attachments"][0]["content"], "OOMKilled");
    }

    #[test]
    fn test_store_cannot_escape_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("transcripts");
        let store = TranscriptStore::new(&root);
        let dir = store.conversation_dir("../../outside", "../conv");
        assert!(dir.starts_with(&root));
    }
}
