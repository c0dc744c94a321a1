//! Inbound query payloads and their validation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Attachment types the upstream agent knows how to ground on.
pub const ATTACHMENT_TYPES: &[&str] = &[
    "alert",
    "api object",
    "configuration",
    "error message",
    "event",
    "log",
    "stack trace",
];

/// MIME types accepted for attachment content.
pub const ATTACHMENT_CONTENT_TYPES: &[&str] = &[
    "text/plain",
    "application/json",
    "application/yaml",
    "application/xml",
];

/// A piece of user-supplied context sent alongside the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Attachment {
    pub attachment_type: String,
    pub content_type: String,
    pub content: String,
}

/// A document handed to the upstream turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub mime_type: String,
}

impl From<&Attachment> for Document {
    fn from(attachment: &Attachment) -> Self {
        Self {
            content: attachment.content.clone(),
            mime_type: attachment.content_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl QueryRequest {
    /// Model and provider hints only make sense together.
    pub fn validate(&self) -> Result<(), CoreError> {
        match (&self.model, &self.provider) {
            (Some(_), None) => Err(CoreError::InvalidRequest(
                "Provider must be specified if model is specified".into(),
            )),
            (None, Some(_)) => Err(CoreError::InvalidRequest(
                "Model must be specified if provider is specified".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Attachments as upstream documents (empty when none were sent).
    pub fn get_documents(&self) -> Vec<Document> {
        self.attachments
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(Document::from)
            .collect()
    }

    pub fn attachments(&self) -> &[Attachment] {
        self.attachments.as_deref().unwrap_or_default()
    }
}

/// Check every attachment's type and content type against the allow-lists.
pub fn validate_attachments_metadata(attachments: &[Attachment]) -> Result<(), CoreError> {
    for attachment in attachments {
        if !ATTACHMENT_TYPES.contains(&attachment.attachment_type.as_str()) {
            return Err(CoreError::InvalidAttachmentType(
                attachment.attachment_type.clone(),
            ));
        }
        if !ATTACHMENT_CONTENT_TYPES.contains(&attachment.content_type.as_str()) {
            return Err(CoreError::InvalidAttachmentContentType(
                attachment.content_type.clone(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(kind: &str, mime: &str) -> Attachment {
        Attachment {
            attachment_type: kind.to_string(),
            content_type: mime.to_string(),
            content: "kind: Pod".to_string(),
        }
    }

    #[test]
    fn test_minimal_request_deserializes() {
        let req: QueryRequest = serde_json::from_str(r#"{"query": "What is a pod?"}"#).unwrap();
        assert_eq!(req.query, "What is a pod?");
        assert!(req.conversation_id.is_none());
        assert!(req.get_documents().is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_missing_query_is_rejected() {
        let res = serde_json::from_str::<QueryRequest>(r#"{"model": "m"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_model_without_provider() {
        let req = QueryRequest {
            query: "q".into(),
            model: Some("llama3".into()),
            ..Default::default()
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "Provider must be specified if model is specified");
    }

    #[test]
    fn test_provider_without_model() {
        let req = QueryRequest {
            query: "q".into(),
            provider: Some("ollama".into()),
            ..Default::default()
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "Model must be specified if provider is specified");
    }

    #[test]
    fn test_documents_use_content_type_as_mime() {
        let req = QueryRequest {
            query: "q".into(),
            attachments: Some(vec![attachment("log", "text/plain")]),
            ..Default::default()
        };
        let docs = req.get_documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].mime_type, "text/plain");
        assert_eq!(docs[0].content, "kind: Pod");
    }

    #[test]
    fn test_valid_attachments() {
        let attachments = vec![
            attachment("log", "text/plain"),
            attachment("api object", "application/yaml"),
        ];
        assert!(validate_attachments_metadata(&attachments).is_ok());
    }

    #[test]
    fn test_improper_attachment_type() {
        let err = validate_attachments_metadata(&[attachment("selfie", "text/plain")]).unwrap_err();
        assert_eq!(err.to_string(), "Attachment with improper type selfie detected");
    }

    #[test]
    fn test_improper_content_type() {
        let err = validate_attachments_metadata(&[attachment("log", "image/png")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attachment with improper content type image/png detected"
        );
    }
}
