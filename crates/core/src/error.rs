use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Attachment with improper type {0} detected")]
    InvalidAttachmentType(String),

    #[error("Attachment with improper content type {0} detected")]
    InvalidAttachmentContentType(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0} is disabled")]
    Disabled(&'static str),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown auth module: '{0}'")]
    UnknownAuthModule(String),

    #[error("{0} must be set when the collection is enabled")]
    MissingStorage(&'static str),

    #[error("invalid {0}: {1}")]
    InvalidValue(&'static str, String),
}
