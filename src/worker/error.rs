//! Failures talking to a provider worker.

use std::io;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("cannot start provider worker: {0}")]
    SpawnFailed(#[source] io::Error),

    #[error("cannot send to provider worker: {0}")]
    WriteFailed(#[source] io::Error),

    #[error("request parameters are not serializable: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    /// The reply's `result` did not have the expected shape.
    #[error("unexpected reply payload: {0}")]
    DeserializeFailed(#[source] serde_json::Error),

    /// No reply within the configured number of seconds.
    #[error("provider worker did not reply within {0}s")]
    Timeout(u64),

    /// The worker went away before the request could be answered.
    #[error("provider worker is no longer running")]
    ChannelClosed,

    /// The provider rejected the credential.
    #[error("credential rejected: {0}")]
    Unauthorized(String),

    #[error("provider refused the request: {0}")]
    InvalidRequest(String),

    #[error("provider worker does not implement {0}")]
    MethodNotFound(String),

    /// The reply decoded but contradicts the request it answers.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Any other error reply, kept with the worker's own code.
    #[error("provider worker failed [{code}]: {message}")]
    Remote { code: String, message: String },
}

impl WorkerError {
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Turn an error reply's code into the matching variant.
    pub fn classify(code: &str, message: &str) -> Self {
        let message = message.to_string();
        match code {
            "UNAUTHORIZED" => Self::Unauthorized(message),
            "INVALID_REQUEST" => Self::InvalidRequest(message),
            "METHOD_NOT_FOUND" => Self::MethodNotFound(message),
            _ => Self::Remote {
                code: code.to_string(),
                message,
            },
        }
    }

    /// True when retrying on the same client cannot succeed.
    pub fn is_worker_exited(&self) -> bool {
        match self {
            Self::ChannelClosed => true,
            Self::Remote { code, .. } => code == "WORKER_EXITED",
            _ => false,
        }
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for WorkerError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Self::ChannelClosed
    }
}
