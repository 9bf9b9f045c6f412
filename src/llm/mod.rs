pub mod assistants;
pub mod models;
pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

use models::Completion;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Schema Error: {0}")]
    Schema(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Run {run_id} failed: {detail}")]
    RunFailed { run_id: String, detail: String },
    #[error("Run {run_id} still {status} after {attempts} polls")]
    PollTimeout {
        run_id: String,
        status: String,
        attempts: u32,
    },
    #[error("Cancelled")]
    Cancelled,
    #[error("Invalid Request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Network(e.to_string())
    }
}

/// Plain single-prompt chat completion.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<Completion, LlmError>;
}
