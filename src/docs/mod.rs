pub mod plain_text;
pub mod wiki;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::WikiConfig;

#[derive(Debug, Error)]
pub enum DocsError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Schema Error: {0}")]
    Schema(String),
    #[error("No relevant docs found")]
    NoResults,
    #[error("Document search is not configured")]
    Disabled,
}

/// Looks up text relevant to a question.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<String, DocsError>;
}

/// Source used when no wiki is configured; every lookup falls through.
pub struct NoDocuments;

#[async_trait]
impl DocumentSource for NoDocuments {
    async fn lookup(&self, _query: &str) -> Result<String, DocsError> {
        Err(DocsError::Disabled)
    }
}

/// The wiki search when configured, otherwise a source that never matches.
pub fn from_config(wiki: Option<&WikiConfig>) -> Arc<dyn DocumentSource> {
    match wiki {
        Some(cfg) => Arc::new(wiki::WikiSearch::new(cfg)),
        None => Arc::new(NoDocuments),
    }
}
