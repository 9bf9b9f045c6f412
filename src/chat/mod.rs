//! Chat entry point: best-effort wiki enrichment, then a plain completion.

use std::sync::Arc;
use tracing::{info, warn};

use crate::docs::DocumentSource;
use crate::llm::{
    models::{ChatRequest, ChatResponse},
    ChatCompleter, LlmError,
};

pub const NO_INPUT_PROMPT: &str = "No Input provided. Please ask a question.";

/// Prompt that wraps retrieved documentation around the question.
pub fn enriched_prompt(docs: &str, question: &str) -> String {
    format!(
        "Use the following documentation to help answer the question:\n\n{}\n\nQuestion: {}",
        docs, question
    )
}

pub struct ChatService {
    docs: Arc<dyn DocumentSource>,
    llm: Arc<dyn ChatCompleter>,
    default_model: String,
}

impl ChatService {
    pub fn new(docs: Arc<dyn DocumentSource>, llm: Arc<dyn ChatCompleter>, default_model: impl Into<String>) -> Self {
        Self {
            docs,
            llm,
            default_model: default_model.into(),
        }
    }

    /// Builds the prompt sent downstream. Enrichment failures never escape.
    pub async fn prompt_for(&self, request: &ChatRequest) -> String {
        let Some(question) = request.question() else {
            return NO_INPUT_PROMPT.to_string();
        };
        if question.is_empty() {
            return question.to_string();
        }

        match self.docs.lookup(question).await {
            Ok(docs) if !docs.is_empty() => enriched_prompt(&docs, question),
            Ok(_) => {
                info!("Wiki lookup returned nothing, using raw question");
                question.to_string()
            }
            Err(e) => {
                warn!("Wiki lookup failed, using raw question: {}", e);
                question.to_string()
            }
        }
    }

    pub async fn respond(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let prompt = self.prompt_for(request).await;
        let model = if request.model.is_empty() {
            self.default_model.as_str()
        } else {
            request.model.as_str()
        };

        let completion = self.llm.complete(model, &prompt).await?;
        if completion.content.is_empty() {
            return Err(LlmError::NotFound("provider returned an empty reply".to_string()));
        }

        let id = if completion.id.is_empty() {
            format!("chatcmpl-{}", uuid::Uuid::new_v4())
        } else {
            completion.id
        };
        Ok(ChatResponse::single(id, completion.model, completion.content, completion.usage))
    }
}
