//! Sequences multi-step assistant interactions against the provider:
//! provisioning (assistants, files, vector stores) and conversational runs.

pub mod poll;

use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::AssistantConfig;
use crate::llm::{
    assistants::{
        default_tools, Assistant, AssistantsApi, CreateAssistantRequest, CreateVectorStoreRequest,
        ThreadMessage, ToolResources, UpdateAssistantRequest,
    },
    LlmError,
};
use poll::{wait_for_run, PollPolicy, Sleeper, TokioSleeper};

/// Steps of a conversational query, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    ThreadCreated,
    MessagePosted,
    RunStarted,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub file_id: String,
    pub vector_store_id: String,
}

pub struct AssistantWorkflow {
    api: Arc<dyn AssistantsApi>,
    sleeper: Arc<dyn Sleeper>,
    policy: PollPolicy,
    vector_store_name: String,
}

impl AssistantWorkflow {
    pub fn new(api: Arc<dyn AssistantsApi>, config: &AssistantConfig) -> Self {
        Self {
            api,
            sleeper: Arc::new(TokioSleeper),
            policy: PollPolicy::new(config.poll_interval_ms, config.max_poll_attempts),
            vector_store_name: config.vector_store_name.clone(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Creates an assistant with code execution and document search enabled.
    /// Tool resources are attached only when a vector store is supplied.
    pub async fn create_assistant(
        &self,
        name: &str,
        instructions: &str,
        model: &str,
        vector_store_id: Option<&str>,
        file_ids: &[String],
    ) -> Result<String, LlmError> {
        let tool_resources = vector_store_id
            .map(|vs| ToolResources::new(file_ids.to_vec(), vec![vs.to_string()]));

        let request = CreateAssistantRequest {
            name: name.to_string(),
            instructions: instructions.to_string(),
            model: model.to_string(),
            tools: default_tools(),
            tool_resources,
        };
        self.api.create_assistant(&request).await
    }

    pub async fn get_assistant(&self, assistant_id: &str) -> Result<Assistant, LlmError> {
        self.api.get_assistant(assistant_id).await
    }

    pub async fn add_file_to_assistant(&self, assistant_id: &str, file_id: &str) -> Result<(), LlmError> {
        require_id("assistant", assistant_id)?;
        require_id("file", file_id)?;
        self.api.attach_file(assistant_id, file_id).await
    }

    /// Uploads `content`, indexes it in a new vector store and points the
    /// assistant's tool resources at both. Any failing step aborts the rest.
    pub async fn upload_file(
        &self,
        assistant_id: &str,
        content: Vec<u8>,
        filename: &str,
    ) -> Result<UploadOutcome, LlmError> {
        require_id("assistant", assistant_id)?;
        let file_id = self.api.upload_file(content, filename).await?;

        let vector_store_id = self
            .api
            .create_vector_store(&CreateVectorStoreRequest {
                name: self.vector_store_name.clone(),
                file_ids: vec![file_id.clone()],
                metadata: serde_json::json!({ "purpose": "retrieval" }),
            })
            .await?;

        self.api
            .update_assistant(
                assistant_id,
                &UpdateAssistantRequest {
                    tools: default_tools(),
                    tool_resources: ToolResources::new(vec![file_id.clone()], vec![vector_store_id.clone()]),
                },
            )
            .await?;

        info!(
            "File {} indexed in {} for assistant {}",
            file_id, vector_store_id, assistant_id
        );
        Ok(UploadOutcome {
            file_id,
            vector_store_id,
        })
    }

    /// Runs `message` against the assistant on a fresh thread and returns the reply.
    pub async fn query(
        &self,
        assistant_id: &str,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<String, LlmError> {
        require_id("assistant", assistant_id)?;
        let thread_id = self.api.create_thread().await?;
        trace_phase(QueryPhase::ThreadCreated, &thread_id);

        self.api.add_message(&thread_id, message).await?;
        trace_phase(QueryPhase::MessagePosted, &thread_id);

        let run = self.api.create_run(&thread_id, assistant_id).await?;
        trace_phase(QueryPhase::RunStarted, &thread_id);

        wait_for_run(
            self.api.as_ref(),
            self.sleeper.as_ref(),
            self.policy,
            &thread_id,
            run,
            cancel,
        )
        .await?;
        trace_phase(QueryPhase::Completed, &thread_id);

        let messages = self.api.list_messages(&thread_id).await?;
        assistant_reply(&messages)
            .map(str::to_string)
            .ok_or_else(|| LlmError::NotFound("no assistant message found".to_string()))
    }
}

fn require_id(kind: &str, id: &str) -> Result<(), LlmError> {
    if id.trim().is_empty() {
        return Err(LlmError::InvalidRequest(format!("{} id must not be empty", kind)));
    }
    Ok(())
}

fn trace_phase(phase: QueryPhase, thread_id: &str) {
    info!("Thread {}: {:?}", thread_id, phase);
}

/// First assistant-authored message whose first content block carries text.
pub fn assistant_reply(messages: &[ThreadMessage]) -> Option<&str> {
    messages
        .iter()
        .filter(|m| m.role == "assistant")
        .find_map(|m| m.content.first()?.text.as_ref())
        .map(|t| t.value.as_str())
}
