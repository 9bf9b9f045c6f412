//! Typed records for the provider's assistants, files, vector stores,
//! threads, messages and runs, and the client operations over them.

use async_trait::async_trait;
use reqwest::{multipart, Method};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::llm::{
    openai::{decode, OpenAiClient},
    LlmError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    CodeInterpreter,
    FileSearch,
}

/// Code execution plus document search.
pub fn default_tools() -> Vec<Tool> {
    vec![Tool::CodeInterpreter, Tool::FileSearch]
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_interpreter: Option<CodeInterpreterResources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_search: Option<FileSearchResources>,
}

impl ToolResources {
    pub fn new(file_ids: Vec<String>, vector_store_ids: Vec<String>) -> Self {
        Self {
            code_interpreter: Some(CodeInterpreterResources { file_ids }),
            file_search: Some(FileSearchResources { vector_store_ids }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeInterpreterResources {
    #[serde(default)]
    pub file_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSearchResources {
    #[serde(default)]
    pub vector_store_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAssistantRequest {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<ToolResources>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateAssistantRequest {
    pub tools: Vec<Tool>,
    pub tool_resources: ToolResources,
}

/// The provider's assistant object. Only `id` is checked; every other
/// field is carried through as the provider sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assistant {
    pub id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Assistant {
    pub fn model(&self) -> Option<&str> {
        self.fields.get("model").and_then(|v| v.as_str())
    }

    /// The `type` of every configured tool, unknown kinds included.
    pub fn tool_types(&self) -> Vec<&str> {
        self.fields
            .get("tools")
            .and_then(|v| v.as_array())
            .map(|tools| tools.iter().filter_map(|t| t.get("type")?.as_str()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateVectorStoreRequest {
    pub name: String,
    pub file_ids: Vec<String>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadMessage {
    pub role: String,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub text: Option<MessageText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageText {
    pub value: String,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

/// The provider operations the assistant workflow is built from.
#[async_trait]
pub trait AssistantsApi: Send + Sync {
    async fn create_assistant(&self, request: &CreateAssistantRequest) -> Result<String, LlmError>;
    async fn get_assistant(&self, assistant_id: &str) -> Result<Assistant, LlmError>;
    async fn update_assistant(&self, assistant_id: &str, request: &UpdateAssistantRequest) -> Result<(), LlmError>;
    async fn attach_file(&self, assistant_id: &str, file_id: &str) -> Result<(), LlmError>;
    async fn upload_file(&self, content: Vec<u8>, filename: &str) -> Result<String, LlmError>;
    async fn create_vector_store(&self, request: &CreateVectorStoreRequest) -> Result<String, LlmError>;
    async fn create_thread(&self) -> Result<String, LlmError>;
    async fn add_message(&self, thread_id: &str, content: &str) -> Result<String, LlmError>;
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, LlmError>;
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, LlmError>;
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, LlmError>;
}

#[async_trait]
impl AssistantsApi for OpenAiClient {
    async fn create_assistant(&self, request: &CreateAssistantRequest) -> Result<String, LlmError> {
        let created: Created = self
            .send_json(self.beta_request(Method::POST, "assistants").json(request))
            .await?;
        info!("Created assistant {}", created.id);
        Ok(created.id)
    }

    async fn get_assistant(&self, assistant_id: &str) -> Result<Assistant, LlmError> {
        let body = self
            .send(self.beta_request(Method::GET, &format!("assistants/{}", assistant_id)))
            .await?;
        let assistant: Assistant = decode(&body)?;
        if assistant.id.is_empty() {
            return Err(LlmError::Schema(format!("empty 'id' in response: {}", body)));
        }
        Ok(assistant)
    }

    async fn update_assistant(&self, assistant_id: &str, request: &UpdateAssistantRequest) -> Result<(), LlmError> {
        self.send(
            self.beta_request(Method::POST, &format!("assistants/{}", assistant_id))
                .json(request),
        )
        .await?;
        info!("Updated tool resources of assistant {}", assistant_id);
        Ok(())
    }

    async fn attach_file(&self, assistant_id: &str, file_id: &str) -> Result<(), LlmError> {
        self.send(
            self.beta_request(Method::POST, &format!("assistants/{}/files", assistant_id))
                .json(&serde_json::json!({ "file_id": file_id })),
        )
        .await?;
        info!("Attached file {} to assistant {}", file_id, assistant_id);
        Ok(())
    }

    async fn upload_file(&self, content: Vec<u8>, filename: &str) -> Result<String, LlmError> {
        let form = multipart::Form::new()
            .text("purpose", "assistants")
            .part("file", multipart::Part::bytes(content).file_name(filename.to_string()));

        let created: Created = self
            .send_json(self.multipart_request("files").multipart(form))
            .await?;
        if created.id.is_empty() {
            return Err(LlmError::Schema("empty 'id' in file upload response".to_string()));
        }
        info!("Uploaded file {} as {}", filename, created.id);
        Ok(created.id)
    }

    async fn create_vector_store(&self, request: &CreateVectorStoreRequest) -> Result<String, LlmError> {
        let created: Created = self
            .send_json(self.beta_request(Method::POST, "vector_stores").json(request))
            .await?;
        info!("Created vector store {}", created.id);
        Ok(created.id)
    }

    async fn create_thread(&self) -> Result<String, LlmError> {
        let created: Created = self
            .send_json(
                self.beta_request(Method::POST, "threads")
                    .json(&serde_json::json!({})),
            )
            .await?;
        Ok(created.id)
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<String, LlmError> {
        let created: Created = self
            .send_json(
                self.beta_request(Method::POST, &format!("threads/{}/messages", thread_id))
                    .json(&serde_json::json!({ "role": "user", "content": content })),
            )
            .await?;
        Ok(created.id)
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, LlmError> {
        self.send_json(
            self.beta_request(Method::POST, &format!("threads/{}/runs", thread_id))
                .json(&serde_json::json!({ "assistant_id": assistant_id })),
        )
        .await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, LlmError> {
        self.send_json(self.beta_request(Method::GET, &format!("threads/{}/runs/{}", thread_id, run_id)))
            .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, LlmError> {
        let list: MessageList = self
            .send_json(self.beta_request(Method::GET, &format!("threads/{}/messages", thread_id)))
            .await?;
        Ok(list.data)
    }
}
