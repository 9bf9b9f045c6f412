use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::OpenAiConfig;
use crate::llm::{
    models::{ChatMessage, Completion, Role, Usage},
    ChatCompleter, LlmError,
};

const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VERSION: &str = "assistants=v2";

/// Client for the provider's REST surface. The credential is fixed at construction.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &OpenAiConfig) -> Self {
        Self::new(config.api_key.clone(), config.api_base.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// JSON request against a plain endpoint.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
    }

    /// JSON request against an assistants-family endpoint.
    pub(crate) fn beta_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request(method, path).header(BETA_HEADER, BETA_VERSION)
    }

    /// Multipart upload; reqwest sets the boundary content type.
    pub(crate) fn multipart_request(&self, path: &str) -> RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header(BETA_HEADER, BETA_VERSION)
    }

    /// Sends the request and returns the raw body of a 2xx response.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<String, LlmError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Provider returned status {}", status);
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }
        debug!("Provider returned status {}", status);
        Ok(body)
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, LlmError> {
        let body = self.send(request).await?;
        decode(&body)
    }

    pub async fn embed(&self, model: &str, input: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let request = self
            .request(Method::POST, "embeddings")
            .json(&EmbeddingRequest { model, input });

        let response: EmbeddingResponse = self.send_json(request).await?;
        if response.data.len() != input.len() {
            return Err(LlmError::Schema(format!(
                "expected {} embeddings, got {}",
                input.len(),
                response.data.len()
            )));
        }
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Decodes only the fields the caller consumes; failures carry the raw body.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, LlmError> {
    serde_json::from_str(body).map_err(|e| LlmError::Schema(format!("{} in response: {}", e, body)))
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl ChatCompleter for OpenAiClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<Completion, LlmError> {
        let body = CompletionRequest {
            model,
            messages: vec![ChatMessage {
                role: Role::User,
                content: prompt.to_string(),
            }],
        };

        let request = self.request(Method::POST, "chat/completions").json(&body);
        let response: CompletionResponse = self.send_json(request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Schema("no choices returned from provider".to_string()))?
            .message
            .content
            .unwrap_or_default();

        Ok(Completion {
            id: response.id,
            content,
            model: if response.model.is_empty() {
                model.to_string()
            } else {
                response.model
            },
            usage: response.usage,
        })
    }
}
