use actix_multipart::form::MultipartForm;
use actix_web::{get, post, web, HttpResponse, Result as WebResult};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::api::models::{AddFileBody, AssistantQuery, CreateAssistantBody, ErrorBody, UploadForm};
use crate::assistant::AssistantWorkflow;
use crate::chat::ChatService;
use crate::config::{AssistantConfig, ResponseEnvelope};
use crate::llm::models::{ChatRequest, ChatResponse, Usage};
use crate::llm::LlmError;

fn error_response(status: actix_web::http::StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody {
        error: message.into(),
    })
}

fn bad_request(message: impl Into<String>) -> HttpResponse {
    error_response(actix_web::http::StatusCode::BAD_REQUEST, message)
}

fn server_error(message: impl Into<String>) -> HttpResponse {
    error_response(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR, message)
}

/// Rejected identifiers are the caller's fault; everything else is ours or the provider's.
fn workflow_error(e: LlmError) -> HttpResponse {
    match e {
        LlmError::InvalidRequest(_) => bad_request(e.to_string()),
        _ => server_error(e.to_string()),
    }
}

/// Malformed JSON bodies are rejected with a 400 carrying the parse error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = bad_request(format!("Invalid input: {}", err));
        actix_web::error::InternalError::from_response(err, response).into()
    })
}

fn render_reply(envelope: ResponseEnvelope, model: &str, reply: String) -> HttpResponse {
    match envelope {
        ResponseEnvelope::Structured => HttpResponse::Ok().json(ChatResponse::single(
            format!("chatcmpl-{}", uuid::Uuid::new_v4()),
            model,
            reply,
            Usage::default(),
        )),
        ResponseEnvelope::Plain => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(reply),
    }
}

fn target_assistant(query: &AssistantQuery, config: &AssistantConfig) -> Option<String> {
    query
        .assistant_id
        .clone()
        .filter(|id| !id.is_empty())
        .or_else(|| config.default_assistant_id.clone())
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}

#[post("/api/chat")]
pub async fn chat(service: web::Data<ChatService>, req: web::Json<ChatRequest>) -> WebResult<HttpResponse> {
    let req = req.into_inner();
    info!("Chat request: model={} messages={}", req.model, req.messages.len());

    match service.respond(&req).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => {
            error!("Chat completion failed: {}", e);
            Ok(server_error(e.to_string()))
        }
    }
}

#[post("/assistant")]
pub async fn create_assistant(
    workflow: web::Data<AssistantWorkflow>,
    config: web::Data<AssistantConfig>,
    req: web::Json<CreateAssistantBody>,
) -> WebResult<HttpResponse> {
    let req = req.into_inner();
    info!("Create assistant request: name={} model={}", req.name, req.model);

    match workflow
        .create_assistant(
            &req.name,
            &req.instructions,
            &req.model,
            req.vector_store_id.as_deref(),
            &req.file_ids,
        )
        .await
    {
        Ok(id) => Ok(render_reply(config.response_envelope, &req.model, id)),
        Err(e) => {
            error!("Failed to create assistant: {}", e);
            Ok(server_error(e.to_string()))
        }
    }
}

#[post("/assistant/add-file")]
pub async fn add_file(workflow: web::Data<AssistantWorkflow>, req: web::Json<AddFileBody>) -> WebResult<HttpResponse> {
    let req = req.into_inner();

    match workflow.add_file_to_assistant(&req.assistant_id, &req.file_id).await {
        Ok(()) => Ok(HttpResponse::Ok().finish()),
        Err(e) => {
            error!("Failed to attach file {} to {}: {}", req.file_id, req.assistant_id, e);
            Ok(workflow_error(e))
        }
    }
}

#[post("/assistant/query")]
pub async fn query_assistant(
    workflow: web::Data<AssistantWorkflow>,
    config: web::Data<AssistantConfig>,
    query: web::Query<AssistantQuery>,
    req: web::Json<ChatRequest>,
) -> WebResult<HttpResponse> {
    let req = req.into_inner();
    let Some(assistant_id) = target_assistant(&query, &config) else {
        return Ok(bad_request("missing assistant_id"));
    };
    let Some(question) = req.question() else {
        return Ok(bad_request("messages must not be empty"));
    };

    // Dropping this handler (client gone) cancels the poll loop.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    match workflow.query(&assistant_id, question, &cancel).await {
        Ok(reply) => {
            // The run uses the assistant's own model; report the assistant when none was named.
            let model = if req.model.is_empty() { &assistant_id } else { &req.model };
            Ok(render_reply(config.response_envelope, model, reply))
        }
        Err(e) => {
            error!("Error querying assistant {}: {}", assistant_id, e);
            Ok(workflow_error(e))
        }
    }
}

#[get("/assistant/{id}")]
pub async fn get_assistant(workflow: web::Data<AssistantWorkflow>, id: web::Path<String>) -> WebResult<HttpResponse> {
    match workflow.get_assistant(&id).await {
        Ok(assistant) => Ok(HttpResponse::Ok().json(assistant)),
        Err(e) => Ok(server_error(e.to_string())),
    }
}

#[post("/upload")]
pub async fn upload(
    workflow: web::Data<AssistantWorkflow>,
    config: web::Data<AssistantConfig>,
    query: web::Query<AssistantQuery>,
    MultipartForm(form): MultipartForm<UploadForm>,
) -> WebResult<HttpResponse> {
    let Some(assistant_id) = target_assistant(&query, &config) else {
        return Ok(bad_request("missing assistant_id"));
    };

    let filename = form
        .file
        .file_name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "upload.bin".to_string());
    info!("Incoming file upload: {} ({} bytes)", filename, form.file.size);

    let content = match tokio::fs::read(form.file.file.path()).await {
        Ok(bytes) => bytes,
        Err(e) => return Ok(server_error(format!("Failed to read uploaded file: {}", e))),
    };

    match workflow.upload_file(&assistant_id, content, &filename).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(outcome)),
        Err(e) => {
            error!("Error uploading file {}: {}", filename, e);
            Ok(workflow_error(e))
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(health)
        .service(chat)
        .service(create_assistant)
        .service(add_file)
        .service(query_assistant)
        .service(get_assistant)
        .service(upload);
}
