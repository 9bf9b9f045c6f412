use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateAssistantBody {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub vector_store_id: Option<String>,
    #[serde(default)]
    pub file_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddFileBody {
    pub assistant_id: String,
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AssistantQuery {
    pub assistant_id: Option<String>,
}

/// The upload is spooled to a temporary file that is removed when the form drops.
#[derive(MultipartForm)]
pub struct UploadForm {
    #[multipart(limit = "10MB")]
    pub file: TempFile,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
