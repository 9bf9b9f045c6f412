#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chatbridge::assistant::poll::Sleeper;
use tokio_util::sync::CancellationToken;
use chatbridge::docs::{DocsError, DocumentSource};
use chatbridge::llm::assistants::{
    Assistant, AssistantsApi, CreateAssistantRequest, CreateVectorStoreRequest, MessageContent, MessageText,
    Run, RunStatus, ThreadMessage, UpdateAssistantRequest,
};
use chatbridge::llm::models::{Completion, Usage};
use chatbridge::llm::{ChatCompleter, LlmError};

/// Never sleeps; counts how often it was asked to.
#[derive(Default)]
pub struct CountingSleeper {
    pub sleeps: AtomicU32,
}

#[async_trait]
impl Sleeper for CountingSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fires `cancel` during its `after`-th sleep, as a caller going away mid-poll would.
pub struct CancellingSleeper {
    pub cancel: CancellationToken,
    pub after: u32,
    pub sleeps: AtomicU32,
}

impl CancellingSleeper {
    pub fn new(cancel: CancellationToken, after: u32) -> Self {
        Self {
            cancel,
            after,
            sleeps: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Sleeper for CancellingSleeper {
    async fn sleep(&self, _duration: Duration) {
        if self.sleeps.fetch_add(1, Ordering::SeqCst) + 1 >= self.after {
            self.cancel.cancel();
        }
    }
}

/// Never wakes up; records when an in-flight sleep is dropped.
#[derive(Default)]
pub struct StallingSleeper {
    pub started: AtomicBool,
    pub abandoned: AtomicBool,
}

struct MarkOnDrop<'a>(&'a AtomicBool);

impl Drop for MarkOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Sleeper for StallingSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.started.store(true, Ordering::SeqCst);
        let _mark = MarkOnDrop(&self.abandoned);
        std::future::pending::<()>().await;
    }
}

pub fn text_message(role: &str, text: &str) -> ThreadMessage {
    ThreadMessage {
        role: role.to_string(),
        content: vec![MessageContent {
            text: Some(MessageText {
                value: text.to_string(),
            }),
        }],
    }
}

/// Scripted provider: run statuses are served in order, every call is recorded.
#[derive(Default)]
pub struct FakeAssistants {
    pub statuses: Mutex<VecDeque<RunStatus>>,
    pub messages: Vec<ThreadMessage>,
    pub calls: Mutex<Vec<String>>,
    pub created: Mutex<Vec<CreateAssistantRequest>>,
    pub updates: Mutex<Vec<UpdateAssistantRequest>>,
    pub fail_vector_store: bool,
}

impl FakeAssistants {
    pub fn with_statuses(statuses: &[RunStatus], messages: Vec<ThreadMessage>) -> Self {
        Self {
            statuses: Mutex::new(statuses.iter().copied().collect()),
            messages,
            ..Default::default()
        }
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }
}

#[async_trait]
impl AssistantsApi for FakeAssistants {
    async fn create_assistant(&self, request: &CreateAssistantRequest) -> Result<String, LlmError> {
        self.record("create_assistant");
        self.created.lock().unwrap().push(request.clone());
        Ok("asst_1".to_string())
    }

    async fn get_assistant(&self, assistant_id: &str) -> Result<Assistant, LlmError> {
        self.record("get_assistant");
        let fields = serde_json::json!({
            "object": "assistant",
            "name": "Helper",
            "model": "gpt-4o",
            "tools": [{"type": "function", "function": {"name": "lookup"}}]
        });
        Ok(Assistant {
            id: assistant_id.to_string(),
            fields: fields.as_object().cloned().unwrap_or_default(),
        })
    }

    async fn update_assistant(&self, _assistant_id: &str, request: &UpdateAssistantRequest) -> Result<(), LlmError> {
        self.record("update_assistant");
        self.updates.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn attach_file(&self, _assistant_id: &str, _file_id: &str) -> Result<(), LlmError> {
        self.record("attach_file");
        Ok(())
    }

    async fn upload_file(&self, _content: Vec<u8>, _filename: &str) -> Result<String, LlmError> {
        self.record("upload_file");
        Ok("file_1".to_string())
    }

    async fn create_vector_store(&self, _request: &CreateVectorStoreRequest) -> Result<String, LlmError> {
        self.record("create_vector_store");
        if self.fail_vector_store {
            return Err(LlmError::Api {
                status: 500,
                body: "vector store backend down".to_string(),
            });
        }
        Ok("vs_1".to_string())
    }

    async fn create_thread(&self) -> Result<String, LlmError> {
        self.record("create_thread");
        Ok("thread_1".to_string())
    }

    async fn add_message(&self, _thread_id: &str, _content: &str) -> Result<String, LlmError> {
        self.record("add_message");
        Ok("msg_1".to_string())
    }

    async fn create_run(&self, _thread_id: &str, _assistant_id: &str) -> Result<Run, LlmError> {
        self.record("create_run");
        Ok(Run {
            id: "run_1".to_string(),
            status: RunStatus::Queued,
            last_error: None,
        })
    }

    async fn get_run(&self, _thread_id: &str, run_id: &str) -> Result<Run, LlmError> {
        self.record("get_run");
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RunStatus::InProgress);
        Ok(Run {
            id: run_id.to_string(),
            status,
            last_error: None,
        })
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<ThreadMessage>, LlmError> {
        self.record("list_messages");
        Ok(self.messages.clone())
    }
}

/// Documentation source returning a fixed answer or failure.
pub struct FixedDocs(pub Result<String, ()>);

#[async_trait]
impl DocumentSource for FixedDocs {
    async fn lookup(&self, _query: &str) -> Result<String, DocsError> {
        self.0.clone().map_err(|_| DocsError::NoResults)
    }
}

/// Completer that records every prompt and answers with a fixed reply.
pub struct RecordingCompleter {
    pub reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingCompleter {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompleter for RecordingCompleter {
    async fn complete(&self, model: &str, prompt: &str) -> Result<Completion, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(Completion {
            id: "chatcmpl-test".to_string(),
            content: self.reply.clone(),
            model: model.to_string(),
            usage: Usage::default(),
        })
    }
}
