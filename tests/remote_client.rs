//! Provider client tests against a wiremock stand-in for the REST API.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chatbridge::assistant::AssistantWorkflow;
    use chatbridge::config::AssistantConfig;
    use chatbridge::llm::assistants::{default_tools, AssistantsApi, CreateAssistantRequest, RunStatus};
    use chatbridge::llm::openai::OpenAiClient;
    use chatbridge::llm::{ChatCompleter, LlmError};
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new("test-api-key", server.uri())
    }

    #[tokio::test]
    async fn test_chat_completion_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-api-key"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({
                "model": "gpt-4.1-mini",
                "messages": [{"role": "user", "content": "Hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-123",
                "object": "chat.completion",
                "created": 1677652288,
                "model": "gpt-4.1-mini",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Hi there"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = client(&server).complete("gpt-4.1-mini", "Hello").await.unwrap();
        assert_eq!(completion.id, "chatcmpl-123");
        assert_eq!(completion.content, "Hi there");
        assert_eq!(completion.usage.total_tokens, 12);
    }

    #[tokio::test]
    async fn test_completion_without_choices_is_schema_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client(&server).complete("gpt-4.1-mini", "Hello").await.unwrap_err();
        assert!(matches!(err, LlmError::Schema(_)));
    }

    #[tokio::test]
    async fn test_non_success_status_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Incorrect API key provided"))
            .mount(&server)
            .await;

        match client(&server).complete("gpt-4.1-mini", "Hello").await {
            Err(LlmError::Api { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "Incorrect API key provided");
            }
            other => panic!("unexpected result: {:?}", other.map(|c| c.content)),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let err = OpenAiClient::new("k", "http://127.0.0.1:9")
            .complete("gpt-4.1-mini", "Hello")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Network(_)));
    }

    #[tokio::test]
    async fn test_create_assistant_sends_beta_header_and_tools() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/assistants"))
            .and(header("OpenAI-Beta", "assistants=v2"))
            .and(body_json(json!({
                "name": "Docs",
                "instructions": "Answer from docs",
                "model": "gpt-4o",
                "tools": [{"type": "code_interpreter"}, {"type": "file_search"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "asst_abc", "object": "assistant"})))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .create_assistant(&CreateAssistantRequest {
                name: "Docs".to_string(),
                instructions: "Answer from docs".to_string(),
                model: "gpt-4o".to_string(),
                tools: default_tools(),
                tool_resources: None,
            })
            .await
            .unwrap();
        assert_eq!(id, "asst_abc");
    }

    #[tokio::test]
    async fn test_missing_id_reports_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"object":"thread"}"#))
            .mount(&server)
            .await;

        match client(&server).create_thread().await {
            Err(LlmError::Schema(msg)) => assert!(msg.contains(r#"{"object":"thread"}"#)),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_without_id_skips_vector_store() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .and(header("Authorization", "Bearer test-api-key"))
            .and(body_string_contains("name=\"purpose\""))
            .and(body_string_contains("assistants"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"object":"file"}"#))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vector_stores"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "vs_1"})))
            .expect(0)
            .mount(&server)
            .await;

        let workflow = AssistantWorkflow::new(Arc::new(client(&server)), &AssistantConfig::default());
        let err = workflow
            .upload_file("asst_1", b"release notes".to_vec(), "notes.txt")
            .await
            .unwrap_err();

        match err {
            LlmError::Schema(msg) => assert!(msg.contains(r#"{"object":"file"}"#)),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_pipeline_against_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "file-1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vector_stores"))
            .and(body_json(json!({
                "name": "My Docs Store",
                "file_ids": ["file-1"],
                "metadata": {"purpose": "retrieval"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "vs_1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/assistants/asst_1"))
            .and(body_json(json!({
                "tools": [{"type": "code_interpreter"}, {"type": "file_search"}],
                "tool_resources": {
                    "code_interpreter": {"file_ids": ["file-1"]},
                    "file_search": {"vector_store_ids": ["vs_1"]}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "asst_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let workflow = AssistantWorkflow::new(Arc::new(client(&server)), &AssistantConfig::default());
        let outcome = workflow
            .upload_file("asst_1", b"release notes".to_vec(), "notes.txt")
            .await
            .unwrap();
        assert_eq!(outcome.file_id, "file-1");
        assert_eq!(outcome.vector_store_id, "vs_1");
    }

    #[tokio::test]
    async fn test_run_and_messages_decode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads/thread_1/runs/run_1"))
            .and(header("OpenAI-Beta", "assistants=v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "run_1",
                "status": "in_progress",
                "thread_id": "thread_1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/threads/thread_1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [{
                    "id": "msg_2",
                    "role": "assistant",
                    "content": [{"type": "text", "text": {"value": "Deploy with helm.", "annotations": []}}]
                }, {
                    "id": "msg_1",
                    "role": "user",
                    "content": [{"type": "text", "text": {"value": "How?", "annotations": []}}]
                }]
            })))
            .mount(&server)
            .await;

        let api = client(&server);
        let run = api.get_run("thread_1", "run_1").await.unwrap();
        assert_eq!(run.status, RunStatus::InProgress);

        let messages = api.list_messages("thread_1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            chatbridge::assistant::assistant_reply(&messages),
            Some("Deploy with helm.")
        );
    }

    #[tokio::test]
    async fn test_embeddings_one_vector_per_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"embedding": [0.1, 0.2]}, {"embedding": [0.3, 0.4]}]
            })))
            .mount(&server)
            .await;

        let vectors = client(&server)
            .embed("text-embedding-ada-002", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[1], vec![0.3, 0.4]);

        let err = client(&server)
            .embed("text-embedding-ada-002", &["only".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Schema(_)));
    }

    #[tokio::test]
    async fn test_assistant_details_pass_through_unchanged() {
        let server = MockServer::start().await;
        let details = json!({
            "id": "asst_7",
            "object": "assistant",
            "created_at": 1699009709,
            "name": "Helper",
            "description": "Answers from the runbooks",
            "model": "gpt-4o",
            "instructions": "Be brief.",
            "temperature": 0.2,
            "metadata": {"team": "ops"},
            "tools": [
                {"type": "function", "function": {"name": "lookup", "parameters": {"type": "object"}}},
                {"type": "file_search"}
            ],
            "tool_resources": {"file_search": {"vector_store_ids": ["vs_1"]}}
        });
        Mock::given(method("GET"))
            .and(path("/assistants/asst_7"))
            .and(header("OpenAI-Beta", "assistants=v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(details.clone()))
            .mount(&server)
            .await;

        let assistant = client(&server).get_assistant("asst_7").await.unwrap();
        assert_eq!(assistant.model(), Some("gpt-4o"));
        assert_eq!(assistant.tool_types(), vec!["function", "file_search"]);
        assert_eq!(serde_json::to_value(&assistant).unwrap(), details);
    }

    #[tokio::test]
    async fn test_assistant_details_without_id_is_schema_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assistants/asst_7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object": "assistant"})))
            .mount(&server)
            .await;

        let err = client(&server).get_assistant("asst_7").await.unwrap_err();
        assert!(matches!(err, LlmError::Schema(_)));
    }
}
