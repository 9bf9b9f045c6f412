pub mod commands;

use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::assistant::AssistantWorkflow;
use crate::chat::ChatService;
use crate::cli::commands::{AssistantAction, Commands};
use crate::config::AppConfig;
use crate::docs;
use crate::llm::{
    models::{ChatMessage, ChatRequest},
    openai::OpenAiClient,
};

pub async fn run_cli(command: Commands, config: AppConfig) -> Result<()> {
    let client = Arc::new(OpenAiClient::from_config(&config.openai));

    match command {
        Commands::Serve => bail!("serve is handled by the server entry point"),
        Commands::Ask { message, model } => {
            let chat = ChatService::new(
                docs::from_config(config.wiki.as_ref()),
                client,
                config.openai.chat_model.clone(),
            );
            let request = ChatRequest {
                model: model.unwrap_or_default(),
                messages: vec![ChatMessage::user(message)],
            };
            let response = chat.respond(&request).await?;
            println!("{}", response.reply().unwrap_or_default());
        }
        Commands::Assistant { action } => {
            let workflow = AssistantWorkflow::new(client, &config.assistant);
            run_assistant(action, &workflow, &config).await?;
        }
        Commands::Embed { texts } => {
            let vectors = client.embed(&config.openai.embedding_model, &texts).await?;
            println!("{}", serde_json::to_string(&vectors)?);
        }
    }
    Ok(())
}

fn resolve_assistant(explicit: Option<String>, config: &AppConfig) -> Result<String> {
    explicit
        .or_else(|| config.assistant.default_assistant_id.clone())
        .ok_or_else(|| anyhow!("no assistant given and assistant.default_assistant_id is not set"))
}

async fn run_assistant(action: AssistantAction, workflow: &AssistantWorkflow, config: &AppConfig) -> Result<()> {
    match action {
        AssistantAction::Create {
            name,
            instructions,
            model,
            vector_store,
            files,
        } => {
            let id = workflow
                .create_assistant(&name, &instructions, &model, vector_store.as_deref(), &files)
                .await?;
            println!("Assistant created with ID: {}", id);
        }
        AssistantAction::Show { id } => {
            let assistant = workflow.get_assistant(&id).await?;
            println!("{}", serde_json::to_string_pretty(&assistant)?);
        }
        AssistantAction::Query { message, assistant } => {
            let assistant_id = resolve_assistant(assistant, config)?;
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted, cancelling run poll");
                    on_interrupt.cancel();
                }
            });

            let reply = workflow.query(&assistant_id, &message, &cancel).await?;
            println!("{}", reply);
        }
        AssistantAction::Upload { path, assistant } => {
            let assistant_id = resolve_assistant(assistant, config)?;
            let content = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path))?;
            let filename = Path::new(&path)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload.bin");

            let outcome = workflow.upload_file(&assistant_id, content, filename).await?;
            println!(
                "File uploaded. ID: {} (vector store {})",
                outcome.file_id, outcome.vector_store_id
            );
        }
        AssistantAction::AddFile { assistant, file } => {
            workflow.add_file_to_assistant(&assistant, &file).await?;
            println!("File {} attached to assistant {}", file, assistant);
        }
    }
    Ok(())
}
