use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::Parser;
use chatbridge::api::middleware::Cors;
use chatbridge::assistant::AssistantWorkflow;
use chatbridge::chat::ChatService;
use chatbridge::cli::{commands::{Cli, Commands}, run_cli};
use chatbridge::config::AppConfig;
use chatbridge::docs;
use chatbridge::llm::openai::OpenAiClient;
use chatbridge::oauth::WikiOAuth;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if !matches!(cli.command, Commands::Serve) {
        if let Err(e) = run_cli(cli.command, config).await {
            error!("{:#}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    info!("Starting chatbridge server...");

    let client = Arc::new(OpenAiClient::from_config(&config.openai));
    let chat = web::Data::new(ChatService::new(
        docs::from_config(config.wiki.as_ref()),
        client.clone(),
        config.openai.chat_model.clone(),
    ));
    let workflow = web::Data::new(AssistantWorkflow::new(client, &config.assistant));
    let assistant_config = web::Data::new(config.assistant.clone());
    let oauth = config.oauth.clone().map(|c| web::Data::new(WikiOAuth::new(c)));

    if config.wiki.is_none() {
        info!("No wiki configured, chat requests go straight to the model");
    }
    if oauth.is_none() {
        info!("No OAuth client configured, /oauth routes disabled");
    }

    let host = config.server.host.clone();
    let port = config.server.port;

    info!("Server listening on {}:{}", host, port);

    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(Cors)
            .wrap(Logger::default())
            .app_data(chat.clone())
            .app_data(workflow.clone())
            .app_data(assistant_config.clone())
            .configure(chatbridge::api::routes::configure);
        if let Some(oauth) = &oauth {
            app = app
                .app_data(oauth.clone())
                .configure(chatbridge::api::routes_oauth::configure);
        }
        app
    })
    .bind((host, port))?
    .run()
    .await
}
