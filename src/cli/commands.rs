use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chatbridge", version, about = "Chat and assistant gateway for an LLM provider", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve,

    /// Ask a single question through the chat pipeline (wiki enrichment + completion)
    Ask {
        message: String,
        /// Model to use instead of the configured chat model
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Manage and query provider-hosted assistants
    Assistant {
        #[command(subcommand)]
        action: AssistantAction,
    },

    /// Print embedding vectors for the given texts as JSON
    Embed {
        #[arg(required = true)]
        texts: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum AssistantAction {
    /// Create an assistant with code execution and document search
    Create {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        instructions: String,
        #[arg(short, long, default_value = "gpt-4o")]
        model: String,
        /// Vector store to attach for document search
        #[arg(long)]
        vector_store: Option<String>,
        /// File ids to attach for code execution (repeatable)
        #[arg(long = "file")]
        files: Vec<String>,
    },

    /// Show an assistant's configuration
    Show { id: String },

    /// Ask an assistant a question on a fresh thread
    Query {
        message: String,
        /// Defaults to the configured assistant
        #[arg(short, long)]
        assistant: Option<String>,
    },

    /// Upload a file, index it in a new vector store and attach both to an assistant
    Upload {
        path: String,
        #[arg(short, long)]
        assistant: Option<String>,
    },

    /// Attach an already uploaded file to an assistant
    AddFile {
        #[arg(short, long)]
        assistant: String,
        #[arg(short, long)]
        file: String,
    },
}
