pub mod api;
pub mod assistant;
pub mod chat;
pub mod cli;
pub mod config;
pub mod docs;
pub mod llm;
pub mod oauth;
