pub mod cli;
pub mod conversation;
pub mod llm;
pub mod models;
pub mod server;
pub mod widget;

use cli::Args;
use llm::LlmConfig;
use log::{info, warn};
use server::api::AppState;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = LlmConfig::from_env(&args);

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!(
        "Chat Model: {}",
        config
            .completion_model
            .as_deref()
            .unwrap_or(llm::DEFAULT_CHAT_MODEL)
    );
    info!("Gemini Credential Configured: {}", config.api_key.is_some());
    if let Some(base_url) = &config.base_url {
        info!("Chat Base URL: {}", base_url);
    }
    info!("-------------------------");

    let client = if config.api_key.is_some() {
        Some(llm::chat::new_client(&config)?)
    } else {
        warn!("No Gemini API key configured; /api/chat will answer with a configuration error.");
        None
    };

    let server = Server::new(args.server_addr.clone(), AppState { client });
    server.run().await
}
