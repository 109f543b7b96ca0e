use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Host address and port for the HTTP server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:3000")]
    pub server_addr: String,

    /// Model name for chat completion (e.g., gemini-2.0-flash).
    #[arg(long, env = "GEMINI_MODEL")] // No default, adapter supplies one if None
    pub chat_model: Option<String>,

    /// Base URL for the Gemini API. Defaults to the hosted endpoint.
    #[arg(long, env = "CHAT_BASE_URL")]
    pub chat_base_url: Option<String>,
}
