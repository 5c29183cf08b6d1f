use anyhow::Context;
use clap::Parser;
use mock_chat_api::{router, MockConfig};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "mock-chat-api")]
#[command(author, version, about = "In-memory Doodle message API for local runs", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Bearer token clients must send
    #[arg(long, default_value = doodle_sdk::config::DEFAULT_AUTH_TOKEN)]
    token: String,

    /// Fail every message request with a 500
    #[arg(long)]
    outage: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.outage {
        warn!("outage mode: every message request will fail");
    }

    let app = router(MockConfig {
        token: cli.token,
        outage: cli.outage,
    });

    let addr = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!(address = %addr, "mock message API listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
