// imagefx-studio - Session-based web backend for Google Labs ImageFX
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use imagefx_studio::auth::TokenManager;
use imagefx_studio::cli::Args;
use imagefx_studio::config::AppConfig;
use imagefx_studio::gemini::PromptClient;
use imagefx_studio::imagefx::ImageFxClient;
use imagefx_studio::server::create_router;
use imagefx_studio::session::SessionStore;
use imagefx_studio::tasks::TaskQueue;
use imagefx_studio::utils::logging;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let config = AppConfig::load()?;

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting imagefx-studio v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Resolve the vendor session token
    let tokens = TokenManager::new(&config.auth);

    if args.check_token {
        return match tokens.session() {
            Ok(_) => {
                println!("session token: OK");
                Ok(())
            }
            Err(detail) => anyhow::bail!("session token invalid: {}", detail),
        };
    }

    if !tokens.is_configured() {
        warn!("GOOGLE_SESSION_TOKEN is not set; generation will fail until it is configured");
    }

    // Phase 4: Construct clients and stores
    let imagefx = Arc::new(ImageFxClient::new(&config.imagefx, tokens.clone())?);
    let prompts = Arc::new(PromptClient::new(&config.gemini)?);
    if !prompts.is_configured() {
        warn!("GEMINI_API_KEY is not set; prompts will pass through untranslated");
    }
    let sessions = Arc::new(SessionStore::new(config.session.clone()));
    let tasks = Arc::new(TaskQueue::new(config.tasks.retention_minutes));

    // Phase 5: Build and start HTTP server
    let app = create_router(config.clone(), imagefx, prompts, sessions, tasks, tokens)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 6: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
