mod config;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use soulmatch_bot::Bot;
use soulmatch_db::Database;
use soulmatch_gateway::dispatcher::Dispatcher;
use soulmatch_gateway::telegram::TelegramClient;
use soulmatch_gateway::{poller, webhook};

use crate::config::Config;

/// How long shutdown waits for queued events to be handled.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "soulmatch=debug,soulmatch_bot=debug,soulmatch_gateway=debug,soulmatch_db=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    let db = Arc::new(Database::open(&config.db_path)?);
    let client = TelegramClient::new(&config.api_base, &config.bot_token, config.poll_timeout)?;
    let bot = Arc::new(Bot::new(db, client.clone()));
    let dispatcher = Dispatcher::new(bot);

    match config.webhook {
        Some(hook) => {
            match &hook.url {
                Some(url) => {
                    client.set_webhook(url, hook.secret.as_deref()).await?;
                    info!("Webhook registered");
                }
                None => warn!("SOULMATCH_WEBHOOK_URL unset, assuming the webhook is already registered"),
            }

            let app = webhook::router(client, dispatcher.clone(), hook.secret);
            let listener = tokio::net::TcpListener::bind(hook.addr).await?;
            info!("SoulMatch webhook listening on {}", hook.addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        None => {
            // getUpdates is refused while a webhook is set
            client.delete_webhook().await?;

            tokio::select! {
                _ = poller::run(client, dispatcher.clone(), config.poll_timeout) => {}
                _ = shutdown_signal() => {}
            }
        }
    }

    // Updates already acknowledged to Telegram are still in the queues
    if tokio::time::timeout(DRAIN_TIMEOUT, dispatcher.shutdown()).await.is_err() {
        warn!("Gave up waiting for event workers after {}s", DRAIN_TIMEOUT.as_secs());
    }

    info!("SoulMatch stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
