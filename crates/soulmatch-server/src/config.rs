use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub db_path: PathBuf,
    pub api_base: String,
    pub poll_timeout: Duration,
    pub webhook: Option<WebhookConfig>,
}

/// Present when the bot should receive updates over HTTP instead of polling.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub addr: SocketAddr,
    /// Public URL to register with Telegram. When unset the webhook is
    /// assumed to be registered already.
    pub url: Option<String>,
    pub secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Empty counts as unset
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let Some(bot_token) = var("BOT_TOKEN") else {
            bail!("BOT_TOKEN is not set");
        };

        let poll_timeout = match var("SOULMATCH_POLL_TIMEOUT_SECS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("SOULMATCH_POLL_TIMEOUT_SECS is not a number: {}", v))?,
            None => 30,
        };

        let webhook = match var("SOULMATCH_WEBHOOK_ADDR") {
            Some(addr) => Some(WebhookConfig {
                addr: addr
                    .parse()
                    .with_context(|| format!("SOULMATCH_WEBHOOK_ADDR is not an address: {}", addr))?,
                url: var("SOULMATCH_WEBHOOK_URL"),
                secret: var("SOULMATCH_WEBHOOK_SECRET"),
            }),
            None => None,
        };

        Ok(Self {
            bot_token,
            db_path: var("DB_PATH").unwrap_or_else(|| "dating_bot.db".into()).into(),
            api_base: var("SOULMATCH_API_BASE").unwrap_or_else(|| "https://api.telegram.org".into()),
            poll_timeout: Duration::from_secs(poll_timeout),
            webhook,
        })
    }
}
