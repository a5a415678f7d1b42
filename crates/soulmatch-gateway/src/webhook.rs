use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;
use tracing::warn;

use soulmatch_types::transport::ChatTransport;

use crate::dispatcher::Dispatcher;
use crate::telegram::{TelegramClient, Update};
use crate::updates;

/// Header Telegram echoes back with the secret given to setWebhook.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

pub struct WebhookState<T> {
    client: TelegramClient,
    dispatcher: Dispatcher<T>,
    secret: Option<Arc<str>>,
}

impl<T> Clone for WebhookState<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            dispatcher: self.dispatcher.clone(),
            secret: self.secret.clone(),
        }
    }
}

pub fn router<T: ChatTransport>(
    client: TelegramClient,
    dispatcher: Dispatcher<T>,
    secret: Option<String>,
) -> Router {
    let state = WebhookState {
        client,
        dispatcher,
        secret: secret.map(Arc::from),
    };

    Router::new()
        .route("/telegram/webhook", post(receive_update::<T>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn receive_update<T: ChatTransport>(
    State(state): State<WebhookState<T>>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    if let Some(expected) = &state.secret {
        let given = headers.get(SECRET_HEADER).map(|v| v.as_bytes());
        if !secret_matches(given, expected) {
            warn!("Rejected webhook call with a bad secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    // Queued, not handled: Telegram only needs the 200
    updates::ingest(&state.client, &state.dispatcher, update).await;
    StatusCode::OK
}

/// Constant-time in the token contents; only the length can leak.
fn secret_matches(given: Option<&[u8]>, expected: &str) -> bool {
    match given {
        Some(given) => bool::from(given.ct_eq(expected.as_bytes())),
        None => false,
    }
}

async fn health() -> &'static str {
    "ok"
}
