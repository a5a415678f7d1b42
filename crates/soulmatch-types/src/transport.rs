use std::future::Future;

use crate::events::OutboundAction;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("chat API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("could not decode API response: {0}")]
    Decode(String),
}

/// Outbound side of the chat platform.
///
/// Implementations make a single delivery attempt per call; retries are the
/// caller's decision.
pub trait ChatTransport: Send + Sync + 'static {
    fn deliver(
        &self,
        action: OutboundAction,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
