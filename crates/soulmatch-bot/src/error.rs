use soulmatch_types::transport::TransportError;

/// Failure of a single inbound event. Never fatal to the process: the
/// dispatcher logs it and moves on to the next event.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, BotError>;
