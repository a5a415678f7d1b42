pub mod account;
pub mod discovery;
pub mod error;
pub mod identity;
pub mod profile;
pub mod relay;
pub mod router;
pub mod state;
pub mod texts;

pub use error::{BotError, Result};
pub use state::Bot;
