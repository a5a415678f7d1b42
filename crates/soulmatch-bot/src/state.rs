use std::sync::Arc;

use soulmatch_db::Database;
use soulmatch_types::events::{ChatId, MessageRef, OutboundAction};
use soulmatch_types::transport::ChatTransport;

use crate::error::Result;
use crate::profile::Dialogues;

/// Everything an event handler needs. Shared by all per-identity workers.
pub struct Bot<T> {
    pub db: Arc<Database>,
    pub transport: T,
    pub(crate) dialogues: Dialogues,
}

impl<T: ChatTransport> Bot<T> {
    pub fn new(db: Arc<Database>, transport: T) -> Self {
        Self {
            db,
            transport,
            dialogues: Dialogues::default(),
        }
    }

    pub(crate) async fn reply(&self, chat_id: ChatId, text: impl Into<String>) -> Result<()> {
        self.transport
            .deliver(OutboundAction::text(chat_id, text))
            .await?;
        Ok(())
    }

    pub(crate) async fn edit(&self, message: MessageRef, text: impl Into<String>) -> Result<()> {
        self.transport
            .deliver(OutboundAction::EditText {
                message,
                text: text.into(),
            })
            .await?;
        Ok(())
    }
}
