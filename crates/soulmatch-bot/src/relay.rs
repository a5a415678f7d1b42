use tracing::{debug, error};

use soulmatch_types::events::{InboundEvent, OutboundAction};
use soulmatch_types::models::UserId;
use soulmatch_types::transport::ChatTransport;

use crate::error::Result;
use crate::state::Bot;
use crate::texts;

/// Name the other side sees instead of the sender's real name or handle.
pub fn anonymous_label(user_id: UserId) -> String {
    format!("Anonymous#{}", user_id)
}

impl<T: ChatTransport> Bot<T> {
    /// Forward free text to the sender's match.
    pub(crate) async fn relay_text(&self, event: &InboundEvent, text: &str) -> Result<()> {
        let sender_id = self.resolve(&event.sender)?;

        let Some(active) = self.db.find_active_match(sender_id)? else {
            return self.reply(event.chat_id, texts::NO_ACTIVE_MATCH).await;
        };

        let other = active.other(sender_id);
        let Some(other_tg) = self.db.get_tg_id(other)? else {
            return self.reply(event.chat_id, texts::CONTACT_NOT_FOUND).await;
        };

        let forwarded = format!("{}:\n{}", anonymous_label(sender_id), text);
        match self
            .transport
            .deliver(OutboundAction::text(other_tg, forwarded))
            .await
        {
            Ok(()) => {
                debug!("Relayed message from user {} to user {}", sender_id, other);
                self.reply(event.chat_id, texts::RELAYED).await
            }
            Err(e) => {
                error!("Relay from user {} to user {} failed: {}", sender_id, other, e);
                self.reply(event.chat_id, texts::RELAY_FAILED).await
            }
        }
    }
}
