use tracing::debug;

use soulmatch_types::events::{EventKind, InboundEvent};
use soulmatch_types::transport::ChatTransport;

use crate::error::Result;
use crate::profile::DialogueInput;
use crate::state::Bot;
use crate::texts;

impl<T: ChatTransport> Bot<T> {
    /// Process one inbound event to completion.
    pub async fn handle(&self, event: InboundEvent) -> Result<()> {
        match &event.kind {
            EventKind::Command { name, args } => self.command(&event, name, args).await,
            EventKind::Button { data, message } => {
                self.press_button(&event.sender, data, *message).await
            }
            EventKind::Text(text) => {
                if self
                    .continue_profile(&event, DialogueInput::Text(text))
                    .await?
                {
                    return Ok(());
                }
                self.relay_text(&event, text).await
            }
            EventKind::Photo { file_id } => {
                if self
                    .continue_profile(&event, DialogueInput::Photo(file_id))
                    .await?
                {
                    return Ok(());
                }
                self.reply(event.chat_id, texts::TEXT_ONLY).await
            }
            EventKind::Unsupported => {
                if self.continue_profile(&event, DialogueInput::Other).await? {
                    return Ok(());
                }
                self.reply(event.chat_id, texts::TEXT_ONLY).await
            }
        }
    }

    async fn command(&self, event: &InboundEvent, name: &str, args: &[String]) -> Result<()> {
        debug!("tg_id {} sent /{}", event.sender_id(), name);

        match name {
            "start" => self.reply(event.chat_id, texts::WELCOME).await,
            "help" => self.reply(event.chat_id, texts::HELP).await,
            "create_profile" => self.start_profile(event).await,
            "skip" => {
                if self.continue_profile(event, DialogueInput::Skip).await? {
                    return Ok(());
                }
                self.reply(event.chat_id, texts::NOTHING_TO_SKIP).await
            }
            "find" => self.find(event).await,
            "myprofile" => self.my_profile(event).await,
            "delete_account" => self.delete_account(event).await,
            "report" => self.report(event, args).await,
            _ => self.reply(event.chat_id, texts::UNKNOWN_COMMAND).await,
        }
    }
}
