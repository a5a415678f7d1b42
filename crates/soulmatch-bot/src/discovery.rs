use tracing::{debug, info, warn};

use soulmatch_db::models::CandidateRow;
use soulmatch_db::queries::LikeOutcome;
use soulmatch_types::events::{Button, InboundEvent, MessageRef, OutboundAction};
use soulmatch_types::models::{ButtonAction, Identity, UserId};
use soulmatch_types::transport::ChatTransport;

use crate::error::Result;
use crate::state::Bot;
use crate::texts;

/// Text shown for a browsed profile (used as a photo caption when there is one).
pub fn candidate_card(candidate: &CandidateRow) -> String {
    format!(
        "{} (@{})\nAge: {}\nGender: {}\nBio: {}",
        candidate.name,
        candidate.username.as_deref().unwrap_or("user"),
        candidate.age,
        candidate.gender,
        candidate.bio
    )
}

impl<T: ChatTransport> Bot<T> {
    /// Show the sender the next profile they haven't liked, with Like/Skip buttons.
    pub(crate) async fn find(&self, event: &InboundEvent) -> Result<()> {
        let user_id = self.resolve(&event.sender)?;
        self.db.touch_last_active(user_id)?;

        let Some(candidate) = self.db.find_candidate(user_id)? else {
            return self.reply(event.chat_id, texts::NO_CANDIDATES).await;
        };
        debug!("Showing user {} to user {}", candidate.user_id, user_id);

        let caption = candidate_card(&candidate);
        let buttons = vec![
            Button::new(texts::LIKE_BUTTON, &ButtonAction::Like(candidate.user_id)),
            Button::new(texts::SKIP_BUTTON, &ButtonAction::Skip(candidate.user_id)),
        ];

        let action = match candidate.photo_file_id {
            Some(file_id) => OutboundAction::Photo {
                chat_id: event.chat_id,
                file_id,
                caption,
                buttons,
            },
            None => OutboundAction::TextWithButtons {
                chat_id: event.chat_id,
                text: caption,
                buttons,
            },
        };
        self.transport.deliver(action).await?;
        Ok(())
    }

    /// Handle a Like/Skip button press. The acknowledgement replaces the
    /// pressed message.
    pub(crate) async fn press_button(
        &self,
        sender: &Identity,
        data: &str,
        message: MessageRef,
    ) -> Result<()> {
        let Some(action) = ButtonAction::parse(data) else {
            warn!("Unrecognized button payload from tg_id {}: {:?}", sender.id, data);
            return self.edit(message, texts::ACTION_NOT_RECOGNIZED).await;
        };

        let user_id = self.resolve(sender)?;

        match action {
            // Skips leave no trace; the candidate comes back on the next /find
            ButtonAction::Skip(_) => self.edit(message, texts::SKIPPED).await,
            ButtonAction::Like(target) => self.like(user_id, target, message).await,
            ButtonAction::Unknown(name, _) => {
                debug!("Unknown button action {:?} from user {}", name, user_id);
                self.edit(message, texts::UNKNOWN_ACTION).await
            }
        }
    }

    async fn like(&self, from: UserId, to: UserId, message: MessageRef) -> Result<()> {
        match self.db.record_like(from, to)? {
            LikeOutcome::Pending => self.edit(message, texts::LIKE_PENDING).await,
            LikeOutcome::TargetMissing => self.edit(message, texts::PROFILE_GONE).await,
            LikeOutcome::Matched { new_match } => {
                if new_match {
                    info!("Users {} and {} matched", from, to);
                }
                // The match is committed; a failed acknowledgement must not
                // stop the other side from hearing about it.
                let acked = self.edit(message, texts::MATCHED).await;
                self.notify_match(to).await;
                acked
            }
        }
    }

    /// Best-effort alert to the other party. Failures are logged and dropped.
    async fn notify_match(&self, user_id: UserId) {
        let tg_id = match self.db.get_tg_id(user_id) {
            Ok(Some(tg_id)) => tg_id,
            Ok(None) => {
                warn!("Matched user {} has no account anymore", user_id);
                return;
            }
            Err(e) => {
                warn!("Could not look up matched user {}: {:#}", user_id, e);
                return;
            }
        };

        if let Err(e) = self
            .transport
            .deliver(OutboundAction::text(tg_id, texts::MATCH_NOTIFICATION))
            .await
        {
            warn!("Could not notify matched user {}: {}", user_id, e);
        }
    }
}
