use tracing::info;

use soulmatch_types::events::{InboundEvent, OutboundAction};
use soulmatch_types::models::ExternalId;
use soulmatch_types::transport::ChatTransport;

use crate::error::Result;
use crate::state::Bot;
use crate::texts;

impl<T: ChatTransport> Bot<T> {
    /// Read-only view of the sender's own profile.
    pub(crate) async fn my_profile(&self, event: &InboundEvent) -> Result<()> {
        let Some(user) = self.db.get_user_by_tg_id(event.sender_id())? else {
            return self.reply(event.chat_id, texts::NO_ACCOUNT).await;
        };
        let Some(profile) = self.db.get_profile(user.id)? else {
            return self.reply(event.chat_id, texts::NO_PROFILE).await;
        };

        let text = format!(
            "Name: {}\nTelegram: @{}\nAge: {}\nGender: {}\nBio: {}",
            user.name,
            user.username.as_deref().unwrap_or("user"),
            profile.age,
            profile.gender,
            profile.bio
        );

        let action = match profile.photo_file_id {
            Some(file_id) => OutboundAction::Photo {
                chat_id: event.chat_id,
                file_id,
                caption: text,
                buttons: vec![],
            },
            None => OutboundAction::text(event.chat_id, text),
        };
        self.transport.deliver(action).await?;
        Ok(())
    }

    pub(crate) async fn delete_account(&self, event: &InboundEvent) -> Result<()> {
        // A half-finished profile dialogue goes with the account
        self.dialogues.clear(event.sender_id()).await;

        match self.db.delete_account(event.sender_id())? {
            Some(user_id) => {
                info!("User {} deleted their account", user_id);
                self.reply(event.chat_id, texts::ACCOUNT_DELETED).await
            }
            None => self.reply(event.chat_id, texts::NO_ACCOUNT_TO_DELETE).await,
        }
    }

    /// `/report <tg_id> <reason...>`
    pub(crate) async fn report(&self, event: &InboundEvent, args: &[String]) -> Result<()> {
        if args.len() < 2 {
            return self.reply(event.chat_id, texts::REPORT_USAGE).await;
        }
        let Ok(target_tg) = args[0].parse::<ExternalId>() else {
            return self.reply(event.chat_id, texts::REPORT_NUMERIC_ID).await;
        };
        let reason = args[1..].join(" ");

        let reporter_id = self.resolve(&event.sender)?;
        let Some(reported) = self.db.get_user_by_tg_id(target_tg)? else {
            return self.reply(event.chat_id, texts::REPORT_USER_NOT_FOUND).await;
        };

        let report_id = self.db.insert_report(reporter_id, reported.id, &reason)?;
        info!(
            "Report {} filed by user {} against user {}",
            report_id, reporter_id, reported.id
        );
        self.reply(event.chat_id, texts::REPORT_RECEIVED).await
    }
}
