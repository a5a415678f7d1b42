use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use soulmatch_db::models::NewProfile;
use soulmatch_types::events::InboundEvent;
use soulmatch_types::models::ExternalId;
use soulmatch_types::transport::ChatTransport;

use crate::error::Result;
use crate::state::Bot;
use crate::texts;

pub const MIN_AGE: u32 = 18;
const MIN_NAME_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Name,
    Age,
    Gender,
    Bio,
    Photo,
}

impl Step {
    fn prompt(self) -> &'static str {
        match self {
            Step::Name => texts::ASK_NAME,
            Step::Age => texts::ASK_AGE,
            Step::Gender => texts::ASK_GENDER,
            Step::Bio => texts::ASK_BIO,
            Step::Photo => texts::ASK_PHOTO,
        }
    }
}

/// Input fed to a running dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueInput<'a> {
    Text(&'a str),
    Photo(&'a str),
    /// The `/skip` command
    Skip,
    /// Anything else the user sent (sticker, voice, ...)
    Other,
}

#[derive(Debug)]
pub enum Transition {
    /// Input rejected, ask again
    Reprompt(&'static str),
    /// Field stored, ask the next question
    Next(&'static str),
    /// Dialogue over without saving
    Rejected(&'static str),
    /// All fields collected
    Complete { name: String, profile: NewProfile },
    /// Input doesn't belong to the dialogue; state unchanged
    Ignored,
}

impl Transition {
    fn is_terminal(&self) -> bool {
        matches!(self, Transition::Rejected(_) | Transition::Complete { .. })
    }
}

/// Transient answers for one identity's profile dialogue.
#[derive(Debug, Clone)]
pub struct Dialogue {
    step: Step,
    name: String,
    age: u32,
    gender: String,
    bio: String,
}

impl Default for Dialogue {
    fn default() -> Self {
        Self {
            step: Step::Name,
            name: String::new(),
            age: 0,
            gender: String::new(),
            bio: String::new(),
        }
    }
}

impl Dialogue {
    pub fn step(&self) -> Step {
        self.step
    }

    pub fn advance(&mut self, input: DialogueInput<'_>) -> Transition {
        match (self.step, input) {
            (Step::Name, DialogueInput::Text(text)) => {
                let name = text.trim();
                if name.chars().count() < MIN_NAME_CHARS {
                    return Transition::Reprompt(texts::INVALID_NAME);
                }
                self.name = name.to_string();
                self.step = Step::Age;
                Transition::Next(texts::ASK_AGE)
            }
            (Step::Age, DialogueInput::Text(text)) => match parse_age(text) {
                Err(reply) => Transition::Reprompt(reply),
                Ok(age) if age < MIN_AGE => Transition::Rejected(texts::UNDERAGE),
                Ok(age) => {
                    self.age = age;
                    self.step = Step::Gender;
                    Transition::Next(texts::ASK_GENDER)
                }
            },
            (Step::Gender, DialogueInput::Text(text)) => {
                self.gender = text.trim().to_string();
                self.step = Step::Bio;
                Transition::Next(texts::ASK_BIO)
            }
            (Step::Bio, DialogueInput::Text(text)) => {
                self.bio = text.trim().to_string();
                self.step = Step::Photo;
                Transition::Next(texts::ASK_PHOTO)
            }
            (Step::Photo, DialogueInput::Photo(file_id)) => self.finish(Some(file_id.to_string())),
            (Step::Photo, DialogueInput::Skip) => self.finish(None),
            (_, DialogueInput::Skip) => Transition::Ignored,
            (step, _) => Transition::Reprompt(step.prompt()),
        }
    }

    fn finish(&mut self, photo_file_id: Option<String>) -> Transition {
        Transition::Complete {
            name: std::mem::take(&mut self.name),
            profile: NewProfile {
                age: self.age,
                gender: std::mem::take(&mut self.gender),
                bio: std::mem::take(&mut self.bio),
                photo_file_id,
            },
        }
    }
}

/// Digits only. The error is the reply to send back: signs, spaces and
/// letters are "not a number", digit strings too long for any age are
/// "not a real age".
fn parse_age(text: &str) -> std::result::Result<u32, &'static str> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(texts::AGE_NOT_NUMBER);
    }
    text.parse().map_err(|_| texts::AGE_NOT_REALISTIC)
}

/// One dialogue slot per external identity.
#[derive(Default)]
pub struct Dialogues {
    inner: Mutex<HashMap<ExternalId, Dialogue>>,
}

impl Dialogues {
    /// Begin (or restart) the dialogue for `who`.
    pub async fn start(&self, who: ExternalId) {
        self.inner.lock().await.insert(who, Dialogue::default());
    }

    /// Drop `who`'s dialogue. Returns whether there was one.
    pub async fn clear(&self, who: ExternalId) -> bool {
        self.inner.lock().await.remove(&who).is_some()
    }

    pub async fn step(&self, who: ExternalId) -> Option<Step> {
        self.inner.lock().await.get(&who).map(Dialogue::step)
    }

    /// Feed input to `who`'s dialogue. `None` when no dialogue is running.
    pub async fn advance(&self, who: ExternalId, input: DialogueInput<'_>) -> Option<Transition> {
        let mut dialogues = self.inner.lock().await;
        let transition = dialogues.get_mut(&who)?.advance(input);
        if transition.is_terminal() {
            dialogues.remove(&who);
        }
        Some(transition)
    }
}

impl<T: ChatTransport> Bot<T> {
    pub(crate) async fn start_profile(&self, event: &InboundEvent) -> Result<()> {
        self.dialogues.start(event.sender_id()).await;
        self.reply(event.chat_id, texts::ASK_NAME).await
    }

    /// Forget a dialogue the user walked away from. Called when the user's
    /// event worker retires after idling.
    pub async fn abandon_dialogue(&self, who: ExternalId) {
        if self.dialogues.clear(who).await {
            debug!("Dropped abandoned profile dialogue for tg_id {}", who);
        }
    }

    /// Route input to the sender's running dialogue. Returns false when there
    /// is no dialogue or the input isn't part of it.
    pub(crate) async fn continue_profile(
        &self,
        event: &InboundEvent,
        input: DialogueInput<'_>,
    ) -> Result<bool> {
        let Some(transition) = self.dialogues.advance(event.sender_id(), input).await else {
            return Ok(false);
        };

        match transition {
            Transition::Ignored => return Ok(false),
            Transition::Reprompt(text) | Transition::Next(text) => {
                self.reply(event.chat_id, text).await?;
            }
            Transition::Rejected(text) => {
                info!("tg_id {} rejected by profile age check", event.sender_id());
                self.reply(event.chat_id, text).await?;
            }
            Transition::Complete { name, profile } => {
                let user_id = self.resolve(&event.sender)?;

                // Name refresh is best-effort
                if let Err(e) = self.db.set_user_name(user_id, &name) {
                    warn!("Could not update name for user {}: {:#}", user_id, e);
                }

                let with_photo = profile.photo_file_id.is_some();
                self.db.save_profile(user_id, &profile)?;
                info!("Profile saved for user {} (photo: {})", user_id, with_photo);

                let text = if with_photo {
                    texts::PROFILE_SAVED
                } else {
                    texts::PROFILE_SAVED_NO_PHOTO
                };
                self.reply(event.chat_id, text).await?;
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(dialogue: &mut Dialogue, inputs: &[DialogueInput<'_>]) -> Vec<Transition> {
        inputs.iter().map(|input| dialogue.advance(*input)).collect()
    }

    #[test]
    fn full_dialogue_collects_every_field() {
        let mut dialogue = Dialogue::default();
        let transitions = run(
            &mut dialogue,
            &[
                DialogueInput::Text("  Ada Lovelace "),
                DialogueInput::Text("36"),
                DialogueInput::Text("Female"),
                DialogueInput::Text("Engines and poetry"),
                DialogueInput::Photo("file-abc"),
            ],
        );

        assert!(matches!(transitions[0], Transition::Next(texts::ASK_AGE)));
        assert!(matches!(transitions[3], Transition::Next(texts::ASK_PHOTO)));
        match &transitions[4] {
            Transition::Complete { name, profile } => {
                assert_eq!(name, "Ada Lovelace");
                assert_eq!(profile.age, 36);
                assert_eq!(profile.gender, "Female");
                assert_eq!(profile.bio, "Engines and poetry");
                assert_eq!(profile.photo_file_id.as_deref(), Some("file-abc"));
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn short_name_reprompts_without_advancing() {
        let mut dialogue = Dialogue::default();
        assert!(matches!(
            dialogue.advance(DialogueInput::Text(" A ")),
            Transition::Reprompt(texts::INVALID_NAME)
        ));
        assert_eq!(dialogue.step(), Step::Name);
    }

    #[test]
    fn age_must_be_digits() {
        let mut dialogue = Dialogue::default();
        dialogue.advance(DialogueInput::Text("Bob"));

        for bad in ["twenty", "-20", "2 0", ""] {
            assert!(matches!(
                dialogue.advance(DialogueInput::Text(bad)),
                Transition::Reprompt(texts::AGE_NOT_NUMBER)
            ));
            assert_eq!(dialogue.step(), Step::Age);
        }
    }

    #[test]
    fn overflowing_age_is_not_called_a_non_number() {
        let mut dialogue = Dialogue::default();
        dialogue.advance(DialogueInput::Text("Bob"));

        assert!(matches!(
            dialogue.advance(DialogueInput::Text("99999999999")),
            Transition::Reprompt(texts::AGE_NOT_REALISTIC)
        ));
        assert_eq!(dialogue.step(), Step::Age);

        // Leading zeros are still a number
        assert!(matches!(
            dialogue.advance(DialogueInput::Text("018")),
            Transition::Next(texts::ASK_GENDER)
        ));
    }

    #[test]
    fn underage_is_a_hard_stop() {
        let mut dialogue = Dialogue::default();
        dialogue.advance(DialogueInput::Text("Kid"));
        assert!(matches!(
            dialogue.advance(DialogueInput::Text("17")),
            Transition::Rejected(texts::UNDERAGE)
        ));
    }

    #[test]
    fn photo_step_reprompts_on_text_and_accepts_skip() {
        let mut dialogue = Dialogue::default();
        run(
            &mut dialogue,
            &[
                DialogueInput::Text("Bob"),
                DialogueInput::Text("18"),
                DialogueInput::Text("Male"),
                DialogueInput::Text("hi"),
            ],
        );

        assert!(matches!(
            dialogue.advance(DialogueInput::Text("no photo")),
            Transition::Reprompt(texts::ASK_PHOTO)
        ));
        assert!(matches!(
            dialogue.advance(DialogueInput::Other),
            Transition::Reprompt(texts::ASK_PHOTO)
        ));
        match dialogue.advance(DialogueInput::Skip) {
            Transition::Complete { profile, .. } => {
                assert_eq!(profile.age, 18);
                assert!(profile.photo_file_id.is_none());
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn skip_before_photo_step_is_ignored() {
        let mut dialogue = Dialogue::default();
        assert!(matches!(dialogue.advance(DialogueInput::Skip), Transition::Ignored));
        assert_eq!(dialogue.step(), Step::Name);
    }

    #[test]
    fn photo_during_text_step_reprompts_current_question() {
        let mut dialogue = Dialogue::default();
        dialogue.advance(DialogueInput::Text("Bob"));
        assert!(matches!(
            dialogue.advance(DialogueInput::Photo("file")),
            Transition::Reprompt(texts::ASK_AGE)
        ));
    }

    #[tokio::test]
    async fn slots_are_per_identity_and_cleared_when_done() {
        let dialogues = Dialogues::default();
        dialogues.start(1).await;
        dialogues.start(2).await;

        dialogues.advance(1, DialogueInput::Text("Ada")).await;
        assert_eq!(dialogues.step(1).await, Some(Step::Age));
        assert_eq!(dialogues.step(2).await, Some(Step::Name));

        dialogues.advance(1, DialogueInput::Text("12")).await;
        assert_eq!(dialogues.step(1).await, None);
        assert!(dialogues.advance(1, DialogueInput::Text("x")).await.is_none());

        // Restarting resets collected state
        dialogues.advance(2, DialogueInput::Text("Bob")).await;
        dialogues.start(2).await;
        assert_eq!(dialogues.step(2).await, Some(Step::Name));
    }
}
