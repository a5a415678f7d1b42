use soulmatch_types::models::{Identity, UserId};
use soulmatch_types::transport::ChatTransport;
use tracing::debug;

use crate::error::Result;
use crate::state::Bot;

impl<T: ChatTransport> Bot<T> {
    /// Map a chat identity to its internal user id, creating the user row on
    /// first contact.
    pub fn resolve(&self, who: &Identity) -> Result<UserId> {
        let user_id = self.db.ensure_user(who)?;
        debug!("tg_id {} resolved to user {}", who.id, user_id);
        Ok(user_id)
    }
}
