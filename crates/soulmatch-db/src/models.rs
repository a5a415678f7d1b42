//! Database row types — these map directly to SQLite rows.
//! Distinct from the soulmatch-types event vocabulary to keep the DB layer independent.

use soulmatch_types::models::{ExternalId, UserId};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: UserId,
    pub tg_id: ExternalId,
    pub username: Option<String>,
    pub name: String,
    pub is_banned: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ProfileRow {
    pub user_id: UserId,
    pub age: u32,
    pub gender: String,
    pub bio: String,
    pub photo_file_id: Option<String>,
    pub last_active: String,
}

/// Fields collected by the profile dialogue.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub age: u32,
    pub gender: String,
    pub bio: String,
    pub photo_file_id: Option<String>,
}

/// A browsable profile joined with its owner's public fields.
#[derive(Debug, Clone)]
pub struct CandidateRow {
    pub user_id: UserId,
    pub name: String,
    pub username: Option<String>,
    pub age: u32,
    pub gender: String,
    pub bio: String,
    pub photo_file_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MatchRow {
    pub id: i64,
    pub a: UserId,
    pub b: UserId,
    pub active: bool,
    pub created_at: String,
}

impl MatchRow {
    /// The member of the pair that isn't `user`.
    pub fn other(&self, user: UserId) -> UserId {
        if self.a == user { self.b } else { self.a }
    }
}

#[derive(Debug, Clone)]
pub struct ReportRow {
    pub id: i64,
    pub reporter_id: UserId,
    pub reported_id: UserId,
    pub reason: String,
    pub created_at: String,
}
