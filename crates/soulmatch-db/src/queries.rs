use crate::Database;
use crate::models::{CandidateRow, MatchRow, NewProfile, ProfileRow, ReportRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, Row};
use soulmatch_types::models::{ExternalId, Identity, UserId};
use tracing::{debug, info};

/// Result of recording a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// Like stored; the other side hasn't liked back yet.
    Pending,
    /// Both sides like each other. `new_match` is false when the match
    /// already existed.
    Matched { new_match: bool },
    /// The target is gone (or is the liker); nothing was written.
    TargetMissing,
}

impl Database {
    // -- Users --

    /// Return the internal id for `who`, creating the user on first contact.
    pub fn ensure_user(&self, who: &Identity) -> Result<UserId> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (tg_id, username, name) VALUES (?1, ?2, ?3)
                 ON CONFLICT(tg_id) DO NOTHING",
                rusqlite::params![who.id, who.username, who.display_name()],
            )?;

            let id: UserId =
                conn.query_row("SELECT id FROM users WHERE tg_id = ?1", [who.id], |row| {
                    row.get(0)
                })?;

            if inserted > 0 {
                info!("Created user {} for tg_id {}", id, who.id);
            }
            Ok(id)
        })
    }

    pub fn get_user_by_tg_id(&self, tg_id: ExternalId) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, tg_id, username, name, is_banned, created_at FROM users WHERE tg_id = ?1",
                [tg_id],
                user_from_row,
            )
            .optional()
        })
    }

    /// External chat id for an internal user, if the user still exists.
    pub fn get_tg_id(&self, user_id: UserId) -> Result<Option<ExternalId>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT tg_id FROM users WHERE id = ?1", [user_id], |row| {
                row.get(0)
            })
            .optional()
        })
    }

    pub fn set_user_name(&self, user_id: UserId, name: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET name = ?1 WHERE id = ?2",
                rusqlite::params![name, user_id],
            )?;
            Ok(())
        })
    }

    // -- Profiles --

    /// Replace the user's profile, or create it if there is none.
    pub fn save_profile(&self, user_id: UserId, profile: &NewProfile) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let exists = tx
                .query_row("SELECT 1 FROM profiles WHERE user_id = ?1", [user_id], |_| {
                    Ok(())
                })
                .optional()?
                .is_some();

            if exists {
                tx.execute(
                    "UPDATE profiles
                     SET age = ?1, gender = ?2, bio = ?3, photo_file_id = ?4, last_active = ?5
                     WHERE user_id = ?6",
                    rusqlite::params![
                        profile.age,
                        profile.gender,
                        profile.bio,
                        profile.photo_file_id,
                        now_timestamp(),
                        user_id
                    ],
                )?;
            } else {
                tx.execute(
                    "INSERT INTO profiles (user_id, age, gender, bio, photo_file_id, last_active)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        user_id,
                        profile.age,
                        profile.gender,
                        profile.bio,
                        profile.photo_file_id,
                        now_timestamp()
                    ],
                )?;
            }
            tx.commit()?;

            debug!("Saved profile for user {} (replaced: {})", user_id, exists);
            Ok(())
        })
    }

    pub fn get_profile(&self, user_id: UserId) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT user_id, age, gender, bio, photo_file_id, last_active
                 FROM profiles WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(ProfileRow {
                        user_id: row.get(0)?,
                        age: row.get(1)?,
                        gender: row.get(2)?,
                        bio: row.get(3)?,
                        photo_file_id: row.get(4)?,
                        last_active: row.get(5)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Bump `last_active` on the user's profile, if they have one.
    pub fn touch_last_active(&self, user_id: UserId) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE profiles SET last_active = ?1 WHERE user_id = ?2",
                rusqlite::params![now_timestamp(), user_id],
            )?;
            Ok(())
        })
    }

    // -- Discovery --

    /// First profile, in storage order, that isn't the user's own and that
    /// the user hasn't liked yet.
    pub fn find_candidate(&self, user_id: UserId) -> Result<Option<CandidateRow>> {
        self.with_conn(|conn| query_candidate(conn, user_id))
    }

    // -- Likes & matches --

    /// Store a like from `from` to `to` and create the match when the like
    /// is reciprocated.
    ///
    /// The insert, the reciprocal check and the match insert share one
    /// transaction, so a like that completes a pair is always seen by the
    /// check, and two reciprocal likes racing each other still produce a
    /// single match.
    pub fn record_like(&self, from: UserId, to: UserId) -> Result<LikeOutcome> {
        if from == to {
            return Ok(LikeOutcome::TargetMissing);
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if !user_exists(&tx, to)? {
                return Ok(LikeOutcome::TargetMissing);
            }

            if !like_exists(&tx, from, to)? {
                tx.execute(
                    "INSERT INTO likes (from_user, to_user) VALUES (?1, ?2)",
                    [from, to],
                )?;
                debug!("User {} liked user {}", from, to);
            }

            if !like_exists(&tx, to, from)? {
                tx.commit()?;
                return Ok(LikeOutcome::Pending);
            }

            let (a, b) = ordered_pair(from, to);
            let new_match = query_match_between(&tx, a, b)?.is_none();
            if new_match {
                tx.execute("INSERT INTO matches (a, b) VALUES (?1, ?2)", [a, b])?;
                info!("New match between users {} and {}", a, b);
            }

            tx.commit()?;
            Ok(LikeOutcome::Matched { new_match })
        })
    }

    pub fn like_exists(&self, from: UserId, to: UserId) -> Result<bool> {
        self.with_conn(|conn| like_exists(conn, from, to))
    }

    /// Oldest active match the user is part of.
    pub fn find_active_match(&self, user_id: UserId) -> Result<Option<MatchRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, a, b, active, created_at FROM matches
                 WHERE (a = ?1 OR b = ?1) AND active = 1
                 ORDER BY id
                 LIMIT 1",
                [user_id],
                match_from_row,
            )
            .optional()
        })
    }

    pub fn get_match_between(&self, x: UserId, y: UserId) -> Result<Option<MatchRow>> {
        let (a, b) = ordered_pair(x, y);
        self.with_conn(|conn| query_match_between(conn, a, b))
    }

    // -- Reports --

    pub fn insert_report(&self, reporter_id: UserId, reported_id: UserId, reason: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO reports (reporter_id, reported_id, reason) VALUES (?1, ?2, ?3)",
                rusqlite::params![reporter_id, reported_id, reason],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_reports_by(&self, reporter_id: UserId) -> Result<Vec<ReportRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, reporter_id, reported_id, reason, created_at
                 FROM reports WHERE reporter_id = ?1 ORDER BY id",
            )?;

            let rows = stmt
                .query_map([reporter_id], |row| {
                    Ok(ReportRow {
                        id: row.get(0)?,
                        reporter_id: row.get(1)?,
                        reported_id: row.get(2)?,
                        reason: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Accounts --

    /// Remove the user and every row referencing them. Returns the deleted
    /// internal id, or `None` when there was no account.
    pub fn delete_account(&self, tg_id: ExternalId) -> Result<Option<UserId>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let user_id: Option<UserId> = tx
                .query_row("SELECT id FROM users WHERE tg_id = ?1", [tg_id], |row| {
                    row.get(0)
                })
                .optional()?;
            let Some(user_id) = user_id else {
                return Ok(None);
            };

            tx.execute("DELETE FROM profiles WHERE user_id = ?1", [user_id])?;
            tx.execute("DELETE FROM likes WHERE from_user = ?1 OR to_user = ?1", [user_id])?;
            tx.execute("DELETE FROM matches WHERE a = ?1 OR b = ?1", [user_id])?;
            tx.execute(
                "DELETE FROM reports WHERE reporter_id = ?1 OR reported_id = ?1",
                [user_id],
            )?;
            tx.execute("DELETE FROM users WHERE id = ?1", [user_id])?;
            tx.commit()?;

            info!("Deleted account {} (tg_id {})", user_id, tg_id);
            Ok(Some(user_id))
        })
    }
}

fn query_candidate(conn: &Connection, user_id: UserId) -> Result<Option<CandidateRow>> {
    let mut stmt = conn.prepare(
        "SELECT p.user_id, u.name, u.username, p.age, p.gender, p.bio, p.photo_file_id
         FROM profiles p
         JOIN users u ON p.user_id = u.id
         WHERE p.user_id != ?1
           AND p.user_id NOT IN (SELECT to_user FROM likes WHERE from_user = ?1)
         ORDER BY p.id
         LIMIT 1",
    )?;

    stmt.query_row([user_id], |row| {
        Ok(CandidateRow {
            user_id: row.get(0)?,
            name: row.get(1)?,
            username: row.get(2)?,
            age: row.get(3)?,
            gender: row.get(4)?,
            bio: row.get(5)?,
            photo_file_id: row.get(6)?,
        })
    })
    .optional()
}

fn query_match_between(conn: &Connection, a: UserId, b: UserId) -> Result<Option<MatchRow>> {
    conn.query_row(
        "SELECT id, a, b, active, created_at FROM matches WHERE a = ?1 AND b = ?2",
        [a, b],
        match_from_row,
    )
    .optional()
}

fn user_exists(conn: &Connection, user_id: UserId) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", [user_id], |_| Ok(()))
        .optional()?
        .is_some())
}

fn like_exists(conn: &Connection, from: UserId, to: UserId) -> Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM likes WHERE from_user = ?1 AND to_user = ?2",
            [from, to],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        tg_id: row.get(1)?,
        username: row.get(2)?,
        name: row.get(3)?,
        is_banned: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn match_from_row(row: &Row<'_>) -> rusqlite::Result<MatchRow> {
    Ok(MatchRow {
        id: row.get(0)?,
        a: row.get(1)?,
        b: row.get(2)?,
        active: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn ordered_pair(x: UserId, y: UserId) -> (UserId, UserId) {
    if x < y { (x, y) } else { (y, x) }
}

/// Same layout as SQLite's `datetime('now')`.
fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: ExternalId, first: &str) -> Identity {
        let mut who = Identity::new(id);
        who.first_name = Some(first.to_string());
        who.username = Some(first.to_lowercase());
        who
    }

    fn profile(age: u32) -> NewProfile {
        NewProfile {
            age,
            gender: "Other".into(),
            bio: "hello".into(),
            photo_file_id: None,
        }
    }

    fn count(db: &Database, sql: &str) -> i64 {
        db.with_conn(|conn| Ok(conn.query_row(sql, [], |r| r.get(0))?))
            .unwrap()
    }

    #[test]
    fn ensure_user_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let who = identity(100, "Ada");

        let first = db.ensure_user(&who).unwrap();
        let second = db.ensure_user(&who).unwrap();

        assert_eq!(first, second);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM users"), 1);

        let row = db.get_user_by_tg_id(100).unwrap().unwrap();
        assert_eq!(row.id, first);
        assert_eq!(row.name, "Ada");
        assert_eq!(row.username.as_deref(), Some("ada"));
        assert!(!row.is_banned);
    }

    #[test]
    fn save_profile_replaces_existing_row() {
        let db = Database::open_in_memory().unwrap();
        let uid = db.ensure_user(&identity(1, "Ada")).unwrap();

        db.save_profile(uid, &profile(20)).unwrap();
        let mut updated = profile(31);
        updated.photo_file_id = Some("photo-1".into());
        db.save_profile(uid, &updated).unwrap();

        assert_eq!(count(&db, "SELECT COUNT(*) FROM profiles"), 1);
        let row = db.get_profile(uid).unwrap().unwrap();
        assert_eq!(row.age, 31);
        assert_eq!(row.photo_file_id.as_deref(), Some("photo-1"));
    }

    #[test]
    fn underage_profile_is_not_stored() {
        let db = Database::open_in_memory().unwrap();
        let uid = db.ensure_user(&identity(1, "Kid")).unwrap();

        assert!(db.save_profile(uid, &profile(17)).is_err());
        assert!(db.get_profile(uid).unwrap().is_none());
    }

    #[test]
    fn candidate_excludes_self_and_liked() {
        let db = Database::open_in_memory().unwrap();
        let a = db.ensure_user(&identity(1, "Ada")).unwrap();
        let b = db.ensure_user(&identity(2, "Bob")).unwrap();
        let c = db.ensure_user(&identity(3, "Cy")).unwrap();
        for uid in [a, b, c] {
            db.save_profile(uid, &profile(25)).unwrap();
        }

        assert_eq!(db.find_candidate(a).unwrap().unwrap().user_id, b);

        db.record_like(a, b).unwrap();
        assert_eq!(db.find_candidate(a).unwrap().unwrap().user_id, c);

        db.record_like(a, c).unwrap();
        assert!(db.find_candidate(a).unwrap().is_none());

        // Being liked doesn't hide anyone from the liker's target
        assert_eq!(db.find_candidate(b).unwrap().unwrap().user_id, a);
    }

    #[test]
    fn candidate_order_is_stable_across_profile_updates() {
        let db = Database::open_in_memory().unwrap();
        let a = db.ensure_user(&identity(1, "Ada")).unwrap();
        let b = db.ensure_user(&identity(2, "Bob")).unwrap();
        let c = db.ensure_user(&identity(3, "Cy")).unwrap();
        db.save_profile(b, &profile(25)).unwrap();
        db.save_profile(c, &profile(25)).unwrap();
        db.save_profile(b, &profile(26)).unwrap();

        let first = db.find_candidate(a).unwrap().unwrap();
        assert_eq!(first.user_id, b);
        assert_eq!(first.age, 26);
        assert_eq!(first.name, "Bob");
    }

    #[test]
    fn record_like_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let a = db.ensure_user(&identity(1, "Ada")).unwrap();
        let b = db.ensure_user(&identity(2, "Bob")).unwrap();

        assert_eq!(db.record_like(a, b).unwrap(), LikeOutcome::Pending);
        assert_eq!(db.record_like(a, b).unwrap(), LikeOutcome::Pending);

        assert_eq!(count(&db, "SELECT COUNT(*) FROM likes"), 1);
        assert!(db.like_exists(a, b).unwrap());
        assert!(!db.like_exists(b, a).unwrap());
    }

    #[test]
    fn mutual_like_creates_exactly_one_match() {
        let db = Database::open_in_memory().unwrap();
        let a = db.ensure_user(&identity(1, "Ada")).unwrap();
        let b = db.ensure_user(&identity(2, "Bob")).unwrap();

        assert_eq!(db.record_like(b, a).unwrap(), LikeOutcome::Pending);
        assert_eq!(
            db.record_like(a, b).unwrap(),
            LikeOutcome::Matched { new_match: true }
        );
        assert_eq!(
            db.record_like(b, a).unwrap(),
            LikeOutcome::Matched { new_match: false }
        );
        assert_eq!(
            db.record_like(a, b).unwrap(),
            LikeOutcome::Matched { new_match: false }
        );

        assert_eq!(count(&db, "SELECT COUNT(*) FROM matches"), 1);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM likes"), 2);

        let m = db.get_match_between(b, a).unwrap().unwrap();
        assert!(m.active);
        assert_eq!(m.other(a), b);
        assert_eq!(m.other(b), a);
        assert_eq!(db.find_active_match(a).unwrap().unwrap().id, m.id);
        assert_eq!(db.find_active_match(b).unwrap().unwrap().id, m.id);
    }

    #[test]
    fn like_of_missing_or_self_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let a = db.ensure_user(&identity(1, "Ada")).unwrap();

        assert_eq!(db.record_like(a, a).unwrap(), LikeOutcome::TargetMissing);
        assert_eq!(db.record_like(a, 999).unwrap(), LikeOutcome::TargetMissing);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM likes"), 0);
    }

    #[test]
    fn delete_account_removes_every_reference() {
        let db = Database::open_in_memory().unwrap();
        let a = db.ensure_user(&identity(1, "Ada")).unwrap();
        let b = db.ensure_user(&identity(2, "Bob")).unwrap();
        db.save_profile(a, &profile(20)).unwrap();
        db.save_profile(b, &profile(22)).unwrap();
        db.record_like(a, b).unwrap();
        db.record_like(b, a).unwrap();
        db.insert_report(a, b, "spam").unwrap();
        db.insert_report(b, a, "rude").unwrap();

        assert_eq!(db.delete_account(1).unwrap(), Some(a));

        assert!(db.get_user_by_tg_id(1).unwrap().is_none());
        assert!(db.get_profile(a).unwrap().is_none());
        assert!(db.find_active_match(b).unwrap().is_none());
        assert_eq!(count(&db, "SELECT COUNT(*) FROM likes"), 0);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM matches"), 0);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM reports"), 0);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM users"), 1);
        assert!(db.get_profile(b).unwrap().is_some());

        assert_eq!(db.delete_account(1).unwrap(), None);
    }

    #[test]
    fn reports_are_listed_per_reporter() {
        let db = Database::open_in_memory().unwrap();
        let a = db.ensure_user(&identity(1, "Ada")).unwrap();
        let b = db.ensure_user(&identity(2, "Bob")).unwrap();

        db.insert_report(a, b, "spam").unwrap();

        let reports = db.get_reports_by(a).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].reported_id, b);
        assert_eq!(reports[0].reason, "spam");
        assert!(db.get_reports_by(b).unwrap().is_empty());
    }

    #[test]
    fn report_against_unknown_user_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let a = db.ensure_user(&identity(1, "Ada")).unwrap();
        assert!(db.insert_report(a, 4242, "spam").is_err());
    }

    #[test]
    fn concurrent_reciprocal_likes_make_one_match() {
        use std::sync::{Arc, Barrier};
        use std::thread;

        let db = Arc::new(Database::open_in_memory().unwrap());

        for round in 0..50 {
            let a = db.ensure_user(&identity(2 * round + 1, "Ada")).unwrap();
            let b = db.ensure_user(&identity(2 * round + 2, "Bob")).unwrap();
            let start = Arc::new(Barrier::new(2));

            let handles: Vec<_> = [(a, b), (b, a)]
                .into_iter()
                .map(|(from, to)| {
                    let db = db.clone();
                    let start = start.clone();
                    thread::spawn(move || {
                        start.wait();
                        db.record_like(from, to).unwrap()
                    })
                })
                .collect();

            let outcomes: Vec<LikeOutcome> =
                handles.into_iter().map(|h| h.join().unwrap()).collect();

            // Whichever like lands second completes the pair
            let created = outcomes
                .iter()
                .filter(|o| matches!(o, LikeOutcome::Matched { new_match: true }))
                .count();
            assert_eq!(created, 1);
            assert!(outcomes.iter().any(|o| matches!(o, LikeOutcome::Pending)));
            assert!(db.get_match_between(a, b).unwrap().is_some());
        }

        assert_eq!(count(&db, "SELECT COUNT(*) FROM matches"), 50);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM likes"), 100);
    }
}
