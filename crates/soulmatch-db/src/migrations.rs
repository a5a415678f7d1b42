use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY,
                tg_id       INTEGER NOT NULL UNIQUE,
                username    TEXT,
                name        TEXT NOT NULL DEFAULT '',
                is_banned   INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE profiles (
                id              INTEGER PRIMARY KEY,
                user_id         INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                age             INTEGER NOT NULL CHECK (age >= 18),
                gender          TEXT NOT NULL,
                bio             TEXT NOT NULL,
                photo_file_id   TEXT,
                last_active     TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE likes (
                id          INTEGER PRIMARY KEY,
                from_user   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                to_user     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(from_user, to_user)
            );

            CREATE INDEX idx_likes_to_user ON likes(to_user);

            -- Pairs are stored normalized (a < b) so one unordered pair has one row
            CREATE TABLE matches (
                id          INTEGER PRIMARY KEY,
                a           INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                b           INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                active      INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                CHECK (a < b),
                UNIQUE(a, b)
            );

            CREATE INDEX idx_matches_b ON matches(b);

            CREATE TABLE reports (
                id          INTEGER PRIMARY KEY,
                reporter_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                reported_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                reason      TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn underage_profile_rejected_by_schema() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute("INSERT INTO users (tg_id) VALUES (1)", []).unwrap();

        let res = conn.execute(
            "INSERT INTO profiles (user_id, age, gender, bio) VALUES (1, 17, 'x', 'y')",
            [],
        );
        assert!(res.is_err());
    }
}
