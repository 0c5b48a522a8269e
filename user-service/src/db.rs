use std::path::Path;
use anyhow::{Context, Result};
use rusqlite::{Connection, params, OptionalExtension};
use shared::types::User;

/// Rows inserted by `seed_demo_data`
const DEMO_USERS: &[(i64, &str, &str)] = &[
    (1, "alice", "Hangzhou"),
    (2, "bob", "Shanghai"),
    (3, "carol", "Beijing"),
    (4, "dave", "Shenzhen"),
    (5, "erin", "Chengdu"),
    (6, "frank", "Wuhan"),
];

pub struct UserDb {
    conn: Connection,
}

impl UserDb {
    /// Open or create the SQLite database with WAL mode enabled
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to enable WAL mode")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tb_user (
                id       INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                address  TEXT NOT NULL DEFAULT ''
            );
            "#,
        )
        .context("Failed to create database schema")?;

        Ok(Self { conn })
    }

    /// Point lookup by primary key
    pub fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, address FROM tb_user WHERE id = ?1",
                params![id],
                Self::row_to_user,
            )
            .optional()
            .with_context(|| format!("Failed to query user {}", id))?;

        Ok(user)
    }

    pub fn insert(&self, user: &User) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO tb_user (id, username, address) VALUES (?1, ?2, ?3)",
                params![user.id, &user.username, &user.address],
            )
            .with_context(|| format!("Failed to insert user {}", user.id))?;
        Ok(())
    }

    /// Insert the demo users that are not present yet. Returns how many were added.
    pub fn seed_demo_data(&self) -> Result<usize> {
        let mut added = 0;
        for (id, username, address) in DEMO_USERS {
            added += self
                .conn
                .execute(
                    "INSERT OR IGNORE INTO tb_user (id, username, address) VALUES (?1, ?2, ?3)",
                    params![id, username, address],
                )
                .context("Failed to seed demo users")?;
        }
        Ok(added)
    }

    fn row_to_user(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            address: row.get(2)?,
        })
    }
}
