use std::path::Path;
use anyhow::{Context, Result};
use rusqlite::{Connection, params, OptionalExtension};
use shared::types::Order;

/// Rows inserted by `seed_demo_data`; order 108 points at a user that does not exist
const DEMO_ORDERS: &[(i64, i64, &str, i64, i32)] = &[
    (101, 1, "Apple iPhone 15", 699_900, 1),
    (102, 2, "Xiaomi 14 Pro", 499_900, 1),
    (103, 3, "Huawei Mate 60", 599_900, 2),
    (104, 4, "Sony WH-1000XM5", 259_900, 1),
    (105, 5, "Kindle Paperwhite", 99_900, 3),
    (106, 6, "Nintendo Switch", 209_900, 1),
    (107, 1, "AirPods Pro", 189_900, 2),
    (108, 99, "Logitech MX Master", 69_900, 1),
];

pub struct OrderDb {
    conn: Connection,
}

impl OrderDb {
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
            CREATE TABLE IF NOT EXISTS tb_order (
                id      INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name    TEXT NOT NULL,
                price   INTEGER NOT NULL,
                num     INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX IF NOT EXISTS idx_order_user ON tb_order(user_id);
            "#,
        )
        .context("Failed to create database schema")?;

        Ok(Self { conn })
    }

    /// Point lookup by primary key; `user` is always left empty
    pub fn find_by_id(&self, id: i64) -> Result<Option<Order>> {
        let order = self
            .conn
            .query_row(
                "SELECT id, user_id, name, price, num FROM tb_order WHERE id = ?1",
                params![id],
                Self::row_to_order,
            )
            .optional()
            .with_context(|| format!("Failed to query order {}", id))?;

        Ok(order)
    }

    pub fn insert(&self, order: &Order) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO tb_order (id, user_id, name, price, num) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![order.id, order.user_id, &order.name, order.price, order.num],
            )
            .with_context(|| format!("Failed to insert order {}", order.id))?;
        Ok(())
    }

    /// Insert the demo orders that are not present yet. Returns how many were added.
    pub fn seed_demo_data(&self) -> Result<usize> {
        let mut added = 0;
        for (id, user_id, name, price, num) in DEMO_ORDERS {
            added += self
                .conn
                .execute(
                    "INSERT OR IGNORE INTO tb_order (id, user_id, name, price, num) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![id, user_id, name, price, num],
                )
                .context("Failed to seed demo orders")?;
        }
        Ok(added)
    }

    fn row_to_order(row: &rusqlite::Row) -> Result<Order, rusqlite::Error> {
        Ok(Order {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            price: row.get(3)?,
            num: row.get(4)?,
            user: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_order(id: i64, user_id: i64) -> Order {
        Order {
            id,
            user_id,
            name: "Mechanical Keyboard".to_string(),
            price: 49_900,
            num: 2,
            user: None,
        }
    }

    #[test]
    fn test_find_existing_order() {
        let db = OrderDb::open(":memory:").unwrap();
        db.insert(&test_order(101, 1)).unwrap();

        let order = db.find_by_id(101).unwrap().unwrap();
        assert_eq!(order, test_order(101, 1));
        assert!(order.user.is_none());
    }

    #[test]
    fn test_find_missing_order() {
        let db = OrderDb::open(":memory:").unwrap();
        db.insert(&test_order(101, 1)).unwrap();

        assert!(db.find_by_id(102).unwrap().is_none());
    }

    #[test]
    fn test_seed_is_idempotent() {
        let db = OrderDb::open(":memory:").unwrap();

        assert_eq!(db.seed_demo_data().unwrap(), DEMO_ORDERS.len());
        assert_eq!(db.seed_demo_data().unwrap(), 0);

        let order = db.find_by_id(108).unwrap().unwrap();
        assert_eq!(order.user_id, 99);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = std::env::temp_dir().join(format!("order-db-{}", std::process::id()));
        let path = dir.join("nested").join("order.db");

        let db = OrderDb::open(&path).unwrap();
        db.insert(&test_order(1, 1)).unwrap();
        drop(db);

        assert!(path.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
