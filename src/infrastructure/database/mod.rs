//! SQLite-backed store for the currency and admin collections.
//!
//! Rates are stored as TEXT and parsed back into `Decimal`, so a rate
//! survives any number of storage round-trips digit for digit.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use rust_decimal::Decimal;

use crate::application::errors::StorageError;
use crate::domain::entities::Currency;
use crate::domain::traits::Store;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(path: impl AsRef<Path>) -> SqliteResult<Self> {
        let conn = Connection::open(path)?;
        init_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Private in-memory database, used by tests.
    pub fn in_memory() -> SqliteResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("connection lock poisoned".to_string()))
    }
}

fn init_tables(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS currencies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            rate TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS admins (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            chat_id TEXT UNIQUE NOT NULL
        )",
        [],
    )?;

    Ok(())
}

fn db_err(e: rusqlite::Error) -> StorageError {
    StorageError::Database(e.to_string())
}

fn parse_rate(name: &str, raw: &str) -> Result<Decimal, StorageError> {
    raw.parse()
        .map_err(|_| StorageError::Corrupt(format!("rate of {} is not a decimal: {}", name, raw)))
}

#[async_trait]
impl Store for Database {
    async fn insert_currency(&self, name: &str, rate: Decimal) -> Result<bool, StorageError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "INSERT INTO currencies (name, rate) VALUES (?1, ?2)
                 ON CONFLICT(name) DO NOTHING",
                params![name, rate.to_string()],
            )
            .map_err(db_err)?;
        Ok(changed > 0)
    }

    async fn delete_currency(&self, name: &str) -> Result<bool, StorageError> {
        let conn = self.conn()?;
        let changed = conn
            .execute("DELETE FROM currencies WHERE name = ?1", [name])
            .map_err(db_err)?;
        Ok(changed > 0)
    }

    async fn update_rate(&self, name: &str, rate: Decimal) -> Result<bool, StorageError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE currencies SET rate = ?1 WHERE name = ?2",
                params![rate.to_string(), name],
            )
            .map_err(db_err)?;
        Ok(changed > 0)
    }

    async fn get_rate(&self, name: &str) -> Result<Option<Decimal>, StorageError> {
        let conn = self.conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT rate FROM currencies WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;

        raw.map(|raw| parse_rate(name, &raw)).transpose()
    }

    async fn list_currencies(&self) -> Result<Vec<Currency>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT name, rate FROM currencies ORDER BY id")
            .map_err(db_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(db_err)?;

        let mut currencies = Vec::new();
        for row in rows {
            let (name, raw) = row.map_err(db_err)?;
            let rate = parse_rate(&name, &raw)?;
            currencies.push(Currency::new(name, rate));
        }
        Ok(currencies)
    }

    async fn is_admin(&self, chat_id: &str) -> Result<bool, StorageError> {
        let conn = self.conn()?;
        let found: Option<i64> = conn
            .query_row("SELECT 1 FROM admins WHERE chat_id = ?1", [chat_id], |row| {
                row.get(0)
            })
            .optional()
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    async fn add_admin(&self, chat_id: &str) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO admins (chat_id) VALUES (?1)
             ON CONFLICT(chat_id) DO NOTHING",
            [chat_id],
        )
        .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn db() -> Database {
        Database::in_memory().unwrap()
    }

    #[tokio::test]
    async fn conditional_insert_reports_whether_it_wrote() {
        let db = db();
        assert!(db.insert_currency("USD", dec!(90.50)).await.unwrap());
        assert!(!db.insert_currency("USD", dec!(91)).await.unwrap());

        // The losing insert did not clobber the rate.
        assert_eq!(db.get_rate("USD").await.unwrap(), Some(dec!(90.50)));
    }

    #[tokio::test]
    async fn rates_round_trip_digit_for_digit() {
        let db = db();
        db.insert_currency("USD", dec!(90.50)).await.unwrap();
        db.insert_currency("JPY", dec!(0.6123)).await.unwrap();

        assert_eq!(db.get_rate("USD").await.unwrap(), Some(dec!(90.50)));
        assert_eq!(db.get_rate("JPY").await.unwrap(), Some(dec!(0.6123)));
        assert_eq!(db.get_rate("XXX").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_reports_presence_and_is_repeatable() {
        let db = db();
        db.insert_currency("USD", dec!(90.50)).await.unwrap();

        assert!(db.delete_currency("USD").await.unwrap());
        assert!(!db.delete_currency("USD").await.unwrap());
        assert_eq!(db.get_rate("USD").await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_touches_only_existing_rows() {
        let db = db();
        assert!(!db.update_rate("USD", dec!(91)).await.unwrap());

        db.insert_currency("USD", dec!(90.50)).await.unwrap();
        assert!(db.update_rate("USD", dec!(91)).await.unwrap());
        assert_eq!(db.get_rate("USD").await.unwrap(), Some(dec!(91)));
    }

    #[tokio::test]
    async fn listing_preserves_insertion_order() {
        let db = db();
        db.insert_currency("USD", dec!(90.50)).await.unwrap();
        db.insert_currency("EUR", dec!(98.20)).await.unwrap();
        db.insert_currency("JPY", dec!(0.61)).await.unwrap();

        let names: Vec<String> = db
            .list_currencies()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["USD", "EUR", "JPY"]);
    }

    #[tokio::test]
    async fn admins_are_a_separate_collection() {
        let db = db();
        db.insert_currency("42", dec!(1)).await.unwrap();

        assert!(!db.is_admin("42").await.unwrap());
        db.add_admin("42").await.unwrap();
        db.add_admin("42").await.unwrap();
        assert!(db.is_admin("42").await.unwrap());
    }
}
