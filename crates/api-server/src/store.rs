//! SQLite watchlist row store.
//!
//! The pipeline itself only reads (company-name lookup); the add/list/remove
//! surface exists so the watchlist the pipeline is keyed on can be managed
//! over the same API.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::SqlitePool;

use watch_core::{WatchError, WatchlistStore};

#[derive(Clone)]
pub struct WatchlistDb {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WatchlistRow {
    pub stock_ticker: String,
    pub company_name: String,
    pub date_added: String,
}

impl WatchlistDb {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Idempotent schema creation, run once at startup.
    pub async fn init_schema(&self) -> Result<(), WatchError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                last_login TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| WatchError::Database(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS watchlist (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                stock_ticker TEXT NOT NULL,
                company_name TEXT NOT NULL,
                date_added TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id),
                UNIQUE(user_id, stock_ticker)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| WatchError::Database(e.to_string()))?;

        Ok(())
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<WatchlistRow>, WatchError> {
        sqlx::query_as::<_, WatchlistRow>(
            "SELECT stock_ticker, company_name, date_added FROM watchlist \
             WHERE user_id = ? ORDER BY date_added DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WatchError::Database(e.to_string()))
    }

    /// Duplicate (user, ticker) pairs are silently ignored.
    pub async fn add(
        &self,
        user_id: i64,
        ticker: &str,
        company_name: &str,
    ) -> Result<(), WatchError> {
        sqlx::query(
            "INSERT OR IGNORE INTO watchlist (user_id, stock_ticker, company_name) \
             VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(ticker)
        .bind(company_name)
        .execute(&self.pool)
        .await
        .map_err(|e| WatchError::Database(e.to_string()))?;

        Ok(())
    }

    pub async fn remove(&self, user_id: i64, ticker: &str) -> Result<(), WatchError> {
        sqlx::query("DELETE FROM watchlist WHERE user_id = ? AND stock_ticker = ?")
            .bind(user_id)
            .bind(ticker)
            .execute(&self.pool)
            .await
            .map_err(|e| WatchError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl WatchlistStore for WatchlistDb {
    async fn company_name(
        &self,
        user_id: i64,
        ticker: &str,
    ) -> Result<Option<String>, WatchError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT company_name FROM watchlist WHERE user_id = ? AND stock_ticker = ?",
        )
        .bind(user_id)
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WatchError::Database(e.to_string()))?;

        Ok(row.map(|(name,)| name))
    }
}
