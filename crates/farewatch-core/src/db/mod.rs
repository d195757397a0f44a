//! Price-history store
//!
//! Optional PostgreSQL store feeding the drop-percent and
//! historical-low rules. The check pipeline never depends on it: with
//! no database configured, rules simply receive no history.

mod history;

pub use history::PriceHistoryRepository;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::error::Result;

/// Database connection bundle
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to the configured PostgreSQL instance.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Create the tables this store needs if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_records (
                id BIGSERIAL PRIMARY KEY,
                origin VARCHAR(3) NOT NULL,
                destination VARCHAR(3) NOT NULL,
                departure_date DATE NOT NULL,
                source VARCHAR(20) NOT NULL,
                airline VARCHAR(50),
                price NUMERIC(10, 2) NOT NULL,
                currency VARCHAR(3) NOT NULL DEFAULT 'CNY',
                flight_number VARCHAR(20),
                stops INTEGER NOT NULL DEFAULT 0,
                fetched_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_price_records_route_time
            ON price_records (origin, destination, fetched_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alert_logs (
                id BIGSERIAL PRIMARY KEY,
                route_name VARCHAR(100),
                origin VARCHAR(3),
                destination VARCHAR(3),
                departure_date TEXT,
                trigger_type VARCHAR(20),
                trigger_condition TEXT,
                price NUMERIC(10, 2),
                notified_via TEXT[],
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Repository over this connection pool.
    pub fn history(&self) -> PriceHistoryRepository {
        PriceHistoryRepository::new(self.pool.clone())
    }
}
