//! Price record and alert log queries

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use crate::error::Result;
use crate::models::{AlertMessage, FlightOffer};

/// Repository for recorded prices and alert logs.
///
/// Zero-price offers (sources without pricing data) are recorded but
/// never considered when resolving last price or historical low.
#[derive(Clone)]
pub struct PriceHistoryRepository {
    pool: PgPool,
}

impl PriceHistoryRepository {
    /// Create a repository over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record one fetched offer.
    pub async fn record_offer(&self, offer: &FlightOffer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO price_records (
                origin, destination, departure_date, source,
                airline, price, currency, flight_number, stops
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&offer.origin)
        .bind(&offer.destination)
        .bind(offer.departure_date)
        .bind(&offer.source)
        .bind(&offer.airline)
        .bind(offer.price)
        .bind(&offer.currency)
        .bind(&offer.flight_number)
        .bind(offer.stops as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Price recorded at the most recent check of this route, if any.
    pub async fn last_price(&self, origin: &str, destination: &str) -> Result<Option<Decimal>> {
        let row = sqlx::query(
            r#"
            SELECT price FROM price_records
            WHERE origin = $1 AND destination = $2 AND price > 0
            ORDER BY fetched_at DESC
            LIMIT 1
            "#,
        )
        .bind(origin)
        .bind(destination)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => Some(row.try_get("price")?),
            None => None,
        })
    }

    /// Lowest price recorded for this route within the lookback window,
    /// if any.
    pub async fn historical_low(
        &self,
        origin: &str,
        destination: &str,
        lookback_days: u32,
    ) -> Result<Option<Decimal>> {
        let cutoff = Utc::now() - Duration::days(i64::from(lookback_days));

        let row = sqlx::query(
            r#"
            SELECT MIN(price) AS low FROM price_records
            WHERE origin = $1 AND destination = $2 AND price > 0
              AND fetched_at >= $3
            "#,
        )
        .bind(origin)
        .bind(destination)
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("low")?)
    }

    /// Log one triggered alert and the channels that received it.
    pub async fn log_alert(&self, message: &AlertMessage, notified_via: &[&str]) -> Result<()> {
        let channels: Vec<String> = notified_via.iter().map(ToString::to_string).collect();

        sqlx::query(
            r#"
            INSERT INTO alert_logs (
                route_name, origin, destination, departure_date,
                trigger_type, trigger_condition, price, notified_via
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&message.route_name)
        .bind(&message.origin)
        .bind(&message.destination)
        .bind(&message.departure_date)
        .bind(message.rule_kind.as_str())
        .bind(&message.rule_message)
        .bind(message.price)
        .bind(&channels)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
