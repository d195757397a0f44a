//! AviationStack schedule adapter
//!
//! AviationStack is a flight tracking API, not a pricing API. Offers
//! from this source carry a price of exactly zero so downstream code
//! can tell "no pricing from this source" apart from a missing field.

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::FlightOffer;

use super::Fetcher;

const BASE_URL: &str = "http://api.aviationstack.com/v1/flights";

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// AviationStack flight schedule fetcher.
pub struct AviationStackFetcher {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl AviationStackFetcher {
    /// Create a fetcher using the public AviationStack endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    /// Create a fetcher against a custom endpoint (tests).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl Fetcher for AviationStackFetcher {
    fn source_name(&self) -> &'static str {
        "aviationstack"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn fetch(
        &self,
        origin: &str,
        destination: &str,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<Vec<FlightOffer>> {
        if !self.is_available() {
            return Ok(Vec::new());
        }

        let response: FlightsResponse = self
            .http
            .get(&self.base_url)
            .query(&[
                ("access_key", self.api_key.as_str()),
                ("dep_iata", origin),
                ("arr_iata", destination),
                ("flight_status", "scheduled"),
                ("limit", "100"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // The free tier reports errors in-band with a 200 status.
        if let Some(error) = &response.error {
            return Err(Error::upstream(
                "aviationstack",
                error
                    .message
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let offers = parse_offers(&response, date_start, date_end);
        info!(
            origin,
            destination,
            count = offers.len(),
            "AviationStack fetch complete"
        );
        Ok(offers)
    }
}

fn parse_offers(
    response: &FlightsResponse,
    date_start: NaiveDate,
    date_end: NaiveDate,
) -> Vec<FlightOffer> {
    let mut offers = Vec::new();

    for item in &response.data {
        let Some(departure_date) = item
            .departure
            .scheduled
            .as_deref()
            .and_then(|s| s.get(0..10))
            .and_then(|s| s.parse::<NaiveDate>().ok())
        else {
            continue;
        };

        if departure_date < date_start || departure_date > date_end {
            continue;
        }

        let airline = item
            .airline
            .name
            .clone()
            .or_else(|| item.airline.iata.clone())
            .unwrap_or_default();
        let flight_number = item
            .flight
            .number
            .clone()
            .or_else(|| item.flight.iata.clone())
            .unwrap_or_default();

        offers.push(FlightOffer {
            origin: item.departure.iata.clone().unwrap_or_default(),
            destination: item.arrival.iata.clone().unwrap_or_default(),
            departure_date,
            // No pricing from this source; zero is the sentinel.
            price: Decimal::ZERO,
            currency: "CNY".to_string(),
            airline,
            flight_number,
            // This endpoint lists direct flights only.
            stops: 0,
            source: "aviationstack".to_string(),
        });
    }

    offers
}

#[derive(Debug, Default, Deserialize)]
struct FlightsResponse {
    #[serde(default)]
    data: Vec<FlightItem>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FlightItem {
    #[serde(default)]
    departure: AirportInfo,
    #[serde(default)]
    arrival: AirportInfo,
    #[serde(default)]
    airline: AirlineInfo,
    #[serde(default)]
    flight: FlightInfo,
}

#[derive(Debug, Default, Deserialize)]
struct AirportInfo {
    iata: Option<String>,
    scheduled: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AirlineInfo {
    name: Option<String>,
    iata: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FlightInfo {
    number: Option<String>,
    iata: Option<String>,
}
