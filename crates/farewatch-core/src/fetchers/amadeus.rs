//! Amadeus flight offers adapter
//!
//! Amadeus prices one exact departure date per search call, so a date
//! window is decimated on a fixed stride with a hard cap on sample
//! points to bound call volume. Auth uses OAuth2 client credentials
//! with a cached short-lived token.

use std::str::FromStr;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::FlightOffer;

use super::Fetcher;

const AUTH_URL: &str = "https://test.api.amadeus.com/v1/security/oauth2/token";
const SEARCH_URL: &str = "https://test.api.amadeus.com/v2/shopping/flight-offers";

/// Refresh the cached token when its expiry is this close to now.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Sample every Nth day of the requested window.
const SAMPLE_STRIDE_DAYS: u64 = 3;

/// Upper bound on search calls per fetch.
const MAX_SAMPLE_DATES: usize = 10;

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Amadeus flight data fetcher with real pricing data.
pub struct AmadeusFetcher {
    client_id: String,
    client_secret: String,
    auth_url: String,
    search_url: String,
    http: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl AmadeusFetcher {
    /// Create a fetcher using the public Amadeus endpoints.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::with_endpoints(client_id, client_secret, AUTH_URL, SEARCH_URL)
    }

    /// Create a fetcher against custom endpoints (tests, regional
    /// gateways).
    pub fn with_endpoints(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        auth_url: impl Into<String>,
        search_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: auth_url.into(),
            search_url: search_url.into(),
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            token: Mutex::new(None),
        }
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if Utc::now() < token.expires_at - Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) {
                return Ok(token.access_token.clone());
            }
        }

        let response: TokenResponse = self
            .http
            .post(&self.auth_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!("Amadeus access token obtained");

        let token = CachedToken {
            access_token: response.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
        };
        *cached = Some(token);

        Ok(response.access_token)
    }

    fn sample_dates(date_start: NaiveDate, date_end: NaiveDate) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut current = date_start;

        while current <= date_end && dates.len() < MAX_SAMPLE_DATES {
            dates.push(current);
            match current.checked_add_days(Days::new(SAMPLE_STRIDE_DAYS)) {
                Some(next) => current = next,
                None => break,
            }
        }

        dates
    }

    async fn search_date(
        &self,
        token: &str,
        origin: &str,
        destination: &str,
        departure_date: NaiveDate,
    ) -> Result<Vec<FlightOffer>> {
        let date = departure_date.to_string();
        let response = self
            .http
            .get(&self.search_url)
            .bearer_auth(token)
            .query(&[
                ("originLocationCode", origin),
                ("destinationLocationCode", destination),
                ("departureDate", date.as_str()),
                ("adults", "1"),
                ("currencyCode", "CNY"),
                ("max", "10"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.error_description)
                .unwrap_or_else(|| status.to_string());
            return Err(Error::upstream("amadeus", detail));
        }

        let data: SearchResponse = response.json().await?;
        Ok(parse_offers(&data, departure_date))
    }
}

#[async_trait]
impl Fetcher for AmadeusFetcher {
    fn source_name(&self) -> &'static str {
        "amadeus"
    }

    fn is_available(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
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

        let token = self.access_token().await?;
        let mut offers = Vec::new();

        for departure_date in Self::sample_dates(date_start, date_end) {
            match self
                .search_date(&token, origin, destination, departure_date)
                .await
            {
                Ok(day_offers) => {
                    debug!(
                        date = %departure_date,
                        count = day_offers.len(),
                        "Amadeus offers for sample date"
                    );
                    offers.extend(day_offers);
                }
                Err(e) => {
                    warn!(date = %departure_date, error = %e, "Amadeus search failed");
                }
            }
        }

        info!(
            origin,
            destination,
            count = offers.len(),
            "Amadeus fetch complete"
        );
        Ok(offers)
    }
}

fn parse_offers(response: &SearchResponse, fallback_date: NaiveDate) -> Vec<FlightOffer> {
    let mut offers = Vec::new();

    for item in &response.data {
        let segments = match item.itineraries.first() {
            Some(itinerary) if !itinerary.segments.is_empty() => &itinerary.segments,
            _ => continue,
        };
        let first = &segments[0];
        let last = &segments[segments.len() - 1];

        let price = item
            .price
            .total
            .as_deref()
            .and_then(|t| Decimal::from_str(t).ok())
            .unwrap_or(Decimal::ZERO);
        let currency = item.price.currency.clone().unwrap_or_else(|| "CNY".to_string());

        let departure_date = first
            .departure
            .at
            .as_deref()
            .and_then(|at| at.get(0..10))
            .and_then(|d| d.parse::<NaiveDate>().ok())
            .unwrap_or(fallback_date);

        let carrier = first.carrier_code.clone().unwrap_or_default();
        let number = first.number.clone().unwrap_or_default();

        offers.push(FlightOffer {
            origin: first.departure.iata_code.clone().unwrap_or_default(),
            destination: last.arrival.iata_code.clone().unwrap_or_default(),
            departure_date,
            price,
            currency,
            airline: carrier.clone(),
            flight_number: format!("{carrier}{number}"),
            stops: (segments.len() - 1) as u32,
            source: "amadeus".to_string(),
        });
    }

    offers
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    1799
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<OfferItem>,
}

#[derive(Debug, Default, Deserialize)]
struct OfferItem {
    #[serde(default)]
    price: PriceInfo,
    #[serde(default)]
    itineraries: Vec<Itinerary>,
}

#[derive(Debug, Default, Deserialize)]
struct PriceInfo {
    total: Option<String>,
    currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Itinerary {
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Segment {
    #[serde(default)]
    departure: Endpoint,
    #[serde(default)]
    arrival: Endpoint,
    carrier_code: Option<String>,
    number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Endpoint {
    iata_code: Option<String>,
    at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_body() -> serde_json::Value {
        json!({"access_token": "tok-1", "expires_in": 1799})
    }

    fn search_body() -> serde_json::Value {
        json!({
            "data": [{
                "price": {"total": "812.50", "currency": "CNY"},
                "itineraries": [{
                    "segments": [
                        {
                            "departure": {"iataCode": "PEK", "at": "2026-09-01T08:30:00"},
                            "arrival": {"iataCode": "XIY", "at": "2026-09-01T10:40:00"},
                            "carrierCode": "MU",
                            "number": "2101"
                        },
                        {
                            "departure": {"iataCode": "XIY", "at": "2026-09-01T12:00:00"},
                            "arrival": {"iataCode": "SHA", "at": "2026-09-01T14:05:00"},
                            "carrierCode": "MU",
                            "number": "2102"
                        }
                    ]
                }]
            }]
        })
    }

    fn mock_fetcher(server: &MockServer) -> AmadeusFetcher {
        AmadeusFetcher::with_endpoints(
            "id",
            "secret",
            format!("{}/oauth2/token", server.uri()),
            format!("{}/flight-offers", server.uri()),
        )
    }

    #[test]
    fn unavailable_without_credentials() {
        let fetcher = AmadeusFetcher::new("", "");
        assert!(!fetcher.is_available());
        let fetcher = AmadeusFetcher::new("id", "secret");
        assert!(fetcher.is_available());
    }

    #[test]
    fn sample_dates_stride_and_cap() {
        let start = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 9, 10).unwrap();
        let dates = AmadeusFetcher::sample_dates(start, end);
        assert_eq!(
            dates,
            vec![
                start,
                NaiveDate::from_ymd_opt(2026, 9, 4).unwrap(),
                NaiveDate::from_ymd_opt(2026, 9, 7).unwrap(),
                NaiveDate::from_ymd_opt(2026, 9, 10).unwrap(),
            ]
        );

        let far_end = NaiveDate::from_ymd_opt(2027, 3, 1).unwrap();
        assert_eq!(AmadeusFetcher::sample_dates(start, far_end).len(), 10);
    }

    #[tokio::test]
    async fn fetches_and_parses_offers() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flight-offers"))
            .and(query_param("originLocationCode", "PEK"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
            .mount(&server)
            .await;

        let fetcher = mock_fetcher(&server);
        let day = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let offers = fetcher.fetch("PEK", "SHA", day, day).await.unwrap();

        assert_eq!(offers.len(), 1);
        let offer = &offers[0];
        assert_eq!(offer.price, dec!(812.50));
        assert_eq!(offer.origin, "PEK");
        assert_eq!(offer.destination, "SHA");
        assert_eq!(offer.flight_number, "MU2101");
        assert_eq!(offer.stops, 1);
        assert_eq!(offer.source, "amadeus");
    }

    #[tokio::test]
    async fn token_is_cached_across_fetches() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flight-offers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
            .mount(&server)
            .await;

        let fetcher = mock_fetcher(&server);
        let day = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        fetcher.fetch("PEK", "SHA", day, day).await.unwrap();
        fetcher.fetch("PEK", "SHA", day, day).await.unwrap();
    }

    #[tokio::test]
    async fn auth_failure_propagates_without_search_calls() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flight-offers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = mock_fetcher(&server);
        let day = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        assert!(fetcher.fetch("PEK", "SHA", day, day).await.is_err());
    }

    #[tokio::test]
    async fn failed_sample_date_is_skipped() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flight-offers"))
            .and(query_param("departureDate", "2026-09-01"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flight-offers"))
            .and(query_param("departureDate", "2026-09-04"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
            .mount(&server)
            .await;

        let fetcher = mock_fetcher(&server);
        let start = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 9, 4).unwrap();
        let offers = fetcher.fetch("PEK", "SHA", start, end).await.unwrap();
        assert_eq!(offers.len(), 1);
    }
}
