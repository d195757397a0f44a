//! Kiwi.com search adapter

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::error::Result;
use crate::models::FlightOffer;

use super::Fetcher;

const BASE_URL: &str = "https://api.tequila.kiwi.com/v2/search";

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Kiwi.com flight data fetcher.
///
/// One search call covers the whole date window, so no date sampling is
/// needed here.
pub struct KiwiFetcher {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl KiwiFetcher {
    /// Create a fetcher using the public Kiwi endpoint.
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
impl Fetcher for KiwiFetcher {
    fn source_name(&self) -> &'static str {
        "kiwi"
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

        let date_from = date_start.format("%d/%m/%Y").to_string();
        let date_to = date_end.format("%d/%m/%Y").to_string();

        let response: SearchResponse = self
            .http
            .get(&self.base_url)
            .header("apikey", &self.api_key)
            .query(&[
                ("fly_from", origin),
                ("fly_to", destination),
                ("date_from", date_from.as_str()),
                ("date_to", date_to.as_str()),
                ("curr", "CNY"),
                ("limit", "50"),
                ("one_for_city", "0"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let offers = parse_offers(&response, date_start);
        info!(origin, destination, count = offers.len(), "Kiwi fetch complete");
        Ok(offers)
    }
}

fn parse_offers(response: &SearchResponse, fallback_date: NaiveDate) -> Vec<FlightOffer> {
    response
        .data
        .iter()
        .map(|item| {
            let departure_date = item
                .local_departure
                .as_deref()
                .and_then(|d| d.get(0..10))
                .and_then(|d| d.parse::<NaiveDate>().ok())
                .unwrap_or(fallback_date);

            FlightOffer {
                origin: item.fly_from.clone().unwrap_or_default(),
                destination: item.fly_to.clone().unwrap_or_default(),
                departure_date,
                price: item.price.unwrap_or(Decimal::ZERO),
                currency: "CNY".to_string(),
                airline: item.airlines.join(","),
                flight_number: item
                    .route
                    .first()
                    .and_then(|leg| leg.flight_no.as_ref())
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                stops: item.route.len().saturating_sub(1) as u32,
                source: "kiwi".to_string(),
            }
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchItem>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchItem {
    #[serde(rename = "flyFrom")]
    fly_from: Option<String>,
    #[serde(rename = "flyTo")]
    fly_to: Option<String>,
    local_departure: Option<String>,
    price: Option<Decimal>,
    #[serde(default)]
    airlines: Vec<String>,
    #[serde(default)]
    route: Vec<RouteLeg>,
}

#[derive(Debug, Default, Deserialize)]
struct RouteLeg {
    flight_no: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{header, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn search_body() -> serde_json::Value {
        json!({
            "data": [
                {
                    "flyFrom": "PEK",
                    "flyTo": "SHA",
                    "local_departure": "2026-09-03T09:15:00.000Z",
                    "price": 688,
                    "airlines": ["MU", "FM"],
                    "route": [
                        {"flight_no": 5137},
                        {"flight_no": 9321}
                    ]
                },
                {
                    "flyFrom": "PEK",
                    "flyTo": "SHA",
                    "local_departure": "2026-09-05T18:40:00.000Z",
                    "price": 912.4,
                    "airlines": ["CA"],
                    "route": [
                        {"flight_no": 1501}
                    ]
                }
            ]
        })
    }

    #[test]
    fn unavailable_without_api_key() {
        assert!(!KiwiFetcher::new("").is_available());
        assert!(KiwiFetcher::new("key").is_available());
    }

    #[tokio::test]
    async fn unavailable_fetcher_returns_empty_without_calls() {
        let fetcher = KiwiFetcher::with_base_url("", "http://127.0.0.1:9/search");
        let day = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let offers = fetcher.fetch("PEK", "SHA", day, day).await.unwrap();
        assert!(offers.is_empty());
    }

    #[tokio::test]
    async fn fetches_and_parses_offers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("apikey", "key"))
            .and(query_param("fly_from", "PEK"))
            .and(query_param("date_from", "01/09/2026"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
            .mount(&server)
            .await;

        let fetcher = KiwiFetcher::with_base_url("key", server.uri());
        let start = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 9, 7).unwrap();
        let offers = fetcher.fetch("PEK", "SHA", start, end).await.unwrap();

        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].price, dec!(688));
        assert_eq!(offers[0].airline, "MU,FM");
        assert_eq!(offers[0].flight_number, "5137");
        assert_eq!(offers[0].stops, 1);
        assert_eq!(
            offers[0].departure_date,
            NaiveDate::from_ymd_opt(2026, 9, 3).unwrap()
        );
        assert_eq!(offers[1].stops, 0);
        assert_eq!(offers[1].source, "kiwi");
    }

    #[tokio::test]
    async fn http_error_surfaces_as_err() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let fetcher = KiwiFetcher::with_base_url("key", server.uri());
        let day = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        assert!(fetcher.fetch("PEK", "SHA", day, day).await.is_err());
    }
}
