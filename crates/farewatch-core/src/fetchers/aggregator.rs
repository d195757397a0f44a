//! Fan-out across flight data sources

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{debug, error, info};

use crate::models::FlightOffer;

use super::Fetcher;

/// Aggregates results from multiple flight data sources.
pub struct PriceAggregator {
    fetchers: Vec<Arc<dyn Fetcher>>,
}

impl PriceAggregator {
    /// Create an aggregator over the available subset of `fetchers`.
    /// Sources without credentials are dropped here and never called.
    pub fn new(fetchers: Vec<Arc<dyn Fetcher>>) -> Self {
        let (available, skipped): (Vec<_>, Vec<_>) =
            fetchers.into_iter().partition(|f| f.is_available());

        for fetcher in &skipped {
            debug!(source = fetcher.source_name(), "Source not configured, skipping");
        }
        info!(active = available.len(), "Aggregator initialized");

        Self {
            fetchers: available,
        }
    }

    /// Number of sources that will be queried.
    pub fn active_sources(&self) -> usize {
        self.fetchers.len()
    }

    /// Fetch from all sources concurrently and combine results.
    ///
    /// Every fetch is awaited regardless of how its siblings fare; a
    /// failing source contributes zero offers and is logged. The
    /// combined offers carry no ordering guarantee.
    pub async fn fetch_all(
        &self,
        origin: &str,
        destination: &str,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Vec<FlightOffer> {
        let tasks = self.fetchers.iter().map(|fetcher| {
            let fetcher = Arc::clone(fetcher);
            async move {
                let result = fetcher
                    .fetch(origin, destination, date_start, date_end)
                    .await;
                (fetcher.source_name(), result)
            }
        });

        let mut all_offers = Vec::new();
        for (source, result) in join_all(tasks).await {
            match result {
                Ok(offers) => {
                    info!(source, count = offers.len(), "Source returned offers");
                    all_offers.extend(offers);
                }
                Err(e) => {
                    error!(source, error = %e, "Source failed");
                }
            }
        }

        all_offers
    }

    /// Return the offer with the lowest price, or `None` when there are
    /// no offers. Ties resolve deterministically: fewer stops first,
    /// then the lexicographically smaller source name.
    pub fn best_price<'a>(&self, offers: &'a [FlightOffer]) -> Option<&'a FlightOffer> {
        offers.iter().min_by(|a, b| {
            (a.price, a.stops, &a.source).cmp(&(b.price, b.stops, &b.source))
        })
    }
}
