//! Flight data source adapters
//!
//! One adapter per upstream pricing API, all behind the [`Fetcher`]
//! capability, plus the aggregator that fans a query out across every
//! available adapter.

mod aggregator;
mod amadeus;
mod aviationstack;
mod kiwi;

pub use aggregator::PriceAggregator;
pub use amadeus::AmadeusFetcher;
pub use aviationstack::AviationStackFetcher;
pub use kiwi::KiwiFetcher;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::FlightOffer;

/// A flight data source.
///
/// Implementations translate a route + date-range query into zero or
/// more offers by calling one upstream API. Partial failures inside an
/// adapter (one sample date out of many, one malformed entry) degrade
/// to fewer offers; a top-level `Err` is isolated by the aggregator and
/// never aborts sibling fetches.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Stable identifier for this source, recorded on every offer.
    fn source_name(&self) -> &'static str;

    /// True iff the credentials this source needs are present. Checked
    /// before any network call, and by the aggregator when selecting
    /// adapters.
    fn is_available(&self) -> bool;

    /// Fetch offers for the route within the inclusive date window.
    async fn fetch(
        &self,
        origin: &str,
        destination: &str,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<Vec<FlightOffer>>;
}
