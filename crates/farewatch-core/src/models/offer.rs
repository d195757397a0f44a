//! Flight offer model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One price quote for a route and departure date from one data source.
///
/// Offers are plain values: two offers with identical fields are
/// interchangeable, and an offer is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightOffer {
    /// Origin airport IATA code (e.g. "PEK")
    pub origin: String,

    /// Destination airport IATA code (e.g. "SHA")
    pub destination: String,

    /// Local departure date
    pub departure_date: NaiveDate,

    /// Quoted total price. Sources without pricing data report exactly
    /// zero so "no price available" stays distinguishable from a missing
    /// field.
    pub price: Decimal,

    /// ISO 4217 currency code
    pub currency: String,

    /// Marketing airline (code or name, source-dependent)
    pub airline: String,

    /// Flight number, carrier prefix included where the source supplies it
    pub flight_number: String,

    /// Number of stops (0 = direct)
    pub stops: u32,

    /// Name of the fetcher that produced this offer
    pub source: String,
}
