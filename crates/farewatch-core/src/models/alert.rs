//! Alert data models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of alert rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Price at or below a fixed maximum
    Threshold,
    /// Price dropped by at least a configured percentage since last check
    DropPercent,
    /// Price strictly below the historical low of a lookback window
    HistoricalLow,
}

impl RuleKind {
    /// Stable string form, matching the configuration file tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::DropPercent => "drop_percent",
            Self::HistoricalLow => "historical_low",
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one rule against one offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertResult {
    /// Whether the rule fired
    pub triggered: bool,

    /// Which rule produced this result
    pub rule_kind: RuleKind,

    /// Human-readable explanation
    pub message: String,

    /// The price that was evaluated
    pub current_price: Decimal,

    /// The price point the rule compared against, when one exists
    pub threshold_value: Option<Decimal>,
}

/// Notification payload built from the best offer and the first
/// triggered rule of a route check. Consumed read-only by every
/// notification channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Configured route name
    pub route_name: String,
    /// Origin IATA code
    pub origin: String,
    /// Destination IATA code
    pub destination: String,
    /// Departure date, already formatted for display
    pub departure_date: String,
    /// Best price found
    pub price: Decimal,
    /// Currency of the price
    pub currency: String,
    /// Airline of the best offer
    pub airline: String,
    /// Rule that triggered the alert
    pub rule_kind: RuleKind,
    /// Explanation from the triggered rule
    pub rule_message: String,
    /// Data source of the best offer
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_kind_display_matches_config_tags() {
        assert_eq!(RuleKind::Threshold.to_string(), "threshold");
        assert_eq!(RuleKind::DropPercent.to_string(), "drop_percent");
        assert_eq!(RuleKind::HistoricalLow.to_string(), "historical_low");
    }

    #[test]
    fn rule_kind_serde_round_trip() {
        let json = serde_json::to_string(&RuleKind::HistoricalLow).unwrap();
        assert_eq!(json, "\"historical_low\"");
        let back: RuleKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RuleKind::HistoricalLow);
    }
}
