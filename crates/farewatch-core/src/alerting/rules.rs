//! Alert rule variants
//!
//! Rules are pure: evaluation does no I/O and mutates nothing, so the
//! same offer and the same injected history always yield the same
//! result. Historical context (last seen price, historical low) is
//! resolved by the caller and injected at construction.

use rust_decimal::Decimal;

use crate::models::{AlertResult, FlightOffer, RuleKind};

/// A predicate plus explanation over one offer, deciding alert-worthiness.
pub trait AlertRule: Send + Sync {
    /// Which rule variant this is.
    fn kind(&self) -> RuleKind;

    /// Evaluate the rule against an offer.
    fn evaluate(&self, offer: &FlightOffer) -> AlertResult;
}

/// Triggers when the price is at or below a fixed maximum.
pub struct ThresholdRule {
    max_price: Decimal,
}

impl ThresholdRule {
    /// Create a threshold rule with the given price ceiling.
    pub fn new(max_price: Decimal) -> Self {
        Self { max_price }
    }
}

impl AlertRule for ThresholdRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Threshold
    }

    fn evaluate(&self, offer: &FlightOffer) -> AlertResult {
        let triggered = offer.price <= self.max_price;
        let relation = if triggered { "<=" } else { ">" };

        AlertResult {
            triggered,
            rule_kind: self.kind(),
            message: format!(
                "price {} {relation} threshold {}",
                offer.price, self.max_price
            ),
            current_price: offer.price,
            threshold_value: Some(self.max_price),
        }
    }
}

/// Triggers when the price dropped by at least a configured percentage
/// since the last recorded check.
pub struct DropPercentRule {
    percent: Decimal,
    last_price: Option<Decimal>,
}

impl DropPercentRule {
    /// Create a drop rule; `last_price` is the previously recorded
    /// price, if any exists.
    pub fn new(percent: Decimal, last_price: Option<Decimal>) -> Self {
        Self {
            percent,
            last_price,
        }
    }
}

impl AlertRule for DropPercentRule {
    fn kind(&self) -> RuleKind {
        RuleKind::DropPercent
    }

    fn evaluate(&self, offer: &FlightOffer) -> AlertResult {
        let Some(last_price) = self.last_price else {
            return AlertResult {
                triggered: false,
                rule_kind: self.kind(),
                message: "no historical data".to_string(),
                current_price: offer.price,
                threshold_value: None,
            };
        };

        let drop = (last_price - offer.price) / last_price * Decimal::ONE_HUNDRED;
        let triggered = drop >= self.percent;

        // The price at which the drop would exactly meet the bar.
        let threshold_value = last_price * (Decimal::ONE - self.percent / Decimal::ONE_HUNDRED);

        AlertResult {
            triggered,
            rule_kind: self.kind(),
            message: format!(
                "price dropped {:.1}% ({last_price} -> {})",
                drop, offer.price
            ),
            current_price: offer.price,
            threshold_value: Some(threshold_value),
        }
    }
}

/// Triggers when the price is strictly below the historical low of a
/// lookback window.
pub struct HistoricalLowRule {
    lookback_days: u32,
    historical_low: Option<Decimal>,
}

impl HistoricalLowRule {
    /// Create a historical-low rule; `historical_low` is the lowest
    /// price recorded within the lookback window, if any.
    pub fn new(lookback_days: u32, historical_low: Option<Decimal>) -> Self {
        Self {
            lookback_days,
            historical_low,
        }
    }

    /// Days of history this rule compares against.
    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }
}

impl AlertRule for HistoricalLowRule {
    fn kind(&self) -> RuleKind {
        RuleKind::HistoricalLow
    }

    fn evaluate(&self, offer: &FlightOffer) -> AlertResult {
        let Some(historical_low) = self.historical_low else {
            return AlertResult {
                triggered: false,
                rule_kind: self.kind(),
                message: "no historical data".to_string(),
                current_price: offer.price,
                threshold_value: None,
            };
        };

        let triggered = offer.price < historical_low;
        let message = if triggered {
            format!(
                "new low: {} undercuts the {}-day low {historical_low}",
                offer.price, self.lookback_days
            )
        } else {
            format!(
                "price {} is at or above the {}-day low {historical_low}",
                offer.price, self.lookback_days
            )
        };

        AlertResult {
            triggered,
            rule_kind: self.kind(),
            message,
            current_price: offer.price,
            threshold_value: Some(historical_low),
        }
    }
}
