//! Alert engine

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::RuleConfig;
use crate::models::{AlertResult, FlightOffer};

use super::rules::{AlertRule, DropPercentRule, HistoricalLowRule, ThresholdRule};

/// Historical price context for one route, resolved by the caller
/// (price store or nothing) before rules are built.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteHistory {
    /// Price recorded at the previous check, if any
    pub last_price: Option<Decimal>,
    /// Lowest price recorded within the lookback window, if any
    pub historical_low: Option<Decimal>,
}

/// Build fresh rule instances from a route's alert configuration,
/// injecting the resolved history. Order follows the configuration.
pub fn build_rules(configs: &[RuleConfig], history: RouteHistory) -> Vec<Box<dyn AlertRule>> {
    configs
        .iter()
        .map(|config| -> Box<dyn AlertRule> {
            match config {
                RuleConfig::Threshold { max_price } => Box::new(ThresholdRule::new(*max_price)),
                RuleConfig::DropPercent { percent } => {
                    Box::new(DropPercentRule::new(*percent, history.last_price))
                }
                RuleConfig::HistoricalLow { lookback_days } => Box::new(HistoricalLowRule::new(
                    *lookback_days,
                    history.historical_low,
                )),
            }
        })
        .collect()
}

/// Evaluates an ordered rule list against flight offers.
pub struct AlertEngine {
    rules: Vec<Box<dyn AlertRule>>,
}

impl AlertEngine {
    /// Create an engine over the given rules; evaluation preserves
    /// their order.
    pub fn new(rules: Vec<Box<dyn AlertRule>>) -> Self {
        Self { rules }
    }

    /// Evaluate every rule against the offer, in order, and return the
    /// triggered subset. The first element is the one a notification
    /// reports even when several rules fire.
    pub fn check(&self, offer: &FlightOffer) -> Vec<AlertResult> {
        let mut triggered = Vec::new();

        for rule in &self.rules {
            let result = rule.evaluate(offer);
            debug!(
                rule = %result.rule_kind,
                triggered = result.triggered,
                price = %result.current_price,
                "Evaluated rule"
            );
            if result.triggered {
                triggered.push(result);
            }
        }

        triggered
    }
}
