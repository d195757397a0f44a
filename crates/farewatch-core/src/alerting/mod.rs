//! Alert rule evaluation
//!
//! Pure price rules plus the engine that runs them in configured order
//! against the best offer of a route check.

mod engine;
mod rules;

pub use engine::{build_rules, AlertEngine, RouteHistory};
pub use rules::{AlertRule, DropPercentRule, HistoricalLowRule, ThresholdRule};
