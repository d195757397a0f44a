//! Route monitoring scheduler
//!
//! One recurring timer per configured route. Each tick runs the full
//! check pipeline: fetch from every available source, pick the best
//! offer, evaluate the route's alert rules, notify on the first
//! triggered rule. Nothing carries over between ticks; historical
//! context comes from the optional price store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{error, info, warn};

use crate::alerting::{build_rules, AlertEngine, RouteHistory};
use crate::config::{Config, NotifiersConfig, RouteConfig, RuleConfig, SourcesConfig};
use crate::db::PriceHistoryRepository;
use crate::fetchers::{
    AmadeusFetcher, AviationStackFetcher, Fetcher, KiwiFetcher, PriceAggregator,
};
use crate::models::{AlertMessage, AlertResult, FlightOffer};
use crate::notifiers::{ConsoleNotifier, Notifier, NotifierManager, PushNotifier};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(3600);

/// Build the aggregator over every source enabled in the configuration.
pub fn build_aggregator(sources: &SourcesConfig) -> PriceAggregator {
    let mut fetchers: Vec<Arc<dyn Fetcher>> = Vec::new();

    if sources.amadeus.enabled {
        fetchers.push(Arc::new(AmadeusFetcher::new(
            sources.amadeus.client_id.clone(),
            sources.amadeus.client_secret.clone(),
        )));
    }
    if sources.kiwi.enabled {
        fetchers.push(Arc::new(KiwiFetcher::new(sources.kiwi.api_key.clone())));
    }
    if sources.aviationstack.enabled {
        fetchers.push(Arc::new(AviationStackFetcher::new(
            sources.aviationstack.api_key.clone(),
        )));
    }

    PriceAggregator::new(fetchers)
}

/// Build the notifier manager over every channel enabled in the
/// configuration.
pub fn build_notifiers(config: &NotifiersConfig) -> NotifierManager {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

    notifiers.push(Arc::new(ConsoleNotifier::new(config.console.enabled)));
    if config.push.enabled {
        notifiers.push(Arc::new(PushNotifier::new(config.push.key.clone())));
    }

    NotifierManager::new(notifiers)
}

/// Recurring per-route flight monitor.
pub struct FlightMonitor {
    routes: Vec<RouteConfig>,
    aggregator: Arc<PriceAggregator>,
    notifiers: Arc<NotifierManager>,
    history: Option<PriceHistoryRepository>,
}

impl FlightMonitor {
    /// Assemble the monitor from loaded configuration and an optional
    /// price store.
    pub fn from_config(config: &Config, history: Option<PriceHistoryRepository>) -> Self {
        Self {
            routes: config.routes.clone(),
            aggregator: Arc::new(build_aggregator(&config.sources)),
            notifiers: Arc::new(build_notifiers(&config.notifiers)),
            history,
        }
    }

    /// Spawn one recurring check task per route. The first tick fires
    /// one full interval after startup. Tasks run until aborted.
    pub fn start(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        self.routes
            .iter()
            .map(|route| {
                let period = parse_interval(&route.check_interval);
                let monitor = Arc::clone(&self);
                let route = route.clone();

                info!(
                    route = %route.name,
                    interval = %route.check_interval,
                    "Scheduled route"
                );

                tokio::spawn(async move {
                    let mut ticker = time::interval_at(Instant::now() + period, period);
                    loop {
                        ticker.tick().await;
                        monitor.check_route(&route).await;
                    }
                })
            })
            .collect()
    }

    /// Run one full check for a route. Never fails: every error inside
    /// the pipeline is logged and contained here, so one route's
    /// trouble cannot disturb another route's schedule.
    pub async fn check_route(&self, route: &RouteConfig) {
        info!(route = %route.name, "Checking route");

        let (date_start, date_end) = date_window(route);
        let offers = self
            .aggregator
            .fetch_all(&route.origin, &route.destination, date_start, date_end)
            .await;

        if offers.is_empty() {
            warn!(route = %route.name, "No flight data");
            return;
        }

        let Some(best) = self.aggregator.best_price(&offers) else {
            return;
        };
        info!(
            route = %route.name,
            price = %best.price,
            source = %best.source,
            "Best offer selected"
        );

        let history = self.resolve_history(route).await;
        let engine = AlertEngine::new(build_rules(&route.alerts, history));
        let alerts = engine.check(best);

        if let Some(first) = alerts.first() {
            let message = build_message(&route.name, best, first);
            let channels = self.notifiers.notify_all(&message).await;
            info!(route = %route.name, channels = ?channels, "Alert notified");

            if let Some(repo) = &self.history {
                if let Err(e) = repo.log_alert(&message, &channels).await {
                    warn!(route = %route.name, error = %e, "Failed to log alert");
                }
            }
        }

        if let Some(repo) = &self.history {
            if let Err(e) = repo.record_offer(best).await {
                warn!(route = %route.name, error = %e, "Failed to record price");
            }
        }
    }

    /// Resolve historical context for the route's rules from the price
    /// store. Query failures degrade to "no history".
    async fn resolve_history(&self, route: &RouteConfig) -> RouteHistory {
        let Some(repo) = &self.history else {
            return RouteHistory::default();
        };

        let mut history = RouteHistory::default();

        if route
            .alerts
            .iter()
            .any(|a| matches!(a, RuleConfig::DropPercent { .. }))
        {
            match repo.last_price(&route.origin, &route.destination).await {
                Ok(price) => history.last_price = price,
                Err(e) => error!(route = %route.name, error = %e, "last_price query failed"),
            }
        }

        if let Some(lookback_days) = route.alerts.iter().find_map(|a| match a {
            RuleConfig::HistoricalLow { lookback_days } => Some(*lookback_days),
            _ => None,
        }) {
            match repo
                .historical_low(&route.origin, &route.destination, lookback_days)
                .await
            {
                Ok(low) => history.historical_low = low,
                Err(e) => error!(route = %route.name, error = %e, "historical_low query failed"),
            }
        }

        history
    }
}

/// Parse a compact interval string ("1h", "30m"). Unrecognized or zero
/// values fall back to one hour.
fn parse_interval(interval: &str) -> Duration {
    match humantime::parse_duration(interval) {
        Ok(duration) if !duration.is_zero() => duration,
        _ => {
            warn!(interval, "Unrecognized check interval, using 1h");
            DEFAULT_INTERVAL
        }
    }
}

/// Resolve a route's departure date window; both ends default to today.
fn date_window(route: &RouteConfig) -> (NaiveDate, NaiveDate) {
    match route.date_range {
        Some(range) => (range.start, range.end),
        None => {
            let today = Local::now().date_naive();
            (today, today)
        }
    }
}

/// Build the notification payload from the best offer and the first
/// triggered rule.
fn build_message(route_name: &str, best: &FlightOffer, first: &AlertResult) -> AlertMessage {
    AlertMessage {
        route_name: route_name.to_string(),
        origin: best.origin.clone(),
        destination: best.destination.clone(),
        departure_date: best.departure_date.to_string(),
        price: best.price,
        currency: best.currency.clone(),
        airline: best.airline.clone(),
        rule_kind: first.rule_kind,
        rule_message: first.message.clone(),
        source: best.source.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DateRange;
    use crate::models::RuleKind;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_interval_accepts_compact_forms() {
        assert_eq!(parse_interval("1h"), Duration::from_secs(3600));
        assert_eq!(parse_interval("30m"), Duration::from_secs(1800));
        assert_eq!(parse_interval("90s"), Duration::from_secs(90));
    }

    #[test]
    fn parse_interval_falls_back_to_one_hour() {
        assert_eq!(parse_interval("soon"), DEFAULT_INTERVAL);
        assert_eq!(parse_interval(""), DEFAULT_INTERVAL);
        assert_eq!(parse_interval("0s"), DEFAULT_INTERVAL);
    }

    fn route(date_range: Option<DateRange>) -> RouteConfig {
        RouteConfig {
            name: "Beijing - Shanghai".to_string(),
            origin: "PEK".to_string(),
            destination: "SHA".to_string(),
            check_interval: "1h".to_string(),
            date_range,
            alerts: Vec::new(),
        }
    }

    #[test]
    fn date_window_uses_configured_range() {
        let start = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 9, 15).unwrap();
        let (from, to) = date_window(&route(Some(DateRange { start, end })));
        assert_eq!((from, to), (start, end));
    }

    #[test]
    fn date_window_defaults_to_today() {
        let today = Local::now().date_naive();
        let (from, to) = date_window(&route(None));
        assert_eq!((from, to), (today, today));
    }

    #[test]
    fn build_message_maps_offer_and_first_result() {
        let best = FlightOffer {
            origin: "PEK".to_string(),
            destination: "SHA".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            price: dec!(688),
            currency: "CNY".to_string(),
            airline: "MU".to_string(),
            flight_number: "MU5137".to_string(),
            stops: 0,
            source: "kiwi".to_string(),
        };
        let first = AlertResult {
            triggered: true,
            rule_kind: RuleKind::Threshold,
            message: "price 688 <= threshold 800".to_string(),
            current_price: dec!(688),
            threshold_value: Some(dec!(800)),
        };
        let before = best.clone();

        let message = build_message("Beijing - Shanghai", &best, &first);

        assert_eq!(message.route_name, "Beijing - Shanghai");
        assert_eq!(message.departure_date, "2026-09-01");
        assert_eq!(message.price, dec!(688));
        assert_eq!(message.rule_kind, RuleKind::Threshold);
        assert_eq!(message.rule_message, first.message);
        assert_eq!(message.source, "kiwi");
        // Inputs are borrowed, not consumed or altered.
        assert_eq!(best, before);
    }

    #[test]
    fn build_notifiers_respects_enablement() {
        let mut config = NotifiersConfig::default();
        assert_eq!(build_notifiers(&config).active_channels(), 1);

        config.console.enabled = false;
        assert_eq!(build_notifiers(&config).active_channels(), 0);

        config.push.enabled = true;
        config.push.key = "pk".to_string();
        assert_eq!(build_notifiers(&config).active_channels(), 1);
    }

    #[test]
    fn build_aggregator_skips_enabled_sources_without_credentials() {
        let mut sources = SourcesConfig::default();
        assert_eq!(build_aggregator(&sources).active_sources(), 0);

        // Enabled but missing the key: constructed, then dropped as
        // unavailable.
        sources.kiwi.enabled = true;
        assert_eq!(build_aggregator(&sources).active_sources(), 0);

        sources.kiwi.api_key = "key".to_string();
        assert_eq!(build_aggregator(&sources).active_sources(), 1);
    }
}
