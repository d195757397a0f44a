//! Push-webhook notification channel
//!
//! Posts a title plus markdown body to a ServerChan-compatible webhook
//! keyed by a push key. Success is any non-error HTTP status.

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::models::AlertMessage;

use super::Notifier;

const BASE_URL: &str = "https://sctapi.ftqq.com";

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Push notification channel keyed by a webhook push key.
pub struct PushNotifier {
    push_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl PushNotifier {
    /// Create a push notifier using the public webhook endpoint.
    pub fn new(push_key: impl Into<String>) -> Self {
        Self::with_base_url(push_key, BASE_URL)
    }

    /// Create a push notifier against a custom endpoint (tests).
    pub fn with_base_url(push_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            push_key: push_key.into(),
            base_url: base_url.into(),
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    fn body(message: &AlertMessage) -> String {
        format!(
            "## Flight\n\
             - **Route**: {} -> {}\n\
             - **Date**: {}\n\
             - **Price**: {} {}\n\
             - **Airline**: {}\n\
             - **Source**: {}\n\
             \n\
             ## Trigger\n\
             - **Rule**: {}\n\
             - **Detail**: {}\n",
            message.origin,
            message.destination,
            message.departure_date,
            message.price,
            message.currency,
            message.airline,
            message.source,
            message.rule_kind,
            message.rule_message,
        )
    }
}

#[async_trait]
impl Notifier for PushNotifier {
    fn name(&self) -> &'static str {
        "push"
    }

    fn is_enabled(&self) -> bool {
        !self.push_key.is_empty()
    }

    async fn send(&self, message: &AlertMessage) -> bool {
        if !self.is_enabled() {
            warn!("Push notifier is disabled (no push key)");
            return false;
        }

        let title = format!("Fare alert - {}", message.route_name);
        let body = Self::body(message);
        let url = format!("{}/{}.send", self.base_url, self.push_key);
        let form = [("title", title.as_str()), ("desp", body.as_str())];

        match self.http.post(&url).form(&form).send().await {
            Ok(response) if response.status().is_success() => {
                info!(title = %title, "Push notification sent");
                true
            }
            Ok(response) => {
                error!(status = %response.status(), "Push notification rejected");
                false
            }
            Err(e) => {
                error!(error = %e, "Push notification failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::models::RuleKind;

    fn message() -> AlertMessage {
        AlertMessage {
            route_name: "Beijing - Shanghai".to_string(),
            origin: "PEK".to_string(),
            destination: "SHA".to_string(),
            departure_date: "2026-09-01".to_string(),
            price: dec!(688),
            currency: "CNY".to_string(),
            airline: "MU".to_string(),
            rule_kind: RuleKind::Threshold,
            rule_message: "price 688 <= threshold 800".to_string(),
            source: "kiwi".to_string(),
        }
    }

    #[test]
    fn disabled_without_push_key() {
        assert!(!PushNotifier::new("").is_enabled());
        assert!(PushNotifier::new("pk").is_enabled());
    }

    #[tokio::test]
    async fn sends_title_and_markdown_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/pk-123.send"))
            .and(body_string_contains("Beijing+-+Shanghai"))
            .and(body_string_contains("688"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let notifier = PushNotifier::with_base_url("pk-123", server.uri());
        assert!(notifier.send(&message()).await);
    }

    #[tokio::test]
    async fn http_error_reports_false() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = PushNotifier::with_base_url("pk-123", server.uri());
        assert!(!notifier.send(&message()).await);
    }

    #[tokio::test]
    async fn disabled_notifier_reports_false_without_calls() {
        let notifier = PushNotifier::with_base_url("", "http://127.0.0.1:9");
        assert!(!notifier.send(&message()).await);
    }
}
