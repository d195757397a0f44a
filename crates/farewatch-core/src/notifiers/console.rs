//! Console notification channel

use async_trait::async_trait;
use console::style;

use crate::models::AlertMessage;

use super::Notifier;

/// Prints alerts as a styled block on standard output.
pub struct ConsoleNotifier {
    enabled: bool,
}

impl ConsoleNotifier {
    /// Create a console notifier.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &'static str {
        "console"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, message: &AlertMessage) -> bool {
        let divider = style("=".repeat(50)).green();

        println!();
        println!("{divider}");
        println!(
            "{}",
            style(format!("Fare alert - {}", message.route_name)).green().bold()
        );
        println!("{divider}");
        println!("Route:    {} -> {}", message.origin, message.destination);
        println!("Date:     {}", message.departure_date);
        println!(
            "Price:    {}",
            style(format!("{} {}", message.price, message.currency)).yellow()
        );
        println!("Airline:  {}", message.airline);
        println!("Source:   {}", message.source);
        println!(
            "Trigger:  {} - {}",
            message.rule_kind, message.rule_message
        );
        println!("{divider}");

        true
    }
}
