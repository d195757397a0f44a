//! Fan-out across notification channels

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::models::AlertMessage;

use super::Notifier;

/// Manages multiple notification channels.
pub struct NotifierManager {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotifierManager {
    /// Create a manager over the enabled subset of `notifiers`.
    /// Disabled channels are dropped here and never called.
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        let enabled: Vec<_> = notifiers.into_iter().filter(|n| n.is_enabled()).collect();
        info!(channels = enabled.len(), "Notifier manager initialized");

        Self { notifiers: enabled }
    }

    /// Number of channels that will be notified.
    pub fn active_channels(&self) -> usize {
        self.notifiers.len()
    }

    /// Send the message to every enabled channel concurrently and
    /// return the names of the channels that reported success. A
    /// failing channel is logged and excluded, never aborting the rest.
    pub async fn notify_all(&self, message: &AlertMessage) -> Vec<&'static str> {
        let tasks = self.notifiers.iter().map(|notifier| {
            let notifier = Arc::clone(notifier);
            async move { (notifier.name(), notifier.send(message).await) }
        });

        let mut succeeded = Vec::new();
        for (name, ok) in join_all(tasks).await {
            if ok {
                succeeded.push(name);
            } else {
                warn!(channel = name, "Notification channel failed");
            }
        }

        succeeded
    }
}
