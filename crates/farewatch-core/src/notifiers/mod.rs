//! Notification channels
//!
//! One adapter per delivery channel behind the [`Notifier`] capability,
//! plus the manager that fans an alert out to every enabled channel.

mod console;
mod manager;
mod push;

pub use console::ConsoleNotifier;
pub use manager::NotifierManager;
pub use push::PushNotifier;

use async_trait::async_trait;

use crate::models::AlertMessage;

/// A notification delivery channel.
///
/// `send` reports plain success or failure; adapter-internal errors are
/// caught at this boundary and surface as `false`, never as a panic or
/// a propagated error.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable channel name, reported in the success list.
    fn name(&self) -> &'static str;

    /// True iff the channel is configured to participate.
    fn is_enabled(&self) -> bool;

    /// Deliver the message. Returns whether delivery succeeded.
    async fn send(&self, message: &AlertMessage) -> bool;
}
