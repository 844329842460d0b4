//! Publish/subscribe transport abstraction.
//!
//! The dashboard only ever talks to a broker through the [`Transport`] trait,
//! so the feed bridge and the simulator are indifferent to whether packets
//! travel over MQTT or stay inside the process.
//!
//! - [`MqttTransport`]: rumqttc client driven by a background [`MqttDriver`] task
//! - [`MemoryBus`]: in-process bus for offline runs and tests

mod memory;
mod mqtt;

pub use memory::MemoryBus;
pub use mqtt::{BrokerOptions, MqttDriver, MqttTransport};

use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::watch;

/// Callback invoked with the raw payload of every message on a subscribed topic.
///
/// Runs on the transport's message-arrival context: it must not block. No
/// transport lock is held while it runs, so it may subscribe or publish.
pub type MessageHandler = Box<dyn Fn(&[u8]) + Send + Sync + 'static>;

/// Errors surfaced by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The broker could not be reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A publish request was refused.
    #[error("Publish failed: {0}")]
    Publish(String),

    /// A subscribe request was refused.
    #[error("Subscribe failed: {0}")]
    Subscribe(String),
}

/// Connection state of a transport, published over a watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Connected,
    Disconnected(String),
}

impl LinkState {
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Connected)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Connecting => f.write_str("connecting"),
            LinkState::Connected => f.write_str("connected"),
            LinkState::Disconnected(reason) => write!(f, "disconnected ({})", reason),
        }
    }
}

/// Minimal publish/subscribe interface consumed by the dashboard.
pub trait Transport: Send + Sync + Debug {
    /// Register `on_message` for every message whose topic matches `topic`.
    ///
    /// MQTT wildcards (`+`, `#`) are honoured.
    fn subscribe(&self, topic: &str, on_message: MessageHandler) -> Result<(), TransportError>;

    /// Publish a payload. Never blocks; a full outbound queue is an error.
    fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError>;

    /// Watch the connection state.
    fn link_state(&self) -> watch::Receiver<LinkState>;

    /// Returns a human-readable description of the transport.
    ///
    /// Used for display in the status bar.
    fn description(&self) -> &str;
}

/// A topic filter and the handler it feeds.
pub(crate) struct Route {
    pub filter: String,
    pub handler: Arc<dyn Fn(&[u8]) + Send + Sync + 'static>,
}

impl Route {
    pub fn new(filter: &str, handler: MessageHandler) -> Self {
        Self {
            filter: filter.to_string(),
            handler: Arc::from(handler),
        }
    }
}

impl Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").field("filter", &self.filter).finish()
    }
}

/// Hand a payload to every route whose filter matches `topic`.
///
/// The matching handlers are cloned out first and run with the route table
/// unlocked. Returns the number of handlers invoked.
pub(crate) fn dispatch(routes: &RwLock<Vec<Route>>, topic: &str, payload: &[u8]) -> usize {
    let handlers: Vec<_> = routes
        .read()
        .iter()
        .filter(|r| topic_matches(&r.filter, topic))
        .map(|r| r.handler.clone())
        .collect();

    for handler in &handlers {
        handler(payload);
    }
    handlers.len()
}

/// MQTT topic filter matching.
///
/// `+` matches exactly one level, `#` (last level only) matches the rest,
/// including the parent level itself.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return filter_levels.next().is_none(),
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_exact_topic_match() {
        assert!(topic_matches("kinto/wearable/v1/data", "kinto/wearable/v1/data"));
        assert!(!topic_matches("kinto/wearable/v1/data", "kinto/wearable/v2/data"));
        assert!(!topic_matches("kinto/wearable", "kinto/wearable/v1"));
        assert!(!topic_matches("kinto/wearable/v1", "kinto/wearable"));
    }

    #[test]
    fn test_single_level_wildcard() {
        assert!(topic_matches("kinto/+/v1/data", "kinto/wearable/v1/data"));
        assert!(!topic_matches("kinto/+/data", "kinto/wearable/v1/data"));
    }

    #[test]
    fn test_multi_level_wildcard() {
        assert!(topic_matches("kinto/#", "kinto/wearable/v1/data"));
        assert!(topic_matches("kinto/#", "kinto"));
        assert!(topic_matches("#", "anything/at/all"));
        assert!(!topic_matches("kinto/#/data", "kinto/wearable/data"));
    }

    #[test]
    fn test_dispatch_only_matching_routes() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let routes = RwLock::new(vec![
            Route::new(
                "kinto/+/v1/data",
                Box::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            ),
            Route::new("other/topic", Box::new(|_| panic!("must not be called"))),
        ]);

        assert_eq!(dispatch(&routes, "kinto/wearable/v1/data", b"{}"), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_releases_lock_before_handlers() {
        let routes = Arc::new(RwLock::new(Vec::new()));
        let table = Arc::downgrade(&routes);
        routes.write().push(Route::new(
            "kinto/#",
            Box::new(move |_| {
                if let Some(table) = table.upgrade() {
                    table.write().push(Route::new("late/topic", Box::new(|_| {})));
                }
            }),
        ));

        assert_eq!(dispatch(&routes, "kinto/wearable/v1/data", b"{}"), 1);
        assert_eq!(routes.read().len(), 2);
    }

    #[test]
    fn test_link_state_display() {
        assert_eq!(LinkState::Connected.to_string(), "connected");
        assert_eq!(
            LinkState::Disconnected("refused".into()).to_string(),
            "disconnected (refused)"
        );
    }
}
