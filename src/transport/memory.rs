//! In-process transport.
//!
//! Delivers published payloads synchronously, on the publisher's thread, to
//! every matching subscriber. Used for `--offline` runs where the simulator
//! feeds the dashboard without a broker, and throughout the tests.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::watch;

use super::{dispatch, LinkState, MessageHandler, Route, Transport, TransportError};

/// A broker-less bus living inside the process.
///
/// # Example
///
/// ```
/// use kinto_monitor::transport::{MemoryBus, Transport};
///
/// let bus = MemoryBus::new();
/// bus.subscribe("kinto/#", Box::new(|payload| println!("{} bytes", payload.len())))
///     .unwrap();
/// bus.publish("kinto/wearable/v1/data", "{}").unwrap();
/// assert_eq!(bus.published(), 1);
/// ```
#[derive(Debug)]
pub struct MemoryBus {
    routes: RwLock<Vec<Route>>,
    link: watch::Sender<LinkState>,
    published: AtomicU64,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    pub fn new() -> Self {
        let (link, _) = watch::channel(LinkState::Connected);
        Self {
            routes: RwLock::new(Vec::new()),
            link,
            published: AtomicU64::new(0),
        }
    }

    /// Total number of payloads published so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Inject a raw payload as if it arrived from a broker.
    ///
    /// Unlike [`Transport::publish`] this accepts arbitrary bytes, which lets
    /// tests exercise the parse boundary with non-UTF-8 garbage.
    pub fn deliver(&self, topic: &str, payload: &[u8]) -> usize {
        dispatch(&self.routes, topic, payload)
    }
}

impl Transport for MemoryBus {
    fn subscribe(&self, topic: &str, on_message: MessageHandler) -> Result<(), TransportError> {
        if topic.is_empty() {
            return Err(TransportError::Subscribe("empty topic filter".to_string()));
        }
        self.routes.write().push(Route::new(topic, on_message));
        Ok(())
    }

    fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError> {
        if topic.contains(['+', '#']) {
            return Err(TransportError::Publish(format!(
                "wildcards not allowed in topic name: {}",
                topic
            )));
        }
        self.published.fetch_add(1, Ordering::Relaxed);
        self.deliver(topic, payload.as_bytes());
        Ok(())
    }

    fn link_state(&self) -> watch::Receiver<LinkState> {
        self.link.subscribe()
    }

    fn description(&self) -> &str {
        "memory"
    }
}
