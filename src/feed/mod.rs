//! Feed sources that put packets on the ingestion channel.
//!
//! - [`live`]: the single live subscription bridging transport messages
//!   into the [`crate::ingest`] channel
//! - [`simulator`]: a synthetic wearable publishing through the same
//!   transport, so the dashboard cannot tell it from a real band

pub mod live;
pub mod simulator;

pub use live::attach;
pub use simulator::{SensorModel, Simulator, SimulatorControl, SimulatorHandle, SimulatorOptions};

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the live subscription, read by the status bar.
#[derive(Debug, Default)]
pub struct FeedStats {
    accepted: AtomicU64,
    dropped: AtomicU64,
}

impl FeedStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Packets parsed and enqueued.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Messages discarded at the parse boundary.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
