//! Per-tick render payload handed to the presentation layer.

use std::fmt;

use kinto_types::Packet;

use super::alert::{evaluate, AlertState};
use super::history::RollingHistory;
use crate::transport::LinkState;

/// Monotonic identifier of one render-loop tick.
///
/// Every tick gets a fresh id so a renderer can never mistake two distinct
/// frames for the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TickId(pub u64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick-{}", self.0)
    }
}

/// Chart series extracted from the history window, oldest to newest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub hr: Vec<f64>,
    pub spo2: Vec<f64>,
    pub svm: Vec<f64>,
}

impl Series {
    pub fn from_history(history: &RollingHistory) -> Self {
        let mut series = Series {
            hr: Vec::with_capacity(history.len()),
            spo2: Vec::with_capacity(history.len()),
            svm: Vec::with_capacity(history.len()),
        };
        for packet in history {
            series.hr.push(f64::from(packet.heart_rate));
            series.spo2.push(packet.spo2);
            series.svm.push(packet.impact_force);
        }
        series
    }

    pub fn len(&self) -> usize {
        self.hr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hr.is_empty()
    }
}

/// Everything the Active view needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPayload {
    pub alert: AlertState,
    pub latest: Packet,
    pub series: Series,
}

impl RenderPayload {
    /// Build the payload from the history, or `None` while it is still empty.
    pub fn from_history(history: &RollingHistory) -> Option<Self> {
        let latest = *history.latest()?;
        Some(Self {
            alert: evaluate(&latest),
            latest,
            series: Series::from_history(history),
        })
    }
}

/// The two dashboard states.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// No packet has arrived yet: show the waiting placeholder.
    Idle,
    /// At least one packet: metrics, alert banner and charts.
    Active(RenderPayload),
}

impl View {
    pub fn is_active(&self) -> bool {
        matches!(self, View::Active(_))
    }

    pub fn payload(&self) -> Option<&RenderPayload> {
        match self {
            View::Active(payload) => Some(payload),
            View::Idle => None,
        }
    }
}

/// Producer-side status of the simulated wearable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    /// No simulator in this process.
    Absent,
    Enabled,
    Paused,
}

/// Feed health shown in the status bar.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedStatus {
    /// Human-readable source, e.g. `mqtt://broker.hivemq.com:1883/kinto/wearable/v1/data`.
    pub source: String,
    pub link: LinkState,
    /// Packets that passed validation and were enqueued.
    pub accepted: u64,
    /// Messages dropped at the parse boundary.
    pub dropped: u64,
    /// Packets the render loop refused after draining.
    pub skipped: u64,
    pub simulator: SimulatorState,
}

/// One frame: the view plus feed status.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub view: View,
    pub feed: FeedStatus,
    /// Packets currently held in the rolling window.
    pub window: usize,
}
