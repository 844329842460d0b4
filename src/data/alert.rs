//! Fall/impact alert rule.

use std::fmt;

use kinto_types::Packet;

/// Impact magnitude (in G) above which a reading counts as a fall.
pub const IMPACT_THRESHOLD_G: f64 = 3.0;

/// Why a packet raised an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertReason {
    /// The wearable flagged the fall itself.
    FallDetected,
    /// Only the impact magnitude crossed the threshold.
    ImpactThreshold,
}

impl AlertReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertReason::FallDetected => "fall detected",
            AlertReason::ImpactThreshold => "impact threshold exceeded",
        }
    }
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert derived from a single packet. Recomputed every tick, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertState {
    pub is_alert: bool,
    pub reason: Option<AlertReason>,
    pub impact_force: f64,
}

/// Evaluate the alert rule for a packet.
///
/// Alerts when the producer flagged a fall or the impact strictly exceeds
/// [`IMPACT_THRESHOLD_G`]. A producer-flagged fall takes precedence as the
/// reported reason.
pub fn evaluate(packet: &Packet) -> AlertState {
    let reason = if packet.fall_detected {
        Some(AlertReason::FallDetected)
    } else if packet.impact_force > IMPACT_THRESHOLD_G {
        Some(AlertReason::ImpactThreshold)
    } else {
        None
    };

    AlertState {
        is_alert: reason.is_some(),
        reason,
        impact_force: packet.impact_force,
    }
}
