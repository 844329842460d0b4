//! Data models for the render loop.
//!
//! ## Submodules
//!
//! - [`history`]: Fixed-capacity rolling window of recent packets
//! - [`alert`]: Fall/impact alert rule evaluated on the latest packet
//! - [`view`]: Per-tick render payload ([`Dashboard`], [`View`], [`Series`])
//! - [`duration`]: Parsing and formatting of cadence strings (e.g., "500ms")
//!
//! ## Data Flow
//!
//! ```text
//! PacketReceiver::drain_all()
//!        │
//!        ▼
//! RollingHistory::append()   (evicts oldest beyond 100)
//!        │
//!        ├──▶ latest() ──▶ alert::evaluate() ──▶ AlertState
//!        │
//!        └──▶ Series::from_history() (chart data)
//!                     │
//!                     ▼
//!              RenderPayload ──▶ Renderer::render()
//! ```

pub mod alert;
pub mod duration;
pub mod history;
pub mod view;

pub use alert::{evaluate, AlertReason, AlertState, IMPACT_THRESHOLD_G};
pub use history::{RollingHistory, HISTORY_CAPACITY};
pub use view::{Dashboard, FeedStatus, RenderPayload, Series, SimulatorState, TickId, View};
