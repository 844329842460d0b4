//! # kinto-monitor
//!
//! Real-time monitor for the KINTO wearable: subscribes to the device's
//! telemetry topic, keeps a rolling window of recent samples, raises a fall
//! alert and redraws a terminal dashboard on a fixed cadence.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  message-arrival context            render context (one owner)   │
//! │  ┌───────────┐   ┌──────┐   ┌────────┐   ┌─────────┐   ┌───────┐ │
//! │  │ transport │──▶│ feed │──▶│ ingest │──▶│   app   │──▶│  ui   │ │
//! │  │ MQTT/mem  │   │ live │   │channel │   │ history │   │render │ │
//! │  └───────────┘   └──────┘   └────────┘   │ alert   │   └───────┘ │
//! │        ▲                                 └─────────┘             │
//! │        └── feed::simulator (synthetic wearable)                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`transport`]**: [`Transport`] trait with an MQTT implementation
//!   (rumqttc) and an in-process [`MemoryBus`]
//! - **[`feed`]**: the live subscription that parses packets into the
//!   ingestion channel, and the [`Simulator`] that publishes synthetic ones
//! - **[`ingest`]**: the thread-safe hand-off between the two contexts
//! - **[`data`]**: rolling history, alert rule and per-tick view types
//! - **[`app`]**: the render loop state machine (Idle / Active)
//! - **[`render`]** and **[`ui`]**: the render interface, a plain-text
//!   renderer and the ratatui dashboard
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use kinto_monitor::{feed, ingest, App, FeedHandles, MemoryBus, Transport, View};
//! use kinto_monitor::feed::FeedStats;
//!
//! let bus = MemoryBus::new();
//! let (tx, rx) = ingest::channel();
//! let stats = Arc::new(FeedStats::new());
//! feed::attach(&bus, "kinto/wearable/v1/data", tx, stats.clone()).unwrap();
//!
//! let mut app = App::new(rx, FeedHandles::detached("memory"));
//! assert_eq!(app.tick().1.view, View::Idle);
//!
//! bus.publish(
//!     "kinto/wearable/v1/data",
//!     r#"{"timestamp":1.0,"hr":80,"spo2":98.0,"temp":36.8,"svm":4.5,"fall_detected":true}"#,
//! )
//! .unwrap();
//!
//! let (_, dashboard) = app.tick();
//! assert!(dashboard.view.payload().unwrap().alert.is_alert);
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod feed;
pub mod ingest;
pub mod logging;
pub mod render;
pub mod transport;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, FeedHandles};
pub use config::Settings;
pub use data::{evaluate, AlertReason, AlertState, Dashboard, RollingHistory, TickId, View};
pub use feed::{Simulator, SimulatorOptions};
pub use kinto_types::{Packet, PacketError, DEFAULT_TOPIC};
pub use render::{RenderError, Renderer, TextRenderer};
pub use transport::{BrokerOptions, LinkState, MemoryBus, MqttTransport, Transport, TransportError};
pub use ui::{TerminalRenderer, Theme};
