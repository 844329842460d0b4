//! # kinto-types
//!
//! Wire schema for the KINTO wearable. Every telemetry sample published by a
//! band (or by the simulator standing in for one) is a single JSON object on
//! [`DEFAULT_TOPIC`]:
//!
//! ```json
//! {"timestamp": 1.0, "hr": 78, "spo2": 97.5, "temp": 36.9, "svm": 1.02, "fall_detected": false}
//! ```
//!
//! All six fields are required. Unknown fields are ignored. A payload with a
//! missing or wrongly typed field is rejected with a [`PacketError`] and never
//! becomes a [`Packet`].
//!
//! ## Example
//!
//! ```rust
//! use kinto_types::Packet;
//!
//! let raw = br#"{"timestamp":1.0,"hr":78,"spo2":97.5,"temp":36.9,"svm":1.02,"fall_detected":false}"#;
//! let packet = Packet::from_slice(raw).unwrap();
//! assert_eq!(packet.heart_rate, 78);
//!
//! assert!(Packet::from_json(r#"{"timestamp":1.0,"spo2":"high"}"#).is_err());
//! ```

mod error;
mod packet;

pub use error::PacketError;
pub use packet::{Packet, RawPacket, SPO2_MAX, SPO2_MIN};

/// Topic the wearable publishes on.
pub const DEFAULT_TOPIC: &str = "kinto/wearable/v1/data";
