//! Telemetry packet and its wire representation.

use serde::{Deserialize, Serialize};

use crate::PacketError;

/// Lowest accepted SpO2 reading, in percent.
pub const SPO2_MIN: f64 = 0.0;
/// Highest accepted SpO2 reading, in percent.
pub const SPO2_MAX: f64 = 100.0;

/// One validated telemetry sample from the wearable.
///
/// Packets only leave the parser through [`TryFrom<RawPacket>`], so a
/// deserialized `Packet` always satisfies [`Packet::validate`]. Packets built
/// by hand in code are not checked until someone calls `validate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPacket", into = "RawPacket")]
pub struct Packet {
    /// Sample time in seconds (wall clock or monotonic, producer's choice).
    pub timestamp: f64,
    /// Heart rate in beats per minute.
    pub heart_rate: i32,
    /// Blood oxygen saturation in percent, within `[0, 100]`.
    pub spo2: f64,
    /// Body temperature in degrees Celsius.
    pub temperature: f64,
    /// Accelerometer signal-vector magnitude in G.
    pub impact_force: f64,
    /// Whether the producer itself flagged a fall.
    pub fall_detected: bool,
}

/// The packet exactly as it appears on the wire.
///
/// Every field is required; serde rejects payloads with missing fields or
/// mismatched types and silently skips fields it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPacket {
    pub timestamp: f64,
    pub hr: i32,
    pub spo2: f64,
    pub temp: f64,
    pub svm: f64,
    pub fall_detected: bool,
}

impl Packet {
    /// Parse a packet from raw message bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PacketError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Parse a packet from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, PacketError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode the packet in wire format.
    pub fn to_json(&self) -> String {
        // Plain numbers and a bool; serde_json writes non-finite floats as null.
        serde_json::to_string(&RawPacket::from(*self)).unwrap_or_default()
    }

    /// Check the packet invariants: every float finite, SpO2 in range.
    pub fn validate(&self) -> Result<(), PacketError> {
        let floats = [
            ("timestamp", self.timestamp),
            ("spo2", self.spo2),
            ("temp", self.temperature),
            ("svm", self.impact_force),
        ];
        for (field, value) in floats {
            if !value.is_finite() {
                return Err(PacketError::NonFinite { field });
            }
        }
        if !(SPO2_MIN..=SPO2_MAX).contains(&self.spo2) {
            return Err(PacketError::OutOfRange {
                field: "spo2",
                value: self.spo2,
            });
        }
        Ok(())
    }
}

impl TryFrom<RawPacket> for Packet {
    type Error = PacketError;

    fn try_from(raw: RawPacket) -> Result<Self, Self::Error> {
        if !raw.spo2.is_finite() {
            return Err(PacketError::NonFinite { field: "spo2" });
        }
        let packet = Packet {
            timestamp: raw.timestamp,
            heart_rate: raw.hr,
            spo2: raw.spo2.clamp(SPO2_MIN, SPO2_MAX),
            temperature: raw.temp,
            impact_force: raw.svm,
            fall_detected: raw.fall_detected,
        };
        packet.validate()?;
        Ok(packet)
    }
}

impl From<Packet> for RawPacket {
    fn from(packet: Packet) -> Self {
        RawPacket {
            timestamp: packet.timestamp,
            hr: packet.heart_rate,
            spo2: packet.spo2,
            temp: packet.temperature,
            svm: packet.impact_force,
            fall_detected: packet.fall_detected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STABLE: &str =
        r#"{"timestamp":1.0,"hr":78,"spo2":97.5,"temp":36.9,"svm":1.02,"fall_detected":false}"#;

    #[test]
    fn test_parse_valid_packet() {
        let packet = Packet::from_json(STABLE).unwrap();
        assert_eq!(packet.timestamp, 1.0);
        assert_eq!(packet.heart_rate, 78);
        assert_eq!(packet.spo2, 97.5);
        assert_eq!(packet.temperature, 36.9);
        assert_eq!(packet.impact_force, 1.02);
        assert!(!packet.fall_detected);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let json = r#"{"timestamp":2.5,"hr":80,"spo2":98.0,"temp":37.0,"svm":1.0,
                       "fall_detected":true,"battery":87,"fw":"1.2.0"}"#;
        let packet = Packet::from_json(json).unwrap();
        assert_eq!(packet.heart_rate, 80);
        assert!(packet.fall_detected);
    }

    #[test]
    fn test_wrong_type_rejected() {
        let json = r#"{"timestamp":1.0,"hr":78,"spo2":"high","temp":36.9,"svm":1.02,"fall_detected":false}"#;
        let err = Packet::from_json(json).unwrap_err();
        assert!(matches!(err, PacketError::Malformed(_)));
    }

    #[test]
    fn test_missing_field_rejected() {
        let json = r#"{"timestamp":1.0,"spo2":97.5,"temp":36.9,"svm":1.02,"fall_detected":false}"#;
        let err = Packet::from_json(json).unwrap_err();
        assert!(err.to_string().contains("hr"));
    }

    #[test]
    fn test_fractional_heart_rate_rejected() {
        let json = r#"{"timestamp":1.0,"hr":78.5,"spo2":97.5,"temp":36.9,"svm":1.02,"fall_detected":false}"#;
        assert!(Packet::from_json(json).is_err());
    }

    #[test]
    fn test_non_json_rejected() {
        assert!(Packet::from_slice(b"\xff\xfe not json").is_err());
        assert!(Packet::from_slice(b"").is_err());
        assert!(Packet::from_json("[1,2,3]").is_err());
    }

    #[test]
    fn test_spo2_clamped_into_range() {
        let high = r#"{"timestamp":1.0,"hr":70,"spo2":100.4,"temp":36.9,"svm":1.0,"fall_detected":false}"#;
        assert_eq!(Packet::from_json(high).unwrap().spo2, SPO2_MAX);

        let low = r#"{"timestamp":1.0,"hr":70,"spo2":-3.0,"temp":36.9,"svm":1.0,"fall_detected":false}"#;
        assert_eq!(Packet::from_json(low).unwrap().spo2, SPO2_MIN);
    }

    #[test]
    fn test_out_of_physiological_range_accepted() {
        let json = r#"{"timestamp":1.0,"hr":-4,"spo2":50.0,"temp":80.0,"svm":-2.0,"fall_detected":false}"#;
        let packet = Packet::from_json(json).unwrap();
        assert_eq!(packet.heart_rate, -4);
        assert_eq!(packet.temperature, 80.0);
    }

    #[test]
    fn test_validate_catches_hand_built_packets() {
        let mut packet = Packet::from_json(STABLE).unwrap();
        assert!(packet.validate().is_ok());

        packet.impact_force = f64::NAN;
        assert!(matches!(
            packet.validate(),
            Err(PacketError::NonFinite { field: "svm" })
        ));

        packet.impact_force = 1.0;
        packet.spo2 = 120.0;
        assert!(matches!(
            packet.validate(),
            Err(PacketError::OutOfRange { field: "spo2", .. })
        ));
    }

    #[test]
    fn test_to_json_uses_wire_names() {
        let packet = Packet::from_json(STABLE).unwrap();
        let value: serde_json::Value = serde_json::from_str(&packet.to_json()).unwrap();
        assert_eq!(value["hr"], 78);
        assert_eq!(value["svm"], 1.02);
        assert_eq!(value["fall_detected"], false);
        assert!(value.get("heart_rate").is_none());
    }
}
