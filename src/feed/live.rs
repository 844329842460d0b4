//! Live subscription: transport messages in, validated packets out.

use std::sync::Arc;

use kinto_types::Packet;
use tracing::{info, trace, warn};

use super::FeedStats;
use crate::ingest::PacketSender;
use crate::transport::{Transport, TransportError};

/// Subscribe to `topic` and forward every valid packet to the ingestion channel.
///
/// Takes ownership of the only [`PacketSender`], so a process can establish
/// exactly one live subscription. The handler runs on the transport's
/// message-arrival context and does nothing but parse and enqueue; payloads
/// that fail to parse are counted, logged and dropped.
pub fn attach(
    transport: &dyn Transport,
    topic: &str,
    sender: PacketSender,
    stats: Arc<FeedStats>,
) -> Result<(), TransportError> {
    let route = topic.to_string();

    transport.subscribe(
        topic,
        Box::new(move |payload: &[u8]| match Packet::from_slice(payload) {
            Ok(packet) => {
                if sender.enqueue(packet) {
                    stats.record_accepted();
                } else {
                    trace!(topic = %route, "Render loop gone, packet discarded");
                }
            }
            Err(e) => {
                stats.record_dropped();
                warn!(topic = %route, error = %e, "Dropping malformed packet");
            }
        }),
    )?;

    info!(topic, source = transport.description(), "Listening for live packets");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest;
    use crate::transport::MemoryBus;

    const TOPIC: &str = "kinto/wearable/v1/data";

    #[test]
    fn test_valid_message_is_enqueued() {
        let bus = MemoryBus::new();
        let (tx, mut rx) = ingest::channel();
        let stats = Arc::new(FeedStats::new());
        attach(&bus, TOPIC, tx, stats.clone()).unwrap();

        bus.publish(
            TOPIC,
            r#"{"timestamp":1.0,"hr":78,"spo2":97.5,"temp":36.9,"svm":1.02,"fall_detected":false}"#,
        )
        .unwrap();

        let drained = rx.drain_all();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].heart_rate, 78);
        assert_eq!(stats.accepted(), 1);
        assert_eq!(stats.dropped(), 0);
    }

    #[test]
    fn test_malformed_messages_are_dropped() {
        let bus = MemoryBus::new();
        let (tx, mut rx) = ingest::channel();
        let stats = Arc::new(FeedStats::new());
        attach(&bus, TOPIC, tx, stats.clone()).unwrap();

        bus.publish(
            TOPIC,
            r#"{"timestamp":1.0,"hr":78,"spo2":"high","temp":36.9,"svm":1.02,"fall_detected":false}"#,
        )
        .unwrap();
        bus.publish(
            TOPIC,
            r#"{"timestamp":1.0,"spo2":97.5,"temp":36.9,"svm":1.02,"fall_detected":false}"#,
        )
        .unwrap();
        bus.deliver(TOPIC, &[0xde, 0xad, 0xbe, 0xef]);

        assert!(rx.drain_all().is_empty());
        assert_eq!(stats.dropped(), 3);
        assert_eq!(stats.accepted(), 0);
    }

    #[test]
    fn test_other_topics_ignored() {
        let bus = MemoryBus::new();
        let (tx, mut rx) = ingest::channel();
        let stats = Arc::new(FeedStats::new());
        attach(&bus, TOPIC, tx, stats.clone()).unwrap();

        bus.publish("kinto/wearable/v2/data", "{}").unwrap();
        assert!(rx.drain_all().is_empty());
        assert_eq!(stats.dropped(), 0);
    }
}
