//! Ingestion channel between the message-arrival path and the render loop.
//!
//! This is the only structure shared between execution contexts. Producers
//! (transport callbacks) call [`PacketSender::enqueue`], which never blocks;
//! the render loop calls [`PacketReceiver::drain_all`] once per tick.
//!
//! ```text
//! transport callback ──enqueue──▶ [ unbounded mpsc ] ──drain_all──▶ render loop
//!   (any thread)                                                   (single owner)
//! ```

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use kinto_types::Packet;

/// Create a connected sender/receiver pair.
///
/// # Example
///
/// ```
/// use kinto_monitor::ingest;
/// use kinto_types::Packet;
///
/// let (tx, mut rx) = ingest::channel();
/// let packet = Packet::from_json(
///     r#"{"timestamp":1.0,"hr":78,"spo2":97.5,"temp":36.9,"svm":1.02,"fall_detected":false}"#,
/// ).unwrap();
/// assert!(tx.enqueue(packet));
/// assert_eq!(rx.drain_all(), vec![packet]);
/// assert!(rx.drain_all().is_empty());
/// ```
pub fn channel() -> (PacketSender, PacketReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        PacketSender { tx },
        PacketReceiver {
            rx,
            closed: false,
        },
    )
}

/// Producer half. Not `Clone`: the single live subscription owns it.
#[derive(Debug)]
pub struct PacketSender {
    tx: mpsc::UnboundedSender<Packet>,
}

impl PacketSender {
    /// Queue a packet for the next render tick.
    ///
    /// Never blocks and never fails under backlog. Returns `false` only when
    /// the render loop is gone, in which case the packet is discarded.
    pub fn enqueue(&self, packet: Packet) -> bool {
        self.tx.send(packet).is_ok()
    }

    /// Whether the consumer has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the render loop.
#[derive(Debug)]
pub struct PacketReceiver {
    rx: mpsc::UnboundedReceiver<Packet>,
    closed: bool,
}

impl PacketReceiver {
    /// Remove and return everything currently queued, in arrival order.
    ///
    /// Returns an empty vector when nothing is waiting. Must only be called
    /// from the render loop.
    pub fn drain_all(&mut self) -> Vec<Packet> {
        let mut drained = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(packet) => drained.push(packet),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        drained
    }

    /// True once the producer is gone and the queue has been fully drained.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(n: i32) -> Packet {
        Packet {
            timestamp: n as f64,
            heart_rate: n,
            spo2: 98.0,
            temperature: 36.8,
            impact_force: 1.0,
            fall_detected: false,
        }
    }

    #[test]
    fn test_drain_preserves_arrival_order() {
        let (tx, mut rx) = channel();
        for n in 0..10 {
            assert!(tx.enqueue(packet(n)));
        }

        let rates: Vec<i32> = rx.drain_all().iter().map(|p| p.heart_rate).collect();
        assert_eq!(rates, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_drain_twice_is_empty() {
        let (tx, mut rx) = channel();
        tx.enqueue(packet(1));
        assert_eq!(rx.drain_all().len(), 1);
        assert!(rx.drain_all().is_empty());
        assert!(!rx.is_closed());
    }

    #[test]
    fn test_large_backlog_never_blocks() {
        let (tx, mut rx) = channel();
        for n in 0..100_000 {
            assert!(tx.enqueue(packet(n % 200)));
        }
        assert_eq!(rx.drain_all().len(), 100_000);
    }

    #[test]
    fn test_enqueue_after_receiver_dropped() {
        let (tx, rx) = channel();
        drop(rx);
        assert!(tx.is_closed());
        assert!(!tx.enqueue(packet(1)));
    }

    #[test]
    fn test_closed_after_sender_dropped_and_drained() {
        let (tx, mut rx) = channel();
        tx.enqueue(packet(1));
        drop(tx);

        assert_eq!(rx.drain_all().len(), 1);
        assert!(rx.is_closed());
        assert!(rx.drain_all().is_empty());
    }

    #[test]
    fn test_concurrent_producer_keeps_order() {
        let (tx, mut rx) = channel();
        let producer = std::thread::spawn(move || {
            for n in 0..5_000 {
                tx.enqueue(packet(n));
            }
        });

        let mut seen = Vec::new();
        while seen.len() < 5_000 {
            seen.extend(rx.drain_all().into_iter().map(|p| p.heart_rate));
            std::thread::yield_now();
        }
        producer.join().unwrap();

        assert_eq!(seen, (0..5_000).collect::<Vec<_>>());
    }
}
