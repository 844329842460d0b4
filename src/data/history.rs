//! Rolling window of recent packets for charting and the latest reading.

use std::collections::{vec_deque, VecDeque};

use kinto_types::Packet;

/// Number of packets kept for the charts.
pub const HISTORY_CAPACITY: usize = 100;

/// Fixed-capacity FIFO of the most recent packets, oldest first.
///
/// Owned by the render loop and never shared, so it needs no locking.
#[derive(Debug, Clone)]
pub struct RollingHistory {
    packets: VecDeque<Packet>,
    capacity: usize,
}

impl Default for RollingHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingHistory {
    /// Create an empty history holding [`HISTORY_CAPACITY`] packets.
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Create an empty history with a custom capacity (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            packets: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a packet at the tail, evicting from the head once over capacity.
    pub fn append(&mut self, packet: Packet) {
        self.packets.push_back(packet);
        while self.packets.len() > self.capacity {
            self.packets.pop_front();
        }
    }

    /// The most recently appended packet.
    pub fn latest(&self) -> Option<&Packet> {
        self.packets.back()
    }

    /// Ordered copy of the window, oldest first.
    pub fn snapshot(&self) -> Vec<Packet> {
        self.packets.iter().copied().collect()
    }

    /// Borrowing view of the window, oldest first.
    pub fn iter(&self) -> vec_deque::Iter<'_, Packet> {
        self.packets.iter()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<'a> IntoIterator for &'a RollingHistory {
    type Item = &'a Packet;
    type IntoIter = vec_deque::Iter<'a, Packet>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
