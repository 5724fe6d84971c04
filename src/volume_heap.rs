use crate::error::{Result, TrackerError};
use crate::types::StockId;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::trace;

/// A volume snapshot taken when the entry was pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeEntry {
    /// The stock's volume at push time
    pub volume: u64,
    /// The stock the snapshot belongs to
    pub id: StockId,
}

impl Ord for VolumeEntry {
    // Higher volume wins; among equal volumes the smaller identifier wins
    fn cmp(&self, other: &Self) -> Ordering {
        self.volume
            .cmp(&other.volume)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for VolumeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A max-heap of volume snapshots with lazy deletion.
///
/// Entries are never updated in place. Each volume increase pushes a fresh
/// snapshot and the outdated ones stay in the heap until `peek_max` meets them
/// at the top and discards them. Every entry is popped at most once, so the
/// total discard work is bounded by the number of pushes.
#[derive(Debug, Default)]
pub struct VolumeHeap {
    entries: BinaryHeap<VolumeEntry>,
}

impl VolumeHeap {
    pub fn new() -> Self {
        VolumeHeap {
            entries: BinaryHeap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        VolumeHeap {
            entries: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Pushes a snapshot of `id` at `volume`. $O(\log{N})$.
    pub fn push(&mut self, volume: u64, id: StockId) {
        self.entries.push(VolumeEntry { volume, id });
    }

    /// Returns the highest live snapshot without removing it.
    ///
    /// `live_volume` resolves an identifier to the stock's current volume.
    /// Snapshots that no longer match are popped and dropped along the way.
    ///
    /// ## Errors
    ///
    /// - `EmptyIndex` if the heap holds no entries at all
    /// - `CorruptedState` if every entry turned out to be stale
    ///
    /// ## Examples
    ///
    /// ```
    /// use stock_tracker::VolumeHeap;
    /// use std::collections::HashMap;
    ///
    /// let mut live = HashMap::from([(1, 0), (2, 0)]);
    /// let mut heap = VolumeHeap::new();
    /// heap.push(0, 1);
    /// heap.push(0, 2);
    ///
    /// // Stock 1 trades 30 and then 5 more
    /// heap.push(30, 1);
    /// heap.push(35, 1);
    /// live.insert(1, 35);
    ///
    /// let top = heap.peek_max(|id| live.get(&id).copied()).unwrap();
    /// assert_eq!((top.volume, top.id), (35, 1));
    /// ```
    pub fn peek_max<F>(&mut self, live_volume: F) -> Result<VolumeEntry>
    where
        F: Fn(StockId) -> Option<u64>,
    {
        if self.entries.is_empty() {
            return Err(TrackerError::EmptyIndex);
        }

        while let Some(top) = self.entries.peek().copied() {
            if live_volume(top.id) == Some(top.volume) {
                return Ok(top);
            }
            trace!(id = top.id, volume = top.volume, "discarding stale volume snapshot");
            self.entries.pop();
        }

        Err(TrackerError::CorruptedState {
            reason: "volume heap exhausted without a live snapshot".to_string(),
        })
    }

    /// Drops every stale snapshot. $O(N)$.
    pub fn compact<F>(&mut self, live_volume: F)
    where
        F: Fn(StockId) -> Option<u64>,
    {
        let before = self.entries.len();
        self.entries.retain(|entry| live_volume(entry.id) == Some(entry.volume));
        trace!(before, after = self.entries.len(), "compacted volume heap");
    }

    /// Returns the number of snapshots held, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
