/// Smallest accepted heap compaction ratio.
pub const MIN_HEAP_COMPACTION_RATIO: usize = 2;

/// Tuning options of a `StockTracker`.
///
/// The defaults reproduce the plain lazy design: no pre-allocation and no heap
/// compaction, so stale volume snapshots are only discarded by `max_volume`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackerConfig {
    /// Number of stocks to pre-allocate room for in the identity index and the volume heap
    pub initial_capacity: usize,
    /// When set, the volume heap is compacted once it holds more than
    /// `ratio` entries per tracked stock
    pub heap_compaction_ratio: Option<usize>,
}

impl TrackerConfig {
    /// Creates the default configuration.
    ///
    /// ## Examples
    ///
    /// ```
    /// use stock_tracker::TrackerConfig;
    ///
    /// let config = TrackerConfig::new()
    ///     .with_initial_capacity(1_000)
    ///     .with_heap_compaction_ratio(4);
    /// assert_eq!(config.heap_compaction_ratio, Some(4));
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocates room for `initial_capacity` stocks.
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Enables heap compaction. Ratios below 2 are raised to 2, so that a
    /// compaction always frees room for at least one push per stock.
    pub fn with_heap_compaction_ratio(mut self, ratio: usize) -> Self {
        self.heap_compaction_ratio = Some(ratio.max(MIN_HEAP_COMPACTION_RATIO));
        self
    }

    /// Raises a compaction ratio set directly on the field to the minimum.
    pub(crate) fn sanitized(mut self) -> Self {
        self.heap_compaction_ratio = self
            .heap_compaction_ratio
            .map(|ratio| ratio.max(MIN_HEAP_COMPACTION_RATIO));
        self
    }
}
