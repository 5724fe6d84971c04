use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::price_index::PriceIndex;
use crate::stock_registry::StockRegistry;
use crate::types::{Stock, StockEvent, StockId};
use crate::volume_heap::VolumeHeap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// A `StockTracker` shared across threads.
///
/// Mutations and `max_volume` need the write lock; `lookup_by_id` and
/// `price_range` only need the read lock.
pub type SharedStockTracker = Arc<RwLock<StockTracker>>;

/// The multi-index coordinator that keeps three views of the same stocks consistent.
///
/// This structure owns:
///
/// - The `StockRegistry`, mapping identifiers to the canonical records
/// - The `PriceIndex`, an AVL tree over `(price, id)` for range queries
/// - The `VolumeHeap`, a lazy max-heap of volume snapshots
///
/// Every mutation reads or updates the registry first and propagates the change
/// afterwards. The price index is kept exactly in sync with the registry, while
/// the volume heap may lag behind with stale snapshots that are discarded when
/// `max_volume` meets them.
///
/// ### Thread Safety
///
/// No operation locks internally. Wrap the tracker in a `RwLock` (see
/// [`SharedStockTracker`]) so that the remove-then-insert of `update_price` is
/// never observed halfway.
#[derive(Debug, Default)]
pub struct StockTracker {
    /// Identifier to record, the source of truth for field values
    registry: StockRegistry,
    /// Price-ordered view used for range queries
    prices: PriceIndex,
    /// Volume snapshots used for the max-volume query
    volumes: VolumeHeap,
    config: TrackerConfig,
}

impl StockTracker {
    /// Creates a new empty tracker with the default configuration.
    ///
    /// ## Examples
    ///
    /// ```
    /// use stock_tracker::StockTracker;
    ///
    /// let tracker = StockTracker::new();
    /// assert!(tracker.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    /// Creates a new empty tracker tuned by `config`.
    ///
    /// A compaction ratio below `MIN_HEAP_COMPACTION_RATIO` is raised to it,
    /// however the configuration was built.
    pub fn with_config(config: TrackerConfig) -> Self {
        let config = config.sanitized();
        StockTracker {
            registry: StockRegistry::with_capacity(config.initial_capacity),
            prices: PriceIndex::new(),
            volumes: VolumeHeap::with_capacity(config.initial_capacity),
            config,
        }
    }

    /// Wraps the tracker for sharing across threads.
    pub fn into_shared(self) -> SharedStockTracker {
        Arc::new(RwLock::new(self))
    }

    /// Lists a new stock at `price` with zero volume.
    ///
    /// Listing an identifier that is already tracked changes nothing and
    /// reports `StockEvent::AlreadyListed`, whatever the given price.
    ///
    /// The operation is $O(\log{N})$ where $N$ is the number of tracked stocks.
    ///
    /// ## Errors
    ///
    /// `InvalidPrice` if `price` is NaN or infinite
    ///
    /// ## Examples
    ///
    /// ```
    /// use stock_tracker::{StockEvent, StockTracker};
    ///
    /// let mut tracker = StockTracker::new();
    ///
    /// let event = tracker.insert_new_stock(1, 10.0).unwrap();
    /// assert_eq!(event, StockEvent::Listed { id: 1, price: 10.0 });
    ///
    /// let event = tracker.insert_new_stock(1, 99.0).unwrap();
    /// assert_eq!(event, StockEvent::AlreadyListed { id: 1 });
    /// ```
    pub fn insert_new_stock(&mut self, id: StockId, price: f64) -> Result<StockEvent> {
        if self.registry.contains(id) {
            debug!(id, "stock already listed");
            return Ok(StockEvent::AlreadyListed { id });
        }
        let price = to_price(price)?;

        let stock = Stock::new(id, price);
        self.registry.insert(stock)?;
        self.prices.insert(price, id);
        self.volumes.push(stock.volume, id);

        debug!(id, price, "listed stock");
        Ok(StockEvent::Listed { id, price })
    }

    /// Moves a stock to a new price.
    ///
    /// The stock's node is removed from the price index under its old price and
    /// inserted again under the new one, both in $O(\log{N})$.
    ///
    /// ## Errors
    ///
    /// - `NotFound` if no stock is tracked under `id`
    /// - `InvalidPrice` if `new_price` is NaN or infinite
    ///
    /// ## Examples
    ///
    /// ```
    /// use stock_tracker::StockTracker;
    ///
    /// let mut tracker = StockTracker::new();
    /// tracker.insert_new_stock(1, 10.0).unwrap();
    /// tracker.update_price(1, 12.5).unwrap();
    ///
    /// assert_eq!(tracker.lookup_by_id(1).unwrap().price, 12.5);
    /// assert_eq!(tracker.price_range(12.5, 12.5).unwrap(), vec![1]);
    /// ```
    pub fn update_price(&mut self, id: StockId, new_price: f64) -> Result<StockEvent> {
        let new_price = to_price(new_price)?;
        let stock = self.registry.get_mut(id)?;
        let previous = stock.price;

        if !self.prices.remove(previous, id) {
            return Err(corrupted(format!(
                "stock {id} missing from the price index at {previous}"
            )));
        }
        stock.price = new_price;
        self.prices.insert(new_price, id);

        debug!(id, previous, current = new_price, "repriced stock");
        Ok(StockEvent::Repriced {
            id,
            previous,
            current: new_price,
        })
    }

    /// Adds `delta` to a stock's traded volume.
    ///
    /// A fresh snapshot is pushed onto the volume heap; the previous snapshot
    /// of the stock stays behind as a stale entry. A zero `delta` pushes
    /// nothing, since the latest snapshot is still accurate.
    ///
    /// ## Errors
    ///
    /// - `NotFound` if no stock is tracked under `id`
    /// - `VolumeOverflow` if the total would not fit in a `u64`
    ///
    /// ## Examples
    ///
    /// ```
    /// use stock_tracker::{StockEvent, StockTracker};
    ///
    /// let mut tracker = StockTracker::new();
    /// tracker.insert_new_stock(7, 3.25).unwrap();
    ///
    /// tracker.increase_volume(7, 40).unwrap();
    /// let event = tracker.increase_volume(7, 2).unwrap();
    /// assert_eq!(event, StockEvent::VolumeIncreased { id: 7, delta: 2, total: 42 });
    /// ```
    pub fn increase_volume(&mut self, id: StockId, delta: u64) -> Result<StockEvent> {
        let stock = self.registry.get_mut(id)?;
        let total = stock
            .volume
            .checked_add(delta)
            .ok_or(TrackerError::VolumeOverflow {
                id,
                volume: stock.volume,
                delta,
            })
            .inspect_err(|err| warn!(%err, "rejected volume increase"))?;
        stock.volume = total;

        if delta > 0 {
            self.volumes.push(total, id);
            self.compact_if_needed();
        }

        debug!(id, delta, total, "increased volume");
        Ok(StockEvent::VolumeIncreased { id, delta, total })
    }

    /// Returns the highest traded volume together with the stock holding it.
    ///
    /// Stale snapshots found on top of the heap are discarded, which is why this
    /// query needs `&mut self`. Its cost is $O(\log{N})$ amortized over all
    /// snapshots ever pushed. Ties go to the smallest identifier.
    ///
    /// ## Errors
    ///
    /// - `EmptyIndex` if no stock has been listed
    /// - `CorruptedState` if no snapshot matches a live volume
    ///
    /// ## Examples
    ///
    /// ```
    /// use stock_tracker::StockTracker;
    ///
    /// let mut tracker = StockTracker::new();
    /// tracker.insert_new_stock(1, 10.0).unwrap();
    /// tracker.insert_new_stock(2, 20.0).unwrap();
    /// tracker.increase_volume(2, 50).unwrap();
    ///
    /// let (volume, stock) = tracker.max_volume().unwrap();
    /// assert_eq!((volume, stock.id), (50, 2));
    /// ```
    pub fn max_volume(&mut self) -> Result<(u64, Stock)> {
        if self.registry.is_empty() {
            return Err(TrackerError::EmptyIndex);
        }

        let registry = &self.registry;
        let top = self
            .volumes
            .peek_max(|id| registry.volume_of(id))
            .map_err(|err| match err {
                TrackerError::EmptyIndex => {
                    corrupted("volume heap is empty while stocks are listed".to_string())
                }
                TrackerError::CorruptedState { reason } => corrupted(reason),
                other => other,
            })?;

        let stock = *self.registry.get(top.id)?;
        Ok((top.volume, stock))
    }

    /// Returns a snapshot of the stock tracked under `id`. Expected $O(1)$.
    ///
    /// ## Errors
    ///
    /// `NotFound` if no stock is tracked under `id`
    pub fn lookup_by_id(&self, id: StockId) -> Result<Stock> {
        self.registry.get(id).copied()
    }

    /// Returns the identifiers of all stocks priced within `[low, high]`.
    ///
    /// Identifiers come in ascending price order; stocks sharing a price are
    /// ordered by identifier. The query is $O(\log{N} + K)$ where $K$ is the
    /// number of identifiers reported.
    ///
    /// ## Errors
    ///
    /// - `InvalidRange` if `low > high`
    /// - `InvalidPrice` if a bound is NaN or infinite
    ///
    /// ## Examples
    ///
    /// ```
    /// use stock_tracker::{StockTracker, TrackerError};
    ///
    /// let mut tracker = StockTracker::new();
    /// for (id, price) in [(1, 10.0), (2, 20.0), (3, 30.0)] {
    ///     tracker.insert_new_stock(id, price).unwrap();
    /// }
    ///
    /// assert_eq!(tracker.price_range(15.0, 25.0).unwrap(), vec![2]);
    /// assert!(matches!(
    ///     tracker.price_range(25.0, 15.0),
    ///     Err(TrackerError::InvalidRange { .. })
    /// ));
    /// ```
    pub fn price_range(&self, low: f64, high: f64) -> Result<Vec<StockId>> {
        if low > high {
            return Err(TrackerError::InvalidRange { low, high });
        }
        let (low, high) = (to_price(low)?, to_price(high)?);

        Ok(self.prices.range(low, high))
    }

    /// Drops every stale volume snapshot. $O(N)$ in the heap size.
    pub fn compact_volume_heap(&mut self) {
        let registry = &self.registry;
        self.volumes.compact(|id| registry.volume_of(id));
    }

    /// Returns the number of snapshots in the volume heap, stale ones included.
    pub fn pending_heap_entries(&self) -> usize {
        self.volumes.len()
    }

    /// Iterates over all tracked stocks in arbitrary order.
    pub fn stocks(&self) -> impl Iterator<Item = &Stock> {
        self.registry.iter()
    }

    /// Read access to the price-ordered view.
    pub fn price_index(&self) -> &PriceIndex {
        &self.prices
    }

    /// The configuration in effect, after clamping.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Returns the number of tracked stocks.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn compact_if_needed(&mut self) {
        let Some(ratio) = self.config.heap_compaction_ratio else {
            return;
        };
        if self.volumes.len() > ratio.saturating_mul(self.registry.len()) {
            self.compact_volume_heap();
        }
    }
}

/// Accepts finite prices unchanged.
fn to_price(value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TrackerError::InvalidPrice { value })
    }
}

fn corrupted(reason: String) -> TrackerError {
    error!(%reason, "stock tracker invariant violated");
    TrackerError::CorruptedState { reason }
}
