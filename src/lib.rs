//! A multi-index stock tracker keeping three views of the same instruments consistent
//! under mutation, each tuned for one access pattern.
//!
//! ## Architecture
//!
//! The `StockTracker` coordinator owns three indexes:
//!
//! 1. `StockRegistry`: a hash map from identifier to the canonical `Stock` record,
//!    giving expected $O(1)$ lookups
//! 2. `PriceIndex`: an AVL tree keyed by `(price, id)`, giving $O(\log{N} + K)$
//!    price-range queries
//! 3. `VolumeHeap`: a max-heap of volume snapshots with lazy deletion, giving
//!    $O(\log{N})$ amortized max-volume queries
//!
//! The registry is always current. The price index is updated in the same
//! operation; the volume heap only receives new snapshots, and outdated ones are
//! dropped when a max-volume query finds them on top.
//!
//! ## Example Usage
//!
//! ```rust
//! use stock_tracker::StockTracker;
//!
//! let mut tracker = StockTracker::new();
//!
//! // List three stocks
//! for (id, price) in [(1, 10.0), (2, 20.0), (3, 30.0)] {
//!     tracker.insert_new_stock(id, price).unwrap();
//! }
//! assert_eq!(tracker.price_range(15.0, 25.0).unwrap(), vec![2]);
//!
//! // Trade some volume
//! tracker.increase_volume(2, 50).unwrap();
//! tracker.increase_volume(1, 10).unwrap();
//! let (volume, stock) = tracker.max_volume().unwrap();
//! assert_eq!((volume, stock.id), (50, 2));
//!
//! // Reprice stock 1 into the range
//! tracker.update_price(1, 25.0).unwrap();
//! assert_eq!(tracker.price_range(15.0, 25.0).unwrap(), vec![2, 1]);
//! assert_eq!(tracker.lookup_by_id(1).unwrap().price, 25.0);
//! ```
//!
//! ## Sharing across threads
//!
//! ```rust
//! use stock_tracker::StockTracker;
//! use std::thread;
//!
//! let tracker = StockTracker::new().into_shared();
//!
//! let writer = {
//!     let tracker = tracker.clone();
//!     thread::spawn(move || {
//!         let mut tracker = tracker.write();
//!         tracker.insert_new_stock(1, 10.0).unwrap();
//!         tracker.increase_volume(1, 5).unwrap();
//!     })
//! };
//! writer.join().unwrap();
//!
//! // Lookups and range queries only need the read lock
//! assert_eq!(tracker.read().lookup_by_id(1).unwrap().volume, 5);
//! // The max-volume query discards stale snapshots, so it needs the write lock
//! assert_eq!(tracker.write().max_volume().unwrap().0, 5);
//! ```

mod config;
mod error;
mod price_index;
mod stock_registry;
mod stock_tracker;
mod types;
mod volume_heap;

// Re-export public API
pub use config::{TrackerConfig, MIN_HEAP_COMPACTION_RATIO};
pub use error::{Result, TrackerError};
pub use price_index::PriceIndex;
/// In-order iterator over the `(price, id)` pairs of a [`PriceIndex`].
pub use price_index::Iter as PriceIter;
pub use stock_registry::StockRegistry;
pub use stock_tracker::{SharedStockTracker, StockTracker};
pub use types::{PriceKey, Stock, StockEvent, StockId};
pub use volume_heap::{VolumeEntry, VolumeHeap};

// Re-export commonly used external dependencies
pub use parking_lot::RwLock;
pub use ordered_float::OrderedFloat;
