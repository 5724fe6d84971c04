use stock_tracker::{StockEvent, StockTracker, TrackerConfig, TrackerError};
use std::sync::Arc;

#[test]
/// Test the listing, trading and repricing workflow end to end.
fn test_listing_trading_and_repricing_workflow() {
    let mut tracker = StockTracker::new();

    for (id, listing_price) in [(1, 10.0), (2, 20.0), (3, 30.0)] {
        let event = tracker.insert_new_stock(id, listing_price).unwrap();
        assert_eq!(
            event,
            StockEvent::Listed {
                id,
                price: listing_price
            },
            "Stock {} should be listed",
            id
        );
        assert_eq!(event.id(), id);
    }
    assert_eq!(
        tracker.price_range(15.0, 25.0).unwrap(),
        vec![2],
        "Only stock 2 lies within [15, 25]"
    );

    tracker.increase_volume(2, 50).unwrap();
    tracker.increase_volume(1, 10).unwrap();
    let (volume, stock) = tracker.max_volume().unwrap();
    assert_eq!(volume, 50, "Max volume should be 50");
    assert_eq!(stock.id, 2, "Stock 2 should hold the max volume");
    assert_eq!(stock.price, 20.0);

    let event = tracker.update_price(1, 25.0).unwrap();
    assert_eq!(
        event,
        StockEvent::Repriced {
            id: 1,
            previous: 10.0,
            current: 25.0
        }
    );
    assert_eq!(
        tracker.price_range(15.0, 25.0).unwrap(),
        vec![2, 1],
        "Results must be in ascending price order: 2 at 20, then 1 at 25"
    );
    assert!(
        tracker.price_range(5.0, 15.0).unwrap().is_empty(),
        "Stock 1 must no longer be found under its old price"
    );
}

#[test]
/// Test that listing a known identifier twice leaves its record untouched.
fn test_insert_is_idempotent() {
    let mut tracker = StockTracker::new();
    tracker.insert_new_stock(42, 12.5).unwrap();
    tracker.increase_volume(42, 7).unwrap();

    let event = tracker.insert_new_stock(42, 99.0).unwrap();
    assert_eq!(event, StockEvent::AlreadyListed { id: 42 });
    assert!(!event.is_change(), "Re-listing is not a change");

    let stock = tracker.lookup_by_id(42).unwrap();
    assert_eq!(stock.price, 12.5, "Price must keep the first listing");
    assert_eq!(stock.volume, 7, "Volume must be preserved");
    assert_eq!(tracker.len(), 1);
    assert_eq!(tracker.price_index().len(), 1, "No second price node was created");
    assert!(tracker.price_range(99.0, 99.0).unwrap().is_empty());
}

#[test]
/// Test that operations on unknown identifiers report `NotFound` instead of doing nothing.
fn test_unknown_identifiers_are_reported() {
    let mut tracker = StockTracker::new();
    tracker.insert_new_stock(1, 10.0).unwrap();

    assert_eq!(
        tracker.update_price(2, 11.0),
        Err(TrackerError::NotFound { id: 2 })
    );
    assert_eq!(
        tracker.increase_volume(2, 5),
        Err(TrackerError::NotFound { id: 2 })
    );
    assert_eq!(
        tracker.lookup_by_id(2),
        Err(TrackerError::NotFound { id: 2 })
    );

    // The failed calls must not have touched the existing stock
    let stock = tracker.lookup_by_id(1).unwrap();
    assert_eq!((stock.price, stock.volume), (10.0, 0));
}

#[test]
/// Test what happens when the tracker is empty.
fn test_empty_tracker() {
    let mut tracker = StockTracker::new();

    assert_eq!(tracker.max_volume(), Err(TrackerError::EmptyIndex));
    assert_eq!(tracker.price_range(0.0, 100.0), Ok(vec![]));
    assert!(tracker.is_empty());
    assert_eq!(tracker.pending_heap_entries(), 0);
}

#[test]
/// Test that a freshly listed stock is already a max-volume candidate at zero.
fn test_max_volume_with_zero_volumes() {
    let mut tracker = StockTracker::new();
    tracker.insert_new_stock(5, 1.0).unwrap();
    tracker.insert_new_stock(3, 2.0).unwrap();

    let (volume, stock) = tracker.max_volume().unwrap();
    assert_eq!(volume, 0);
    assert_eq!(stock.id, 3, "Ties go to the smallest identifier");
}

#[test]
/// Test that the max volume follows a stock overtaking the leader.
fn test_max_volume_tracks_overtaking() {
    let mut tracker = StockTracker::new();
    for id in 1..=3 {
        tracker.insert_new_stock(id, id as f64).unwrap();
    }

    tracker.increase_volume(1, 100).unwrap();
    assert_eq!(tracker.max_volume().unwrap().1.id, 1);

    tracker.increase_volume(3, 60).unwrap();
    tracker.increase_volume(3, 60).unwrap();
    let (volume, stock) = tracker.max_volume().unwrap();
    assert_eq!((volume, stock.id), (120, 3), "Stock 3 overtook stock 1");

    // Repeated queries return the same answer
    assert_eq!(tracker.max_volume().unwrap().0, 120);
    assert_eq!(tracker.lookup_by_id(3).unwrap().volume, 120);
}

#[test]
/// Test that zero-volume increases are accepted without growing the heap.
fn test_zero_volume_increase() {
    let mut tracker = StockTracker::new();
    tracker.insert_new_stock(1, 10.0).unwrap();
    let entries_before = tracker.pending_heap_entries();

    let event = tracker.increase_volume(1, 0).unwrap();
    assert_eq!(
        event,
        StockEvent::VolumeIncreased {
            id: 1,
            delta: 0,
            total: 0
        }
    );
    assert_eq!(tracker.pending_heap_entries(), entries_before);
    assert_eq!(tracker.max_volume().unwrap().0, 0);
}

#[test]
/// Test that a volume overflow is rejected and leaves the stock unchanged.
fn test_volume_overflow_is_rejected() {
    let mut tracker = StockTracker::new();
    tracker.insert_new_stock(1, 10.0).unwrap();
    tracker.increase_volume(1, u64::MAX - 1).unwrap();

    assert_eq!(
        tracker.increase_volume(1, 2),
        Err(TrackerError::VolumeOverflow {
            id: 1,
            volume: u64::MAX - 1,
            delta: 2
        })
    );
    assert_eq!(tracker.lookup_by_id(1).unwrap().volume, u64::MAX - 1);
    assert_eq!(tracker.max_volume().unwrap().0, u64::MAX - 1);
}

#[test]
/// Test that stocks sharing a price are each repriced independently.
fn test_duplicate_prices() {
    let mut tracker = StockTracker::new();
    for id in [4, 1, 3, 2] {
        tracker.insert_new_stock(id, 50.0).unwrap();
    }
    assert_eq!(
        tracker.price_range(50.0, 50.0).unwrap(),
        vec![1, 2, 3, 4],
        "Equal prices are ordered by identifier"
    );

    // Moving stock 3 must move exactly stock 3, not another node at 50
    tracker.update_price(3, 51.0).unwrap();
    assert_eq!(tracker.price_range(50.0, 50.0).unwrap(), vec![1, 2, 4]);
    assert_eq!(tracker.price_range(51.0, 51.0).unwrap(), vec![3]);

    tracker.update_price(1, 51.0).unwrap();
    assert_eq!(tracker.price_range(50.0, 51.0).unwrap(), vec![2, 4, 1, 3]);
}

#[test]
/// Test repricing a stock to its current price.
fn test_update_to_same_price() {
    let mut tracker = StockTracker::new();
    tracker.insert_new_stock(1, 10.0).unwrap();
    tracker.update_price(1, 10.0).unwrap();

    assert_eq!(tracker.price_range(10.0, 10.0).unwrap(), vec![1]);
    assert_eq!(tracker.price_index().len(), 1);
}

#[test]
/// Test the boundary handling of range queries.
fn test_price_range_boundaries() {
    let mut tracker = StockTracker::new();
    for (id, listing_price) in [(1, 99.99), (2, 100.00), (3, 100.01)] {
        tracker.insert_new_stock(id, listing_price).unwrap();
    }

    assert_eq!(
        tracker.price_range(100.0, 100.0).unwrap(),
        vec![2],
        "Bounds are inclusive"
    );
    assert_eq!(tracker.price_range(99.99, 100.01).unwrap(), vec![1, 2, 3]);
    assert!(matches!(
        tracker.price_range(100.01, 99.99),
        Err(TrackerError::InvalidRange { .. })
    ));
    assert!(matches!(
        tracker.price_range(f64::NAN, 100.0),
        Err(TrackerError::InvalidPrice { .. })
    ));
}

#[test]
/// Test that unrepresentable prices are rejected before anything is mutated.
fn test_invalid_prices() {
    let mut tracker = StockTracker::new();
    assert!(matches!(
        tracker.insert_new_stock(1, f64::NAN),
        Err(TrackerError::InvalidPrice { .. })
    ));
    assert!(tracker.is_empty(), "A rejected listing must not register the stock");

    tracker.insert_new_stock(1, 10.0).unwrap();
    assert!(matches!(
        tracker.update_price(1, f64::INFINITY),
        Err(TrackerError::InvalidPrice { .. })
    ));
    assert_eq!(tracker.lookup_by_id(1).unwrap().price, 10.0);
    assert_eq!(tracker.price_range(10.0, 10.0).unwrap(), vec![1]);
}

#[test]
/// Test that prices are stored and compared exactly, without rounding to a coarser grid.
fn test_prices_are_kept_exactly() {
    let sum = 0.1 + 0.2;
    assert_ne!(sum, 0.3);

    let mut tracker = StockTracker::new();
    tracker.insert_new_stock(1, 0.3).unwrap();
    tracker.insert_new_stock(2, sum).unwrap();
    tracker.insert_new_stock(3, 1.0).unwrap();

    assert_eq!(tracker.lookup_by_id(2).unwrap().price, sum, "Lookup returns the given price");
    assert_eq!(tracker.price_range(sum, sum).unwrap(), vec![2]);
    assert_eq!(tracker.price_range(0.3, 0.3).unwrap(), vec![1]);
    assert!(
        tracker.price_range(1.0000000000000002, 2.0).unwrap().is_empty(),
        "A stock at 1.0 lies below the next representable price"
    );

    let event = tracker.insert_new_stock(4, 1e-30).unwrap();
    assert_eq!(event, StockEvent::Listed { id: 4, price: 1e-30 });
    tracker.insert_new_stock(5, 0.0).unwrap();
    assert_eq!(tracker.price_range(1e-31, 0.3).unwrap(), vec![4, 1]);
    assert_eq!(tracker.price_range(0.0, 0.0).unwrap(), vec![5]);

    tracker.update_price(2, 0.3).unwrap();
    assert_eq!(tracker.price_range(0.3, 0.3).unwrap(), vec![1, 2]);
    assert!(tracker.price_range(sum, sum).unwrap().is_empty());
}

#[test]
/// Test that a compaction ratio set directly on the field is raised to the minimum.
fn test_compaction_ratio_is_clamped() {
    let config = TrackerConfig {
        initial_capacity: 0,
        heap_compaction_ratio: Some(1),
    };
    let mut tracker = StockTracker::with_config(config);
    assert_eq!(tracker.config().heap_compaction_ratio, Some(2));

    for id in 0..4 {
        tracker.insert_new_stock(id, 10.0).unwrap();
    }
    for id in 0..4 {
        tracker.increase_volume(id, 1).unwrap();
    }
    assert_eq!(
        tracker.pending_heap_entries(),
        8,
        "Twice as many entries as stocks stays under a ratio of 2"
    );

    tracker.increase_volume(0, 1).unwrap();
    assert_eq!(tracker.pending_heap_entries(), 4, "Compaction keeps one entry per stock");
}

#[test]
/// Test that iterating over the tracked stocks yields every current record.
fn test_stocks_iterator() {
    let mut tracker = StockTracker::new();
    for id in 1..=5 {
        tracker.insert_new_stock(id, id as f64).unwrap();
        let event = tracker.increase_volume(id, id * 10).unwrap();
        assert_eq!(event.id(), id);
    }
    tracker.update_price(3, 30.0).unwrap();

    assert_eq!(tracker.stocks().count(), 5);
    assert_eq!(tracker.stocks().map(|stock| stock.volume).sum::<u64>(), 150);
    let repriced = tracker.stocks().find(|stock| stock.id == 3).unwrap();
    assert_eq!(repriced.price, 30.0, "The iterator reflects the latest price");
}

#[test]
/// Test that heap compaction bounds the number of stale snapshots.
fn test_heap_compaction() {
    let config = TrackerConfig::new()
        .with_initial_capacity(16)
        .with_heap_compaction_ratio(2);
    let mut tracker = StockTracker::with_config(config);
    for id in 0..4 {
        tracker.insert_new_stock(id, 10.0 + id as f64).unwrap();
    }

    for round in 1..=50 {
        for id in 0..4 {
            tracker.increase_volume(id, round).unwrap();
            assert!(
                tracker.pending_heap_entries() <= 2 * tracker.len(),
                "Heap holds {} entries for {} stocks",
                tracker.pending_heap_entries(),
                tracker.len()
            );
        }
    }

    let (volume, stock) = tracker.max_volume().unwrap();
    assert_eq!(volume, (1..=50).sum::<u64>());
    assert_eq!(stock.id, 0, "All volumes tie, so the smallest identifier wins");
}

#[test]
/// Test that without compaction stale snapshots stay until explicitly compacted.
fn test_lazy_heap_without_compaction() {
    let mut tracker = StockTracker::new();
    tracker.insert_new_stock(1, 10.0).unwrap();
    for _ in 0..10 {
        tracker.increase_volume(1, 1).unwrap();
    }
    assert_eq!(tracker.pending_heap_entries(), 11);

    tracker.compact_volume_heap();
    assert_eq!(tracker.pending_heap_entries(), 1);
    assert_eq!(tracker.max_volume().unwrap().0, 10);
}

#[test]
/// Test that the tracker correctly handles concurrent access.
fn test_concurrent_access_smoke_test() {
    use std::thread;

    let tracker_arc = StockTracker::new().into_shared();

    let mut thread_handles = vec![];
    let stocks_per_thread = 250;
    let number_of_threads = 4;

    for thread_id in 0..number_of_threads {
        let tracker_clone = Arc::clone(&tracker_arc);

        thread_handles.push(thread::spawn(move || {
            for stock_index in 0..stocks_per_thread {
                let id = (thread_id * stocks_per_thread + stock_index) as u64;

                // 1. Writer lists, reprices and trades under one write lock
                {
                    let mut tracker = tracker_clone.write();
                    tracker.insert_new_stock(id, 100.0).unwrap();
                    tracker.update_price(id, 100.0 + id as f64 * 0.01).unwrap();
                    tracker.increase_volume(id, id + 1).unwrap();
                }

                // 2. Readers check the stock and a range (read lock)
                {
                    let tracker = tracker_clone.read();
                    let stock = tracker.lookup_by_id(id).unwrap();
                    assert_eq!(stock.volume, id + 1);
                    let _range = tracker.price_range(100.0, 105.0).unwrap();
                }

                // 3. The max-volume query needs the write lock
                let _max = tracker_clone.write().max_volume().unwrap();
            }
        }));
    }

    for thread_handle in thread_handles {
        thread_handle.join().unwrap();
    }

    let total_stocks = (stocks_per_thread * number_of_threads) as u64;
    let mut tracker = tracker_arc.write();
    assert_eq!(tracker.len() as u64, total_stocks);
    assert_eq!(tracker.price_index().len() as u64, total_stocks);
    let (volume, stock) = tracker.max_volume().unwrap();
    assert_eq!(stock.id, total_stocks - 1);
    assert_eq!(volume, total_stocks);
}
