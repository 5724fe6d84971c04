use crate::error::{Result, TrackerError};
use crate::types::{Stock, StockId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// The identity index: owns every `Stock` record, keyed by identifier.
///
/// This is the source of truth for current prices and volumes. Records are
/// created once and mutated in place afterwards; they are never replaced.
#[derive(Debug, Default)]
pub struct StockRegistry {
    stocks: HashMap<StockId, Stock>,
}

impl StockRegistry {
    pub fn new() -> Self {
        StockRegistry {
            stocks: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        StockRegistry {
            stocks: HashMap::with_capacity(capacity),
        }
    }

    /// Returns whether a stock is registered under `id`. Expected $O(1)$.
    pub fn contains(&self, id: StockId) -> bool {
        self.stocks.contains_key(&id)
    }

    /// Returns the record registered under `id`, or `NotFound`.
    pub fn get(&self, id: StockId) -> Result<&Stock> {
        self.stocks.get(&id).ok_or(TrackerError::NotFound { id })
    }

    pub fn get_mut(&mut self, id: StockId) -> Result<&mut Stock> {
        self.stocks.get_mut(&id).ok_or(TrackerError::NotFound { id })
    }

    /// Registers a new record.
    ///
    /// ## Errors
    ///
    /// `AlreadyExists` if the identifier is taken; the existing record is kept.
    ///
    /// ## Examples
    ///
    /// ```
    /// use stock_tracker::{Stock, StockRegistry, TrackerError};
    ///
    /// let mut registry = StockRegistry::new();
    /// registry.insert(Stock::new(1, 10.0)).unwrap();
    ///
    /// let duplicate = registry.insert(Stock::new(1, 99.0));
    /// assert_eq!(duplicate, Err(TrackerError::AlreadyExists { id: 1 }));
    /// assert_eq!(registry.get(1).unwrap().price, 10.0);
    /// ```
    pub fn insert(&mut self, stock: Stock) -> Result<()> {
        match self.stocks.entry(stock.id) {
            Entry::Occupied(_) => Err(TrackerError::AlreadyExists { id: stock.id }),
            Entry::Vacant(slot) => {
                slot.insert(stock);
                Ok(())
            }
        }
    }

    /// Returns the live volume of `id`, if registered.
    pub fn volume_of(&self, id: StockId) -> Option<u64> {
        self.stocks.get(&id).map(|stock| stock.volume)
    }

    /// Iterates over all records in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Stock> {
        self.stocks.values()
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }
}
