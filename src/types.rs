use ordered_float::OrderedFloat;

/// Unique identifier of a tracked stock.
pub type StockId = u64;

/// A single tracked instrument.
///
/// The record is owned by the identity index; the price index and the volume
/// heap only refer to it through its `id`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stock {
    /// The identifier, fixed once the stock is listed
    pub id: StockId,
    /// The current price, exactly as given by the caller
    pub price: f64,
    /// The total traded volume, never decreasing
    pub volume: u64,
}

impl Stock {
    /// Creates a freshly listed stock with zero volume.
    pub fn new(id: StockId, price: f64) -> Self {
        Self {
            id,
            price,
            volume: 0,
        }
    }
}

/// Key of the price index.
///
/// Ordered by price first and identifier second, so that several stocks
/// sharing a price each own a distinct, addressable node. Prices compare as
/// exact `f64` values under the total order of `OrderedFloat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriceKey {
    /// The price the stock is indexed under
    pub price: OrderedFloat<f64>,
    /// The stock carrying that price
    pub id: StockId,
}

impl PriceKey {
    /// Creates the key of `id` indexed under `price`.
    pub fn new(price: f64, id: StockId) -> Self {
        Self {
            price: OrderedFloat(price),
            id,
        }
    }
}

/// Represents an event published by the `StockTracker` when a mutation is applied.
///
/// Every mutating operation reports one of these, including the idempotent
/// re-listing of a known stock, so that callers can tell "already consistent"
/// apart from an actual change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StockEvent {
    /// A new stock was inserted with zero volume
    Listed { id: StockId, price: f64 },
    /// The stock was already tracked; nothing changed
    AlreadyListed { id: StockId },
    /// The stock moved from `previous` to `current` in the price index
    Repriced {
        id: StockId,
        previous: f64,
        current: f64,
    },
    /// The stock's volume grew by `delta`, reaching `total`
    VolumeIncreased {
        id: StockId,
        delta: u64,
        total: u64,
    },
}

impl StockEvent {
    /// The stock the event refers to.
    pub fn id(&self) -> StockId {
        match *self {
            StockEvent::Listed { id, .. }
            | StockEvent::AlreadyListed { id }
            | StockEvent::Repriced { id, .. }
            | StockEvent::VolumeIncreased { id, .. } => id,
        }
    }

    /// Whether the event reflects a change of state.
    pub fn is_change(&self) -> bool {
        !matches!(self, StockEvent::AlreadyListed { .. })
    }
}
