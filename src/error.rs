//! Error types for stock tracker operations

use crate::types::StockId;
use thiserror::Error;

/// Main error type for stock tracker operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    /// No stock is tracked under this identifier
    #[error("Stock not found: {id}")]
    NotFound { id: StockId },

    /// A stock is already tracked under this identifier
    #[error("Stock already exists: {id}")]
    AlreadyExists { id: StockId },

    /// The queried index holds no entries
    #[error("Index is empty")]
    EmptyIndex,

    /// An internal invariant between the indexes was violated
    #[error("Corrupted tracker state: {reason}")]
    CorruptedState { reason: String },

    /// The price is NaN or infinite
    #[error("Invalid price: {value}")]
    InvalidPrice { value: f64 },

    /// The lower bound of a range query exceeds the upper bound
    #[error("Invalid price range: low {low} is greater than high {high}")]
    InvalidRange { low: f64, high: f64 },

    /// Adding the delta would overflow the stock's volume
    #[error("Volume overflow for stock {id}: {volume} + {delta}")]
    VolumeOverflow {
        id: StockId,
        volume: u64,
        delta: u64,
    },
}

impl TrackerError {
    /// Whether the error denotes a bug rather than bad input.
    pub fn is_programming_error(&self) -> bool {
        matches!(self, TrackerError::CorruptedState { .. })
    }
}

/// Result type alias for stock tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;
