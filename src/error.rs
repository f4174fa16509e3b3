use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum KdKnnError {
    /// The read-only accessor was asked for a point the tree does not hold.
    #[error("Point not found in the KD-Tree")]
    PointNotFound,

    /// A value was dequeued from an empty bounded priority queue.
    #[error("Cannot dequeue from an empty queue")]
    EmptyQueue,

    #[error("Expected {expected} coordinates, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, KdKnnError>;
