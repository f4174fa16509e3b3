#![doc = include_str!("../README.md")]

pub mod classify;
pub mod dataset;
mod error;
pub mod kdtree;
mod point;
mod queue;
mod r#type;

pub use error::{KdKnnError, Result};
pub use point::Point;
pub use queue::BoundedPriorityQueue;
pub use r#type::IndexableNum;
