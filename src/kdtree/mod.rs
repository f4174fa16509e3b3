//! A balanced, mutable k-d tree over fixed-dimension points.

#![warn(missing_docs)]

mod builder;
mod index;
mod r#trait;
mod traversal;

pub use builder::KDTreeBuilder;
pub use index::{KDTree, KDTreeRef, TreeNode};
pub use r#trait::KDTreeIndex;
pub use traversal::Node;
