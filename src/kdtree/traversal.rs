//! Utilities to traverse the KDTree structure.

use crate::kdtree::TreeNode;
use crate::point::Point;
use crate::r#type::IndexableNum;

/// A node in the KDTree, borrowed for manual traversal.
#[derive(Debug)]
pub struct Node<'a, N: IndexableNum, const D: usize, L> {
    /// The arena of the tree that this node is a reference onto
    nodes: &'a [TreeNode<N, D, L>],

    id: usize,
}

impl<N: IndexableNum, const D: usize, L> Clone for Node<'_, N, D, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N: IndexableNum, const D: usize, L> Copy for Node<'_, N, D, L> {}

impl<'a, N: IndexableNum, const D: usize, L> Node<'a, N, D, L> {
    pub(crate) fn new(nodes: &'a [TreeNode<N, D, L>], id: usize) -> Self {
        Self { nodes, id }
    }

    #[inline]
    fn inner(&self) -> &'a TreeNode<N, D, L> {
        &self.nodes[self.id]
    }

    /// The arena index of this node.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The point stored in this node.
    pub fn point(&self) -> &'a Point<N, D> {
        &self.inner().point
    }

    /// The label bound to this node's point.
    pub fn label(&self) -> &'a L {
        &self.inner().label
    }

    /// Depth of this node, starting at 0 for the root.
    pub fn level(&self) -> usize {
        self.inner().level
    }

    /// The coordinate the children of this node are split over.
    pub fn axis(&self) -> usize {
        self.inner().axis()
    }

    /// The child holding points strictly less than this node's on [`axis`][Self::axis].
    pub fn left_child(&self) -> Option<Node<'a, N, D, L>> {
        self.inner().left.map(|id| Node::new(self.nodes, id))
    }

    /// The child holding points greater than or equal to this node's on [`axis`][Self::axis].
    pub fn right_child(&self) -> Option<Node<'a, N, D, L>> {
        self.inner().right.map(|id| Node::new(self.nodes, id))
    }

    /// Whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        let node = self.inner();
        node.left.is_none() && node.right.is_none()
    }

    /// The number of nodes in the subtree rooted at this node, including itself.
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![*self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.left_child());
            stack.extend(node.right_child());
        }
        count
    }
}
