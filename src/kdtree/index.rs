use crate::error::{KdKnnError, Result};
use crate::kdtree::builder::build;
use crate::kdtree::r#trait::locate;
use crate::kdtree::KDTreeIndex;
use crate::point::Point;
use crate::r#type::IndexableNum;

/// A single node of a [`KDTree`].
///
/// Every point in the left subtree of a node at level `L` has coordinate `L mod D` strictly less
/// than the node's own; every point in the right subtree has it greater or equal.
#[derive(Debug, Clone)]
pub struct TreeNode<N: IndexableNum, const D: usize, L> {
    pub(crate) point: Point<N, D>,
    pub(crate) label: L,
    pub(crate) level: usize,
    pub(crate) left: Option<usize>,
    pub(crate) right: Option<usize>,
}

impl<N: IndexableNum, const D: usize, L> TreeNode<N, D, L> {
    pub(crate) fn new(point: Point<N, D>, label: L, level: usize) -> Self {
        Self {
            point,
            label,
            level,
            left: None,
            right: None,
        }
    }

    /// The point stored in this node.
    pub fn point(&self) -> &Point<N, D> {
        &self.point
    }

    /// The label bound to this node's point.
    pub fn label(&self) -> &L {
        &self.label
    }

    /// Depth of this node, starting at 0 for the root.
    pub fn level(&self) -> usize {
        self.level
    }

    /// The coordinate this node splits its children on.
    #[inline]
    pub fn axis(&self) -> usize {
        self.level % D
    }

    /// Arena index of the left child, if any.
    pub fn left(&self) -> Option<usize> {
        self.left
    }

    /// Arena index of the right child, if any.
    pub fn right(&self) -> Option<usize> {
        self.right
    }

    /// The child `point` would descend into from this node.
    #[inline]
    pub(crate) fn goes_left(&self, point: &Point<N, D>) -> bool {
        let axis = self.axis();
        point[axis] < self.point[axis]
    }
}

/// An owned, mutable k-d tree mapping points to labels.
///
/// Nodes live in an arena addressed by index; each node is owned by exactly one slot and is never
/// removed individually. Cloning produces a fully independent copy of every node.
///
/// Usually this will be created in bulk via [`KDTree::from_points`] or
/// [`KDTreeBuilder`][crate::kdtree::KDTreeBuilder], which produce a balanced tree. Later calls to
/// [`insert`][KDTree::insert] do not rebalance.
#[derive(Debug)]
pub struct KDTree<N: IndexableNum, const D: usize, L> {
    pub(crate) nodes: Vec<TreeNode<N, D, L>>,
    pub(crate) root: Option<usize>,
}

impl<N: IndexableNum, const D: usize, L> KDTree<N, D, L> {
    /// Create an empty tree.
    pub fn new() -> Self {
        assert!(D > 0, "Points must have at least one dimension.");
        Self {
            nodes: vec![],
            root: None,
        }
    }

    /// Build a balanced tree from a collection of `(point, label)` pairs.
    ///
    /// The order of `points` is not preserved. If the same point appears more than once, the
    /// label of its last occurrence wins, as if the pairs had been inserted one at a time.
    pub fn from_points(points: Vec<(Point<N, D>, L)>) -> Self {
        assert!(D > 0, "Points must have at least one dimension.");
        let (nodes, root) = build(points);
        Self { nodes, root }
    }

    /// A borrowed view onto this tree.
    pub fn as_ref(&self) -> KDTreeRef<'_, N, D, L> {
        KDTreeRef {
            nodes: &self.nodes,
            root: self.root,
        }
    }

    /// Insert `point` with the given label.
    ///
    /// If the point is already present only its label is overwritten.
    pub fn insert(&mut self, point: Point<N, D>, label: L) {
        match self.locate(&point) {
            Some(id) if self.nodes[id].point == point => self.nodes[id].label = label,
            parent => {
                self.attach(parent, point, label);
            }
        }
    }

    /// A mutable reference to the label bound to `point`.
    ///
    /// Fails with [`KdKnnError::PointNotFound`] if the point is not in the tree.
    pub fn at_mut(&mut self, point: &Point<N, D>) -> Result<&mut L> {
        match self.locate(point) {
            Some(id) if self.nodes[id].point == *point => Ok(&mut self.nodes[id].label),
            _ => Err(KdKnnError::PointNotFound),
        }
    }

    /// A mutable reference to the label bound to `point`, inserting `default` first if the point
    /// is absent.
    pub fn get_or_insert(&mut self, point: Point<N, D>, default: L) -> &mut L {
        self.get_or_insert_with(point, || default)
    }

    /// A mutable reference to the label bound to `point`, inserting the label returned by `f`
    /// first if the point is absent.
    pub fn get_or_insert_with<F: FnOnce() -> L>(&mut self, point: Point<N, D>, f: F) -> &mut L {
        let id = match self.locate(&point) {
            Some(id) if self.nodes[id].point == point => id,
            parent => self.attach(parent, point, f()),
        };
        &mut self.nodes[id].label
    }

    /// Iterate over all `(point, label)` pairs in the tree, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Point<N, D>, &L)> + '_ {
        self.nodes.iter().map(|node| (&node.point, &node.label))
    }

    fn locate(&self, point: &Point<N, D>) -> Option<usize> {
        locate(&self.nodes, self.root, point)
    }

    /// Add a new node below `parent`, or as the root if the tree is empty. Returns its id.
    fn attach(&mut self, parent: Option<usize>, point: Point<N, D>, label: L) -> usize {
        let id = self.nodes.len();
        match parent {
            None => {
                debug_assert!(self.root.is_none());
                self.nodes.push(TreeNode::new(point, label, 0));
                self.root = Some(id);
            }
            Some(parent) => {
                let parent_node = &mut self.nodes[parent];
                let level = parent_node.level + 1;
                if parent_node.goes_left(&point) {
                    debug_assert!(parent_node.left.is_none());
                    parent_node.left = Some(id);
                } else {
                    debug_assert!(parent_node.right.is_none());
                    parent_node.right = Some(id);
                }
                self.nodes.push(TreeNode::new(point, label, level));
            }
        }
        id
    }
}

impl<N: IndexableNum, const D: usize, L: Default> KDTree<N, D, L> {
    /// A mutable reference to the label bound to `point`, inserting `L::default()` first if the
    /// point is absent.
    pub fn get_or_insert_default(&mut self, point: Point<N, D>) -> &mut L {
        self.get_or_insert_with(point, L::default)
    }
}

impl<N: IndexableNum, const D: usize, L> Default for KDTree<N, D, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: IndexableNum, const D: usize, L: Clone> Clone for KDTree<N, D, L> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
        }
    }

    /// Release this tree's nodes and replace them with a deep copy of `source`'s.
    fn clone_from(&mut self, source: &Self) {
        self.nodes.clone_from(&source.nodes);
        self.root = source.root;
    }
}

impl<N: IndexableNum, const D: usize, L> FromIterator<(Point<N, D>, L)> for KDTree<N, D, L> {
    fn from_iter<T: IntoIterator<Item = (Point<N, D>, L)>>(iter: T) -> Self {
        Self::from_points(iter.into_iter().collect())
    }
}

/// A reference onto an existing [`KDTree`].
///
/// Queries only read the tree, so a `KDTreeRef` can be shared freely between worker threads once
/// the tree is no longer being mutated.
#[derive(Debug)]
pub struct KDTreeRef<'a, N: IndexableNum, const D: usize, L> {
    pub(crate) nodes: &'a [TreeNode<N, D, L>],
    pub(crate) root: Option<usize>,
}

impl<N: IndexableNum, const D: usize, L> Clone for KDTreeRef<'_, N, D, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N: IndexableNum, const D: usize, L> Copy for KDTreeRef<'_, N, D, L> {}

impl<N: IndexableNum, const D: usize, L> KDTreeIndex<N, D, L> for KDTree<N, D, L> {
    fn nodes(&self) -> &[TreeNode<N, D, L>] {
        &self.nodes
    }

    fn root_id(&self) -> Option<usize> {
        self.root
    }
}

impl<N: IndexableNum, const D: usize, L> KDTreeIndex<N, D, L> for KDTreeRef<'_, N, D, L> {
    fn nodes(&self) -> &[TreeNode<N, D, L>] {
        self.nodes
    }

    fn root_id(&self) -> Option<usize> {
        self.root
    }
}
