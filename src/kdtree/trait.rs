use tinyvec::TinyVec;

use crate::error::{KdKnnError, Result};
use crate::kdtree::{Node, TreeNode};
use crate::point::Point;
use crate::queue::BoundedPriorityQueue;
use crate::r#type::IndexableNum;

/// A trait for searching and accessing data out of a KDTree.
pub trait KDTreeIndex<N: IndexableNum, const D: usize, L>: Sized {
    /// The underlying node arena of this tree
    fn nodes(&self) -> &[TreeNode<N, D, L>];

    /// Arena index of the root node, or `None` if the tree is empty
    fn root_id(&self) -> Option<usize>;

    /// The number of coordinates of every point in this tree
    fn dimension(&self) -> usize {
        D
    }

    /// The number of points in this tree
    fn len(&self) -> usize {
        self.nodes().len()
    }

    /// Whether this tree holds no points
    fn is_empty(&self) -> bool {
        self.nodes().is_empty()
    }

    /// The number of levels of this tree. An empty tree has depth 0.
    fn depth(&self) -> usize {
        self.nodes()
            .iter()
            .map(|node| node.level + 1)
            .max()
            .unwrap_or(0)
    }

    /// Whether `point` is in this tree.
    fn contains(&self, point: &Point<N, D>) -> bool {
        self.get(point).is_some()
    }

    /// The label bound to `point`, or `None` if the point is not in this tree.
    fn get(&self, point: &Point<N, D>) -> Option<&L> {
        let nodes = self.nodes();
        locate(nodes, self.root_id(), point)
            .map(|id| &nodes[id])
            .filter(|node| node.point == *point)
            .map(|node| &node.label)
    }

    /// The label bound to `point`.
    ///
    /// Fails with [`KdKnnError::PointNotFound`] if the point is not in this tree.
    fn at(&self, point: &Point<N, D>) -> Result<&L> {
        self.get(point).ok_or(KdKnnError::PointNotFound)
    }

    /// Find the (up to) `k` points nearest to `query`.
    ///
    /// Returns `(label, squared distance)` pairs ordered from nearest to farthest.
    fn nearest(&self, query: &Point<N, D>, k: usize) -> Vec<(&L, N)> {
        search(self.nodes(), self.root_id(), query, k).into_sorted_vec()
    }

    /// The most common label among the `k` points nearest to `query`.
    ///
    /// Returns `None` if the tree is empty or `k` is 0. When several labels are equally common,
    /// the one belonging to the nearest of the tied neighbors is returned.
    ///
    /// ```
    /// use kdknn::kdtree::{KDTree, KDTreeIndex};
    /// use kdknn::Point;
    ///
    /// let tree = KDTree::from_points(vec![
    ///     (Point::new([0., 0.]), 'A'),
    ///     (Point::new([10., 10.]), 'B'),
    ///     (Point::new([0., 1.]), 'A'),
    ///     (Point::new([9., 9.]), 'B'),
    /// ]);
    ///
    /// assert_eq!(tree.knn(&Point::new([0., 0.5]), 1), Some('A'));
    /// assert_eq!(tree.knn(&Point::new([0., 0.5]), 3), Some('A'));
    /// ```
    fn knn(&self, query: &Point<N, D>, k: usize) -> Option<L>
    where
        L: Clone + PartialEq,
    {
        let neighbors = self.nearest(query, k);

        // count occurrences of each label, nearest first
        let mut tally: Vec<(&L, usize)> = vec![];
        for (label, _) in neighbors {
            match tally.iter_mut().find(|(seen, _)| *seen == label) {
                Some((_, count)) => *count += 1,
                None => tally.push((label, 1)),
            }
        }

        let mut result: Option<(&L, usize)> = None;
        for (label, count) in tally {
            if result.map_or(true, |(_, best)| count > best) {
                result = Some((label, count));
            }
        }
        result.map(|(label, _)| label.clone())
    }

    /// Like [`knn`][KDTreeIndex::knn], but returns `L::default()` when there is no neighbor.
    fn knn_or_default(&self, query: &Point<N, D>, k: usize) -> L
    where
        L: Clone + PartialEq + Default,
    {
        self.knn(query, k).unwrap_or_default()
    }

    /// Access the root node of the KDTree for manual traversal.
    fn root(&self) -> Option<Node<'_, N, D, L>> {
        self.root_id().map(|id| Node::new(self.nodes(), id))
    }
}

/// Walk from `root` toward `point`.
///
/// Returns the node holding `point` if present. Otherwise returns the last node visited, which is
/// the node `point` would be attached below. Returns `None` only for an empty tree.
pub(crate) fn locate<N: IndexableNum, const D: usize, L>(
    nodes: &[TreeNode<N, D, L>],
    root: Option<usize>,
    point: &Point<N, D>,
) -> Option<usize> {
    let mut id = root?;
    loop {
        let node = &nodes[id];
        if node.point == *point {
            return Some(id);
        }
        let next = if node.goes_left(point) {
            node.left
        } else {
            node.right
        };
        match next {
            Some(child) => id = child,
            None => return Some(id),
        }
    }
}

/// Branch-and-bound search for the `k` nearest neighbors of `query`.
///
/// Visits the side of each splitting plane containing `query` first. The other side is visited
/// afterwards only if fewer than `k` candidates have been found or the plane is strictly closer
/// than the current k-th best candidate.
pub(crate) fn search<'a, N: IndexableNum, const D: usize, L>(
    nodes: &'a [TreeNode<N, D, L>],
    root: Option<usize>,
    query: &Point<N, D>,
    k: usize,
) -> BoundedPriorityQueue<&'a L, N> {
    let mut queue = BoundedPriorityQueue::new(k);
    let Some(root) = root else {
        return queue;
    };
    if k == 0 {
        return queue;
    }

    // Each entry is a node id and whether its near side has already been searched. Use TinyVec
    // to avoid heap allocations on balanced trees.
    let mut stack: TinyVec<[(usize, bool); 64]> = TinyVec::new();
    stack.push((root, false));

    while let Some((id, near_done)) = stack.pop() {
        let node = &nodes[id];
        let axis = node.axis();
        let gap = query[axis] - node.point[axis];
        let (near, far) = if node.goes_left(query) {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if near_done {
            // both sides are compared in squared units
            if !queue.is_full() || gap * gap < queue.worst() {
                if let Some(far) = far {
                    stack.push((far, false));
                }
            }
            continue;
        }

        queue.enqueue(&node.label, node.point.sq_dist(query));

        // Note: these are pushed in backwards order to what gets popped
        stack.push((id, true));
        if let Some(near) = near {
            stack.push((near, false));
        }
    }

    queue
}
