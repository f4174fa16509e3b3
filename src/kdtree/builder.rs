use std::cmp::{self, Ordering};

use crate::kdtree::{KDTree, TreeNode};
use crate::point::Point;
use crate::r#type::IndexableNum;

/// A builder to create a balanced [`KDTree`] from points added one at a time.
///
/// ```
/// use kdknn::kdtree::{KDTreeBuilder, KDTreeIndex};
/// use kdknn::Point;
///
/// let mut builder = KDTreeBuilder::new(3);
/// builder.add(Point::new([1., 2.]), "a");
/// builder.add(Point::new([3., 4.]), "b");
/// builder.add(Point::new([5., 6.]), "c");
/// let tree = builder.finish();
///
/// assert_eq!(tree.len(), 3);
/// assert_eq!(tree.at(&Point::new([3., 4.])).unwrap(), &"b");
/// ```
#[derive(Debug, Clone)]
pub struct KDTreeBuilder<N: IndexableNum, const D: usize, L> {
    items: Vec<(Point<N, D>, L)>,
}

impl<N: IndexableNum, const D: usize, L> KDTreeBuilder<N, D, L> {
    /// Create a new builder with room for the provided number of items.
    pub fn new(num_items: usize) -> Self {
        Self {
            items: Vec::with_capacity(num_items),
        }
    }

    /// Add a point to the index. Returns the insertion index of the point.
    pub fn add(&mut self, point: Point<N, D>, label: L) -> usize {
        self.items.push((point, label));
        self.items.len() - 1
    }

    /// Consume this builder, performing the median splits and generating a KDTree ready for
    /// queries.
    pub fn finish(self) -> KDTree<N, D, L> {
        KDTree::from_points(self.items)
    }
}

impl<N: IndexableNum, const D: usize, L> Default for KDTreeBuilder<N, D, L> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<N: IndexableNum, const D: usize, L> Extend<(Point<N, D>, L)> for KDTreeBuilder<N, D, L> {
    fn extend<T: IntoIterator<Item = (Point<N, D>, L)>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

/// Child links of the node that ends up at a given position of the kd-sorted items.
#[derive(Debug, Clone, Copy, Default)]
struct Link {
    level: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// kd-sort `items` and turn them into a node arena. Returns the nodes and the root id.
///
/// The node for each range is the element at its split position, so a node's arena id is its
/// position in the kd-sorted items.
pub(crate) fn build<N: IndexableNum, const D: usize, L>(
    mut items: Vec<(Point<N, D>, L)>,
) -> (Vec<TreeNode<N, D, L>>, Option<usize>) {
    let num_input = items.len();
    dedup_points(&mut items);
    if items.len() < num_input {
        log::debug!(
            "Dropped {} duplicate points while building KD-Tree",
            num_input - items.len()
        );
    }

    let num_items = items.len();
    let mut links = vec![Link::default(); num_items];
    let mut root = None;

    // (start, end, level, parent and whether this range is its left child)
    let mut stack: Vec<(usize, usize, usize, Option<(usize, bool)>)> =
        vec![(0, num_items, 0, None)];
    while let Some((start, end, level, parent)) = stack.pop() {
        if start >= end {
            continue;
        }

        let m = start + split(&mut items[start..end], level % D);
        links[m].level = level;
        match parent {
            None => root = Some(m),
            Some((p, true)) => links[p].left = Some(m),
            Some((p, false)) => links[p].right = Some(m),
        }

        stack.push((m + 1, end, level + 1, Some((m, false))));
        stack.push((start, m, level + 1, Some((m, true))));
    }

    let nodes: Vec<_> = items
        .into_iter()
        .zip(links)
        .map(|((point, label), link)| TreeNode {
            point,
            label,
            level: link.level,
            left: link.left,
            right: link.right,
        })
        .collect();

    let depth = nodes.iter().map(|node| node.level + 1).max().unwrap_or(0);
    log::debug!("Built KD-Tree with {} points and depth {}", num_items, depth);
    let balanced_depth = (usize::BITS - num_items.leading_zeros()) as usize;
    if depth > 4 * balanced_depth + D {
        log::warn!(
            "KD-Tree depth {} is far above the balanced depth {}; many points share coordinate values",
            depth,
            balanced_depth
        );
    }

    (nodes, root)
}

/// Remove repeated points, keeping the label of the last occurrence of each.
fn dedup_points<N: IndexableNum, const D: usize, L>(items: &mut Vec<(Point<N, D>, L)>) {
    items.sort_by(|(a, _), (b, _)| lexicographic_cmp(a, b));
    items.dedup_by(|later, kept| {
        if later.0 == kept.0 {
            std::mem::swap(&mut later.1, &mut kept.1);
            true
        } else {
            false
        }
    });
}

fn lexicographic_cmp<N: IndexableNum, const D: usize>(
    a: &Point<N, D>,
    b: &Point<N, D>,
) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.partial_cmp(y).unwrap_or(Ordering::Equal))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Partition `items` around the median on `axis` and return the split position.
///
/// Afterwards every element before the split is strictly less than the split element on `axis`,
/// and every element after it is greater or equal. All elements equal to the median go to the
/// right, which keeps the strict-less invariant of the left subtree.
fn split<N: IndexableNum, const D: usize, L>(
    items: &mut [(Point<N, D>, L)],
    axis: usize,
) -> usize {
    let k = items.len() >> 1;
    if items.len() > 1 {
        select(items, k, 0, items.len() - 1, axis);
    }

    // gather elements equal to the median directly in front of it
    let t = items[k].0[axis];
    let mut lo = 0;
    for i in 0..k {
        if items[i].0[axis] < t {
            items.swap(i, lo);
            lo += 1;
        }
    }
    lo
}

/// Custom Floyd-Rivest selection algorithm: sort items so that [left..k-1] items are no greater
/// than the k-th item, and [k+1..right] items are no smaller, on the given axis.
#[inline]
fn select<N: IndexableNum, const D: usize, L>(
    items: &mut [(Point<N, D>, L)],
    k: usize,
    mut left: usize,
    mut right: usize,
    axis: usize,
) {
    while right > left {
        if right - left > 600 {
            let n = (right - left + 1) as f64;
            let m = (k - left + 1) as f64;
            let z = f64::ln(n);
            let s = 0.5 * f64::exp((2.0 * z) / 3.0);
            let sd = 0.5
                * f64::sqrt((z * s * (n - s)) / n)
                * (if m - n / 2.0 < 0.0 { -1.0 } else { 1.0 });
            let new_left = cmp::max(left, f64::floor(k as f64 - (m * s) / n + sd) as usize);
            let new_right = cmp::min(
                right,
                f64::floor(k as f64 + ((n - m) * s) / n + sd) as usize,
            );
            select(items, k, new_left, new_right, axis);
        }

        let t = items[k].0[axis];
        let mut i = left;
        let mut j = right;

        items.swap(left, k);
        if items[right].0[axis] > t {
            items.swap(left, right);
        }

        while i < j {
            items.swap(i, j);
            i += 1;
            j -= 1;
            while items[i].0[axis] < t {
                i += 1;
            }
            while items[j].0[axis] > t {
                j -= 1;
            }
        }

        if items[left].0[axis] == t {
            items.swap(left, j);
        } else {
            j += 1;
            items.swap(j, right);
        }

        if j <= k {
            left = j + 1;
        }
        if k <= j {
            right = j.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn axis_values(items: &[(Point<f64, 2>, usize)], axis: usize) -> Vec<f64> {
        items.iter().map(|(p, _)| p[axis]).collect()
    }

    #[test]
    fn select_places_kth_element() {
        let values = [7., 3., 9., 1., 5., 8., 2., 6., 4., 0.];
        let mut items: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| (Point::new([v, 0.]), i))
            .collect();
        let last = items.len() - 1;
        select(&mut items, 4, 0, last, 0);

        let xs = axis_values(&items, 0);
        assert_eq!(xs[4], 4.);
        assert!(xs[..4].iter().all(|&x| x <= 4.));
        assert!(xs[5..].iter().all(|&x| x >= 4.));
    }

    #[test]
    fn select_large_range() {
        // exercise the Floyd-Rivest sampling step
        let n = 2000;
        let mut items: Vec<_> = (0..n)
            .map(|i| (Point::new([((i * 7919) % n) as f64, 0.]), i))
            .collect();
        let k = n / 2;
        select(&mut items, k, 0, n - 1, 0);
        assert_eq!(items[k].0[0], k as f64);
    }

    #[test]
    fn split_moves_equal_values_right() {
        let values = [5., 3., 5., 5., 1., 5., 9.];
        let mut items: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| (Point::new([0., v]), i))
            .collect();
        let m = split(&mut items, 1);

        let ys = axis_values(&items, 1);
        assert_eq!(ys[m], 5.);
        assert!(ys[..m].iter().all(|&y| y < 5.));
        assert!(ys[m + 1..].iter().all(|&y| y >= 5.));
    }

    #[test]
    fn duplicate_points_keep_last_label() {
        let mut items = vec![
            (Point::new([1., 1.]), 0),
            (Point::new([2., 2.]), 1),
            (Point::new([1., 1.]), 2),
            (Point::new([1., 1.]), 3),
        ];
        dedup_points(&mut items);
        assert_eq!(items.len(), 2);
        assert!(items.contains(&(Point::new([1., 1.]), 3)));
        assert!(items.contains(&(Point::new([2., 2.]), 1)));
    }
}
