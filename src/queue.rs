//! A priority queue with a hard cap on the number of stored elements.
//!
//! Like a high score table, whenever an insertion pushes the queue over its maximum size the
//! element with the *largest* priority is ejected, which may be the element that was just added.
//! The element with the smallest priority is the one handed out by
//! [`dequeue_min`][BoundedPriorityQueue::dequeue_min].

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::{KdKnnError, Result};
use crate::r#type::IndexableNum;

/// A wrapper around a priority and its insertion sequence for use as the ordered map key.
///
/// Equal priorities are ordered by insertion, so the map behaves like an ordered multimap: the
/// last entry is the largest priority, most recently inserted among equals.
#[derive(Debug, Clone, Copy)]
struct QueueKey<N: IndexableNum> {
    priority: N,
    seq: u64,
}

impl<N: IndexableNum> PartialEq for QueueKey<N> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<N: IndexableNum> Eq for QueueKey<N> {}

impl<N: IndexableNum> Ord for QueueKey<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        // We don't allow NaN priorities; they compare equal to everything and fall back to
        // insertion order.
        self.priority
            .partial_cmp(&other.priority)
            .unwrap_or(Ordering::Equal)
            .then(self.seq.cmp(&other.seq))
    }
}

impl<N: IndexableNum> PartialOrd for QueueKey<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A size-capped queue of `(value, priority)` pairs.
///
/// ```
/// use kdknn::BoundedPriorityQueue;
///
/// let mut queue = BoundedPriorityQueue::<&str, f64>::new(2);
/// queue.enqueue("far", 9.0);
/// queue.enqueue("near", 1.0);
/// queue.enqueue("middle", 4.0);
///
/// assert_eq!(queue.len(), 2);
/// assert_eq!(queue.best(), 1.0);
/// assert_eq!(queue.worst(), 4.0);
/// assert_eq!(queue.dequeue_min(), Some("near"));
/// ```
#[derive(Debug, Clone)]
pub struct BoundedPriorityQueue<T, N: IndexableNum> {
    elems: BTreeMap<QueueKey<N>, T>,
    max_size: usize,
    next_seq: u64,
}

impl<T, N: IndexableNum> BoundedPriorityQueue<T, N> {
    /// Create a new, empty queue holding at most `max_size` elements.
    pub fn new(max_size: usize) -> Self {
        Self {
            elems: BTreeMap::new(),
            max_size,
            next_seq: 0,
        }
    }

    /// Add `value` with the given priority.
    ///
    /// If this overflows the maximum size of the queue, the element with the largest priority is
    /// removed. That element may be `value` itself.
    pub fn enqueue(&mut self, value: T, priority: N) {
        let key = QueueKey {
            priority,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.elems.insert(key, value);

        if self.elems.len() > self.max_size {
            self.elems.pop_last();
        }
    }

    /// Remove and return the value with the smallest priority, or `None` if the queue is empty.
    pub fn dequeue_min(&mut self) -> Option<T> {
        self.elems.pop_first().map(|(_, value)| value)
    }

    /// Remove and return the value with the smallest priority.
    ///
    /// Dequeuing from an empty queue is a caller error and is reported as
    /// [`KdKnnError::EmptyQueue`].
    pub fn try_dequeue_min(&mut self) -> Result<T> {
        self.dequeue_min().ok_or(KdKnnError::EmptyQueue)
    }

    /// The number of elements currently in the queue.
    #[inline]
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// Whether the queue holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// The maximum number of elements this queue can hold.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Whether the queue holds `max_size` elements, so that any further insertion evicts one.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.elems.len() >= self.max_size
    }

    /// The smallest priority in the queue, or infinity if the queue is empty.
    pub fn best(&self) -> N {
        self.elems
            .first_key_value()
            .map_or(N::infinity(), |(key, _)| key.priority)
    }

    /// The largest priority in the queue, or infinity if the queue is empty.
    ///
    /// An element enqueued into a full queue with a priority above this value is dropped
    /// immediately.
    pub fn worst(&self) -> N {
        self.elems
            .last_key_value()
            .map_or(N::infinity(), |(key, _)| key.priority)
    }

    /// Iterate over `(value, priority)` pairs in ascending priority order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, N)> + '_ {
        self.elems.iter().map(|(key, value)| (value, key.priority))
    }

    /// Consume the queue, returning its `(value, priority)` pairs in ascending priority order.
    pub fn into_sorted_vec(self) -> Vec<(T, N)> {
        self.elems
            .into_iter()
            .map(|(key, value)| (value, key.priority))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_queue_reports_infinity() {
        let queue = BoundedPriorityQueue::<u8, f64>::new(3);
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.max_size(), 3);
        assert_eq!(queue.best(), f64::INFINITY);
        assert_eq!(queue.worst(), f64::INFINITY);
    }

    #[test]
    fn evicts_largest_priority_on_overflow() {
        let mut queue = BoundedPriorityQueue::new(3);
        for (value, priority) in [('a', 5.0), ('b', 1.0), ('c', 3.0), ('d', 4.0), ('e', 9.0)] {
            queue.enqueue(value, priority);
            assert!(queue.len() <= 3);
        }

        assert!(queue.is_full());
        assert_eq!(queue.best(), 1.0);
        assert_eq!(queue.worst(), 4.0);
        assert_eq!(
            queue.into_sorted_vec(),
            vec![('b', 1.0), ('c', 3.0), ('d', 4.0)]
        );
    }

    #[test]
    fn newly_enqueued_value_can_be_evicted() {
        let mut queue = BoundedPriorityQueue::new(1);
        queue.enqueue("kept", 2.0_f32);
        queue.enqueue("dropped", 7.0);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.dequeue_min(), Some("kept"));
    }

    #[test]
    fn equal_priorities_evict_latest() {
        let mut queue = BoundedPriorityQueue::new(2);
        queue.enqueue(1, 1.0_f64);
        queue.enqueue(2, 1.0);
        queue.enqueue(3, 1.0);
        let values: Vec<_> = queue.iter().map(|(value, _)| *value).collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn dequeue_in_ascending_order() {
        let mut queue = BoundedPriorityQueue::new(10);
        for (i, priority) in [8.0, 2.0, 6.0, 4.0].into_iter().enumerate() {
            queue.enqueue(i, priority);
        }
        let mut order = vec![];
        while !queue.is_empty() {
            order.push(queue.try_dequeue_min().unwrap());
        }
        assert_eq!(order, vec![1, 3, 2, 0]);
    }

    #[test]
    fn dequeue_from_empty_queue_is_an_error() {
        let mut queue = BoundedPriorityQueue::<(), f64>::new(1);
        assert!(queue.dequeue_min().is_none());
        assert!(matches!(
            queue.try_dequeue_min(),
            Err(KdKnnError::EmptyQueue)
        ));
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut queue = BoundedPriorityQueue::new(0);
        queue.enqueue('x', 0.0_f64);
        assert!(queue.is_empty());
        assert!(queue.is_full());
        assert_eq!(queue.worst(), f64::INFINITY);
    }
}
