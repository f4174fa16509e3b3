//! Batch evaluation of kNN classification against labeled samples.

#[cfg(feature = "rayon")]
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::kdtree::KDTreeIndex;
use crate::point::Point;
use crate::r#type::IndexableNum;

/// Number of samples between progress log lines.
pub const PROGRESS_INTERVAL: usize = 500;

/// The tally of a batch evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Number of samples classified
    pub total: usize,
    /// Number of samples whose predicted label matched the expected one
    pub correct: usize,
}

impl Evaluation {
    /// Record one prediction.
    #[inline]
    fn record(mut self, hit: bool) -> Self {
        self.total += 1;
        self.correct += hit as usize;
        self
    }

    /// Combine two partial tallies.
    #[inline]
    pub fn merge(self, other: Self) -> Self {
        Self {
            total: self.total + other.total,
            correct: self.correct + other.correct,
        }
    }

    /// Percentage of correct predictions, or 0 if nothing was evaluated.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 * 100.0 / self.total as f64
        }
    }
}

/// Classify every sample with a `k`-nearest-neighbor vote and count how many match their
/// ground-truth label.
///
/// Queries only read the tree. With the `rayon` feature samples are spread across the thread pool,
/// each worker keeping its own tally; the tallies are summed at the end.
pub fn evaluate<N, const D: usize, L, T>(
    tree: &T,
    samples: &[(Point<N, D>, L)],
    k: usize,
) -> Evaluation
where
    N: IndexableNum,
    L: Clone + PartialEq + Send + Sync,
    T: KDTreeIndex<N, D, L> + Sync,
{
    let predict = |(point, expected): &(Point<N, D>, L)| {
        tree.knn(point, k).is_some_and(|label| label == *expected)
    };

    #[cfg(feature = "rayon")]
    let evaluation = samples
        .par_iter()
        .fold(Evaluation::default, |acc, sample| acc.record(predict(sample)))
        .reduce(Evaluation::default, Evaluation::merge);

    #[cfg(not(feature = "rayon"))]
    let evaluation = samples
        .iter()
        .fold(Evaluation::default(), |acc, sample| {
            let acc = acc.record(predict(sample));
            if acc.total % PROGRESS_INTERVAL == 0 {
                log::debug!("Classified {} of {} samples", acc.total, samples.len());
            }
            acc
        });

    log::info!(
        "Evaluated {} samples with k = {}: {} correct ({:.2}%)",
        evaluation.total,
        k,
        evaluation.correct,
        evaluation.accuracy()
    );
    evaluation
}
