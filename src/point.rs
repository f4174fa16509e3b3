//! A fixed-dimension point.

use std::ops::{Index, IndexMut};

use crate::error::{KdKnnError, Result};
use crate::r#type::IndexableNum;

/// A point with exactly `D` coordinates.
///
/// Equality is exact, element-wise comparison. Distances are *squared* Euclidean distances: every
/// comparison the tree makes is monotonic in the squared distance, so the square root is never
/// taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<N: IndexableNum, const D: usize> {
    coords: [N; D],
}

impl<N: IndexableNum, const D: usize> Point<N, D> {
    /// Create a new point from its coordinates.
    pub fn new(coords: [N; D]) -> Self {
        Self { coords }
    }

    /// The number of coordinates in this point.
    #[inline]
    pub const fn dimension(&self) -> usize {
        D
    }

    /// The underlying coordinates of this point.
    #[inline]
    pub fn coords(&self) -> &[N; D] {
        &self.coords
    }

    /// Iterate over the coordinates of this point.
    pub fn iter(&self) -> std::slice::Iter<'_, N> {
        self.coords.iter()
    }

    /// The squared Euclidean distance between this point and `other`.
    #[inline]
    pub fn sq_dist(&self, other: &Self) -> N {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .fold(N::zero(), |acc, (&a, &b)| {
                let d = a - b;
                acc + d * d
            })
    }
}

impl<N: IndexableNum, const D: usize> Default for Point<N, D> {
    fn default() -> Self {
        Self {
            coords: [N::zero(); D],
        }
    }
}

impl<N: IndexableNum, const D: usize> Index<usize> for Point<N, D> {
    type Output = N;

    #[inline]
    fn index(&self, axis: usize) -> &N {
        &self.coords[axis]
    }
}

impl<N: IndexableNum, const D: usize> IndexMut<usize> for Point<N, D> {
    #[inline]
    fn index_mut(&mut self, axis: usize) -> &mut N {
        &mut self.coords[axis]
    }
}

impl<N: IndexableNum, const D: usize> From<[N; D]> for Point<N, D> {
    fn from(coords: [N; D]) -> Self {
        Self::new(coords)
    }
}

impl<N: IndexableNum, const D: usize> TryFrom<&[N]> for Point<N, D> {
    type Error = KdKnnError;

    fn try_from(value: &[N]) -> Result<Self> {
        let coords: [N; D] = value
            .try_into()
            .map_err(|_| KdKnnError::DimensionMismatch {
                expected: D,
                found: value.len(),
            })?;
        Ok(Self { coords })
    }
}

impl<'a, N: IndexableNum, const D: usize> IntoIterator for &'a Point<N, D> {
    type Item = &'a N;
    type IntoIter = std::slice::Iter<'a, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
