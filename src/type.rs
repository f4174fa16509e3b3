use std::fmt::Debug;

use num_traits::{Float, NumCast};

/// A trait for types that can be used as point coordinates.
///
/// This trait is sealed and cannot be implemented for external types. Coordinates must be
/// floating point so that squared distances and the empty-queue sentinel
/// ([`Float::infinity`]) are representable in the same type.
///
/// `NaN` coordinates are not supported: ordering comparisons on them are meaningless and the
/// tree's axis invariant cannot hold.
pub trait IndexableNum:
    private::Sealed + Float + NumCast + Debug + Default + Send + Sync + 'static
{
}

impl IndexableNum for f32 {}

impl IndexableNum for f64 {}

// https://rust-lang.github.io/api-guidelines/future-proofing.html#sealed-traits-protect-against-downstream-implementations-c-sealed
mod private {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for f64 {}
}
