//! Sealed trait marker for Transport implementations.

pub(crate) mod private {
    /// Sealed trait marker.
    ///
    /// This trait cannot be implemented outside this crate.
    pub trait Sealed {}
}
