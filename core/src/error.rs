//! Public error type for container and registry operations.
//!
//! Slot-level `set`/`get` never produce these — type mismatches there are
//! boolean/`Option` outcomes so "try get" patterns stay cheap. Container-level
//! structural violations raise through this enum, and the container is left in
//! its prior valid state whenever the violation is detected before mutation
//! begins.

use thiserror::Error;

/// Errors raised by the value subsystem.
///
/// Each variant carries a stable category and message; hosts surface them to
/// script as catchable exceptions. `OutOfMemory` is the one condition a host
/// may choose to treat as fatal instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("out of memory")]
    OutOfMemory,

    /// A supplied index or range start lies past the end of the container.
    #[error("index out of range")]
    OutOfBounds,

    /// The supplied value or type does not fit the operation.
    #[error("invalid argument")]
    InvalidArgument,

    /// Two containers with incompatible element types were combined.
    #[error("incompatible element types")]
    TemplateMismatch,

    /// No equality/ordering method is registered for the element type.
    #[error("no matching comparison method found for the element type")]
    ComparatorNotFound,

    /// More than one candidate method matched during comparator resolution.
    #[error("multiple comparison methods match the element type")]
    ComparatorAmbiguous,

    /// The requested size exceeds the addressable element count.
    #[error("requested size exceeds the addressable element count")]
    TooLarge,
}
