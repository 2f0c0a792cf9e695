//! Initializer entries for literal array/map construction.
//!
//! The compiler front-end lowers a literal into a flat sequence of typed
//! entries; containers decode and validate the sequence. The byte-level
//! layout of the front-end's buffer is the front-end's business — by the time
//! it reaches this subsystem each entry already carries its type tag.

use crate::types::TypeId;
use crate::values::slot::Value;

/// One element of an array literal.
#[derive(Debug)]
pub struct InitEntry {
    /// Type tag emitted by the front-end for this element.
    pub ty: TypeId,
    pub value: Value,
}

impl InitEntry {
    pub fn new(ty: TypeId, value: impl Into<Value>) -> Self {
        Self { ty, value: value.into() }
    }
}

/// One association of a map literal.
#[derive(Debug)]
pub struct MapInitEntry {
    pub key: String,
    /// Type tag emitted by the front-end for this entry's value.
    pub ty: TypeId,
    pub value: Value,
}

impl MapInitEntry {
    pub fn new(key: impl Into<String>, ty: TypeId, value: impl Into<Value>) -> Self {
        Self { key: key.into(), ty, value: value.into() }
    }
}
