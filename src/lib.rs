//! Sorrel - runtime values for embedded scripting
//!
//! # Overview
//!
//! Sorrel is the runtime-value subsystem of an embeddable scripting runtime:
//! the pieces a host needs to hold, copy, compare, and garbage-collect script
//! values whose concrete type is not known to Rust's static type system.
//!
//! - A [`types::TypeRegistry`] describes every type script code can touch and
//!   memoizes per-type comparison callables.
//! - A [`values::ValueSlot`] stores one instance of an arbitrary type next to
//!   its descriptor; [`values::AnyBox`] wraps a slot in a shared,
//!   collector-visible box.
//! - [`values::DynamicArray`] and [`values::DynamicMap`] are the two generic
//!   containers built on the same storage cell.
//! - A [`context::ContextPool`] lends out execution contexts when a container
//!   has to call back into script to compare elements.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use sorrel::context::ContextPool;
//! use sorrel::types::{PrimKind, TypeRegistry};
//! use sorrel::values::DynamicArray;
//!
//! let registry = Arc::new(TypeRegistry::new());
//! let pool = ContextPool::new();
//!
//! // An array of int32 elements, filled and sorted.
//! let mut scores = DynamicArray::new(registry.clone(), registry.prim(PrimKind::I32)).unwrap();
//! for v in [3i32, 1, 2] {
//!     scores.insert_last(v).unwrap();
//! }
//! scores.sort(&pool).unwrap();
//!
//! assert_eq!(scores.value_at(0).unwrap().as_i64(), Some(1));
//! assert_eq!(scores.value_at(2).unwrap().as_i64(), Some(3));
//! ```
//!
//! # Storing anything
//!
//! ```
//! use std::sync::Arc;
//! use sorrel::types::{PrimKind, TypeRegistry};
//! use sorrel::values::{AnyBox, Value};
//!
//! let registry = Arc::new(TypeRegistry::new());
//! let boxed = AnyBox::new(registry.clone());
//!
//! boxed.store(registry.prim(PrimKind::F64), Value::from(2.5f64)).unwrap();
//! // Retrieval states the expected type; a mismatch is a miss, not an error.
//! assert_eq!(boxed.retrieve(registry.prim(PrimKind::F64)).unwrap().as_f64(), Some(2.5));
//! assert!(boxed.retrieve(registry.prim(PrimKind::I32)).is_none());
//! ```

// Re-export the public API from sorrel_core.
pub use sorrel_core::{context, error, types, values};

// Commonly used types at the crate root.
pub use sorrel_core::context::{ContextPool, ExecContext, ExecStatus};
pub use sorrel_core::error::Error;
pub use sorrel_core::types::{PrimKind, TypeId, TypeRegistry};
pub use sorrel_core::values::{
    AnyBox, DynamicArray, DynamicMap, Handle, ScriptObject, Value, ValueObject, ValueSlot,
};
