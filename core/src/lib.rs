//! Sorrel's runtime-value subsystem.
//!
//! Script code needs to hold, copy, compare, and garbage-collect values whose
//! concrete type is unknown to the host's static type system. This crate
//! provides the pieces that make that possible:
//!
//! - [`types::TypeRegistry`] — descriptors for every host type the runtime
//!   knows about, plus the per-type comparator cache.
//! - [`values::ValueSlot`] — one instance of an arbitrary type together with
//!   its descriptor; the storage cell shared by everything below.
//! - [`values::AnyBox`] — a reference-counted, collector-visible box around a
//!   single slot.
//! - [`values::DynamicArray`] and [`values::DynamicMap`] — the two generic
//!   containers.
//! - [`context::ContextPool`] — execution-context borrowing for comparator
//!   callbacks that re-enter script.

pub mod context;
pub mod error;
pub mod types;
pub mod values;
