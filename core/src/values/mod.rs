//! Runtime values: slots, the boxed-any type, and the generic containers.

mod array;
mod boxed;
mod handle;
mod init;
mod map;
mod object;
mod slot;

#[cfg(test)]
mod boxed_test;
#[cfg(test)]
mod map_test;

pub use array::DynamicArray;
pub use boxed::AnyBox;
pub use handle::Handle;
pub use init::{InitEntry, MapInitEntry};
pub use map::DynamicMap;
pub use object::{GcParticipant, ScriptObject, ValueObject};
pub use slot::{Value, ValueRef, ValueSlot};
