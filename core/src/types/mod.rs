//! Type descriptors, the type registry, and the comparator cache.

mod comparators;
mod desc;
mod kind;
mod registry;


pub use comparators::{CallOutcome, MethodFn, Resolution, TypeComparators};
pub use desc::{Category, DefaultCtor, TypeDesc, TypeShape};
pub use kind::{PrimKind, PrimValue};
pub use registry::{MethodDef, ParamSpec, RegistryOptions, ReturnKind, TypeId, TypeRegistry};
