//! Runtime type descriptors.

use core::any::TypeId as RustTypeId;
use core::fmt;
use std::sync::Arc;

use crate::types::kind::PrimKind;
use crate::types::registry::TypeId;
use crate::values::ValueObject;

/// Constructs a default instance of a value-object type.
///
/// Required for value-object element types of [`DynamicArray`], which
/// default-constructs the gap when growing.
///
/// [`DynamicArray`]: crate::values::DynamicArray
pub type DefaultCtor = Arc<dyn Fn() -> Box<dyn ValueObject> + Send + Sync>;

/// The three value categories a descriptor can have.
///
/// The category is fixed once a slot binds the descriptor to a stored value;
/// changing type always discards the old value first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Fixed-width scalar stored inline, no heap allocation.
    Primitive,
    /// Independently owned instance, duplicated by deep copy on assignment.
    ValueObject,
    /// Shared reference-counted pointer; copying add-refs instead of cloning.
    Handle,
}

/// Category-specific dispatch payload of a descriptor.
///
/// A closed tagged variant chosen once at descriptor creation; consumers match
/// exhaustively instead of testing flag bitmasks.
#[derive(Clone)]
pub enum TypeShape {
    Primitive(PrimKind),
    ValueObject {
        /// Identity of the concrete Rust type; exact-match checked on `set`.
        rust_type: RustTypeId,
        default_ctor: Option<DefaultCtor>,
    },
    Handle {
        /// Const handles satisfy only const-handle requests.
        is_const: bool,
        /// The mutable counterpart this (possibly const) handle refers to.
        base: TypeId,
    },
}

impl TypeShape {
    pub fn category(&self) -> Category {
        match self {
            TypeShape::Primitive(_) => Category::Primitive,
            TypeShape::ValueObject { .. } => Category::ValueObject,
            TypeShape::Handle { .. } => Category::Handle,
        }
    }
}

impl fmt::Debug for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::Primitive(kind) => f.debug_tuple("Primitive").field(kind).finish(),
            TypeShape::ValueObject { rust_type, default_ctor } => f
                .debug_struct("ValueObject")
                .field("rust_type", rust_type)
                .field("has_default", &default_ctor.is_some())
                .finish(),
            TypeShape::Handle { is_const, base } => f
                .debug_struct("Handle")
                .field("is_const", is_const)
                .field("base", base)
                .finish(),
        }
    }
}

/// Descriptor for one concrete host type.
#[derive(Debug, Clone)]
pub struct TypeDesc {
    id: TypeId,
    decl: String,
    shape: TypeShape,
    collectible: bool,
}

impl TypeDesc {
    pub(crate) fn new(id: TypeId, decl: String, shape: TypeShape, collectible: bool) -> Self {
        Self { id, decl, shape, collectible }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Declaration string, e.g. `"int32"`, `"Vec3"`, `"Widget@"`.
    pub fn decl(&self) -> &str {
        &self.decl
    }

    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    pub fn category(&self) -> Category {
        self.shape.category()
    }

    /// Whether instances may form reference cycles and must be reported to
    /// the host's cycle collector.
    pub fn is_collectible(&self) -> bool {
        self.collectible
    }

    pub fn is_const_handle(&self) -> bool {
        matches!(self.shape, TypeShape::Handle { is_const: true, .. })
    }

    /// Byte width for primitives, `None` otherwise.
    pub fn byte_width(&self) -> Option<usize> {
        match self.shape {
            TypeShape::Primitive(kind) => Some(kind.byte_width()),
            _ => None,
        }
    }
}
