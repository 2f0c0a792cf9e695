//! The owning handle abstraction.

use core::fmt;
use std::sync::Arc;

use crate::types::TypeId;
use crate::values::object::ScriptObject;

/// A shared, reference-counted pointer to a script object.
///
/// Copying a handle add-refs the object instead of duplicating it; dropping
/// the handle releases. A handle may carry a const view flag: a const handle
/// never satisfies a mutable-handle request, while a mutable handle satisfies
/// both.
#[derive(Clone)]
pub struct Handle {
    obj: Arc<dyn ScriptObject>,
    is_const: bool,
}

impl Handle {
    pub fn new(obj: Arc<dyn ScriptObject>) -> Self {
        Self { obj, is_const: false }
    }

    pub fn new_const(obj: Arc<dyn ScriptObject>) -> Self {
        Self { obj, is_const: true }
    }

    /// A const view of the same object (add-refs).
    pub fn as_const(&self) -> Handle {
        Handle { obj: self.obj.clone(), is_const: true }
    }

    pub fn is_const(&self) -> bool {
        self.is_const
    }

    /// The registered type of the pointed-to object (const-ness of the view
    /// is not part of the object's type).
    pub fn type_id(&self) -> TypeId {
        ScriptObject::type_id(&*self.obj)
    }

    pub fn object(&self) -> &dyn ScriptObject {
        &*self.obj
    }

    /// Downcast the pointed-to object to a concrete type.
    pub fn downcast_ref<T: ScriptObject>(&self) -> Option<&T> {
        self.obj.as_any().downcast_ref::<T>()
    }

    /// Identity comparison: do both handles point at the same object?
    pub fn ptr_eq(&self, other: &Handle) -> bool {
        Arc::ptr_eq(&self.obj, &other.obj)
    }

    /// Current reference count of the pointed-to object.
    ///
    /// Observable so ownership round-trips are testable: storing a handle in
    /// a slot is net +1, releasing the slot is net −1.
    pub fn refcount(&self) -> usize {
        Arc::strong_count(&self.obj)
    }

    /// The shared pointer itself, for hosts that manage objects directly.
    pub fn as_arc(&self) -> &Arc<dyn ScriptObject> {
        &self.obj
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Handle({:p}, rc={})",
            if self.is_const { "const " } else { "" },
            Arc::as_ptr(&self.obj) as *const (),
            self.refcount(),
        )
    }
}
