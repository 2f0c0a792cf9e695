//! The boxed-any type: a reference-counted, collector-visible box around one
//! value slot.

use core::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use crate::types::{TypeId, TypeRegistry};
use crate::values::handle::Handle;
use crate::values::object::ScriptObject;
use crate::values::slot::{Value, ValueSlot};

/// A shared box holding one value of arbitrary type.
///
/// Script code passes these around as handles; copying the handle add-refs
/// the box, and the box's payload is released when the last handle drops (or
/// earlier, if the cycle collector breaks a cycle through it).
///
/// The slot sits behind a mutex because the box itself is a shared object:
/// `store` must work through `&self`. The mutex is uncontended in the
/// host-guaranteed single-mutator discipline; it is not a concurrency
/// guarantee for racing mutators.
pub struct AnyBox {
    registry: Arc<TypeRegistry>,
    slot: Mutex<ValueSlot>,
}

impl AnyBox {
    /// An empty box.
    pub fn new(registry: Arc<TypeRegistry>) -> Arc<AnyBox> {
        Arc::new(AnyBox { registry, slot: Mutex::new(ValueSlot::new()) })
    }

    /// A box holding `value` as type `ty`.
    pub fn with_value(
        registry: Arc<TypeRegistry>,
        ty: TypeId,
        value: Value,
    ) -> Result<Arc<AnyBox>, crate::error::Error> {
        let boxed = AnyBox::new(registry);
        boxed.store(ty, value)?;
        Ok(boxed)
    }

    /// A mutable handle to this box.
    pub fn handle(self: &Arc<AnyBox>) -> Handle {
        Handle::new(self.clone() as Arc<dyn ScriptObject>)
    }

    /// Store `value` as type `ty`, releasing any previous payload.
    pub fn store(&self, ty: TypeId, value: Value) -> Result<(), crate::error::Error> {
        if self.lock().set(&self.registry, ty, value) {
            Ok(())
        } else {
            Err(crate::error::Error::InvalidArgument)
        }
    }

    /// Copy the held value out as type `want`; `None` on mismatch.
    pub fn retrieve(&self, want: TypeId) -> Option<Value> {
        self.lock().get(&self.registry, want)
    }

    /// The type the current payload was stored under, if any.
    pub fn type_of(&self) -> Option<TypeId> {
        ValueSlot::type_id(&self.lock())
    }

    /// Replace this box's payload with a duplicate of `other`'s.
    pub fn copy_from(&self, other: &AnyBox) {
        if core::ptr::eq(self, other) {
            return;
        }
        let dup = {
            let src = other.lock();
            let mut copy = ValueSlot::new();
            copy.copy_from(&src);
            copy
        };
        *self.lock() = dup;
    }

    fn lock(&self) -> MutexGuard<'_, ValueSlot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ScriptObject for AnyBox {
    fn type_id(&self) -> TypeId {
        self.registry.any_type()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn enumerate_references(&self, visitor: &mut dyn FnMut(&Handle)) {
        self.lock().enumerate_refs(&self.registry, visitor);
    }

    fn release_references(&self) {
        trace!("breaking references held by boxed value");
        self.lock().release();
    }
}

impl core::fmt::Debug for AnyBox {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AnyBox").field("slot", &*self.lock()).finish()
    }
}
