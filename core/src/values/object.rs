//! Host object traits and collector hooks.

use core::any::Any;
use core::fmt;

use crate::types::TypeId;
use crate::values::handle::Handle;

/// An independently owned value-object instance.
///
/// Assignment duplicates the object through [`ValueObject::clone_boxed`] (the
/// type's copy constructor); destruction is ordinary `Drop`. Exact type
/// identity is checked on retrieval, so the trait exposes `Any` views for
/// downcasting.
pub trait ValueObject: Any + Send + Sync + fmt::Debug {
    /// Deep-copy this instance.
    fn clone_boxed(&self) -> Box<dyn ValueObject>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Report handles held inside this object to the collector's mark phase.
    ///
    /// Only called for value-object types registered as collectible; the
    /// default is for plain data that cannot hold references.
    fn enumerate_references(&self, _visitor: &mut dyn FnMut(&Handle)) {}
}

impl dyn ValueObject {
    /// Downcast to a concrete value-object type.
    pub fn downcast_ref<T: ValueObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: ValueObject>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// A script-visible shared object, addressed through [`Handle`]s.
///
/// Add-ref and release are atomic (the handle is `Arc`-backed), so two
/// containers may hold concurrent handles to the same object without locking
/// each other. Collectible implementations override the collector hooks;
/// `release_references` takes `&self` because the cycle collector invokes it
/// on shared objects, so any interior state it clears must be behind interior
/// mutability.
pub trait ScriptObject: Any + Send + Sync {
    /// The registered type of this object.
    fn type_id(&self) -> TypeId;

    fn as_any(&self) -> &dyn Any;

    /// Mark-phase hook: report every handle this object holds.
    fn enumerate_references(&self, _visitor: &mut dyn FnMut(&Handle)) {}

    /// Cycle-break hook: drop every handle this object holds.
    ///
    /// Invoked by the collector independent of normal destruction order, so
    /// it must be safe to call on a live object and must leave the object
    /// usable (holding no references).
    fn release_references(&self) {}
}

/// Collector participation for host-owned containers.
///
/// Same two hooks as [`ScriptObject`], but `release_references` can take
/// `&mut self` because the host owns the container exclusively.
pub trait GcParticipant {
    /// Mark-phase hook: report every handle (and collectible value object)
    /// held by this container.
    fn enumerate_references(&self, visitor: &mut dyn FnMut(&Handle));

    /// Cycle-break hook: drop every reference held by this container while
    /// leaving the container itself valid.
    fn release_references(&mut self);
}
