//! The value slot: one instance of an arbitrary type plus its descriptor.

use core::fmt;
use static_assertions::const_assert;

use crate::types::{PrimValue, TypeDesc, TypeId, TypeRegistry, TypeShape};
use crate::values::handle::Handle;
use crate::values::object::ValueObject;

/// An owned value in transit between the host and a slot or container.
///
/// This is the transfer representation used by `set`-style operations (which
/// consume it) and `get`-style operations (which produce a fresh one: a deep
/// copy for value objects, an add-ref'd handle for handles, a widened scalar
/// for primitives).
#[derive(Debug)]
pub enum Value {
    Prim(PrimValue),
    Object(Box<dyn ValueObject>),
    /// A handle, possibly null.
    Handle(Option<Handle>),
}

impl Value {
    pub fn object(obj: impl ValueObject) -> Self {
        Value::Object(Box::new(obj))
    }

    pub fn handle(h: Handle) -> Self {
        Value::Handle(Some(h))
    }

    pub fn null_handle() -> Self {
        Value::Handle(None)
    }

    pub fn as_prim(&self) -> Option<PrimValue> {
        match self {
            Value::Prim(pv) => Some(*pv),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_prim().and_then(|pv| pv.as_bool())
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_prim().and_then(|pv| pv.as_i64())
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_prim().and_then(|pv| pv.as_u64())
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_prim().and_then(|pv| pv.as_f64())
    }

    /// Downcast a value object to its concrete type.
    pub fn as_object<T: ValueObject>(&self) -> Option<&T> {
        match self {
            Value::Object(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// The held handle, if this is a non-null handle value.
    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Value::Handle(Some(h)) => Some(h),
            _ => None,
        }
    }

    pub fn is_null_handle(&self) -> bool {
        matches!(self, Value::Handle(None))
    }

    /// Borrowed view of this value.
    pub fn as_ref(&self) -> ValueRef<'_> {
        match self {
            Value::Prim(pv) => ValueRef::Prim(*pv),
            Value::Object(obj) => ValueRef::Object(&**obj),
            Value::Handle(h) => ValueRef::Handle(h.as_ref()),
        }
    }
}

macro_rules! value_from_prim {
    ($($t:ty => $ctor:ident),* $(,)?) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Prim(PrimValue::$ctor(v))
            }
        })*
    };
}

value_from_prim! {
    bool => from_bool,
    i8 => from_i8,
    i16 => from_i16,
    i32 => from_i32,
    i64 => from_i64,
    u8 => from_u8,
    u16 => from_u16,
    u32 => from_u32,
    u64 => from_u64,
    f32 => from_f32,
    f64 => from_f64,
}

/// A borrowed view of a stored value, as passed to comparison callables.
#[derive(Clone, Copy)]
pub enum ValueRef<'a> {
    Prim(PrimValue),
    Object(&'a dyn ValueObject),
    Handle(Option<&'a Handle>),
}

impl<'a> ValueRef<'a> {
    pub fn as_prim(&self) -> Option<PrimValue> {
        match self {
            ValueRef::Prim(pv) => Some(*pv),
            _ => None,
        }
    }

    pub fn as_object<T: ValueObject>(&self) -> Option<&'a T> {
        match self {
            ValueRef::Object(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&'a Handle> {
        match self {
            ValueRef::Handle(Some(h)) => Some(h),
            _ => None,
        }
    }
}

impl fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRef::Prim(pv) => write!(f, "{pv:?}"),
            ValueRef::Object(obj) => write!(f, "{obj:?}"),
            ValueRef::Handle(Some(h)) => write!(f, "{h:?}"),
            ValueRef::Handle(None) => f.write_str("null"),
        }
    }
}

/// Category-tagged storage for one value.
///
/// This is the cell representation shared by [`ValueSlot`], array buffers,
/// and map entries. Dropping a payload releases per category: handles
/// decrement the refcount, owned objects run their destructor, primitives
/// are inert.
#[derive(Debug)]
pub(crate) enum Payload {
    Empty,
    Inline(PrimValue),
    Owned(Box<dyn ValueObject>),
    Shared(Option<Handle>),
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Empty
    }
}

// The payload is the element stride of every generic container; keep it from
// growing past two pointers plus tag words.
const_assert!(core::mem::size_of::<Payload>() <= 40);

impl Payload {
    /// Duplicate per category: bit-copy a primitive, deep-copy a value
    /// object, add-ref a handle.
    pub(crate) fn duplicate(&self) -> Payload {
        match self {
            Payload::Empty => Payload::Empty,
            Payload::Inline(pv) => Payload::Inline(*pv),
            Payload::Owned(obj) => Payload::Owned(obj.clone_boxed()),
            Payload::Shared(h) => Payload::Shared(h.clone()),
        }
    }

    pub(crate) fn as_value_ref(&self) -> ValueRef<'_> {
        match self {
            // An empty payload only ever pairs with an absent descriptor;
            // surface it as a null handle view.
            Payload::Empty => ValueRef::Handle(None),
            Payload::Inline(pv) => ValueRef::Prim(*pv),
            Payload::Owned(obj) => ValueRef::Object(&**obj),
            Payload::Shared(h) => ValueRef::Handle(h.as_ref()),
        }
    }

    /// Convert an incoming value into storage shaped for `desc`.
    ///
    /// Returns `None` when the value's category or type does not fit:
    /// primitives must widen into the descriptor's kind, value objects must
    /// be the exact registered Rust type, handles must point at the
    /// descriptor's base type and may not lose const-ness.
    pub(crate) fn from_value(desc: &TypeDesc, value: Value) -> Option<Payload> {
        match (desc.shape(), value) {
            (TypeShape::Primitive(kind), Value::Prim(pv)) => {
                Some(Payload::Inline(pv.widen_to(*kind)?))
            }
            (TypeShape::ValueObject { rust_type, .. }, Value::Object(obj)) => {
                if obj.as_any().type_id() == *rust_type {
                    Some(Payload::Owned(obj))
                } else {
                    None
                }
            }
            (TypeShape::Handle { .. }, Value::Handle(None)) => Some(Payload::Shared(None)),
            (TypeShape::Handle { is_const, base }, Value::Handle(Some(h))) => {
                if h.type_id() != *base {
                    return None;
                }
                if h.is_const() && !is_const {
                    // A const handle cannot be stored where mutation is allowed.
                    return None;
                }
                let stored = if *is_const { h.as_const() } else { h };
                Some(Payload::Shared(Some(stored)))
            }
            _ => None,
        }
    }

    /// Copy this payload out as the requested type.
    ///
    /// `stored` is the descriptor the payload was stored under, `want` the
    /// requested one. Handle targets require a safe upcast (a const handle
    /// cannot satisfy a mutable-handle request), value-object targets an
    /// exact type match, primitive targets the documented widening.
    pub(crate) fn extract(&self, stored: &TypeDesc, want: &TypeDesc) -> Option<Value> {
        match (self, want.shape()) {
            (Payload::Inline(pv), TypeShape::Primitive(kind)) => {
                Some(Value::Prim(pv.widen_to(*kind)?))
            }
            (Payload::Owned(obj), TypeShape::ValueObject { .. }) => {
                if stored.id() == want.id() {
                    Some(Value::Object(obj.clone_boxed()))
                } else {
                    None
                }
            }
            (Payload::Shared(held), TypeShape::Handle { is_const: want_const, base: want_base }) => {
                let TypeShape::Handle { base: stored_base, .. } = stored.shape() else {
                    return None;
                };
                if stored_base != want_base {
                    return None;
                }
                match held {
                    None => Some(Value::Handle(None)),
                    Some(h) => {
                        if h.is_const() && !want_const {
                            return None;
                        }
                        let out = if *want_const { h.as_const() } else { h.clone() };
                        Some(Value::Handle(Some(out)))
                    }
                }
            }
            _ => None,
        }
    }
}

/// One instance of an arbitrary type plus the descriptor it was stored under.
///
/// Used standalone as a map entry and as the payload of [`AnyBox`]. A slot
/// never holds a payload without a matching descriptor, and `release` is
/// idempotent. Neither `set` nor `get` ever raises — mismatches are boolean
/// outcomes so "try get" stays cheap.
///
/// [`AnyBox`]: crate::values::AnyBox
#[derive(Debug, Default)]
pub struct ValueSlot {
    ty: Option<TypeId>,
    payload: Payload,
}

impl ValueSlot {
    pub fn new() -> Self {
        Self { ty: None, payload: Payload::Empty }
    }

    pub fn type_id(&self) -> Option<TypeId> {
        self.ty
    }

    pub fn is_empty(&self) -> bool {
        self.ty.is_none()
    }

    /// Store `value` as type `ty`, releasing any previous payload.
    ///
    /// Returns `false` (leaving the slot unchanged) when `ty` is unknown or
    /// the value does not fit it. The new payload is fully constructed — any
    /// new handle already add-ref'd — before the old payload drops, so
    /// self-assignment and aliasing never double-free or dangle.
    pub fn set(&mut self, registry: &TypeRegistry, ty: TypeId, value: Value) -> bool {
        let Some(desc) = registry.descriptor_of(ty) else {
            return false;
        };
        let Some(new_payload) = Payload::from_value(&desc, value) else {
            return false;
        };
        self.ty = Some(ty);
        self.payload = new_payload;
        true
    }

    /// Copy the held value out as type `want`.
    ///
    /// Non-mutating; returns `None` (not an error) on any mismatch.
    pub fn get(&self, registry: &TypeRegistry, want: TypeId) -> Option<Value> {
        let stored = registry.descriptor_of(self.ty?)?;
        let want = registry.descriptor_of(want)?;
        self.payload.extract(&stored, &want)
    }

    /// Borrowed view of the held value, if any.
    pub fn value_ref(&self) -> Option<ValueRef<'_>> {
        match self.ty {
            Some(_) => Some(self.payload.as_value_ref()),
            None => None,
        }
    }

    /// Drop ownership of the payload per its category. Idempotent.
    pub fn release(&mut self) {
        self.ty = None;
        self.payload = Payload::Empty;
    }

    /// Replace this slot's contents with a duplicate of `other`'s.
    ///
    /// The duplicate is built before the old payload drops, so copying a slot
    /// onto itself through the host is safe.
    pub fn copy_from(&mut self, other: &ValueSlot) {
        let dup = other.payload.duplicate();
        self.ty = other.ty;
        self.payload = dup;
    }

    /// Cycle-break hook: release the payload only if it holds a reference.
    /// Non-reference payloads stay untouched.
    pub(crate) fn release_refs(&mut self) {
        if matches!(self.payload, Payload::Shared(_)) {
            self.release();
        }
    }

    /// Report the held handle (or collectible value object's handles) to the
    /// collector's mark phase.
    pub(crate) fn enumerate_refs(
        &self,
        registry: &TypeRegistry,
        visitor: &mut dyn FnMut(&Handle),
    ) {
        match &self.payload {
            Payload::Shared(Some(h)) => visitor(h),
            Payload::Owned(obj) => {
                let collectible = self
                    .ty
                    .and_then(|ty| registry.descriptor_of(ty))
                    .is_some_and(|desc| desc.is_collectible());
                if collectible {
                    obj.enumerate_references(visitor);
                }
            }
            _ => {}
        }
    }
}
