use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::boxed::AnyBox;
use super::object::{ScriptObject, ValueObject};
use super::slot::Value;
use crate::error::Error;
use crate::types::{PrimKind, TypeRegistry};

#[derive(Debug, Clone, Default, PartialEq)]
struct Payload64 {
    bytes: [u8; 8],
}

impl ValueObject for Payload64 {
    fn clone_boxed(&self) -> Box<dyn ValueObject> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn core::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
        self
    }
}

#[test]
fn empty_box_has_no_type() {
    let reg = Arc::new(TypeRegistry::new());
    let boxed = AnyBox::new(reg.clone());
    assert_eq!(boxed.type_of(), None);
    assert!(boxed.retrieve(reg.prim(PrimKind::I32)).is_none());
}

#[test]
fn store_and_retrieve_round_trip() {
    let reg = Arc::new(TypeRegistry::new());
    let boxed = AnyBox::new(reg.clone());

    boxed.store(reg.prim(PrimKind::I32), Value::from(7i32)).unwrap();
    assert_eq!(boxed.type_of(), Some(reg.prim(PrimKind::I32)));
    assert_eq!(boxed.retrieve(reg.prim(PrimKind::I64)).unwrap().as_i64(), Some(7));
    // Mismatched retrieval is a miss, not an error.
    assert!(boxed.retrieve(reg.prim(PrimKind::U32)).is_none());
}

#[test]
fn store_mismatch_is_invalid_argument() {
    let reg = Arc::new(TypeRegistry::new());
    let boxed = AnyBox::new(reg.clone());
    let err = boxed.store(reg.prim(PrimKind::Bool), Value::from(1i32)).unwrap_err();
    assert_eq!(err, Error::InvalidArgument);
    assert_eq!(boxed.type_of(), None);
}

#[test]
fn restore_replaces_previous_payload() {
    let reg = Arc::new(TypeRegistry::new());
    let py_ty = reg.register_value_type::<Payload64>("Payload64").unwrap();
    let boxed = AnyBox::with_value(reg.clone(), py_ty, Value::object(Payload64::default())).unwrap();

    boxed.store(reg.prim(PrimKind::F64), Value::from(0.5f64)).unwrap();
    assert_eq!(boxed.type_of(), Some(reg.prim(PrimKind::F64)));
    assert!(boxed.retrieve(py_ty).is_none());
}

#[test]
fn handle_views_share_the_box() {
    let reg = Arc::new(TypeRegistry::new());
    let boxed = AnyBox::new(reg.clone());
    let h = boxed.handle();
    assert_eq!(h.type_id(), reg.any_type());

    // Stores through the original are visible through the handle's object.
    boxed.store(reg.prim(PrimKind::I32), Value::from(3i32)).unwrap();
    let through = h.downcast_ref::<AnyBox>().unwrap();
    assert_eq!(through.retrieve(reg.prim(PrimKind::I32)).unwrap().as_i64(), Some(3));
}

#[test]
fn copy_from_duplicates_and_self_copy_is_harmless() {
    let reg = Arc::new(TypeRegistry::new());
    let a = AnyBox::new(reg.clone());
    let b = AnyBox::new(reg.clone());
    b.store(reg.prim(PrimKind::U8), Value::from(9u8)).unwrap();

    a.copy_from(&b);
    assert_eq!(a.retrieve(reg.prim(PrimKind::U8)).unwrap().as_u64(), Some(9));

    // Self-copy must not deadlock or disturb the payload.
    a.copy_from(&a);
    assert_eq!(a.retrieve(reg.prim(PrimKind::U8)).unwrap().as_u64(), Some(9));
}

#[test]
fn boxes_can_nest() {
    let reg = Arc::new(TypeRegistry::new());
    let inner = AnyBox::new(reg.clone());
    inner.store(reg.prim(PrimKind::I32), Value::from(1i32)).unwrap();

    let outer = AnyBox::new(reg.clone());
    outer.store(reg.any_type(), Value::handle(inner.handle())).unwrap();

    let out = outer.retrieve(reg.any_type()).unwrap();
    let through = out.as_handle().unwrap().downcast_ref::<AnyBox>().unwrap();
    assert_eq!(through.retrieve(reg.prim(PrimKind::I32)).unwrap().as_i64(), Some(1));
}

#[test]
fn collector_hooks_see_and_break_cycles() {
    let reg = Arc::new(TypeRegistry::new());
    let a = AnyBox::new(reg.clone());
    let b = AnyBox::new(reg.clone());

    // a → b → a.
    a.store(reg.any_type(), Value::handle(b.handle())).unwrap();
    b.store(reg.any_type(), Value::handle(a.handle())).unwrap();
    assert_eq!(Arc::strong_count(&a), 2);
    assert_eq!(Arc::strong_count(&b), 2);

    // Mark phase sees exactly the peer.
    let mut seen = Vec::new();
    ScriptObject::enumerate_references(&*a, &mut |h| seen.push(h.ptr_eq(&b.handle())));
    assert_eq!(seen, vec![true]);

    // Cycle break on one box releases its reference and empties it.
    a.release_references();
    assert_eq!(a.type_of(), None);
    assert_eq!(Arc::strong_count(&b), 1);
    // b still points at a until the collector reaches it.
    assert_eq!(Arc::strong_count(&a), 2);
    b.release_references();
    assert_eq!(Arc::strong_count(&a), 1);
}
