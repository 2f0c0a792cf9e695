use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::handle::Handle;
use super::init::MapInitEntry;
use super::map::DynamicMap;
use super::object::{GcParticipant, ScriptObject, ValueObject};
use super::slot::Value;
use crate::error::Error;
use crate::types::{PrimKind, TypeId, TypeRegistry};

#[derive(Debug, Clone, Default, PartialEq)]
struct Color {
    rgba: u32,
}

impl ValueObject for Color {
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

#[derive(Debug)]
struct Node {
    ty: TypeId,
}

impl ScriptObject for Node {
    fn type_id(&self) -> TypeId {
        self.ty
    }

    fn as_any(&self) -> &dyn core::any::Any {
        self
    }
}

#[test]
fn entries_carry_their_own_types() {
    let reg = Arc::new(TypeRegistry::new());
    let color_ty = reg.register_value_type::<Color>("Color").unwrap();
    let mut map = DynamicMap::new(reg.clone());

    assert!(map.set("count", reg.prim(PrimKind::I32), Value::from(3i32)));
    assert!(map.set("ratio", reg.prim(PrimKind::F64), Value::from(0.5f64)));
    assert!(map.set("tint", color_ty, Value::object(Color { rgba: 0xFF00FF00 })));

    assert_eq!(map.len(), 3);
    assert_eq!(map.get("count", reg.prim(PrimKind::I64)).unwrap().as_i64(), Some(3));
    assert_eq!(map.get("ratio", reg.prim(PrimKind::F64)).unwrap().as_f64(), Some(0.5));
    assert_eq!(
        map.get("tint", color_ty).unwrap().as_object::<Color>(),
        Some(&Color { rgba: 0xFF00FF00 })
    );
    assert_eq!(map.get_type("count"), Some(reg.prim(PrimKind::I32)));

    // Wrong-type reads are misses, not errors.
    assert!(map.get("count", color_ty).is_none());
    assert!(map.get("absent", color_ty).is_none());
    assert_eq!(map.get_type("absent"), None);
}

#[test]
fn overwriting_a_key_may_change_its_type() {
    let reg = Arc::new(TypeRegistry::new());
    let mut map = DynamicMap::new(reg.clone());

    assert!(map.set("x", reg.prim(PrimKind::I32), Value::from(1i32)));
    assert!(map.set("x", reg.prim(PrimKind::Bool), Value::from(true)));

    assert_eq!(map.len(), 1);
    assert_eq!(map.get_type("x"), Some(reg.prim(PrimKind::Bool)));
    assert_eq!(map.get("x", reg.prim(PrimKind::Bool)).unwrap().as_bool(), Some(true));
    assert!(map.get("x", reg.prim(PrimKind::I32)).is_none());
}

#[test]
fn failed_set_on_a_new_key_adds_nothing() {
    let reg = Arc::new(TypeRegistry::new());
    let mut map = DynamicMap::new(reg.clone());

    assert!(!map.set("bad", reg.prim(PrimKind::Bool), Value::from(1i32)));
    assert!(map.is_empty());
    assert!(!map.contains("bad"));

    // On an existing key the old entry survives a failed overwrite.
    assert!(map.set("x", reg.prim(PrimKind::I32), Value::from(1i32)));
    assert!(!map.set("x", reg.prim(PrimKind::Bool), Value::from(2i32)));
    assert_eq!(map.get("x", reg.prim(PrimKind::I32)).unwrap().as_i64(), Some(1));
}

#[test]
fn keys_iterate_in_lexicographic_order() {
    let reg = Arc::new(TypeRegistry::new());
    let mut map = DynamicMap::new(reg.clone());
    for key in ["delta", "alpha", "charlie", "bravo"] {
        assert!(map.set(key, reg.prim(PrimKind::I32), Value::from(0i32)));
    }

    let keys: Vec<&str> = map.keys().collect();
    assert_eq!(keys, vec!["alpha", "bravo", "charlie", "delta"]);

    assert_eq!(map.key_at(0).unwrap(), "alpha");
    assert_eq!(map.key_at(3).unwrap(), "delta");
    assert_eq!(map.key_at(4).unwrap_err(), Error::OutOfBounds);

    let (key, slot) = map.value_at(1).unwrap();
    assert_eq!(key, "bravo");
    assert_eq!(slot.type_id(), Some(reg.prim(PrimKind::I32)));
    assert_eq!(map.value_at(9).unwrap_err(), Error::OutOfBounds);
}

#[test]
fn erase_releases_the_entry() {
    let reg = Arc::new(TypeRegistry::new());
    let node_ty = reg.register_handle_type("Node", false).unwrap();
    let h = Handle::new(Arc::new(Node { ty: node_ty }));

    let mut map = DynamicMap::new(reg.clone());
    assert!(map.set("n", node_ty, Value::handle(h.clone())));
    assert_eq!(h.refcount(), 2);

    assert!(map.erase("n"));
    assert_eq!(h.refcount(), 1);
    assert!(!map.contains("n"));
    // Erasing again reports the miss.
    assert!(!map.erase("n"));
}

#[test]
fn clear_releases_every_entry() {
    let reg = Arc::new(TypeRegistry::new());
    let node_ty = reg.register_handle_type("Node", false).unwrap();
    let h = Handle::new(Arc::new(Node { ty: node_ty }));

    let mut map = DynamicMap::new(reg.clone());
    assert!(map.set("a", node_ty, Value::handle(h.clone())));
    assert!(map.set("b", node_ty, Value::handle(h.clone())));
    assert_eq!(h.refcount(), 3);

    map.clear();
    assert!(map.is_empty());
    assert_eq!(h.refcount(), 1);
}

#[test]
fn from_entries_last_key_wins() {
    let reg = Arc::new(TypeRegistry::new());
    let map = DynamicMap::from_entries(
        reg.clone(),
        vec![
            MapInitEntry::new("x", reg.prim(PrimKind::I32), 1i32),
            MapInitEntry::new("y", reg.prim(PrimKind::I32), 2i32),
            MapInitEntry::new("x", reg.prim(PrimKind::I32), 3i32),
        ],
    )
    .unwrap();

    assert_eq!(map.len(), 2);
    assert_eq!(map.get("x", reg.prim(PrimKind::I32)).unwrap().as_i64(), Some(3));

    let err = DynamicMap::from_entries(
        reg.clone(),
        vec![MapInitEntry::new("bad", reg.prim(PrimKind::Bool), 1i32)],
    )
    .unwrap_err();
    assert_eq!(err, Error::TemplateMismatch);
}

#[test]
fn gc_hooks_walk_handle_entries() {
    let reg = Arc::new(TypeRegistry::new());
    let node_ty = reg.register_handle_type("Node", false).unwrap();
    let h = Handle::new(Arc::new(Node { ty: node_ty }));

    let mut map = DynamicMap::new(reg.clone());
    assert!(map.set("n", node_ty, Value::handle(h.clone())));
    assert!(map.set("i", reg.prim(PrimKind::I32), Value::from(1i32)));

    let mut seen = 0;
    map.enumerate_references(&mut |held| {
        assert!(held.ptr_eq(&h));
        seen += 1;
    });
    assert_eq!(seen, 1);

    map.release_references();
    assert_eq!(h.refcount(), 1);
    // Keys survive a cycle break; the broken entry just reads as empty.
    assert!(map.contains("n"));
    assert_eq!(map.get_type("n"), None);
    assert_eq!(map.get("i", reg.prim(PrimKind::I32)).unwrap().as_i64(), Some(1));
}
