//! Integration tests for the public API.
//!
//! These tests drive the subsystem the way a host embedding it would: register
//! types and methods once, then run script-visible operations end-to-end.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use sorrel_core::context::ContextPool;
use sorrel_core::error::Error;
use sorrel_core::types::{
    CallOutcome, MethodDef, ParamSpec, PrimKind, ReturnKind, TypeId, TypeRegistry,
};
use sorrel_core::values::{
    AnyBox, DynamicArray, DynamicMap, GcParticipant, Handle, ScriptObject, Value, ValueRef,
};

/// A host-side shared object, the way a game entity or resource would be
/// exposed to script.
#[derive(Debug)]
struct Item {
    ty: TypeId,
    price: i32,
}

impl ScriptObject for Item {
    fn type_id(&self) -> TypeId {
        self.ty
    }

    fn as_any(&self) -> &dyn core::any::Any {
        self
    }
}

fn price_of(v: ValueRef<'_>) -> i32 {
    v.as_handle().and_then(|h| h.downcast_ref::<Item>()).map(|i| i.price).unwrap_or(i32::MIN)
}

/// Registry set up the way a host would at startup: one shared object type
/// with both comparison methods.
fn host_registry() -> (Arc<TypeRegistry>, TypeId) {
    let reg = Arc::new(TypeRegistry::new());
    let item = reg.register_handle_type("Item", false).unwrap();
    reg.register_method(MethodDef {
        name: "opEquals".to_string(),
        receiver: item,
        param: ParamSpec { type_id: item, is_const: true },
        ret: ReturnKind::Bool,
        invoke: Arc::new(|_, a, b| Ok(CallOutcome::Bool(price_of(a) == price_of(b)))),
    });
    reg.register_method(MethodDef {
        name: "opCmp".to_string(),
        receiver: item,
        param: ParamSpec { type_id: item, is_const: true },
        ret: ReturnKind::Order,
        invoke: Arc::new(|_, a, b| Ok(CallOutcome::Order(price_of(a).cmp(&price_of(b))))),
    });
    (reg, item)
}

fn item(ty: TypeId, price: i32) -> Handle {
    Handle::new(Arc::new(Item { ty, price }))
}

#[test]
fn array_of_host_objects_end_to_end() {
    let (reg, item_ty) = host_registry();
    let pool = ContextPool::new();

    let mut inventory = DynamicArray::new(reg.clone(), item_ty).unwrap();
    for price in [30, 10, 20] {
        inventory.insert_last(Value::handle(item(item_ty, price))).unwrap();
    }

    inventory.sort(&pool).unwrap();
    let prices: Vec<i32> =
        (0..inventory.len()).map(|i| price_of(inventory.ref_at(i).unwrap())).collect();
    assert_eq!(prices, vec![10, 20, 30]);

    let probe = Value::handle(item(item_ty, 20));
    assert_eq!(inventory.find(&probe, 0, &pool).unwrap(), Some(1));

    // A copy is element-wise equal but shares the underlying objects.
    let mut copy = DynamicArray::new(reg.clone(), item_ty).unwrap();
    copy.copy_from(&inventory).unwrap();
    assert!(copy.equals(&inventory, &pool).unwrap());
    let first = inventory.ref_at(0).unwrap().as_handle().unwrap().clone();
    assert_eq!(copy.index_of_handle(&first, 0).unwrap(), Some(0));
}

#[test]
fn heterogeneous_map_round_trip() {
    let (reg, item_ty) = host_registry();

    let mut state = DynamicMap::new(reg.clone());
    assert!(state.set("gold", reg.prim(PrimKind::I64), Value::from(250i64)));
    assert!(state.set("weapon", item_ty, Value::handle(item(item_ty, 75))));
    assert!(state.set("alive", reg.prim(PrimKind::Bool), Value::from(true)));

    assert_eq!(state.get("gold", reg.prim(PrimKind::I64)).unwrap().as_i64(), Some(250));
    assert_eq!(price_of(state.value_ref("weapon").unwrap()), 75);

    let keys: Vec<&str> = state.keys().collect();
    assert_eq!(keys, vec!["alive", "gold", "weapon"]);

    assert!(state.erase("weapon"));
    assert_eq!(state.len(), 2);
}

#[test]
fn boxed_any_in_a_container() {
    let reg = Arc::new(TypeRegistry::new());
    let mut bag = DynamicMap::new(reg.clone());

    // A box can hold anything, so a map of any-handles is fully dynamic.
    let number = AnyBox::new(reg.clone());
    number.store(reg.prim(PrimKind::I32), Value::from(7i32)).unwrap();
    assert!(bag.set("n", reg.any_type(), Value::handle(number.handle())));

    let out = bag.get("n", reg.any_type()).unwrap();
    let through = out.as_handle().unwrap().downcast_ref::<AnyBox>().unwrap();
    assert_eq!(through.retrieve(reg.prim(PrimKind::I64)).unwrap().as_i64(), Some(7));
}

#[test]
fn collector_walk_breaks_a_container_cycle() {
    let reg = Arc::new(TypeRegistry::new());

    // box → box cycle through two any-boxes.
    let a = AnyBox::new(reg.clone());
    let b = AnyBox::new(reg.clone());
    a.store(reg.any_type(), Value::handle(b.handle())).unwrap();
    b.store(reg.any_type(), Value::handle(a.handle())).unwrap();

    // The mark phase can walk the whole cycle.
    let mut reachable_from_a = Vec::new();
    a.enumerate_references(&mut |h| reachable_from_a.push(h.clone()));
    assert_eq!(reachable_from_a.len(), 1);

    // Breaking each participant's references unwinds the cycle. (Drop the
    // mark-phase clones first so they don't inflate the counts below.)
    drop(reachable_from_a);
    a.release_references();
    b.release_references();
    assert_eq!(Arc::strong_count(&a), 1);
    assert_eq!(Arc::strong_count(&b), 1);

    // An array participates through the same two hooks.
    let item_ty = reg.register_handle_type("Item", false).unwrap();
    let h = item(item_ty, 1);
    let mut arr = DynamicArray::new(reg.clone(), item_ty).unwrap();
    arr.insert_last(Value::handle(h.clone())).unwrap();
    arr.release_references();
    assert_eq!(h.refcount(), 1);
}

#[test]
fn error_taxonomy_is_stable() {
    let (reg, item_ty) = host_registry();
    let pool = ContextPool::new();

    let mut arr = DynamicArray::new(reg.clone(), reg.prim(PrimKind::I32)).unwrap();
    assert_eq!(arr.value_at(0).unwrap_err(), Error::OutOfBounds);
    assert_eq!(arr.insert_at(1, 0i32).unwrap_err(), Error::OutOfBounds);

    let items = DynamicArray::new(reg.clone(), item_ty).unwrap();
    assert_eq!(arr.copy_from(&items).unwrap_err(), Error::TemplateMismatch);

    // Item has comparators; a type without them raises at point of use.
    let bare = reg.register_handle_type("Bare", false).unwrap();
    let mut bares = DynamicArray::new(reg.clone(), bare).unwrap();
    bares.insert_last(Value::handle(item(bare, 0))).unwrap();
    assert_eq!(bares.sort(&pool).unwrap_err(), Error::ComparatorNotFound);
}
