//! The type registry.
//!
//! Owns every descriptor the runtime knows about, the per-type method table
//! used for comparator resolution, and the comparator cache itself. Registry
//! state lives for the registry's lifetime — there is no process-wide global.

use core::any::TypeId as RustTypeId;
use core::fmt;
use std::sync::{Arc, RwLock};

use hashbrown::HashMap;
use tracing::trace;

use crate::error::Error;
use crate::types::comparators::{self, MethodFn, TypeComparators};
use crate::types::desc::{DefaultCtor, TypeDesc, TypeShape};
use crate::types::kind::PrimKind;
use crate::values::ValueObject;

/// Opaque identity of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

#[cfg(test)]
impl TypeId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

/// The single parameter of a registered comparison method.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub type_id: TypeId,
    /// Parameter taken by const reference / const handle.
    pub is_const: bool,
}

/// Return classification of a registered method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// Boolean return — an `equals` candidate.
    Bool,
    /// Signed-ordering return — an `order` candidate.
    Order,
    /// Anything else; never a comparator candidate.
    Other,
}

/// A method registered on a type, as seen by comparator resolution.
#[derive(Clone)]
pub struct MethodDef {
    pub name: String,
    pub receiver: TypeId,
    pub param: ParamSpec,
    pub ret: ReturnKind,
    pub invoke: MethodFn,
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("receiver", &self.receiver)
            .field("param", &self.param)
            .field("ret", &self.ret)
            .finish()
    }
}

/// Tunables carried by the registry.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Upper bound on any single container buffer, in bytes. The per-type
    /// addressable element count is this divided by the element stride.
    pub max_buffer_bytes: usize,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self { max_buffer_bytes: u32::MAX as usize }
    }
}

#[derive(Default)]
struct RegistryState {
    descs: HashMap<TypeId, Arc<TypeDesc>>,
    by_decl: HashMap<String, TypeId>,
    /// Mutable handle id → const view id.
    const_views: HashMap<TypeId, TypeId>,
    next: u32,
}

impl RegistryState {
    fn insert(&mut self, decl: String, shape: TypeShape, collectible: bool) -> Result<TypeId, Error> {
        if self.by_decl.contains_key(&decl) {
            return Err(Error::InvalidArgument);
        }
        self.next += 1;
        let id = TypeId(self.next);
        let desc = Arc::new(TypeDesc::new(id, decl.clone(), shape, collectible));
        self.descs.insert(id, desc);
        self.by_decl.insert(decl, id);
        Ok(id)
    }
}

/// Registry of runtime type descriptors.
pub struct TypeRegistry {
    options: RegistryOptions,
    state: RwLock<RegistryState>,
    methods: RwLock<Vec<MethodDef>>,
    /// Comparator outcomes, memoized once per type id. Exclusive lock on the
    /// first resolution for a type, shared reads afterwards; an entry is
    /// immutable once inserted.
    comparators: RwLock<HashMap<TypeId, Arc<TypeComparators>>>,
    prims: [TypeId; 11],
    any_ty: TypeId,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        let mut state = RegistryState::default();
        let mut prims = [TypeId(0); 11];
        for (i, kind) in PrimKind::ALL.iter().enumerate() {
            // Built-in declarations are unique, insertion cannot fail here.
            if let Ok(id) = state.insert(kind.decl().to_string(), TypeShape::Primitive(*kind), false)
            {
                prims[i] = id;
            }
        }
        // The boxed-any type participates in garbage collection: it may hold
        // a handle back to something that holds it.
        let any_ty = state
            .insert(
                "any".to_string(),
                TypeShape::Handle { is_const: false, base: TypeId(state.next + 1) },
                true,
            )
            .unwrap_or(TypeId(0));

        Self {
            options,
            state: RwLock::new(state),
            methods: RwLock::new(Vec::new()),
            comparators: RwLock::new(HashMap::new()),
            prims,
            any_ty,
        }
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// The descriptor id of the built-in primitive `kind`.
    pub fn prim(&self, kind: PrimKind) -> TypeId {
        let idx = PrimKind::ALL.iter().position(|k| *k == kind).unwrap_or(0);
        self.prims[idx]
    }

    /// The descriptor id of the boxed-any handle type.
    pub fn any_type(&self) -> TypeId {
        self.any_ty
    }

    /// Register a value-object type with a `Default`-based constructor.
    pub fn register_value_type<T: ValueObject + Default>(&self, decl: &str) -> Result<TypeId, Error> {
        self.register_value_type_with::<T>(
            decl,
            Some(Arc::new(|| Box::new(T::default()) as Box<dyn ValueObject>)),
            false,
        )
    }

    /// Register a value-object type, optionally without a default constructor.
    ///
    /// Types lacking a default constructor cannot be array element types,
    /// since growing an array default-constructs the gap.
    pub fn register_value_type_with<T: ValueObject>(
        &self,
        decl: &str,
        default_ctor: Option<DefaultCtor>,
        collectible: bool,
    ) -> Result<TypeId, Error> {
        let shape = TypeShape::ValueObject { rust_type: RustTypeId::of::<T>(), default_ctor };
        let mut state = write_lock(&self.state);
        let id = state.insert(decl.to_string(), shape, collectible)?;
        trace!(decl, %id, "registered value type");
        Ok(id)
    }

    /// Register a handle (shared, reference-counted) type.
    ///
    /// A const view of the type is registered alongside it, declared as
    /// `const <decl>@`; [`TypeRegistry::const_view_of`] retrieves it.
    pub fn register_handle_type(&self, decl: &str, collectible: bool) -> Result<TypeId, Error> {
        let mut state = write_lock(&self.state);
        // The mutable handle is its own base; its id is known before insertion.
        let base = TypeId(state.next + 1);
        let id = state.insert(
            format!("{decl}@"),
            TypeShape::Handle { is_const: false, base },
            collectible,
        )?;
        debug_assert_eq!(id, base);
        let const_id = state.insert(
            format!("const {decl}@"),
            TypeShape::Handle { is_const: true, base: id },
            collectible,
        )?;
        state.const_views.insert(id, const_id);
        trace!(decl, %id, %const_id, "registered handle type");
        Ok(id)
    }

    pub fn descriptor_of(&self, id: TypeId) -> Option<Arc<TypeDesc>> {
        read_lock(&self.state).descs.get(&id).cloned()
    }

    /// Look up a descriptor by its declaration string, e.g. `"int32"` or
    /// `"const Widget@"`. Used when decoding heterogeneous literals.
    pub fn descriptor_by_decl(&self, decl: &str) -> Option<Arc<TypeDesc>> {
        let state = read_lock(&self.state);
        let id = state.by_decl.get(decl)?;
        state.descs.get(id).cloned()
    }

    /// The const view of a handle type, if `id` names a mutable handle type.
    pub fn const_view_of(&self, id: TypeId) -> Option<TypeId> {
        read_lock(&self.state).const_views.get(&id).copied()
    }

    /// Strip const qualification: the mutable counterpart of a handle type,
    /// or `id` itself for anything else.
    pub fn base_of(&self, id: TypeId) -> TypeId {
        let state = read_lock(&self.state);
        match state.descs.get(&id).map(|d| d.shape()) {
            Some(TypeShape::Handle { base, .. }) => *base,
            _ => id,
        }
    }

    /// Record a method for comparator resolution.
    ///
    /// Has no effect on element types whose comparators were already
    /// resolved — resolution outcomes are terminal for the registry's life.
    pub fn register_method(&self, method: MethodDef) {
        write_lock(&self.methods).push(method);
    }

    /// The memoized `(equals, order)` pair for `id`.
    ///
    /// Resolves on first use under the exclusive lock (double-checked), then
    /// serves the immutable cached entry.
    pub fn comparators_for(&self, id: TypeId) -> Arc<TypeComparators> {
        if let Some(hit) = read_lock(&self.comparators).get(&id) {
            return hit.clone();
        }

        let mut cache = write_lock(&self.comparators);
        // Another thread may have resolved while we waited for the lock.
        if let Some(hit) = cache.get(&id) {
            return hit.clone();
        }

        let resolved = match self.descriptor_of(id) {
            Some(desc) => {
                let methods = read_lock(&self.methods);
                comparators::resolve_for(&desc, |t| self.base_of(t), &methods)
            }
            None => TypeComparators {
                equals: crate::types::Resolution::NotFound,
                order: crate::types::Resolution::NotFound,
            },
        };
        let entry = Arc::new(resolved);
        cache.insert(id, entry.clone());
        entry
    }

    /// Largest representable element count for a buffer of `stride`-byte
    /// elements, per [`RegistryOptions::max_buffer_bytes`].
    pub fn max_elements(&self, stride: usize) -> usize {
        self.options.max_buffer_bytes / stride.max(1)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = read_lock(&self.state);
        f.debug_struct("TypeRegistry")
            .field("types", &state.descs.len())
            .field("options", &self.options)
            .finish()
    }
}

// Lock poisoning carries no meaning for registry state (no invariants span a
// panic boundary), so poisoned locks are recovered rather than propagated.
fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}
