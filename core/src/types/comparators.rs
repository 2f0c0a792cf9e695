//! Per-type comparator resolution and caching.
//!
//! Generic containers sometimes need to compare values of a type unknown at
//! compile time. The registry resolves an `(equals, order)` callable pair per
//! element type, at most once for the registry's lifetime, and containers read
//! the memoized outcome lock-free afterwards.

use core::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::context::ExecContext;
use crate::error::Error;
use crate::types::desc::TypeDesc;
use crate::types::registry::{MethodDef, ReturnKind, TypeId};
use crate::values::ValueRef;

/// Result of invoking a comparison method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Bool(bool),
    Order(Ordering),
}

/// A resolved comparison callable.
///
/// Receives the execution context borrowed for the call, the receiver value,
/// and the single parameter value. The callable may re-enter the scripting
/// runtime; suspension happens at that boundary, not inside the containers.
pub type MethodFn =
    Arc<dyn Fn(&mut ExecContext, ValueRef<'_>, ValueRef<'_>) -> Result<CallOutcome, Error> + Send + Sync>;

/// Tri-state outcome of resolving one comparator role for a type.
///
/// `NotFound` and `Ambiguous` are terminal: once recorded for a type they are
/// never retried. Consumers raise only at point of use.
#[derive(Clone)]
pub enum Resolution<T> {
    Resolved(T),
    NotFound,
    Ambiguous,
}

impl<T> Resolution<T> {
    /// The callable, or the point-of-use error for this role.
    pub fn require(&self) -> Result<&T, Error> {
        match self {
            Resolution::Resolved(f) => Ok(f),
            Resolution::NotFound => Err(Error::ComparatorNotFound),
            Resolution::Ambiguous => Err(Error::ComparatorAmbiguous),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

impl<T> core::fmt::Debug for Resolution<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Resolution::Resolved(_) => f.write_str("Resolved"),
            Resolution::NotFound => f.write_str("NotFound"),
            Resolution::Ambiguous => f.write_str("Ambiguous"),
        }
    }
}

/// The cached `(equals, order)` pair for one element type.
pub struct TypeComparators {
    pub equals: Resolution<MethodFn>,
    pub order: Resolution<MethodFn>,
}

/// Resolve both comparator roles for `elem` from the registered methods.
///
/// Candidates take exactly one parameter whose type, stripped of handle/const
/// qualifiers, matches the element type. A boolean-returning candidate fills
/// the `equals` role, a signed-ordering-returning candidate the `order` role.
/// If the element type is const-qualified, candidates must accept their
/// parameter as const. Exactly one survivor per role resolves; zero records
/// `NotFound`, more than one `Ambiguous`.
pub(crate) fn resolve_for(
    elem: &TypeDesc,
    base_of: impl Fn(TypeId) -> TypeId,
    methods: &[MethodDef],
) -> TypeComparators {
    let elem_base = base_of(elem.id());
    let elem_is_const = elem.is_const_handle();

    let mut equals: Resolution<MethodFn> = Resolution::NotFound;
    let mut order: Resolution<MethodFn> = Resolution::NotFound;

    for m in methods {
        if base_of(m.receiver) != elem_base || base_of(m.param.type_id) != elem_base {
            continue;
        }
        if elem_is_const && !m.param.is_const {
            continue;
        }
        let role = match m.ret {
            ReturnKind::Bool => &mut equals,
            ReturnKind::Order => &mut order,
            ReturnKind::Other => continue,
        };
        *role = match role {
            Resolution::NotFound => Resolution::Resolved(m.invoke.clone()),
            _ => Resolution::Ambiguous,
        };
    }

    debug!(
        ty = elem.decl(),
        equals = ?equals,
        order = ?order,
        "resolved comparison methods"
    );

    TypeComparators { equals, order }
}
