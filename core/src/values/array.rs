//! The generic dynamic array.

use core::cmp::Ordering;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::debug;

use crate::context::ContextPool;
use crate::error::Error;
use crate::types::{CallOutcome, PrimKind, PrimValue, TypeDesc, TypeId, TypeRegistry, TypeShape};
use crate::values::handle::Handle;
use crate::values::init::InitEntry;
use crate::values::object::GcParticipant;
use crate::values::slot::{Payload, Value, ValueRef};

/// Default-constructed element for one concrete element type, resolved once
/// at array construction: zero for primitives, null for handles, the
/// registered default constructor for value objects.
enum Filler {
    Zero(PrimKind),
    NullHandle,
    Ctor(crate::types::DefaultCtor),
}

impl Filler {
    fn make(&self) -> Payload {
        match self {
            Filler::Zero(kind) => Payload::Inline(PrimValue::zero(*kind)),
            Filler::NullHandle => Payload::Shared(None),
            Filler::Ctor(ctor) => Payload::Owned(ctor()),
        }
    }
}

/// A dynamically resizable array of one element type.
///
/// Elements live in a contiguous buffer of category-tagged cells; every
/// occupied cell is live and category-consistent with the element
/// descriptor. Growth via [`DynamicArray::resize`] allocates exactly the
/// requested length, while [`DynamicArray::reserve`] may grow amortized —
/// the asymmetry is deliberate and observable through
/// [`DynamicArray::capacity`].
///
/// Mutation takes `&mut self`; hosts sharing an array across owners are
/// responsible for external locking.
pub struct DynamicArray {
    registry: Arc<TypeRegistry>,
    elem: Arc<TypeDesc>,
    filler: Filler,
    buf: Vec<Payload>,
}

impl DynamicArray {
    /// An empty array of `elem_ty` elements.
    ///
    /// Fails with `InvalidArgument` if the type is unknown, or if it is a
    /// value-object type without a default constructor (growth could not
    /// construct the gap).
    pub fn new(registry: Arc<TypeRegistry>, elem_ty: TypeId) -> Result<Self, Error> {
        let elem = registry.descriptor_of(elem_ty).ok_or(Error::InvalidArgument)?;
        let filler = match elem.shape() {
            TypeShape::Primitive(kind) => Filler::Zero(*kind),
            TypeShape::Handle { .. } => Filler::NullHandle,
            TypeShape::ValueObject { default_ctor, .. } => {
                Filler::Ctor(default_ctor.clone().ok_or(Error::InvalidArgument)?)
            }
        };
        Ok(Self { registry, elem, filler, buf: Vec::new() })
    }

    /// An array of `len` default-constructed elements.
    pub fn with_length(
        registry: Arc<TypeRegistry>,
        elem_ty: TypeId,
        len: usize,
    ) -> Result<Self, Error> {
        let mut array = Self::new(registry, elem_ty)?;
        array.resize(len)?;
        Ok(array)
    }

    /// Decode an array literal produced by the compiler front-end.
    ///
    /// Every entry must fit the element type (primitives may widen);
    /// anything else is a `TemplateMismatch`.
    pub fn from_entries(
        registry: Arc<TypeRegistry>,
        elem_ty: TypeId,
        entries: impl IntoIterator<Item = InitEntry>,
    ) -> Result<Self, Error> {
        let mut array = Self::new(registry, elem_ty)?;
        for entry in entries {
            if array.registry.descriptor_of(entry.ty).is_none() {
                return Err(Error::TemplateMismatch);
            }
            let payload =
                Payload::from_value(&array.elem, entry.value).ok_or(Error::TemplateMismatch)?;
            array.check_size(array.buf.len() + 1)?;
            array.buf.push(payload);
        }
        Ok(array)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn element_type(&self) -> TypeId {
        self.elem.id()
    }

    /// Ensure capacity for at least `cap` elements. May over-allocate
    /// (amortized growth) and never shrinks.
    pub fn reserve(&mut self, cap: usize) -> Result<(), Error> {
        if cap > self.buf.capacity() {
            self.check_size(cap)?;
            self.buf.reserve(cap - self.buf.len());
        }
        Ok(())
    }

    /// Resize to exactly `new_len` elements.
    ///
    /// Shrinking destroys the tail. Growing past the current capacity
    /// allocates a fresh buffer sized exactly to `new_len` — no amortized
    /// slack — and re-homes the existing elements.
    pub fn resize(&mut self, new_len: usize) -> Result<(), Error> {
        let len = self.buf.len();
        if new_len < len {
            self.buf.truncate(new_len);
            Ok(())
        } else {
            self.insert_gap(len, new_len - len)
        }
    }

    /// Grow or shrink by `delta` elements at position `at`.
    ///
    /// Positive `delta` opens a default-constructed gap before `at`;
    /// negative `delta` destroys `[at, at + |delta|)` (clamped to the tail)
    /// and shifts the rest down.
    pub fn resize_delta(&mut self, delta: isize, at: usize) -> Result<(), Error> {
        let len = self.buf.len();
        if at > len {
            return Err(Error::OutOfBounds);
        }
        if delta >= 0 {
            self.insert_gap(at, delta as usize)
        } else {
            let count = (delta.unsigned_abs()).min(len - at);
            self.buf.drain(at..at + count);
            Ok(())
        }
    }

    /// Insert `value` before `index` (`index == len` appends).
    pub fn insert_at(&mut self, index: usize, value: impl Into<Value>) -> Result<(), Error> {
        if index > self.buf.len() {
            return Err(Error::OutOfBounds);
        }
        let payload =
            Payload::from_value(&self.elem, value.into()).ok_or(Error::InvalidArgument)?;
        self.insert_payloads(index, [payload])
    }

    pub fn insert_last(&mut self, value: impl Into<Value>) -> Result<(), Error> {
        self.insert_at(self.buf.len(), value)
    }

    /// Insert a duplicate of every element of `other` before `index`.
    pub fn insert_range(&mut self, index: usize, other: &DynamicArray) -> Result<(), Error> {
        if index > self.buf.len() {
            return Err(Error::OutOfBounds);
        }
        if other.elem.id() != self.elem.id() {
            return Err(Error::TemplateMismatch);
        }
        let copies: Vec<Payload> = other.buf.iter().map(Payload::duplicate).collect();
        self.insert_payloads(index, copies)
    }

    /// Insert duplicates of this array's own `[start, start + count)` before
    /// `index`.
    ///
    /// The source elements are duplicated before any cell moves, so the copy
    /// never reads an element the shift has already overwritten.
    pub fn insert_range_within(
        &mut self,
        index: usize,
        start: usize,
        count: usize,
    ) -> Result<(), Error> {
        let len = self.buf.len();
        if index > len || start > len {
            return Err(Error::OutOfBounds);
        }
        let count = count.min(len - start);
        let copies: SmallVec<[Payload; 8]> =
            self.buf[start..start + count].iter().map(Payload::duplicate).collect();
        self.insert_payloads(index, copies)
    }

    /// Remove the element at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<(), Error> {
        if index >= self.buf.len() {
            return Err(Error::OutOfBounds);
        }
        self.buf.remove(index);
        Ok(())
    }

    pub fn remove_last(&mut self) -> Result<(), Error> {
        match self.buf.pop() {
            Some(_) => Ok(()),
            None => Err(Error::OutOfBounds),
        }
    }

    /// Remove `[start, start + count)`.
    ///
    /// `start` past the end fails; a `count` overshooting the tail is
    /// clamped to what is available rather than failing.
    pub fn remove_range(&mut self, start: usize, count: usize) -> Result<(), Error> {
        let len = self.buf.len();
        if start > len {
            return Err(Error::OutOfBounds);
        }
        let count = count.min(len - start);
        self.buf.drain(start..start + count);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Copy the element at `index` out as an owned value.
    pub fn value_at(&self, index: usize) -> Result<Value, Error> {
        let payload = self.buf.get(index).ok_or(Error::OutOfBounds)?;
        payload.extract(&self.elem, &self.elem).ok_or(Error::InvalidArgument)
    }

    /// Borrowed view of the element at `index`.
    pub fn ref_at(&self, index: usize) -> Option<ValueRef<'_>> {
        self.buf.get(index).map(Payload::as_value_ref)
    }

    pub fn first(&self) -> Option<ValueRef<'_>> {
        self.ref_at(0)
    }

    pub fn last(&self) -> Option<ValueRef<'_>> {
        self.buf.last().map(Payload::as_value_ref)
    }

    /// Overwrite the element at `index` (releases the previous element).
    pub fn set_at(&mut self, index: usize, value: impl Into<Value>) -> Result<(), Error> {
        if index >= self.buf.len() {
            return Err(Error::OutOfBounds);
        }
        let payload =
            Payload::from_value(&self.elem, value.into()).ok_or(Error::InvalidArgument)?;
        self.buf[index] = payload;
        Ok(())
    }

    /// Replace this array's contents with duplicates of `other`'s elements.
    pub fn copy_from(&mut self, other: &DynamicArray) -> Result<(), Error> {
        if other.elem.id() != self.elem.id() {
            return Err(Error::TemplateMismatch);
        }
        let mut fresh = Vec::with_capacity(other.buf.len());
        fresh.extend(other.buf.iter().map(Payload::duplicate));
        self.buf = fresh;
        Ok(())
    }

    /// Linear search for `probe` starting at `start_at`, using the cached
    /// `equals` comparator for non-primitive elements.
    ///
    /// Fails with `ComparatorNotFound`/`ComparatorAmbiguous` when the
    /// element type has no usable equality method, and with
    /// `InvalidArgument` for a probe that cannot widen into a primitive
    /// element type. Usage errors raise even when `start_at` is past the
    /// end; a start offset that merely leaves nothing to scan is `None`.
    pub fn find(
        &self,
        probe: &Value,
        start_at: usize,
        pool: &ContextPool,
    ) -> Result<Option<usize>, Error> {
        match self.elem.shape() {
            TypeShape::Primitive(kind) => {
                let probe = probe
                    .as_prim()
                    .and_then(|pv| pv.widen_to(*kind))
                    .ok_or(Error::InvalidArgument)?;
                for (i, cell) in self.buf.iter().enumerate().skip(start_at) {
                    if let ValueRef::Prim(pv) = cell.as_value_ref() {
                        if pv.same_value(&probe) {
                            return Ok(Some(i));
                        }
                    }
                }
                Ok(None)
            }
            _ => {
                let cmps = self.registry.comparators_for(self.elem.id());
                let eq = cmps.equals.require()?.clone();
                let mut ctx = pool.acquire();
                for (i, cell) in self.buf.iter().enumerate().skip(start_at) {
                    let outcome =
                        ctx.scoped_call(|ctx| eq(ctx, cell.as_value_ref(), probe.as_ref()))?;
                    if outcome == CallOutcome::Bool(true) {
                        return Ok(Some(i));
                    }
                }
                Ok(None)
            }
        }
    }

    /// Linear search with an explicit equality callable.
    pub fn find_with(
        &self,
        probe: &Value,
        start_at: usize,
        mut eq: impl FnMut(ValueRef<'_>, ValueRef<'_>) -> bool,
    ) -> Result<Option<usize>, Error> {
        for (i, cell) in self.buf.iter().enumerate().skip(start_at) {
            if eq(cell.as_value_ref(), probe.as_ref()) {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    /// Identity search: the first element whose handle points at the same
    /// object as `probe`. Needs no comparator, but is only meaningful for
    /// handle element types.
    pub fn index_of_handle(
        &self,
        probe: &Handle,
        start_at: usize,
    ) -> Result<Option<usize>, Error> {
        if !matches!(self.elem.shape(), TypeShape::Handle { .. }) {
            return Err(Error::InvalidArgument);
        }
        for (i, cell) in self.buf.iter().enumerate().skip(start_at) {
            if let Payload::Shared(Some(h)) = cell {
                if h.ptr_eq(probe) {
                    return Ok(Some(i));
                }
            }
        }
        Ok(None)
    }

    /// Sort ascending with the cached `order` comparator (primitives sort
    /// natively). Insertion sort: already-sorted input does no swaps, so
    /// sorting twice equals sorting once.
    pub fn sort(&mut self, pool: &ContextPool) -> Result<(), Error> {
        match self.elem.shape() {
            TypeShape::Primitive(_) => insertion_sort(&mut self.buf, |a, b| {
                match (a.as_value_ref(), b.as_value_ref()) {
                    (ValueRef::Prim(x), ValueRef::Prim(y)) => Ok(x.order(&y)),
                    _ => Err(Error::InvalidArgument),
                }
            }),
            _ => {
                let cmps = self.registry.comparators_for(self.elem.id());
                let ord = cmps.order.require()?.clone();
                let mut ctx = pool.acquire();
                insertion_sort(&mut self.buf, |a, b| {
                    let outcome =
                        ctx.scoped_call(|ctx| ord(ctx, a.as_value_ref(), b.as_value_ref()))?;
                    match outcome {
                        CallOutcome::Order(o) => Ok(o),
                        CallOutcome::Bool(_) => Err(Error::InvalidArgument),
                    }
                })
            }
        }
    }

    /// Sort ascending with an explicit ordering callable.
    pub fn sort_with(
        &mut self,
        mut cmp: impl FnMut(ValueRef<'_>, ValueRef<'_>) -> Ordering,
    ) -> Result<(), Error> {
        insertion_sort(&mut self.buf, |a, b| Ok(cmp(a.as_value_ref(), b.as_value_ref())))
    }

    pub fn reverse(&mut self) {
        self.buf.reverse();
    }

    pub fn swap(&mut self, i: usize, j: usize) -> Result<(), Error> {
        if i >= self.buf.len() || j >= self.buf.len() {
            return Err(Error::OutOfBounds);
        }
        self.buf.swap(i, j);
        Ok(())
    }

    /// Element-wise equality.
    ///
    /// Arrays of different element types or lengths compare unequal. With no
    /// resolvable `equals` for a non-primitive element type, any pair that is
    /// not identical (same shared object, both null, or the very same cell)
    /// compares unequal; this operation never raises for a missing comparator.
    pub fn equals(&self, other: &DynamicArray, pool: &ContextPool) -> Result<bool, Error> {
        if self.elem.id() != other.elem.id() || self.buf.len() != other.buf.len() {
            return Ok(false);
        }
        match self.elem.shape() {
            TypeShape::Primitive(_) => {
                for (a, b) in self.buf.iter().zip(&other.buf) {
                    match (a.as_value_ref(), b.as_value_ref()) {
                        (ValueRef::Prim(x), ValueRef::Prim(y)) if x.same_value(&y) => {}
                        _ => return Ok(false),
                    }
                }
                Ok(true)
            }
            _ => {
                let cmps = self.registry.comparators_for(self.elem.id());
                match cmps.equals.require() {
                    Ok(eq) => {
                        let eq = eq.clone();
                        let mut ctx = pool.acquire();
                        for (a, b) in self.buf.iter().zip(&other.buf) {
                            let outcome = ctx
                                .scoped_call(|ctx| eq(ctx, a.as_value_ref(), b.as_value_ref()))?;
                            if outcome != CallOutcome::Bool(true) {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    }
                    Err(_) => {
                        for (a, b) in self.buf.iter().zip(&other.buf) {
                            if !identical(a, b) {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    }
                }
            }
        }
    }

    fn check_size(&self, new_len: usize) -> Result<(), Error> {
        if new_len > self.registry.max_elements(core::mem::size_of::<Payload>()) {
            return Err(Error::TooLarge);
        }
        Ok(())
    }

    /// Open a default-constructed gap of `count` cells before `at`.
    fn insert_gap(&mut self, at: usize, count: usize) -> Result<(), Error> {
        let filler = match &self.filler {
            Filler::Zero(kind) => Filler::Zero(*kind),
            Filler::NullHandle => Filler::NullHandle,
            Filler::Ctor(ctor) => Filler::Ctor(ctor.clone()),
        };
        self.insert_payloads(at, (0..count).map(move |_| filler.make()))
    }

    /// Insert pre-built cells before `at`, honoring the exact-size growth
    /// contract when the buffer must be reallocated.
    fn insert_payloads<I>(&mut self, at: usize, items: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = Payload>,
        I::IntoIter: ExactSizeIterator,
    {
        let items = items.into_iter();
        let len = self.buf.len();
        let new_len = len.checked_add(items.len()).ok_or(Error::TooLarge)?;
        self.check_size(new_len)?;

        if new_len <= self.buf.capacity() {
            // Tail shift within the existing buffer.
            let _ = self.buf.splice(at..at, items);
        } else {
            // Exact-size growth: the fresh buffer is allocated before the
            // old one is touched, so an aborting allocation never leaves a
            // partially-shifted buffer observable.
            debug!(len, new_len, "array regrow to exact size");
            let mut fresh = Vec::with_capacity(new_len);
            let mut old = core::mem::take(&mut self.buf);
            let tail = old.split_off(at);
            fresh.extend(old);
            fresh.extend(items);
            fresh.extend(tail);
            self.buf = fresh;
        }
        Ok(())
    }
}

impl GcParticipant for DynamicArray {
    fn enumerate_references(&self, visitor: &mut dyn FnMut(&Handle)) {
        for cell in &self.buf {
            match cell {
                Payload::Shared(Some(h)) => visitor(h),
                Payload::Owned(obj) if self.elem.is_collectible() => {
                    obj.enumerate_references(visitor);
                }
                _ => {}
            }
        }
    }

    fn release_references(&mut self) {
        for cell in &mut self.buf {
            if matches!(cell, Payload::Shared(Some(_))) {
                *cell = Payload::Shared(None);
            }
        }
    }
}

impl core::fmt::Debug for DynamicArray {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DynamicArray")
            .field("elem", &self.elem.decl())
            .field("len", &self.buf.len())
            .finish()
    }
}

/// Are two cells the same value by identity alone? Owned boxes are never
/// shared, so pointer-equal `Owned` cells are the same cell (an array
/// compared against itself).
fn identical(a: &Payload, b: &Payload) -> bool {
    match (a, b) {
        (Payload::Shared(Some(x)), Payload::Shared(Some(y))) => x.ptr_eq(y),
        (Payload::Shared(None), Payload::Shared(None)) => true,
        (Payload::Owned(x), Payload::Owned(y)) => {
            core::ptr::addr_eq(&raw const **x, &raw const **y)
        }
        _ => false,
    }
}

/// In-place insertion sort. Stable, O(n²), and a no-op pass over sorted
/// input; errors from the comparator propagate immediately.
fn insertion_sort(
    buf: &mut [Payload],
    mut cmp: impl FnMut(&Payload, &Payload) -> Result<Ordering, Error>,
) -> Result<(), Error> {
    for i in 1..buf.len() {
        let mut j = i;
        while j > 0 {
            if cmp(&buf[j], &buf[j - 1])? == Ordering::Less {
                buf.swap(j, j - 1);
                j -= 1;
            } else {
                break;
            }
        }
    }
    Ok(())
}
