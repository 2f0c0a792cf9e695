//! Primitive kinds and inline primitive values.

use core::cmp::Ordering;
use core::fmt;

/// The fixed-width scalar kinds a slot can store inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl PrimKind {
    /// Width of the primitive as declared to script, in bytes.
    pub const fn byte_width(self) -> usize {
        match self {
            PrimKind::Bool | PrimKind::I8 | PrimKind::U8 => 1,
            PrimKind::I16 | PrimKind::U16 => 2,
            PrimKind::I32 | PrimKind::U32 | PrimKind::F32 => 4,
            PrimKind::I64 | PrimKind::U64 | PrimKind::F64 => 8,
        }
    }

    pub const fn is_signed_int(self) -> bool {
        matches!(self, PrimKind::I8 | PrimKind::I16 | PrimKind::I32 | PrimKind::I64)
    }

    pub const fn is_unsigned_int(self) -> bool {
        matches!(self, PrimKind::U8 | PrimKind::U16 | PrimKind::U32 | PrimKind::U64)
    }

    pub const fn is_float(self) -> bool {
        matches!(self, PrimKind::F32 | PrimKind::F64)
    }

    /// Whether a value of `self` may be retrieved as `target`.
    ///
    /// The widening rules are deliberately narrow: a signed integer widens to
    /// any wider signed integer, an unsigned integer to any wider unsigned
    /// integer, `f32` to `f64`, and `bool` only to itself. There is no
    /// cross-domain conversion and never an implicit object conversion.
    pub fn widens_to(self, target: PrimKind) -> bool {
        if self == target {
            return true;
        }
        match (self, target) {
            _ if self.is_signed_int() && target.is_signed_int() => {
                self.byte_width() <= target.byte_width()
            }
            _ if self.is_unsigned_int() && target.is_unsigned_int() => {
                self.byte_width() <= target.byte_width()
            }
            (PrimKind::F32, PrimKind::F64) => true,
            _ => false,
        }
    }

    /// Declaration name used by the registry (`descriptor_by_decl`).
    pub const fn decl(self) -> &'static str {
        match self {
            PrimKind::Bool => "bool",
            PrimKind::I8 => "int8",
            PrimKind::I16 => "int16",
            PrimKind::I32 => "int32",
            PrimKind::I64 => "int64",
            PrimKind::U8 => "uint8",
            PrimKind::U16 => "uint16",
            PrimKind::U32 => "uint32",
            PrimKind::U64 => "uint64",
            PrimKind::F32 => "float",
            PrimKind::F64 => "double",
        }
    }

    pub const ALL: [PrimKind; 11] = [
        PrimKind::Bool,
        PrimKind::I8,
        PrimKind::I16,
        PrimKind::I32,
        PrimKind::I64,
        PrimKind::U8,
        PrimKind::U16,
        PrimKind::U32,
        PrimKind::U64,
        PrimKind::F32,
        PrimKind::F64,
    ];
}

/// An inline primitive value.
///
/// `bits` holds the canonical 64-bit form: signed integers are sign-extended,
/// unsigned integers zero-extended, floats stored as `f64` bits, booleans as
/// 0/1. `kind` records the declared width, so widening a value only retags it.
#[derive(Clone, Copy)]
pub struct PrimValue {
    kind: PrimKind,
    bits: u64,
}

impl PrimValue {
    pub fn from_bool(v: bool) -> Self {
        Self { kind: PrimKind::Bool, bits: v as u64 }
    }

    pub fn from_i8(v: i8) -> Self {
        Self { kind: PrimKind::I8, bits: v as i64 as u64 }
    }

    pub fn from_i16(v: i16) -> Self {
        Self { kind: PrimKind::I16, bits: v as i64 as u64 }
    }

    pub fn from_i32(v: i32) -> Self {
        Self { kind: PrimKind::I32, bits: v as i64 as u64 }
    }

    pub fn from_i64(v: i64) -> Self {
        Self { kind: PrimKind::I64, bits: v as u64 }
    }

    pub fn from_u8(v: u8) -> Self {
        Self { kind: PrimKind::U8, bits: v as u64 }
    }

    pub fn from_u16(v: u16) -> Self {
        Self { kind: PrimKind::U16, bits: v as u64 }
    }

    pub fn from_u32(v: u32) -> Self {
        Self { kind: PrimKind::U32, bits: v as u64 }
    }

    pub fn from_u64(v: u64) -> Self {
        Self { kind: PrimKind::U64, bits: v }
    }

    pub fn from_f32(v: f32) -> Self {
        Self { kind: PrimKind::F32, bits: (v as f64).to_bits() }
    }

    pub fn from_f64(v: f64) -> Self {
        Self { kind: PrimKind::F64, bits: v.to_bits() }
    }

    /// A zero value of the given kind, used when containers default-construct
    /// a gap of primitive elements.
    pub fn zero(kind: PrimKind) -> Self {
        let bits = if kind.is_float() { 0.0f64.to_bits() } else { 0 };
        Self { kind, bits }
    }

    pub fn kind(&self) -> PrimKind {
        self.kind
    }

    /// Retag this value as `target`, if the widening rules allow it.
    pub fn widen_to(&self, target: PrimKind) -> Option<PrimValue> {
        if self.kind.widens_to(target) {
            Some(PrimValue { kind: target, bits: self.bits })
        } else {
            None
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            PrimKind::Bool => Some(self.bits != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        if self.kind.is_signed_int() {
            Some(self.bits as i64)
        } else {
            None
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        if self.kind.is_unsigned_int() {
            Some(self.bits)
        } else {
            None
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        if self.kind.is_float() {
            Some(f64::from_bits(self.bits))
        } else {
            None
        }
    }

    /// Equality between two primitives of the same kind domain.
    ///
    /// Floats compare by `total_cmp`, so NaN equals NaN here. Containers use
    /// this for `find` and `==` on primitive elements; script-level float
    /// semantics are the evaluator's concern, not the container's.
    pub fn same_value(&self, other: &PrimValue) -> bool {
        self.order(other) == Ordering::Equal
    }

    /// Total ordering between two primitives.
    ///
    /// The caller guarantees both sides share an element type, so mixed-domain
    /// comparisons fall back to raw-bit ordering rather than panicking.
    pub fn order(&self, other: &PrimValue) -> Ordering {
        if self.kind.is_signed_int() && other.kind.is_signed_int() {
            (self.bits as i64).cmp(&(other.bits as i64))
        } else if self.kind.is_float() && other.kind.is_float() {
            f64::from_bits(self.bits).total_cmp(&f64::from_bits(other.bits))
        } else {
            self.bits.cmp(&other.bits)
        }
    }
}

impl fmt::Debug for PrimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PrimKind::Bool => write!(f, "{}", self.bits != 0),
            k if k.is_signed_int() => write!(f, "{}", self.bits as i64),
            k if k.is_float() => write!(f, "{}", f64::from_bits(self.bits)),
            _ => write!(f, "{}", self.bits),
        }
    }
}

impl PartialEq for PrimValue {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.same_value(other)
    }
}
