use std::fmt;

use crate::runtime::gc::GcHandle;

/// Runtime value held by registers, stack slots, list elements and upvalue cells.
///
/// `Value` is a small `Copy` scalar. It never owns heap memory: the `Object`
/// variant carries a [`GcHandle`] whose referent is kept alive only by being
/// reachable from the root set during a collection.
///
/// The discriminant is the only authority for which payload is valid. The
/// `as_*` accessors return `None` on a mismatch instead of reinterpreting the
/// payload, and no accessor coerces between variants.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    /// Uninitialized register or absent result.
    #[default]
    Empty,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Reference to a heap object.
    Object(GcHandle),
}

impl Value {
    pub const fn empty() -> Self {
        Value::Empty
    }

    pub const fn integer(value: i64) -> Self {
        Value::Integer(value)
    }

    pub const fn float(value: f64) -> Self {
        Value::Float(value)
    }

    pub const fn boolean(value: bool) -> Self {
        Value::Bool(value)
    }

    pub const fn object(handle: GcHandle) -> Self {
        Value::Object(handle)
    }

    /// Returns the canonical runtime type label used in diagnostics.
    ///
    /// These labels are user-visible and are expected to remain stable.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Object(_) => "object",
        }
    }

    /// Returns whether this value is truthy.
    ///
    /// Zero integers, zero floats and `false` are falsy; empty values and
    /// every object reference are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Bool(v) => *v,
            Value::Empty | Value::Object(_) => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the heap handle if this value references an object.
    ///
    /// The marker uses this to decide whether a slot needs tracing.
    #[inline]
    pub fn as_object(&self) -> Option<GcHandle> {
        match self {
            Value::Object(handle) => Some(*handle),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<GcHandle> for Value {
    fn from(handle: GcHandle) -> Self {
        Value::Object(handle)
    }
}

/// Scalar rendering. Objects only show their handle here; use
/// `GcHeap::render` to print their contents.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => write!(f, "_"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Object(handle) => write!(f, "<object {}>", handle),
        }
    }
}
