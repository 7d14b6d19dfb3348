//! GC root injection.
//!
//! The interpreter owns every root (registers, stack slots, globals, open
//! upvalues). It hands them to the collector through [`RootSource`], so the
//! heap never needs to know how the interpreter lays out its frames, and
//! tests can pass a plain slice of values as a synthetic root set.

use crate::runtime::{gc::gc_handle::GcHandle, value::Value};

/// Collects root handles during the mark phase.
pub struct Marker<'a> {
    pending: &'a mut Vec<GcHandle>,
    scanned: usize,
}

impl<'a> Marker<'a> {
    pub(crate) fn new(pending: &'a mut Vec<GcHandle>) -> Self {
        Self {
            pending,
            scanned: 0,
        }
    }

    /// Records a root value. Scalars are counted but not traced.
    #[inline]
    pub fn mark_value(&mut self, value: Value) {
        self.scanned += 1;
        if let Value::Object(handle) = value {
            self.pending.push(handle);
        }
    }

    /// Records a root object handle.
    #[inline]
    pub fn mark_handle(&mut self, handle: GcHandle) {
        self.scanned += 1;
        self.pending.push(handle);
    }

    pub fn mark_values(&mut self, values: &[Value]) {
        for value in values {
            self.mark_value(*value);
        }
    }

    /// Number of root slots visited so far.
    pub fn scanned(&self) -> usize {
        self.scanned
    }
}

/// Anything that can enumerate GC roots.
pub trait RootSource {
    fn trace_roots(&self, marker: &mut Marker<'_>);
}

impl RootSource for Value {
    fn trace_roots(&self, marker: &mut Marker<'_>) {
        marker.mark_value(*self);
    }
}

impl RootSource for GcHandle {
    fn trace_roots(&self, marker: &mut Marker<'_>) {
        marker.mark_handle(*self);
    }
}

impl<T: RootSource> RootSource for [T] {
    fn trace_roots(&self, marker: &mut Marker<'_>) {
        for root in self {
            root.trace_roots(marker);
        }
    }
}

impl<T: RootSource> RootSource for Vec<T> {
    fn trace_roots(&self, marker: &mut Marker<'_>) {
        self.as_slice().trace_roots(marker);
    }
}

impl<T: RootSource, const N: usize> RootSource for [T; N] {
    fn trace_roots(&self, marker: &mut Marker<'_>) {
        self.as_slice().trace_roots(marker);
    }
}

impl<T: RootSource + ?Sized> RootSource for &T {
    fn trace_roots(&self, marker: &mut Marker<'_>) {
        (**self).trace_roots(marker);
    }
}

impl RootSource for () {
    fn trace_roots(&self, _marker: &mut Marker<'_>) {}
}

impl<A: RootSource, B: RootSource> RootSource for (A, B) {
    fn trace_roots(&self, marker: &mut Marker<'_>) {
        self.0.trace_roots(marker);
        self.1.trace_roots(marker);
    }
}

/// Owned root set for hosts that rebuild their roots before each collection.
///
/// Non-object values are dropped on insert since they can never keep
/// anything alive.
#[derive(Debug, Default, Clone)]
pub struct RootSet {
    stack_roots: Vec<GcHandle>,
    global_roots: Vec<GcHandle>,
    open_upvalues: Vec<GcHandle>,
}

impl RootSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stack_root(&mut self, value: Value) {
        if let Some(handle) = value.as_object() {
            self.stack_roots.push(handle);
        }
    }

    pub fn add_global_root(&mut self, value: Value) {
        if let Some(handle) = value.as_object() {
            self.global_roots.push(handle);
        }
    }

    /// Registers an upvalue cell that is still open on a live frame.
    pub fn add_open_upvalue(&mut self, upvalue: GcHandle) {
        self.open_upvalues.push(upvalue);
    }

    pub fn clear_stack_roots(&mut self) {
        self.stack_roots.clear();
    }

    pub fn clear(&mut self) {
        self.stack_roots.clear();
        self.global_roots.clear();
        self.open_upvalues.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = GcHandle> + '_ {
        self.stack_roots
            .iter()
            .chain(self.global_roots.iter())
            .chain(self.open_upvalues.iter())
            .copied()
    }

    pub fn len(&self) -> usize {
        self.stack_roots.len() + self.global_roots.len() + self.open_upvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RootSource for RootSet {
    fn trace_roots(&self, marker: &mut Marker<'_>) {
        for handle in self.iter() {
            marker.mark_handle(handle);
        }
    }
}
