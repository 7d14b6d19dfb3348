use std::fmt;

/// Handle into the GC heap.
///
/// A `GcHandle` is a lightweight, copyable slot index that names a
/// heap-allocated object managed by the collector. It is the runtime
/// representation used inside `Value::Object`, inside list elements, and in a
/// closure's upvalue array.
///
/// Handles do not keep their object alive. An object survives a collection
/// only if a handle to it is reachable from the root set when `mark` runs;
/// after that object is swept its slot may be reused by a later allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GcHandle(pub(crate) u32);

impl GcHandle {
    /// Returns the raw heap slot index backing this handle.
    pub fn index(self) -> u32 {
        self.0
    }

    #[cfg(test)]
    pub fn new_for_test(index: u32) -> Self {
        Self(index)
    }
}

impl fmt::Display for GcHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
