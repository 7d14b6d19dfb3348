use crate::runtime::value::Value;

/// Shared capture cell.
///
/// Closures alias an upvalue by holding its `GcHandle`, so every write made
/// through `GcHeap::upvalue_set` is seen by every closure holding the same
/// handle. Opening and closing cells against live stack frames is the call
/// stack manager's job; open cells reach the collector as roots.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Upvalue {
    pub value: Value,
}

impl Upvalue {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}
