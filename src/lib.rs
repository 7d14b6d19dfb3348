//! Tagged values and a mark-sweep object heap for a bytecode interpreter.
pub mod runtime;

pub use runtime::{
    HeapError, Value,
    gc::{GcConfig, GcHandle, GcHeap, HeapObject, ObjectKind, RootSet, RootSource},
};
