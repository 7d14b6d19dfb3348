//! Runtime value model and heap.
//!
//! # Ownership model
//! [`Value`](value::Value) is a `Copy` scalar; heap objects are reached only
//! through [`GcHandle`](gc::GcHandle)s and are reclaimed only by a mark-sweep
//! cycle on [`GcHeap`](gc::GcHeap). Nothing is reference counted between heap
//! objects, so cycles through lists, closures and upvalues are collected like
//! any other garbage.
//!
//! Two kinds share data with collaborators outside the heap: atoms hold an
//! `Rc<str>` share of interned text, and function prototypes an `Rc<[u8]>`
//! share of the compiled instruction stream. Releasing either object drops
//! only the heap's share.
pub mod atom;
pub mod closure;
pub mod error;
pub mod function_prototype;
pub mod gc;
pub mod list;
pub mod string_object;
pub mod upvalue;
pub mod value;

pub use error::{HeapError, Result};
pub use value::Value;
