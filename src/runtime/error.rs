//! Recoverable heap errors.
//!
//! Only operations that grow existing storage, or that validate caller input,
//! report through here. Allocating a fresh object never fails recoverably: the
//! global allocator aborts the process, so a half-built object is never
//! observable.
use thiserror::Error;

use crate::runtime::gc::ObjectKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeapError {
    #[error("allocation failed while growing {kind} storage to {requested} {}", .kind.growth_unit())]
    AllocationFailed { kind: ObjectKind, requested: usize },

    #[error("index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("closure expects {expected} upvalues, got {found}")]
    UpvalueCountMismatch { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, HeapError>;
