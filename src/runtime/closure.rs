use crate::runtime::gc::GcHandle;

/// A function prototype bound to its captured upvalue cells.
///
/// The closure owns the handle array but neither the prototype nor the
/// upvalues it names; those are separate heap objects kept alive by tracing
/// through this closure.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub function: GcHandle,
    pub upvalues: Vec<GcHandle>,
}

impl Closure {
    /// Stores `upvalues` as given. The count check against the prototype is
    /// done by `GcHeap::alloc_closure`, which can see the prototype.
    pub fn new(function: GcHandle, upvalues: Vec<GcHandle>) -> Self {
        Self { function, upvalues }
    }

    pub fn upvalue(&self, slot: usize) -> Option<GcHandle> {
        self.upvalues.get(slot).copied()
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        self.upvalues.capacity() * std::mem::size_of::<GcHandle>()
    }
}
