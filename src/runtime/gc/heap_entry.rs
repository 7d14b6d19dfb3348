use crate::runtime::gc::{gc_handle::GcHandle, heap_object::HeapObject};

/// One occupied heap slot: the object, its mark bit, and the link to the
/// next-older entry in the allocation chain.
///
/// `marked` and `next` belong to the collector; nothing outside `gc_heap`
/// writes them.
#[derive(Debug)]
pub(crate) struct HeapEntry {
    pub(crate) object: HeapObject,
    pub(crate) marked: bool,
    pub(crate) next: Option<GcHandle>,
}

impl HeapEntry {
    pub(crate) fn new(object: HeapObject, next: Option<GcHandle>) -> Self {
        Self {
            object,
            marked: false,
            next,
        }
    }
}
