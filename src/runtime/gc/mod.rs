pub mod config;
pub mod gc_handle;
pub mod gc_heap;
pub mod heap_entry;
pub mod heap_object;
pub mod roots;
#[cfg(feature = "gc-telemetry")]
pub mod telemetry;

pub use config::GcConfig;
pub use gc_handle::GcHandle;
pub use gc_heap::{GcHeap, HeapStats, MarkedHeap, SweepStats};
pub use heap_object::{HeapObject, ObjectKind};
pub use roots::{Marker, RootSet, RootSource};
