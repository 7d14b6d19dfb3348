use std::{fmt::Write as _, iter, rc::Rc};

use serde::Serialize;

#[cfg(feature = "gc-telemetry")]
use crate::runtime::gc::telemetry::{GcTelemetry, HeapSnapshot};
use crate::runtime::{
    atom::Atom,
    closure::Closure,
    error::{HeapError, Result},
    function_prototype::{FunctionPrototype, Instructions},
    gc::{
        config::{GcConfig, MAX_GC_THRESHOLD, MIN_GC_THRESHOLD},
        gc_handle::GcHandle,
        heap_entry::HeapEntry,
        heap_object::{HeapObject, ObjectKind},
        roots::{Marker, RootSource},
    },
    list::List,
    string_object::StringObject,
    upvalue::Upvalue,
    value::Value,
};

/// Per-kind object counters.
///
/// Serialized arrays are indexed by `ObjectKind as usize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeapStats {
    allocated: [usize; ObjectKind::COUNT],
    live: [usize; ObjectKind::COUNT],
    released: [usize; ObjectKind::COUNT],
}

impl HeapStats {
    /// Objects of `kind` ever allocated on this heap.
    pub fn allocated(&self, kind: ObjectKind) -> usize {
        self.allocated[kind as usize]
    }

    /// Objects of `kind` currently in the allocation chain.
    pub fn live(&self, kind: ObjectKind) -> usize {
        self.live[kind as usize]
    }

    /// Release routines run for `kind` so far.
    pub fn released(&self, kind: ObjectKind) -> usize {
        self.released[kind as usize]
    }

    pub fn total_released(&self) -> usize {
        self.released.iter().sum()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Outcome of one mark-sweep cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepStats {
    pub live_before: usize,
    pub live_after: usize,
    pub released: usize,
    pub bytes_released: usize,
    pub roots_scanned: usize,
    pub threshold_after: usize,
}

impl SweepStats {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Stop-the-world mark-and-sweep heap.
///
/// Objects live in a slot arena addressed by [`GcHandle`]; freed slots are
/// recycled through a free list. Every occupied slot is also threaded onto
/// the allocation chain, newest first, and sweep walks that chain to find
/// what to release.
///
/// The heap never collects on its own. The host polls
/// [`should_collect`](Self::should_collect) and runs
/// [`collect`](Self::collect), or the two phases through
/// [`mark`](Self::mark), with its current roots.
pub struct GcHeap {
    entries: Vec<Option<HeapEntry>>,
    free_list: Vec<u32>,
    head: Option<GcHandle>,
    live: usize,
    bytes_allocated: usize,
    allocation_count: usize,
    config: GcConfig,
    stats: HeapStats,
    total_collections: usize,
    total_allocations: usize,
    worklist: Vec<GcHandle>,
    #[cfg(feature = "gc-telemetry")]
    telemetry: GcTelemetry,
}

impl Default for GcHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl GcHeap {
    /// Creates a heap with [`GcConfig::default`].
    pub fn new() -> Self {
        Self::with_config(GcConfig::default())
    }

    pub fn with_config(config: GcConfig) -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            head: None,
            live: 0,
            bytes_allocated: 0,
            allocation_count: 0,
            config,
            stats: HeapStats::default(),
            total_collections: 0,
            total_allocations: 0,
            worklist: Vec::with_capacity(16),
            #[cfg(feature = "gc-telemetry")]
            telemetry: GcTelemetry::new(),
        }
    }

    /// Creates a heap with a custom allocation threshold.
    ///
    /// Unlike [`Self::set_threshold`], this does not clamp to `MIN_GC_THRESHOLD`.
    pub fn with_threshold(threshold: usize) -> Self {
        Self::with_config(GcConfig {
            threshold,
            ..GcConfig::default()
        })
    }

    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    /// Enables or disables collection checks.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled
    }

    /// Sets the allocation threshold. Values below `MIN_GC_THRESHOLD` are
    /// clamped upward.
    pub fn set_threshold(&mut self, threshold: usize) {
        self.config.threshold = threshold.max(MIN_GC_THRESHOLD)
    }

    pub fn threshold(&self) -> usize {
        self.config.threshold
    }

    pub fn set_trace(&mut self, enabled: bool) {
        self.config.trace = enabled
    }

    /// Returns `true` when collection is enabled and the allocation count
    /// since the last cycle reached the threshold.
    pub fn should_collect(&self) -> bool {
        self.config.enabled && self.allocation_count >= self.config.threshold
    }

    // -- Allocation --

    pub fn alloc_string(&mut self, value: String) -> GcHandle {
        self.alloc(HeapObject::String(StringObject::new(value)))
    }

    /// Wraps interned text. The interner keeps its own share of `text`.
    pub fn alloc_atom(&mut self, text: Rc<str>) -> GcHandle {
        self.alloc(HeapObject::Atom(Atom::new(text)))
    }

    /// Allocates an empty list with the default initial capacity.
    pub fn alloc_list(&mut self) -> GcHandle {
        self.alloc(HeapObject::List(List::new()))
    }

    pub fn alloc_list_with_capacity(&mut self, capacity: usize) -> GcHandle {
        self.alloc(HeapObject::List(List::with_capacity(capacity)))
    }

    pub fn alloc_list_from(&mut self, values: Vec<Value>) -> GcHandle {
        self.alloc(HeapObject::List(List::from_values(values)))
    }

    pub fn alloc_function(
        &mut self,
        arity: u16,
        name: Option<Rc<str>>,
        upvalue_count: u8,
        instructions: Instructions,
    ) -> GcHandle {
        self.alloc(HeapObject::Function(FunctionPrototype::new(
            arity,
            name,
            upvalue_count,
            instructions,
        )))
    }

    pub fn alloc_upvalue(&mut self, value: Value) -> GcHandle {
        self.alloc(HeapObject::Upvalue(Upvalue::new(value)))
    }

    /// Allocates a closure over `function`, taking ownership of `upvalues`.
    ///
    /// Fails with [`HeapError::UpvalueCountMismatch`] when the array length
    /// differs from the prototype's declared upvalue count.
    pub fn alloc_closure(&mut self, function: GcHandle, upvalues: Vec<GcHandle>) -> Result<GcHandle> {
        let prototype = self.get(function).as_function();
        debug_assert!(
            prototype.is_some(),
            "alloc_closure: {} is not a function prototype",
            function
        );
        debug_assert!(
            upvalues
                .iter()
                .all(|&h| self.try_get(h).is_some_and(|o| o.as_upvalue().is_some())),
            "alloc_closure: upvalue array names a non-upvalue object"
        );

        let expected = prototype.map_or(0, |p| usize::from(p.upvalue_count));
        if upvalues.len() != expected {
            return Err(HeapError::UpvalueCountMismatch {
                expected,
                found: upvalues.len(),
            });
        }
        Ok(self.alloc(HeapObject::Closure(Closure::new(function, upvalues))))
    }

    /// Links `object` at the head of the allocation chain.
    ///
    /// Freed slots are reused through the free list before the arena grows.
    fn alloc(&mut self, object: HeapObject) -> GcHandle {
        let kind = object.kind();
        let size = object.shallow_size_bytes();
        #[cfg(feature = "gc-telemetry")]
        self.telemetry.record_alloc(kind, size);

        self.allocation_count += 1;
        self.total_allocations += 1;
        self.bytes_allocated += size;
        self.live += 1;
        self.stats.allocated[kind as usize] += 1;
        self.stats.live[kind as usize] += 1;

        let entry = HeapEntry::new(object, self.head);
        let handle = if let Some(idx) = self.free_list.pop() {
            self.entries[idx as usize] = Some(entry);
            GcHandle(idx)
        } else {
            let idx = u32::try_from(self.entries.len()).expect("GcHeap: slot index overflow");
            self.entries.push(Some(entry));
            GcHandle(idx)
        };
        self.head = Some(handle);
        handle
    }

    // -- Access --

    /// Returns a live object by handle.
    ///
    /// Panics if the handle points to a free slot or is out of bounds.
    pub fn get(&self, handle: GcHandle) -> &HeapObject {
        &self.entries[handle.0 as usize]
            .as_ref()
            .expect("GcHeap::get: invalid or free handle")
            .object
    }

    /// Mutable access to a live object. Panics like [`Self::get`].
    ///
    /// The mark bit and chain link are not reachable through this.
    pub fn get_mut(&mut self, handle: GcHandle) -> &mut HeapObject {
        &mut self.entries[handle.0 as usize]
            .as_mut()
            .expect("GcHeap::get_mut: invalid or free handle")
            .object
    }

    pub fn try_get(&self, handle: GcHandle) -> Option<&HeapObject> {
        self.entries
            .get(handle.0 as usize)
            .and_then(Option::as_ref)
            .map(|entry| &entry.object)
    }

    pub fn contains(&self, handle: GcHandle) -> bool {
        self.try_get(handle).is_some()
    }

    /// Reads the cell of an upvalue.
    ///
    /// Panics if `handle` does not name a live upvalue.
    pub fn upvalue_get(&self, handle: GcHandle) -> Value {
        match self.get(handle) {
            HeapObject::Upvalue(upvalue) => upvalue.value,
            other => panic!("upvalue_get: {} is a {}", handle, other.kind()),
        }
    }

    /// Writes the cell of an upvalue; every closure aliasing it sees the
    /// new value.
    pub fn upvalue_set(&mut self, handle: GcHandle, value: Value) {
        match self.get_mut(handle) {
            HeapObject::Upvalue(upvalue) => upvalue.value = value,
            other => panic!("upvalue_set: {} is a {}", handle, other.kind()),
        }
    }

    /// Returns the upvalue handle a closure captured in `slot`.
    pub fn closure_upvalue(&self, closure: GcHandle, slot: usize) -> Option<GcHandle> {
        self.get(closure).as_closure().and_then(|c| c.upvalue(slot))
    }

    /// Appends `src`'s text to `dest`. `src` is left as it was; `dest` and
    /// `src` may be the same string.
    pub fn concat_strings(&mut self, dest: GcHandle, src: GcHandle) -> Result<()> {
        if dest == src {
            return match self.get_mut(dest) {
                HeapObject::String(s) => s.concat_self(),
                other => panic!("concat_strings: {} is a {}", dest, other.kind()),
            };
        }
        match self.pair_mut(dest, src) {
            (HeapObject::String(d), HeapObject::String(s)) => d.concat(s),
            (d, s) => panic!(
                "concat_strings: expected two strings, found {} and {}",
                d.kind(),
                s.kind()
            ),
        }
    }

    fn pair_mut(&mut self, a: GcHandle, b: GcHandle) -> (&mut HeapObject, &HeapObject) {
        let (ai, bi) = (a.0 as usize, b.0 as usize);
        assert_ne!(ai, bi);
        let (first, second) = if ai < bi {
            let (lo, hi) = self.entries.split_at_mut(bi);
            (&mut lo[ai], &hi[0])
        } else {
            let (lo, hi) = self.entries.split_at_mut(ai);
            (&mut hi[0], &lo[bi])
        };
        match (first.as_mut(), second.as_ref()) {
            (Some(x), Some(y)) => (&mut x.object, &y.object),
            _ => panic!("GcHeap::pair_mut: invalid or free handle"),
        }
    }

    // -- Inspection --

    /// Number of objects in the allocation chain.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Walks the allocation chain and counts it. Always equals
    /// [`Self::live_count`].
    pub fn chain_len(&self) -> usize {
        self.handles().count()
    }

    /// Handles in allocation-chain order, newest first.
    pub fn handles(&self) -> impl Iterator<Item = GcHandle> + '_ {
        iter::successors(self.head, move |h| {
            self.entries[h.0 as usize].as_ref().and_then(|e| e.next)
        })
    }

    pub fn objects(&self) -> impl Iterator<Item = (GcHandle, &HeapObject)> + '_ {
        self.handles().map(move |h| (h, self.get(h)))
    }

    /// Whether the object is currently marked. Outside a cycle this is
    /// always `false`.
    pub fn is_marked(&self, handle: GcHandle) -> bool {
        self.entries
            .get(handle.0 as usize)
            .and_then(Option::as_ref)
            .is_some_and(|e| e.marked)
    }

    /// Shallow bytes of live objects, as of their allocation or the last
    /// sweep, whichever is later.
    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated
    }

    pub fn stats(&self) -> &HeapStats {
        &self.stats
    }

    pub fn total_allocations(&self) -> usize {
        self.total_allocations
    }

    pub fn total_collections(&self) -> usize {
        self.total_collections
    }

    // -- Collection --

    /// Runs a full stop-the-world mark-and-sweep cycle.
    pub fn collect<R: RootSource + ?Sized>(&mut self, roots: &R) -> SweepStats {
        self.mark(roots).sweep()
    }

    /// Marks everything reachable from `roots`.
    ///
    /// The returned guard holds the heap exclusively until it is swept, so
    /// no mutation can slip in between the phases. Dropping the guard
    /// without calling [`MarkedHeap::sweep`] still sweeps.
    pub fn mark<R: RootSource + ?Sized>(&mut self, roots: &R) -> MarkedHeap<'_> {
        #[cfg(feature = "gc-telemetry")]
        self.telemetry.begin_cycle(self.config.threshold);

        let mut worklist = std::mem::take(&mut self.worklist);
        worklist.clear();

        let roots_scanned = {
            let mut marker = Marker::new(&mut worklist);
            roots.trace_roots(&mut marker);
            marker.scanned()
        };

        let mut reached = 0;
        let mut peak_worklist = worklist.len();
        while let Some(handle) = worklist.pop() {
            if self.mark_handle(handle, &mut worklist) {
                reached += 1;
            }
            peak_worklist = peak_worklist.max(worklist.len());
        }
        self.worklist = worklist;
        #[cfg(feature = "gc-telemetry")]
        self.telemetry.record_mark(reached, peak_worklist);

        MarkedHeap {
            heap: self,
            roots_scanned,
            reached,
            peak_worklist,
            swept: false,
        }
    }

    /// Marks one object and queues its children. Returns `false` for stale
    /// handles and objects already marked this cycle.
    fn mark_handle(&mut self, handle: GcHandle, worklist: &mut Vec<GcHandle>) -> bool {
        let entry = match self.entries.get_mut(handle.0 as usize) {
            Some(Some(entry)) => entry,
            _ => return false,
        };
        // Mark first so cycles and shared objects are visited once.
        if entry.marked {
            return false;
        }
        entry.marked = true;

        match &entry.object {
            HeapObject::List(list) => {
                worklist.extend(list.iter().filter_map(Value::as_object));
            }
            HeapObject::Closure(closure) => {
                worklist.push(closure.function);
                worklist.extend_from_slice(&closure.upvalues);
            }
            HeapObject::Upvalue(upvalue) => {
                if let Some(child) = upvalue.value.as_object() {
                    worklist.push(child);
                }
            }
            // Leaf kinds: no heap references
            HeapObject::String(_) | HeapObject::Atom(_) | HeapObject::Function(_) => {}
        }
        true
    }

    /// Walks the allocation chain once, releasing unmarked objects and
    /// clearing the mark on survivors.
    fn sweep(&mut self, roots_scanned: usize) -> SweepStats {
        let live_before = self.live;
        let mut released = 0;
        let mut bytes_released = 0;
        let mut bytes_surviving = 0;
        let mut prev: Option<GcHandle> = None;
        let mut cursor = self.head;

        while let Some(handle) = cursor {
            let idx = handle.0 as usize;
            let entry = self.entries[idx]
                .as_mut()
                .expect("GcHeap::sweep: allocation chain points at a free slot");
            let next = entry.next;

            if entry.marked {
                entry.marked = false;
                let size = entry.object.shallow_size_bytes();
                bytes_surviving += size;
                #[cfg(feature = "gc-telemetry")]
                self.telemetry.record_survival(entry.object.kind());
                prev = Some(handle);
            } else {
                match prev {
                    Some(p) => {
                        if let Some(prev_entry) = self.entries[p.0 as usize].as_mut() {
                            prev_entry.next = next;
                        }
                    }
                    None => self.head = next,
                }
                if let Some(dead) = self.entries[idx].take() {
                    let size = dead.object.shallow_size_bytes();
                    bytes_released += size;
                    let kind = dead.object.release();
                    #[cfg(feature = "gc-telemetry")]
                    self.telemetry.record_release(kind, size);
                    self.stats.live[kind as usize] -= 1;
                    self.stats.released[kind as usize] += 1;
                }
                self.free_list.push(handle.0);
                self.live -= 1;
                released += 1;
            }
            cursor = next;
        }

        self.bytes_allocated = bytes_surviving;
        self.total_collections += 1;
        self.allocation_count = 0;
        if self.config.adaptive {
            self.adapt_threshold(released, live_before);
        }

        let outcome = SweepStats {
            live_before,
            live_after: self.live,
            released,
            bytes_released,
            roots_scanned,
            threshold_after: self.config.threshold,
        };
        #[cfg(feature = "gc-telemetry")]
        self.telemetry.end_cycle(outcome);

        if self.config.trace {
            eprintln!(
                "[gc] cycle {}: live {} -> {}, released {}, threshold {}",
                self.total_collections, live_before, self.live, released, self.config.threshold
            );
        }

        outcome
    }

    fn adapt_threshold(&mut self, collected: usize, total_before: usize) {
        if total_before == 0 {
            return;
        }

        let ratio = collected as f64 / total_before as f64;
        if ratio < 0.25 {
            // A configured threshold above the cap is kept, never lowered.
            let ceiling = MAX_GC_THRESHOLD.max(self.config.threshold);
            self.config.threshold = self.config.threshold.saturating_mul(2).min(ceiling);
        } else if ratio > 0.75 {
            self.config.threshold = (self.config.threshold / 2).max(MIN_GC_THRESHOLD)
        }
    }

    // -- Rendering --

    /// Renders a value for diagnostics, following object references.
    ///
    /// Strings and atoms print their text, lists their elements, functions
    /// and closures `<function name>` (or `<function @slot>` when
    /// anonymous). A list or upvalue met again while it is still being
    /// printed renders as `[...]` / `<upvalue ...>`.
    pub fn render(&self, value: Value) -> String {
        let mut out = String::new();
        let mut path = Vec::new();
        self.render_into(value, &mut out, &mut path);
        out
    }

    fn render_into(&self, value: Value, out: &mut String, path: &mut Vec<GcHandle>) {
        let handle = match value {
            Value::Object(handle) => handle,
            scalar => {
                let _ = write!(out, "{}", scalar);
                return;
            }
        };
        let Some(object) = self.try_get(handle) else {
            out.push_str("<freed>");
            return;
        };

        match object {
            HeapObject::String(s) => out.push_str(s.as_str()),
            HeapObject::Atom(atom) => out.push_str(atom.as_str()),
            HeapObject::List(list) => {
                if path.contains(&handle) {
                    out.push_str("[...]");
                    return;
                }
                path.push(handle);
                out.push('[');
                for (i, element) in list.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.render_into(*element, out, path);
                }
                out.push(']');
                path.pop();
            }
            HeapObject::Function(prototype) => render_function(handle, prototype, out),
            HeapObject::Closure(closure) => {
                match self.try_get(closure.function).and_then(HeapObject::as_function) {
                    Some(prototype) => render_function(closure.function, prototype, out),
                    None => out.push_str("<function>"),
                }
            }
            HeapObject::Upvalue(upvalue) => {
                if path.contains(&handle) {
                    out.push_str("<upvalue ...>");
                    return;
                }
                path.push(handle);
                out.push_str("<upvalue ");
                self.render_into(upvalue.value, out, path);
                out.push('>');
                path.pop();
            }
        }
    }

    // -- Telemetry --

    #[cfg(feature = "gc-telemetry")]
    pub fn telemetry(&self) -> &GcTelemetry {
        &self.telemetry
    }

    /// Slot usage and live objects per kind.
    #[cfg(feature = "gc-telemetry")]
    pub fn snapshot(&self) -> HeapSnapshot {
        let mut live_by_kind = [0; ObjectKind::COUNT];
        let mut live_bytes_by_kind = [0; ObjectKind::COUNT];
        let mut chain_len = 0;
        for (_, object) in self.objects() {
            let kind = object.kind() as usize;
            live_by_kind[kind] += 1;
            live_bytes_by_kind[kind] += object.shallow_size_bytes();
            chain_len += 1;
        }
        HeapSnapshot {
            slots: self.entries.len(),
            free_slots: self.free_list.len(),
            chain_len,
            live_by_kind,
            live_bytes_by_kind,
        }
    }

    #[cfg(feature = "gc-telemetry")]
    pub fn telemetry_report(&self) -> String {
        self.telemetry.report(&self.snapshot())
    }
}

fn render_function(handle: GcHandle, prototype: &FunctionPrototype, out: &mut String) {
    match prototype.name() {
        Some(name) => {
            let _ = write!(out, "<function {}>", name);
        }
        None => {
            let _ = write!(out, "<function @{}>", handle.0);
        }
    }
}

/// A heap between its mark and sweep phases.
///
/// Holding the guard keeps the heap borrowed, so the interpreter cannot
/// allocate or mutate mid-cycle.
pub struct MarkedHeap<'a> {
    heap: &'a mut GcHeap,
    roots_scanned: usize,
    reached: usize,
    peak_worklist: usize,
    swept: bool,
}

impl MarkedHeap<'_> {
    /// Objects marked this cycle.
    pub fn reached(&self) -> usize {
        self.reached
    }

    pub fn roots_scanned(&self) -> usize {
        self.roots_scanned
    }

    /// Deepest the mark worklist got this cycle.
    pub fn peak_worklist(&self) -> usize {
        self.peak_worklist
    }

    pub fn is_marked(&self, handle: GcHandle) -> bool {
        self.heap.is_marked(handle)
    }

    pub fn sweep(mut self) -> SweepStats {
        self.swept = true;
        self.heap.sweep(self.roots_scanned)
    }
}

impl Drop for MarkedHeap<'_> {
    fn drop(&mut self) {
        if !self.swept {
            self.heap.sweep(self.roots_scanned);
        }
    }
}
