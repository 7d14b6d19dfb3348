//! Collector telemetry.
//!
//! Compiled only with the `gc-telemetry` feature. The heap feeds it from the
//! allocation path and from both collection phases; the recorded history
//! exports as JSON or as a plain-text report.

use std::{
    fmt::Write as _,
    time::{Duration, Instant},
};

use serde::Serialize;

use super::{gc_heap::SweepStats, heap_object::ObjectKind};

/// Lifetime counters for one object kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounters {
    pub allocated: usize,
    pub allocated_bytes: usize,
    /// Times an object of this kind was found marked by a sweep.
    pub survivals: usize,
    /// Release routines run by sweeps.
    pub released: usize,
    pub released_bytes: usize,
}

/// One mark-sweep cycle, as seen from both phases.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleRecord {
    pub cycle: usize,
    pub duration: Duration,
    pub threshold_before: usize,
    /// Objects the mark phase reached from the roots.
    pub reached: usize,
    /// Deepest the mark worklist got.
    pub peak_worklist: usize,
    /// Indexed by `ObjectKind as usize`.
    pub released_by_kind: [usize; ObjectKind::COUNT],
    pub outcome: SweepStats,
}

/// Slot and chain occupancy at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeapSnapshot {
    pub slots: usize,
    pub free_slots: usize,
    pub chain_len: usize,
    pub live_by_kind: [usize; ObjectKind::COUNT],
    pub live_bytes_by_kind: [usize; ObjectKind::COUNT],
}

impl HeapSnapshot {
    pub fn live_bytes(&self) -> usize {
        self.live_bytes_by_kind.iter().sum()
    }
}

#[derive(Debug)]
struct OpenCycle {
    started: Instant,
    threshold_before: usize,
    reached: usize,
    peak_worklist: usize,
    released_by_kind: [usize; ObjectKind::COUNT],
}

/// Per-kind counters plus the history of completed cycles.
#[derive(Debug, Default, Serialize)]
pub struct GcTelemetry {
    kinds: [KindCounters; ObjectKind::COUNT],
    cycles: Vec<CycleRecord>,
    #[serde(skip)]
    open: Option<OpenCycle>,
}

impl GcTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_alloc(&mut self, kind: ObjectKind, bytes: usize) {
        let counters = &mut self.kinds[kind as usize];
        counters.allocated += 1;
        counters.allocated_bytes += bytes;
    }

    /// Opens a cycle. Called before the roots are traced.
    pub fn begin_cycle(&mut self, threshold: usize) {
        self.open = Some(OpenCycle {
            started: Instant::now(),
            threshold_before: threshold,
            reached: 0,
            peak_worklist: 0,
            released_by_kind: [0; ObjectKind::COUNT],
        });
    }

    /// Mark phase results for the open cycle.
    pub fn record_mark(&mut self, reached: usize, peak_worklist: usize) {
        if let Some(open) = self.open.as_mut() {
            open.reached = reached;
            open.peak_worklist = peak_worklist;
        }
    }

    #[inline]
    pub fn record_survival(&mut self, kind: ObjectKind) {
        self.kinds[kind as usize].survivals += 1;
    }

    #[inline]
    pub fn record_release(&mut self, kind: ObjectKind, bytes: usize) {
        let counters = &mut self.kinds[kind as usize];
        counters.released += 1;
        counters.released_bytes += bytes;
        if let Some(open) = self.open.as_mut() {
            open.released_by_kind[kind as usize] += 1;
        }
    }

    /// Closes the open cycle with the sweep's outcome.
    pub fn end_cycle(&mut self, outcome: SweepStats) {
        let open = self.open.take();
        let record = CycleRecord {
            cycle: self.cycles.len(),
            duration: open
                .as_ref()
                .map(|o| o.started.elapsed())
                .unwrap_or_default(),
            threshold_before: open.as_ref().map_or(outcome.threshold_after, |o| o.threshold_before),
            reached: open.as_ref().map_or(0, |o| o.reached),
            peak_worklist: open.as_ref().map_or(0, |o| o.peak_worklist),
            released_by_kind: open.map_or([0; ObjectKind::COUNT], |o| o.released_by_kind),
            outcome,
        };
        self.cycles.push(record);
    }

    pub fn kind(&self, kind: ObjectKind) -> &KindCounters {
        &self.kinds[kind as usize]
    }

    pub fn cycles(&self) -> &[CycleRecord] {
        &self.cycles
    }

    pub fn last_cycle(&self) -> Option<&CycleRecord> {
        self.cycles.last()
    }

    pub fn total_allocated(&self) -> usize {
        self.kinds.iter().map(|k| k.allocated).sum()
    }

    pub fn total_released(&self) -> usize {
        self.kinds.iter().map(|k| k.released).sum()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Plain-text summary: per-kind counters, one line per cycle, then the
    /// current occupancy.
    pub fn report(&self, snapshot: &HeapSnapshot) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "gc: {} cycles, {} allocated, {} released",
            self.cycles.len(),
            self.total_allocated(),
            self.total_released()
        );
        let _ = writeln!(
            out,
            "{:<10} {:>10} {:>10} {:>10} {:>8}",
            "kind", "allocated", "released", "survivals", "live"
        );
        for kind in ObjectKind::ALL {
            let k = self.kind(kind);
            let _ = writeln!(
                out,
                "{:<10} {:>10} {:>10} {:>10} {:>8}",
                kind.label(),
                k.allocated,
                k.released,
                k.survivals,
                snapshot.live_by_kind[kind as usize]
            );
        }
        for c in &self.cycles {
            let _ = write!(
                out,
                "cycle {}: reached {} of {}, released {}",
                c.cycle, c.reached, c.outcome.live_before, c.outcome.released
            );
            let released: Vec<String> = ObjectKind::ALL
                .iter()
                .filter(|&&kind| c.released_by_kind[kind as usize] > 0)
                .map(|&kind| format!("{} {}", kind, c.released_by_kind[kind as usize]))
                .collect();
            if !released.is_empty() {
                let _ = write!(out, " ({})", released.join(", "));
            }
            let _ = writeln!(
                out,
                ", threshold {} -> {}, {}us",
                c.threshold_before,
                c.outcome.threshold_after,
                c.duration.as_micros()
            );
        }
        let _ = writeln!(
            out,
            "slots {}, free {}, chain {}, live bytes {}",
            snapshot.slots,
            snapshot.free_slots,
            snapshot.chain_len,
            snapshot.live_bytes()
        );
        out
    }
}
