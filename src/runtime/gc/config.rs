use serde::{Deserialize, Serialize};

pub const DEFAULT_GC_THRESHOLD: usize = 10_000;
pub const MIN_GC_THRESHOLD: usize = 1024;
pub const MAX_GC_THRESHOLD: usize = 1_000_000;

/// Collector settings.
///
/// The heap never collects on its own; `threshold` and `enabled` only drive
/// [`GcHeap::should_collect`](super::GcHeap::should_collect), which the host
/// polls before allocating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcConfig {
    /// Allocations since the last cycle before `should_collect` fires.
    pub threshold: usize,
    pub enabled: bool,
    /// Rescale the threshold after each cycle based on how much was freed.
    pub adaptive: bool,
    /// Print one summary line per cycle to stderr.
    pub trace: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_GC_THRESHOLD,
            enabled: true,
            adaptive: true,
            trace: false,
        }
    }
}

impl GcConfig {
    /// Parses a config from JSON. Missing fields keep their defaults.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
