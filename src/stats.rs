//! Per-search bookkeeping: generated nodes, wall-clock time and process memory.

use std::fs;
use std::time::{Duration, Instant};

/// Statistics of one search run, produced once whether it solved, exhausted
/// the frontier or timed out.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStats {
    /// Length of the solution, 0 without one.
    pub steps: usize,
    /// Sum of the weights of all pushed stones along the solution.
    pub weight: u64,
    /// Successors produced, including the ones pruned as deadlocked or visited.
    pub nodes_generated: u64,
    pub elapsed: Duration,
    /// Change of the process resident size over the run, in MiB.
    pub memory_delta_mb: f64,
    /// Peak resident size of the process at the end of the run, in MiB.
    pub peak_memory_mb: f64,
}

impl SearchStats {
    pub fn elapsed_millis(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

pub(crate) struct Collector {
    started: Instant,
    resident_before: Option<u64>,
    nodes_generated: u64,
}

impl Collector {
    pub fn start() -> Self {
        Self {
            resident_before: read_status_kib("VmRSS:"),
            started: Instant::now(),
            nodes_generated: 0,
        }
    }

    pub fn record_generated(&mut self) {
        self.nodes_generated += 1;
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn finish(self, steps: usize, weight: u64) -> SearchStats {
        let elapsed = self.started.elapsed();
        let resident_after = read_status_kib("VmRSS:");
        let memory_delta_mb = match (self.resident_before, resident_after) {
            (Some(before), Some(after)) => kib_to_mib(after) - kib_to_mib(before),
            _ => 0.0,
        };
        let peak_memory_mb = read_status_kib("VmHWM:").map_or(0.0, kib_to_mib);
        SearchStats {
            steps,
            weight,
            nodes_generated: self.nodes_generated,
            elapsed,
            memory_delta_mb,
            peak_memory_mb,
        }
    }
}

fn kib_to_mib(kib: u64) -> f64 {
    kib as f64 / 1024.0
}

// Only Linux exposes these; elsewhere memory figures stay at 0.
fn read_status_kib(field: &str) -> Option<u64> {
    let status = fs::read_to_string("/proc/self/status").ok()?;
    status
        .lines()
        .find_map(|line| line.strip_prefix(field))
        .and_then(|rest| rest.split_whitespace().next()?.parse().ok())
}
