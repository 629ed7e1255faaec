// ABOUTME: Diagnostics sink - decouples the core from any logging framework (spec §9 reshaping note)
// ABOUTME: Owns rate-limiting for "extreme elevation" and similar outlier events

use std::sync::atomic::{AtomicU32, Ordering};

/// An event the core reports to its host through a `DiagnosticsSink`,
/// replacing the source's process-wide warning counters.
#[derive(Debug, Clone)]
pub enum DiagnosticEvent {
    /// An elevation write exceeded `E_EXTREME_THRESHOLD` before being
    /// clamped to `E_MAX`.
    ExtremeElevation { x: i64, z: i64, unclamped: f32 },
    /// A Δt handed to an engine was outside its expected range and was
    /// silently clamped.
    TimeStepClamped { engine: &'static str, requested: f32, clamped: f32 },
}

/// Host-supplied sink for diagnostic events. The core never logs directly;
/// it hands events to whatever sink was passed to the simulator at
/// construction, so the core has no dependency on a logging framework.
pub trait DiagnosticsSink: Send + Sync {
    fn report(&self, event: DiagnosticEvent);
}

/// Default sink: prints the first `N` events of each kind to stderr, then
/// suppresses the rest (§7 "first N, then suppress"). Mirrors the teacher's
/// own `println!`-based verbose-logging convention, just behind a trait.
pub struct StderrDiagnostics {
    limit: u32,
    extreme_elevation_count: AtomicU32,
    time_step_clamped_count: AtomicU32,
}

impl StderrDiagnostics {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            extreme_elevation_count: AtomicU32::new(0),
            time_step_clamped_count: AtomicU32::new(0),
        }
    }
}

impl Default for StderrDiagnostics {
    fn default() -> Self {
        Self::new(20)
    }
}

impl DiagnosticsSink for StderrDiagnostics {
    fn report(&self, event: DiagnosticEvent) {
        let (counter, seen) = match &event {
            DiagnosticEvent::ExtremeElevation { .. } => (
                &self.extreme_elevation_count,
                self.extreme_elevation_count.fetch_add(1, Ordering::Relaxed),
            ),
            DiagnosticEvent::TimeStepClamped { .. } => (
                &self.time_step_clamped_count,
                self.time_step_clamped_count.fetch_add(1, Ordering::Relaxed),
            ),
        };
        let _ = counter;
        if seen >= self.limit {
            return;
        }
        match event {
            DiagnosticEvent::ExtremeElevation { x, z, unclamped } => {
                eprintln!("[strata] extreme elevation at ({x},{z}): {unclamped:.1}m before clamp");
            }
            DiagnosticEvent::TimeStepClamped { engine, requested, clamped } => {
                eprintln!("[strata] {engine}: Δt {requested:.3} clamped to {clamped:.3}");
            }
        }
    }
}

/// Sink that does nothing; useful for tests and benchmarks.
pub struct NullDiagnostics;

impl DiagnosticsSink for NullDiagnostics {
    fn report(&self, _event: DiagnosticEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CollectingSink {
        events: Mutex<Vec<DiagnosticEvent>>,
    }

    impl DiagnosticsSink for CollectingSink {
        fn report(&self, event: DiagnosticEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn stderr_sink_rate_limits_per_kind() {
        let sink = StderrDiagnostics::new(2);
        for i in 0..5 {
            sink.report(DiagnosticEvent::ExtremeElevation { x: i, z: 0, unclamped: 99999.0 });
        }
        assert_eq!(sink.extreme_elevation_count.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn collecting_sink_receives_events() {
        let sink = CollectingSink { events: Mutex::new(Vec::new()) };
        sink.report(DiagnosticEvent::TimeStepClamped { engine: "erosion", requested: 5.0, clamped: 1.0 });
        assert_eq!(sink.events.lock().unwrap().len(), 1);
    }
}
