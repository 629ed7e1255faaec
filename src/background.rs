// ABOUTME: Worker-thread driver for Simulator - background stepping behind a bounded drop-oldest snapshot queue (§5)
// ABOUTME: std::thread + atomics only, mirroring the generator-thread pattern the pack's viewer apps use for long steps

use crate::simulator::Simulator;
use crate::snapshot::Snapshot;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const QUEUE_CAPACITY: usize = 10;
const IDLE_SLEEP: Duration = Duration::from_millis(10);

struct Shared {
    queue: Mutex<VecDeque<Snapshot>>,
    running: AtomicBool,
    paused: AtomicBool,
}

/// Drives a [`Simulator`] on a dedicated thread so a host doesn't block its
/// own loop on `step()`. Snapshots accumulate in a bounded queue the caller
/// drains at its own pace; once the queue is full the oldest snapshot is
/// dropped to make room rather than blocking the worker (§5).
///
/// No async runtime. The teacher's stack only reaches for one around its
/// UI event loop, never its simulation core, and the pack's own
/// background-generation viewers (see the planet viewer's generator
/// thread) use the same plain `std::thread` + channel/atomic shape this
/// follows.
pub struct BackgroundSimulation {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<Simulator>>,
}

impl BackgroundSimulation {
    /// Spawns the worker and takes ownership of `sim` for the duration of
    /// the run; call [`stop`](Self::stop) to get it back.
    pub fn spawn(mut sim: Simulator) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::with_capacity(QUEUE_CAPACITY)),
            running: AtomicBool::new(true),
            paused: AtomicBool::new(false),
        });
        let worker = Arc::clone(&shared);

        let handle = thread::spawn(move || {
            while worker.running.load(Ordering::Acquire) {
                if worker.paused.load(Ordering::Acquire) {
                    thread::sleep(IDLE_SLEEP);
                    continue;
                }

                let more_work = sim.step();

                if let Some(snapshot) = sim.latest_snapshot().cloned() {
                    let mut queue = worker.queue.lock().unwrap();
                    if queue.len() >= QUEUE_CAPACITY {
                        queue.pop_front();
                    }
                    queue.push_back(snapshot);
                }

                if !more_work {
                    break;
                }
            }
            sim
        });

        Self { shared, handle: Some(handle) }
    }

    /// Suspends stepping without tearing down the worker thread.
    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Drains every snapshot queued since the last drain, oldest first.
    pub fn drain_snapshots(&self) -> Vec<Snapshot> {
        self.shared.queue.lock().unwrap().drain(..).collect()
    }

    pub fn queued_snapshot_count(&self) -> usize {
        self.shared.queue.lock().unwrap().len()
    }

    /// Signals the worker to exit after its current step and blocks until
    /// it does, handing back the simulator in whatever state it reached.
    pub fn stop(mut self) -> Simulator {
        self.shared.running.store(false, Ordering::Release);
        self.handle.take().expect("worker already stopped").join().expect("background worker panicked")
    }
}

impl Drop for BackgroundSimulation {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulatorConfig;

    fn running_sim() -> Simulator {
        let mut sim = Simulator::new(64.0, SimulatorConfig::default()).unwrap();
        sim.initialize(1);
        sim
    }

    #[test]
    fn stop_joins_and_returns_the_simulator() {
        let bg = BackgroundSimulation::spawn(running_sim());
        thread::sleep(Duration::from_millis(50));
        let sim = bg.stop();
        assert!(sim.current_step() > 0 || sim.is_complete());
    }

    #[test]
    fn pause_halts_progress_until_resumed() {
        let bg = BackgroundSimulation::spawn(running_sim());
        bg.pause();
        thread::sleep(Duration::from_millis(30));
        assert!(bg.is_paused());
        bg.resume();
        thread::sleep(Duration::from_millis(30));
        assert!(!bg.is_paused());
        bg.stop();
    }

    #[test]
    fn snapshot_queue_never_exceeds_capacity() {
        let bg = BackgroundSimulation::spawn(running_sim());
        thread::sleep(Duration::from_millis(200));
        assert!(bg.queued_snapshot_count() <= QUEUE_CAPACITY);
        bg.stop();
    }
}
