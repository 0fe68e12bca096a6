//! Controller Module - Phase State Machine
//!
//! The controller is the single authority over which phase the collector is
//! in. It does not mark or relocate anything itself; it validates phase
//! transitions requested by [`crate::gc::GarbageCollector`], records a pause
//! timestamp on each one, and runs the background thread that polls heap
//! usage to decide when a cycle should start.
//!
//! ## Phase table
//!
//! ```text
//! IDLE          -> MARK           (should_collect() and not already running)
//! MARK          -> MARK_IDLE      (mark stack drained, or deadline+complete)
//! MARK_IDLE     -> RELOCATE       (reference processing finished)
//! RELOCATE      -> RELOCATE_IDLE  (all candidate regions evacuated)
//! RELOCATE_IDLE -> CLEANUP        (no unhealed references observed)
//! CLEANUP       -> IDLE           (freed regions returned, gc_count++)
//! ```
//!
//! Any transition outside this table is rejected with
//! [`FgcError::InvalidState`]; the caller is expected to treat that as a
//! failed phase and restart from `IDLE` after a backoff (see §7 of the
//! design: nothing here is fatal to the GC).

use crate::config::GcConfig;
use crate::error::{FgcError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The controller's six-state phase machine. Distinct from
/// [`crate::barrier::colored_ptr::GcPhase`], which is the much coarser
/// three-way split (`Idle` / `Marking` / `Relocating`) the load barrier's
/// hot path dispatches on; `GcPhase` here exists so the controller can tell
/// "marking is done but reference processing hasn't run yet" apart from
/// "marking is still running", which the barrier never needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GcPhase {
    Idle,
    Mark,
    MarkIdle,
    Relocate,
    RelocateIdle,
    Cleanup,
}

impl GcPhase {
    /// Is `to` a legal successor of `self` per the table above?
    fn allows(self, to: GcPhase) -> bool {
        matches!(
            (self, to),
            (GcPhase::Idle, GcPhase::Mark)
                | (GcPhase::Mark, GcPhase::MarkIdle)
                | (GcPhase::MarkIdle, GcPhase::Relocate)
                | (GcPhase::Relocate, GcPhase::RelocateIdle)
                | (GcPhase::RelocateIdle, GcPhase::Cleanup)
                | (GcPhase::Cleanup, GcPhase::Idle)
        )
    }
}

/// One recorded phase transition, timestamped for the pause-time histogram
/// and for diagnosing a controller that is stuck in a non-`Idle` phase.
#[derive(Debug, Clone, Copy)]
pub struct PhaseTransition {
    pub from: GcPhase,
    pub to: GcPhase,
    pub at: Instant,
}

/// Drives the GC phase state machine and the background trigger-polling
/// thread. One instance per [`crate::gc::GarbageCollector`].
pub struct PhaseController {
    phase: Mutex<GcPhase>,
    config: Arc<GcConfig>,
    history: Mutex<Vec<PhaseTransition>>,
    gc_count: AtomicU64,
    failed_transitions: AtomicU64,
    /// Set while the background poll thread should keep running; cleared by
    /// `stop_polling` to let it exit at its next wakeup.
    polling: Arc<AtomicBool>,
    poll_thread: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl PhaseController {
    pub fn new(config: Arc<GcConfig>) -> Self {
        Self {
            phase: Mutex::new(GcPhase::Idle),
            config,
            history: Mutex::new(Vec::new()),
            gc_count: AtomicU64::new(0),
            failed_transitions: AtomicU64::new(0),
            polling: Arc::new(AtomicBool::new(false)),
            poll_thread: Mutex::new(None),
        }
    }

    pub fn phase(&self) -> GcPhase {
        *self.phase.lock()
    }

    pub fn is_idle(&self) -> bool {
        self.phase() == GcPhase::Idle
    }

    /// Attempt to move the state machine from its current phase to `to`.
    /// Rejects any transition not in the table instead of silently
    /// clobbering state, so a bug elsewhere in the cycle surfaces here
    /// rather than corrupting heap bookkeeping.
    pub fn advance(&self, to: GcPhase) -> Result<()> {
        let mut phase = self.phase.lock();
        if !phase.allows(to) {
            self.failed_transitions.fetch_add(1, Ordering::Relaxed);
            return Err(FgcError::InvalidState {
                expected: format!("a state reachable from {:?}", *phase),
                actual: format!("{:?}", to),
            });
        }
        let from = *phase;
        *phase = to;
        self.history.lock().push(PhaseTransition {
            from,
            to,
            at: Instant::now(),
        });
        if to == GcPhase::Idle {
            self.gc_count.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// A phase failed outside the normal table (e.g. an allocation inside
    /// relocation kept failing). Per §7, nothing here is fatal: reset to
    /// `IDLE` unconditionally and let the controller retry on its next
    /// poll, after the caller's backoff delay.
    pub fn force_idle_after_failure(&self) {
        let mut phase = self.phase.lock();
        let from = *phase;
        *phase = GcPhase::Idle;
        self.failed_transitions.fetch_add(1, Ordering::Relaxed);
        self.history.lock().push(PhaseTransition {
            from,
            to: GcPhase::Idle,
            at: Instant::now(),
        });
    }

    pub fn gc_count(&self) -> u64 {
        self.gc_count.load(Ordering::Relaxed)
    }

    pub fn failed_transitions(&self) -> u64 {
        self.failed_transitions.load(Ordering::Relaxed)
    }

    pub fn history(&self) -> Vec<PhaseTransition> {
        self.history.lock().clone()
    }

    /// `used / capacity > trigger_ratio`, the same rule `Heap::should_collect`
    /// applies; exposed here too so the background poll thread doesn't need
    /// a `Heap` reference of its own beyond the stats snapshot it is given.
    pub fn should_collect(&self, used: usize, capacity: usize) -> bool {
        if capacity == 0 {
            return false;
        }
        (used as f64 / capacity as f64) as f32 > self.config.gc_trigger_threshold
    }

    /// Spawn the background thread that polls heap usage every
    /// `controller_poll_ms` and calls `trigger` once `should_collect`
    /// returns true and the machine is idle. `trigger` is expected to be a
    /// closure invoking `GarbageCollector::collect`; failures are not
    /// propagated here (they are surfaced to the mutator via the next
    /// allocation instead, per §7).
    pub fn spawn_poll_thread<F>(self: &Arc<Self>, stats_fn: F, trigger: impl Fn() + Send + 'static)
    where
        F: Fn() -> (usize, usize) + Send + 'static,
    {
        if self.polling.swap(true, Ordering::SeqCst) {
            return; // already running
        }
        let controller = Arc::clone(self);
        let polling = Arc::clone(&self.polling);
        let poll_interval = Duration::from_millis(self.config.controller_poll_ms.max(1));
        let handle = std::thread::Builder::new()
            .name("fgc-controller".to_string())
            .spawn(move || {
                while polling.load(Ordering::Relaxed) {
                    std::thread::sleep(poll_interval);
                    let (used, capacity) = stats_fn();
                    if controller.is_idle() && controller.should_collect(used, capacity) {
                        trigger();
                    }
                }
            })
            .expect("failed to spawn fgc-controller thread");
        *self.poll_thread.lock() = Some(handle);
    }

    /// Signal the poll thread to exit and join it. Safe to call even if no
    /// thread was ever spawned.
    pub fn stop_polling(&self) {
        self.polling.store(false, Ordering::SeqCst);
        if let Some(handle) = self.poll_thread.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PhaseController {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> PhaseController {
        PhaseController::new(Arc::new(GcConfig::default()))
    }

    #[test]
    fn full_cycle_round_trips_to_idle() {
        let c = controller();
        assert_eq!(c.phase(), GcPhase::Idle);
        c.advance(GcPhase::Mark).unwrap();
        c.advance(GcPhase::MarkIdle).unwrap();
        c.advance(GcPhase::Relocate).unwrap();
        c.advance(GcPhase::RelocateIdle).unwrap();
        c.advance(GcPhase::Cleanup).unwrap();
        c.advance(GcPhase::Idle).unwrap();
        assert_eq!(c.phase(), GcPhase::Idle);
        assert_eq!(c.gc_count(), 1);
        assert_eq!(c.history().len(), 6);
    }

    #[test]
    fn skipping_a_phase_is_rejected() {
        let c = controller();
        assert!(c.advance(GcPhase::Relocate).is_err());
        assert_eq!(c.phase(), GcPhase::Idle);
        assert_eq!(c.failed_transitions(), 1);
    }

    #[test]
    fn failure_resets_to_idle_without_panicking() {
        let c = controller();
        c.advance(GcPhase::Mark).unwrap();
        c.force_idle_after_failure();
        assert_eq!(c.phase(), GcPhase::Idle);
    }

    #[test]
    fn should_collect_honors_trigger_ratio() {
        let c = controller();
        assert!(!c.should_collect(50, 100)); // default ratio 0.75
        assert!(c.should_collect(80, 100));
        assert!(!c.should_collect(0, 0));
    }
}
