//! Reference Processing Pipeline
//!
//! Runs at the end of concurrent marking, after the live set is known, in a
//! fixed order: soft references, then weak, then phantom, then finalizable
//! objects. Each stage only ever clears references to objects absent from
//! the marked set; an object already cleared by an earlier stage is still
//! visited by later stages (a phantom reference to a soft-cleared object is
//! itself independently cleared) — weak is just one of several reference
//! strengths processed by this same pipeline, not a special case.
//!
//! Soft references are the only strength that *also* checks the GC's own
//! memory pressure signal: they are cleared early, ahead of an OOM, once
//! heap usage crosses `soft_ref_clear_threshold` or the caller reports
//! `memory_low`. Weak and phantom references are always cleared once
//! unreached, independent of memory pressure.
//!
//! This is the single reference-processing entry point the GC cycle calls;
//! an object is only ever reachable through the marked-address set passed
//! to [`ReferenceProcessor::process`].

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::runtime::finalizer::Finalizer;

/// Reference strength, weakest collection resistance last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Cleared only under memory pressure; otherwise behaves like a strong
    /// reference.
    Soft,
    /// Cleared as soon as the referent is unreached.
    Weak,
    /// Cleared as soon as the referent is unreached; never returns the
    /// referent itself, only signals that it was about to be reclaimed.
    Phantom,
}

/// A single managed reference of one of the three weaker-than-strong kinds.
pub struct ManagedReference {
    kind: ReferenceKind,
    referent: AtomicUsize,
    id: u64,
}

impl ManagedReference {
    fn new(kind: ReferenceKind, referent_addr: usize, id: u64) -> Self {
        Self {
            kind,
            referent: AtomicUsize::new(referent_addr),
            id,
        }
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns `None` once cleared. Phantom references never resurrect
    /// their referent through this call even before clearing - callers must
    /// treat the address as already invalid and only use it to identify
    /// the referent to external tracking tables.
    pub fn get(&self) -> Option<usize> {
        match self.referent.load(Ordering::Acquire) {
            0 => None,
            addr => Some(addr),
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.referent.load(Ordering::Acquire) == 0
    }

    fn clear(&self) {
        self.referent.store(0, Ordering::Release);
    }
}

/// Per-cycle counts, one per pipeline stage, reported to `GcStats`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceStageCounts {
    pub soft_cleared: usize,
    pub weak_cleared: usize,
    pub phantom_cleared: usize,
    pub finalizers_scheduled: usize,
}

/// An object with a registered finalizer, awaiting a reachability decision.
/// Kept alive (not collected) for as long as it stays in this registry;
/// removed the cycle it is found unreached, at which point its callback
/// moves to `Finalizer`'s run queue and it can never revive through this
/// path again.
struct PendingFinalizer {
    object: usize,
    callback: Box<dyn FnOnce(usize) + Send>,
}

/// Orchestrates soft/weak/phantom/finalizer processing for one `GarbageCollector`.
pub struct ReferenceProcessor {
    soft_refs: Mutex<Vec<ManagedReference>>,
    weak_refs: Mutex<Vec<ManagedReference>>,
    phantom_refs: Mutex<Vec<ManagedReference>>,
    /// Finalizer-registered objects not yet found unreached (§4.9 point 4),
    /// scanned against the marked set the same way the other three stages
    /// scan their own registries.
    pending_finalizable: Mutex<Vec<PendingFinalizer>>,
    /// Run queue + background thread for callbacks that have already been
    /// found unreached and are only waiting to execute.
    finalizer: Finalizer,
    next_id: AtomicU64,
    soft_clear_threshold: f32,
    last_counts: Mutex<ReferenceStageCounts>,
}

impl ReferenceProcessor {
    pub fn new(soft_clear_threshold: f32) -> Self {
        Self {
            soft_refs: Mutex::new(Vec::new()),
            weak_refs: Mutex::new(Vec::new()),
            phantom_refs: Mutex::new(Vec::new()),
            pending_finalizable: Mutex::new(Vec::new()),
            finalizer: Finalizer::new(),
            next_id: AtomicU64::new(1),
            soft_clear_threshold,
            last_counts: Mutex::new(ReferenceStageCounts::default()),
        }
    }

    fn alloc_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn register_soft(&self, referent_addr: usize) -> u64 {
        let id = self.alloc_id();
        self.soft_refs
            .lock()
            .unwrap()
            .push(ManagedReference::new(ReferenceKind::Soft, referent_addr, id));
        id
    }

    pub fn register_weak(&self, referent_addr: usize) -> u64 {
        let id = self.alloc_id();
        self.weak_refs
            .lock()
            .unwrap()
            .push(ManagedReference::new(ReferenceKind::Weak, referent_addr, id));
        id
    }

    pub fn register_phantom(&self, referent_addr: usize) -> u64 {
        let id = self.alloc_id();
        self.phantom_refs
            .lock()
            .unwrap()
            .push(ManagedReference::new(ReferenceKind::Phantom, referent_addr, id));
        id
    }

    /// Register a finalizer callback for `object`. The object is kept alive
    /// (treated as reachable through its finalizer) until a cycle's
    /// [`Self::process`] finds it absent from the marked set, at which
    /// point the callback is handed to the run queue exactly once and the
    /// object can be reclaimed on a later cycle.
    pub fn register_finalizer<F>(&self, object: usize, finalizer_fn: F)
    where
        F: FnOnce(usize) + Send + 'static,
    {
        self.pending_finalizable.lock().unwrap().push(PendingFinalizer {
            object,
            callback: Box::new(finalizer_fn),
        });
    }

    pub fn start_finalizer_thread(&self) -> crate::error::Result<()> {
        self.finalizer.start()
    }

    pub fn stop_finalizer_thread(&self) -> crate::error::Result<()> {
        self.finalizer.stop()
    }

    /// Count of finalizer-registered objects still awaiting a reachability
    /// decision (i.e. not yet found unreached by any cycle).
    pub fn pending_finalizers(&self) -> usize {
        self.pending_finalizable.lock().unwrap().len()
    }

    /// Count of callbacks already found unreached and waiting in the run
    /// queue for the finalizer thread to execute. Distinct from
    /// [`Self::pending_finalizers`], which counts objects still awaiting
    /// the reachability check itself.
    pub fn scheduled_finalizer_count(&self) -> usize {
        self.finalizer.pending_count()
    }

    /// Run all four stages in order against the cycle's marked set.
    ///
    /// `heap_usage` is the fraction (0.0-1.0) of the heap currently in use;
    /// `memory_low` is an out-of-band pressure signal the allocator can set
    /// ahead of an imminent allocation failure. Soft references clear when
    /// either condition crosses `soft_clear_threshold` / is true; weak and
    /// phantom references always clear once unreached.
    pub fn process(
        &self,
        marked_objects: &[usize],
        heap_usage: f32,
        memory_low: bool,
    ) -> ReferenceStageCounts {
        let mut counts = ReferenceStageCounts::default();

        let clear_soft = memory_low || heap_usage > self.soft_clear_threshold;
        if clear_soft {
            let refs = self.soft_refs.lock().unwrap();
            for r in refs.iter() {
                if let Some(addr) = r.get() {
                    if !marked_objects.contains(&addr) {
                        r.clear();
                        counts.soft_cleared += 1;
                    }
                }
            }
        }

        {
            let refs = self.weak_refs.lock().unwrap();
            for r in refs.iter() {
                if let Some(addr) = r.get() {
                    if !marked_objects.contains(&addr) {
                        r.clear();
                        counts.weak_cleared += 1;
                    }
                }
            }
        }

        {
            let refs = self.phantom_refs.lock().unwrap();
            for r in refs.iter() {
                if let Some(addr) = r.get() {
                    if !marked_objects.contains(&addr) {
                        r.clear();
                        counts.phantom_cleared += 1;
                    }
                }
            }
        }

        // Finalizable objects are processed last: by the time soft/weak/phantom
        // have run, every reachable-through-those-kinds object has already
        // been cleared from its wrapper, so a finalizer never observes a
        // live weak/soft/phantom handle to its own object. An object stays
        // in `pending_finalizable` - kept alive - for as long as it appears
        // in `marked_objects`; the cycle it drops out, its callback moves to
        // the run queue and its registry entry is removed so it cannot be
        // rescheduled on a later cycle (§4.9 point 4).
        {
            let mut pending = self.pending_finalizable.lock().unwrap();
            let mut still_pending = Vec::with_capacity(pending.len());
            for entry in pending.drain(..) {
                if marked_objects.contains(&entry.object) {
                    still_pending.push(entry);
                } else {
                    self.finalizer.register_boxed(entry.object, entry.callback);
                    counts.finalizers_scheduled += 1;
                }
            }
            *pending = still_pending;
        }

        *self.last_counts.lock().unwrap() = counts;
        counts
    }

    pub fn last_counts(&self) -> ReferenceStageCounts {
        *self.last_counts.lock().unwrap()
    }

    pub fn soft_count(&self) -> usize {
        self.soft_refs.lock().unwrap().len()
    }

    pub fn weak_count(&self) -> usize {
        self.weak_refs.lock().unwrap().len()
    }

    pub fn phantom_count(&self) -> usize {
        self.phantom_refs.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_and_phantom_clear_unconditionally() {
        let processor = ReferenceProcessor::new(0.9);
        processor.register_weak(0x1000);
        processor.register_phantom(0x2000);

        let counts = processor.process(&[], 0.1, false);
        assert_eq!(counts.weak_cleared, 1);
        assert_eq!(counts.phantom_cleared, 1);
    }

    #[test]
    fn soft_survives_below_threshold() {
        let processor = ReferenceProcessor::new(0.9);
        processor.register_soft(0x1000);

        let counts = processor.process(&[], 0.5, false);
        assert_eq!(counts.soft_cleared, 0);
        assert_eq!(processor.soft_count(), 1);
    }

    #[test]
    fn soft_clears_above_threshold() {
        let processor = ReferenceProcessor::new(0.9);
        processor.register_soft(0x1000);

        let counts = processor.process(&[], 0.95, false);
        assert_eq!(counts.soft_cleared, 1);
    }

    #[test]
    fn soft_clears_on_memory_low_regardless_of_usage() {
        let processor = ReferenceProcessor::new(0.9);
        processor.register_soft(0x1000);

        let counts = processor.process(&[], 0.1, true);
        assert_eq!(counts.soft_cleared, 1);
    }

    #[test]
    fn marked_referents_survive_every_stage() {
        let processor = ReferenceProcessor::new(0.5);
        processor.register_soft(0x1000);
        processor.register_weak(0x1000);
        processor.register_phantom(0x1000);

        let counts = processor.process(&[0x1000], 0.99, true);
        assert_eq!(counts.soft_cleared, 0);
        assert_eq!(counts.weak_cleared, 0);
        assert_eq!(counts.phantom_cleared, 0);
    }

    #[test]
    fn finalizer_kept_alive_while_reachable() {
        let processor = ReferenceProcessor::new(0.9);
        processor.register_finalizer(0x3000, |_| {});

        // Still in the marked set: the object stays alive through its
        // finalizer record rather than being scheduled.
        let counts = processor.process(&[0x3000], 0.1, false);
        assert_eq!(counts.finalizers_scheduled, 0);
        assert_eq!(processor.pending_finalizers(), 1);
        assert_eq!(processor.scheduled_finalizer_count(), 0);
    }

    #[test]
    fn finalizer_runs_only_when_unreached() {
        let processor = ReferenceProcessor::new(0.9);
        processor.register_finalizer(0x3000, |_| {});

        // Object absent from the marked set: finalizer stage must move it
        // to the run queue exactly once and drop its registry entry so it
        // cannot be rescheduled on a later cycle.
        let counts = processor.process(&[], 0.1, false);
        assert_eq!(counts.finalizers_scheduled, 1);
        assert_eq!(processor.pending_finalizers(), 0);
        assert_eq!(processor.scheduled_finalizer_count(), 1);

        // A second cycle must not reschedule it again.
        let counts2 = processor.process(&[], 0.1, false);
        assert_eq!(counts2.finalizers_scheduled, 0);
    }

    #[test]
    fn finalizer_transitions_from_reachable_to_unreached() {
        let processor = ReferenceProcessor::new(0.9);
        processor.register_finalizer(0x4000, |_| {});

        let counts1 = processor.process(&[0x4000], 0.1, false);
        assert_eq!(counts1.finalizers_scheduled, 0);
        assert_eq!(processor.pending_finalizers(), 1);

        let counts2 = processor.process(&[], 0.1, false);
        assert_eq!(counts2.finalizers_scheduled, 1);
        assert_eq!(processor.pending_finalizers(), 0);
    }
}
