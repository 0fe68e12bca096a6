//! Pinning Table - Relocation-Exempt Handles
//!
//! Some callers (FFI boundaries, native code holding a raw pointer) cannot
//! tolerate an object moving under them. A pin is a handle that exempts its
//! referent from relocation for as long as the handle's ref-count is above
//! zero. Regions containing a pinned object are marked `Pinned` and skipped
//! by the relocator rather than evacuated.
//!
//! The table never blocks: `pin` either succeeds immediately or returns
//! `None` once `max_pins` is reached. Handles are plain integers, not RAII
//! by default, but [`ScopedPin`] wraps one to unpin automatically on drop.

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub type ThreadId = u64;
pub type PinHandle = u64;

/// A single pin table entry.
#[derive(Debug, Clone)]
pub struct PinEntry {
    /// The pinned reference (colored pointer or raw address).
    pub reference: usize,
    /// Thread that created the pin.
    pub thread_id: ThreadId,
    /// Number of outstanding holders of this handle.
    pub ref_count: usize,
    /// Creation timestamp, used for `max_pin_duration_ms` expiry.
    pub created_at: Instant,
}

/// Table of outstanding pins, keyed by handle id.
///
/// Contract: while an entry's `ref_count > 0`, the relocator must never move
/// `entry.reference`'s target. `is_pinned` is consulted by the relocator's
/// candidate-selection and per-object copy steps.
pub struct PinningTable {
    entries: Mutex<IndexMap<PinHandle, PinEntry>>,
    next_id: AtomicU64,
    max_pins: usize,
    max_pin_duration: Duration,
    invalid_unpin_count: AtomicUsize,
    forced_release_count: AtomicUsize,
}

impl PinningTable {
    pub fn new(max_pins: usize, max_pin_duration_ms: u64) -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            next_id: AtomicU64::new(1),
            max_pins,
            max_pin_duration: Duration::from_millis(max_pin_duration_ms.max(1)),
            invalid_unpin_count: AtomicUsize::new(0),
            forced_release_count: AtomicUsize::new(0),
        }
    }

    /// Pin `reference` on behalf of `thread_id`. Returns `None` once the
    /// table is at `max_pins` capacity; the caller must surface this as a
    /// `PinTableFull` error rather than retry internally.
    pub fn pin(&self, reference: usize, thread_id: ThreadId) -> Option<PinHandle> {
        let mut entries = self.entries.lock();
        if entries.len() >= self.max_pins {
            return None;
        }
        let handle = self.next_id.fetch_add(1, Ordering::Relaxed);
        entries.insert(
            handle,
            PinEntry {
                reference,
                thread_id,
                ref_count: 1,
                created_at: Instant::now(),
            },
        );
        Some(handle)
    }

    /// Add a reference to an existing handle (nested pinning of the same
    /// object through one handle).
    pub fn add_ref(&self, handle: PinHandle) -> bool {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(&handle) {
            entry.ref_count += 1;
            true
        } else {
            self.invalid_unpin_count.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Drop one reference from `handle`. Removes the entry once its
    /// ref-count reaches zero. Unpinning an unknown handle is a recorded
    /// no-op, never an error.
    pub fn unpin(&self, handle: PinHandle) {
        let mut entries = self.entries.lock();
        match entries.get_mut(&handle) {
            Some(entry) => {
                entry.ref_count = entry.ref_count.saturating_sub(1);
                if entry.ref_count == 0 {
                    entries.shift_remove(&handle);
                }
            }
            None => {
                self.invalid_unpin_count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Pin a batch of references atomically: either every reference in
    /// `refs` is pinned or none are (the critical-section contract).
    pub fn pin_batch(&self, refs: &[usize], thread_id: ThreadId) -> Option<Vec<PinHandle>> {
        let mut entries = self.entries.lock();
        if entries.len() + refs.len() > self.max_pins {
            return None;
        }
        let handles: Vec<PinHandle> = refs
            .iter()
            .map(|&reference| {
                let handle = self.next_id.fetch_add(1, Ordering::Relaxed);
                entries.insert(
                    handle,
                    PinEntry {
                        reference,
                        thread_id,
                        ref_count: 1,
                        created_at: Instant::now(),
                    },
                );
                handle
            })
            .collect();
        Some(handles)
    }

    /// Is `addr` currently the target of a live pin? Consulted by the
    /// relocator before evacuating any object.
    pub fn is_pinned(&self, addr: usize) -> bool {
        self.entries
            .lock()
            .values()
            .any(|e| e.ref_count > 0 && e.reference == addr)
    }

    /// Is any live pin's reference within `[start, end)`? Consulted by the
    /// relocator when deciding whether a whole region must be marked
    /// `Pinned` rather than added to the relocation set.
    pub fn is_pinned_in_range(&self, start: usize, end: usize) -> bool {
        self.entries
            .lock()
            .values()
            .any(|e| e.ref_count > 0 && e.reference >= start && e.reference < end)
    }

    /// Release pins that have outlived `max_pin_duration_ms`. Called at a
    /// safepoint; forcibly-released objects become relocatable again on the
    /// next cycle.
    pub fn release_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        let expired: Vec<PinHandle> = entries
            .iter()
            .filter(|(_, e)| now.duration_since(e.created_at) > self.max_pin_duration)
            .map(|(&h, _)| h)
            .collect();
        for handle in &expired {
            entries.shift_remove(handle);
        }
        let n = expired.len();
        if n > 0 {
            self.forced_release_count.fetch_add(n, Ordering::Relaxed);
        }
        n
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn invalid_unpin_count(&self) -> usize {
        self.invalid_unpin_count.load(Ordering::Relaxed)
    }

    pub fn forced_release_count(&self) -> usize {
        self.forced_release_count.load(Ordering::Relaxed)
    }

    pub fn max_pins(&self) -> usize {
        self.max_pins
    }
}

impl Default for PinningTable {
    fn default() -> Self {
        Self::new(10_000, 60_000)
    }
}

/// RAII wrapper that unpins automatically on drop.
pub struct ScopedPin<'a> {
    table: &'a PinningTable,
    handle: PinHandle,
}

impl<'a> ScopedPin<'a> {
    pub fn new(table: &'a PinningTable, reference: usize, thread_id: ThreadId) -> Option<Self> {
        table.pin(reference, thread_id).map(|handle| Self { table, handle })
    }

    pub fn handle(&self) -> PinHandle {
        self.handle
    }
}

impl Drop for ScopedPin<'_> {
    fn drop(&mut self) {
        self.table.unpin(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_then_unpin_restores_prior_state() {
        let table = PinningTable::new(10, 60_000);
        assert_eq!(table.len(), 0);
        let handle = table.pin(0x1000, 1).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.is_pinned(0x1000));
        table.unpin(handle);
        assert_eq!(table.len(), 0);
        assert!(!table.is_pinned(0x1000));
    }

    #[test]
    fn pin_honors_max_pins() {
        let table = PinningTable::new(2, 60_000);
        assert!(table.pin(0x1, 1).is_some());
        assert!(table.pin(0x2, 1).is_some());
        assert!(table.pin(0x3, 1).is_none());
    }

    #[test]
    fn unpin_unknown_handle_is_recorded_not_fatal() {
        let table = PinningTable::new(10, 60_000);
        table.unpin(999);
        assert_eq!(table.invalid_unpin_count(), 1);
    }

    #[test]
    fn pin_batch_is_all_or_nothing() {
        let table = PinningTable::new(2, 60_000);
        let refs = [0x1, 0x2, 0x3];
        assert!(table.pin_batch(&refs, 1).is_none());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn scoped_pin_unpins_on_drop() {
        let table = PinningTable::new(10, 60_000);
        {
            let _scoped = ScopedPin::new(&table, 0x42, 1).unwrap();
            assert!(table.is_pinned(0x42));
        }
        assert!(!table.is_pinned(0x42));
    }

    #[test]
    fn expired_pins_are_released() {
        let table = PinningTable::new(10, 0);
        let _handle = table.pin(0x1000, 1).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        let released = table.release_expired();
        assert_eq!(released, 1);
        assert!(!table.is_pinned(0x1000));
    }
}
