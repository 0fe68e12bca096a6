//! Generational Allocator - Young/Old Generation Management
//!
//! Manages generational allocation (young/old generation).
//! Based on the observation that:
//! - Most objects die young
//! - Objects that survive tend to live long
//!
//! The young generation is split HotSpot-style into Eden and two survivor
//! spaces (S0/S1): every minor GC copies survivors out of Eden and the
//! current "from" survivor into the current "to" survivor, then swaps
//! which of S0/S1 plays "to" for the next cycle. An object that survives
//! `tenure_threshold` minor GCs is promoted to the old generation instead
//! of being copied again.

use crate::allocator::bump::MultiBumpAllocator;
use crate::allocator::tlab::{Tlab, TlabManager, ThreadId};
use crate::error::Result;
use crate::heap::Heap;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use indexmap::IndexMap;

/// Default eden:survivor:survivor size ratio (HotSpot's `SurvivorRatio=8`).
const DEFAULT_SURVIVOR_RATIO: usize = 8;

/// Target fraction of a survivor space that should be occupied after a
/// minor GC; the tenuring threshold adapts to try to hold this.
const TARGET_SURVIVOR_OCCUPANCY: f64 = 0.5;

const MIN_TENURE_THRESHOLD: u8 = 1;
const MAX_TENURE_THRESHOLD: u8 = 15;

/// GenerationalAllocator - allocator with young/old separation
///
/// Manages allocation for both generations:
/// - Young generation: Eden (TLAB-backed bump allocation) + two survivor
///   spaces used alternately as minor-GC copy destinations
/// - Old generation: Bump pointer for promoted objects
pub struct GenerationalAllocator {
    /// Eden - where new young objects are allocated
    eden_allocator: MultiBumpAllocator,

    /// The two survivor spaces (S0, S1). Exactly one is "to" at a time;
    /// the other is "from" and is reset once objects are copied out of it.
    survivor_allocators: [MultiBumpAllocator; 2],

    /// Index (0 or 1) of the survivor space currently accepting copies.
    to_survivor: AtomicUsize,

    /// Old generation bump allocator
    old_allocator: MultiBumpAllocator,

    /// TLAB manager for young generation (backed by Eden)
    tlab_manager: TlabManager,

    /// Heap reference for TLAB allocation
    heap: Arc<Heap>,

    /// Eden size (bytes)
    eden_size: AtomicUsize,

    /// Size of a single survivor space (bytes)
    survivor_size: AtomicUsize,

    /// Old generation size (bytes)
    old_size: AtomicUsize,

    /// Promotion count (objects promoted to old)
    promotion_count: AtomicUsize,

    /// Objects copied between young spaces without promotion
    survivor_copy_count: AtomicUsize,

    /// Tenure threshold (survive N minor GCs before promote). Adapts after
    /// every minor GC to keep the "to" survivor space near
    /// `TARGET_SURVIVOR_OCCUPANCY`.
    tenure_threshold: AtomicU8,

    /// Per-object survival age, incremented on each minor GC the object
    /// survives; consulted against `tenure_threshold` to decide promotion.
    ages: AgeTracker,
}

impl GenerationalAllocator {
    /// Create new generational allocator
    ///
    /// # Arguments
    /// * `heap` - Heap reference
    /// * `young_ratio` - Ratio of heap for young generation (0.0-1.0)
    /// * `tenure_threshold` - Survives before promotion
    pub fn new(heap: Arc<Heap>, young_ratio: f32, tenure_threshold: u8) -> Self {
        let heap_size = heap.max_size();
        let young_size = (heap_size as f32 * young_ratio) as usize;
        let old_size = heap_size - young_size;

        // Eden:S0:S1 = SurvivorRatio:1:1, i.e. each survivor gets
        // young_size / (ratio + 2).
        let survivor_size = young_size / (DEFAULT_SURVIVOR_RATIO + 2);
        let eden_size = young_size - 2 * survivor_size;

        Self {
            eden_allocator: MultiBumpAllocator::new(2 * 1024 * 1024, 8, 100),
            survivor_allocators: [
                MultiBumpAllocator::new(256 * 1024, 8, 50),
                MultiBumpAllocator::new(256 * 1024, 8, 50),
            ],
            to_survivor: AtomicUsize::new(0),
            old_allocator: MultiBumpAllocator::new(32 * 1024 * 1024, 8, 50),
            tlab_manager: TlabManager::new(256 * 1024, 16 * 1024, 2 * 1024 * 1024, 8, 1000),
            heap,
            eden_size: AtomicUsize::new(eden_size),
            survivor_size: AtomicUsize::new(survivor_size),
            old_size: AtomicUsize::new(old_size),
            promotion_count: AtomicUsize::new(0),
            survivor_copy_count: AtomicUsize::new(0),
            tenure_threshold: AtomicU8::new(tenure_threshold.clamp(MIN_TENURE_THRESHOLD, MAX_TENURE_THRESHOLD)),
            ages: AgeTracker::new(),
        }
    }

    /// Allocate in Eden (fast path)
    ///
    /// Default allocation for new objects.
    ///
    /// # Arguments
    /// * `size` - Size in bytes
    pub fn allocate_young(&self, size: usize) -> Result<usize> {
        let thread_id = self.get_current_thread_id();

        if let Ok(tlab) = self.tlab_manager.get_or_create_tlab(thread_id, &self.heap) {
            if tlab.has_space(size) {
                if let Ok(addr) = tlab.allocate(size) {
                    return Ok(addr);
                }
            }
        }

        self.eden_allocator.allocate(size)
    }

    /// Allocate in old generation
    ///
    /// Used for promoted objects and large objects.
    ///
    /// # Arguments
    /// * `size` - Size in bytes
    pub fn allocate_old(&self, size: usize) -> Result<usize> {
        self.old_allocator.allocate(size)
    }

    /// Allocate space in the survivor space currently playing "to".
    fn allocate_to_survivor(&self, size: usize) -> Result<usize> {
        let to = self.to_survivor.load(Ordering::Acquire);
        self.survivor_allocators[to].allocate(size)
    }

    /// Allocate with generational heuristic
    ///
    /// # Arguments
    /// * `size` - Size in bytes
    /// * `prefer_young` - If true, try young generation first
    pub fn allocate(&self, size: usize, prefer_young: bool) -> Result<usize> {
        if prefer_young {
            self.allocate_young(size)
        } else {
            self.allocate_old(size)
        }
    }

    /// Decide the fate of an object that survived a minor GC: copy it into
    /// the "to" survivor space, or promote it to the old generation if its
    /// age has reached `tenure_threshold`. Returns the new address and
    /// whether it was promoted.
    ///
    /// # Arguments
    /// * `old_address` - Object's address before this minor GC
    /// * `size` - Object size
    pub fn copy_or_promote(&self, old_address: usize, size: usize) -> Result<(usize, bool)> {
        let age = self.ages.increment_age(old_address);

        if age >= self.tenure_threshold.load(Ordering::Relaxed) {
            let new_address = self.allocate_old(size)?;
            self.promotion_count.fetch_add(1, Ordering::Relaxed);
            self.ages.remove(old_address);
            return Ok((new_address, true));
        }

        match self.allocate_to_survivor(size) {
            Ok(new_address) => {
                self.survivor_copy_count.fetch_add(1, Ordering::Relaxed);
                Ok((new_address, false))
            }
            // Survivor space is full: HotSpot's "premature promotion" -
            // an object that should have stayed young is promoted anyway
            // rather than failing the collection.
            Err(_) => {
                let new_address = self.allocate_old(size)?;
                self.promotion_count.fetch_add(1, Ordering::Relaxed);
                self.ages.remove(old_address);
                Ok((new_address, true))
            }
        }
    }

    /// Promote object from young to old generation directly, bypassing the
    /// survivor spaces. Used when a caller already knows an object should
    /// tenure immediately (e.g. objects larger than a survivor space).
    ///
    /// # Arguments
    /// * `old_address` - Object address in young generation
    /// * `size` - Object size
    ///
    /// # Returns
    /// New address in old generation
    pub fn promote_object(&self, old_address: usize, size: usize) -> Result<usize> {
        let new_address = self.allocate_old(size)?;
        self.promotion_count.fetch_add(1, Ordering::Relaxed);
        self.ages.remove(old_address);
        Ok(new_address)
    }

    /// Minor GC - collect young generation
    ///
    /// Resets Eden, drains the current "from" survivor (whatever
    /// `copy_or_promote` didn't keep is garbage), then swaps which
    /// survivor space plays "to" for the next cycle. The tenuring
    /// threshold is adapted based on how full the just-vacated "to"
    /// space (now about to become "from" again) ended up.
    ///
    /// # Returns
    /// Estimated bytes reclaimed
    pub fn minor_gc(&self) -> usize {
        let eden_reclaimed = self.eden_allocator.total_allocated();
        self.eden_allocator.reset_all();

        let to = self.to_survivor.load(Ordering::Acquire);
        let from = 1 - to;

        let to_occupancy = self.survivor_allocators[to].total_allocated();
        let survivor_capacity = self.survivor_size.load(Ordering::Relaxed).max(1);
        let occupancy_ratio = to_occupancy as f64 / survivor_capacity as f64;
        self.adapt_tenure_threshold(occupancy_ratio);

        let from_reclaimed = self.survivor_allocators[from].total_allocated();
        self.survivor_allocators[from].reset_all();

        self.to_survivor.store(from, Ordering::Release);

        eden_reclaimed + from_reclaimed
    }

    /// Raise the tenuring threshold when the survivor space is running
    /// under target occupancy (fewer objects need to tenure to make
    /// room), lower it when it is running over (more objects need to
    /// tenure to avoid overflowing the space next cycle).
    fn adapt_tenure_threshold(&self, occupancy_ratio: f64) {
        let current = self.tenure_threshold.load(Ordering::Relaxed);
        let new_threshold = if occupancy_ratio > TARGET_SURVIVOR_OCCUPANCY + 0.1 {
            current.saturating_sub(1).max(MIN_TENURE_THRESHOLD)
        } else if occupancy_ratio < TARGET_SURVIVOR_OCCUPANCY - 0.1 {
            (current + 1).min(MAX_TENURE_THRESHOLD)
        } else {
            current
        };
        self.tenure_threshold.store(new_threshold, Ordering::Relaxed);
    }

    /// Major GC - collect old generation
    ///
    /// Called when old generation is nearly full.
    ///
    /// # Returns
    /// Estimated bytes reclaimed
    pub fn major_gc(&self) -> usize {
        self.old_allocator.reset_all();
        self.old_size.load(Ordering::Relaxed) / 2
    }

    /// Full GC - collect both generations
    ///
    /// Called when heap is nearly full.
    pub fn full_gc(&self) -> usize {
        let young_reclaimed = self.minor_gc();
        let old_reclaimed = self.major_gc();
        self.ages.clear();
        young_reclaimed + old_reclaimed
    }

    /// Get TLAB for current thread
    pub fn get_current_tlab(&self) -> Option<Arc<Tlab>> {
        let thread_id = self.get_current_thread_id();
        self.tlab_manager
            .get_or_create_tlab(thread_id, &self.heap)
            .ok()
    }

    /// Refill TLAB for current thread
    pub fn refill_tlab(&self) -> Result<Arc<Tlab>> {
        let thread_id = self.get_current_thread_id();
        self.tlab_manager.refill_tlab(thread_id, &self.heap)
    }

    /// Get Eden size
    pub fn young_size(&self) -> usize {
        self.eden_size.load(Ordering::Relaxed)
    }

    /// Get the size of a single survivor space
    pub fn survivor_size(&self) -> usize {
        self.survivor_size.load(Ordering::Relaxed)
    }

    /// Get old generation size
    pub fn old_size(&self) -> usize {
        self.old_size.load(Ordering::Relaxed)
    }

    /// Get Eden usage
    pub fn young_usage(&self) -> usize {
        self.eden_allocator.total_allocated()
    }

    /// Get old generation usage
    pub fn old_usage(&self) -> usize {
        self.old_allocator.total_allocated()
    }

    /// Get combined survivor-space usage (both S0 and S1)
    pub fn survivor_usage(&self) -> usize {
        self.survivor_allocators[0].total_allocated() + self.survivor_allocators[1].total_allocated()
    }

    /// Get promotion count
    pub fn promotion_count(&self) -> usize {
        self.promotion_count.load(Ordering::Relaxed)
    }

    /// Get count of objects copied between survivor spaces without
    /// promotion
    pub fn survivor_copy_count(&self) -> usize {
        self.survivor_copy_count.load(Ordering::Relaxed)
    }

    /// Get tenure threshold
    pub fn tenure_threshold(&self) -> u8 {
        self.tenure_threshold.load(Ordering::Relaxed)
    }

    /// Set tenure threshold, overriding the adaptive value (used by
    /// configuration overrides / tests).
    pub fn set_tenure_threshold(&self, threshold: u8) {
        self.tenure_threshold
            .store(threshold.clamp(MIN_TENURE_THRESHOLD, MAX_TENURE_THRESHOLD), Ordering::Relaxed);
    }

    /// Get statistics
    pub fn stats(&self) -> GenerationalStats {
        GenerationalStats {
            young_size: self.young_size(),
            old_size: self.old_size(),
            young_used: self.young_usage(),
            old_used: self.old_usage(),
            survivor_size: self.survivor_size(),
            survivor_used: self.survivor_usage(),
            promotion_count: self.promotion_count(),
            survivor_copy_count: self.survivor_copy_count(),
            tenure_threshold: self.tenure_threshold(),
            tlab_count: self.tlab_manager.active_tlab_count(),
            tlab_refills: self.tlab_manager.total_refills(),
        }
    }

    /// Get current thread ID
    fn get_current_thread_id(&self) -> ThreadId {
        static THREAD_COUNTER: std::sync::atomic::AtomicU64 =
            std::sync::atomic::AtomicU64::new(0);

        thread_local! {
            static TID: u64 = THREAD_COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }

        TID.with(|&id| id)
    }
}

/// Statistics for generational allocator
#[derive(Debug, Default)]
pub struct GenerationalStats {
    /// Eden size (bytes)
    pub young_size: usize,
    /// Old generation size (bytes)
    pub old_size: usize,
    /// Eden used (bytes)
    pub young_used: usize,
    /// Old generation used (bytes)
    pub old_used: usize,
    /// Size of a single survivor space (bytes)
    pub survivor_size: usize,
    /// Combined survivor-space usage (bytes)
    pub survivor_used: usize,
    /// Objects promoted to old generation
    pub promotion_count: usize,
    /// Objects copied between survivor spaces without promotion
    pub survivor_copy_count: usize,
    /// Current adaptive tenuring threshold
    pub tenure_threshold: u8,
    /// Active TLABs
    pub tlab_count: usize,
    /// TLAB refills
    pub tlab_refills: usize,
}

/// Object age tracker for tenure decision
///
/// Tracks how many times an object survives minor GC.
pub struct AgeTracker {
    ages: std::sync::Mutex<IndexMap<usize, u8>>,
}

impl AgeTracker {
    /// Create new age tracker
    pub fn new() -> Self {
        Self {
            ages: std::sync::Mutex::new(IndexMap::new()),
        }
    }

    /// Increment age for object
    pub fn increment_age(&self, address: usize) -> u8 {
        let mut ages = self.ages.lock().unwrap();
        let age = ages.entry(address).or_insert(0);
        *age += 1;
        *age
    }

    /// Get age for object
    pub fn get_age(&self, address: usize) -> u8 {
        let ages = self.ages.lock().unwrap();
        *ages.get(&address).unwrap_or(&0)
    }

    /// Remove object from tracker
    pub fn remove(&self, address: usize) {
        let mut ages = self.ages.lock().unwrap();
        ages.swap_remove(&address);
    }

    /// Clear all ages (after major GC)
    pub fn clear(&self) {
        let mut ages = self.ages.lock().unwrap();
        ages.clear();
    }
}

impl Default for AgeTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GcConfig;

    fn test_allocator() -> GenerationalAllocator {
        let config = Arc::new(GcConfig::default());
        let heap = Arc::new(Heap::new(config).unwrap());
        GenerationalAllocator::new(heap, 0.4, 4)
    }

    #[test]
    fn eden_and_old_allocations_land_in_distinct_ranges() {
        let alloc = test_allocator();
        let young_addr = alloc.allocate_young(64).unwrap();
        let old_addr = alloc.allocate_old(64).unwrap();
        assert_ne!(young_addr, old_addr);
    }

    #[test]
    fn object_below_tenure_threshold_copies_to_survivor_not_old() {
        let alloc = test_allocator();
        let (_, promoted) = alloc.copy_or_promote(0x1000, 32).unwrap();
        assert!(!promoted);
        assert_eq!(alloc.survivor_copy_count(), 1);
        assert_eq!(alloc.promotion_count(), 0);
    }

    #[test]
    fn object_reaching_tenure_threshold_promotes() {
        let alloc = test_allocator();
        for _ in 0..3 {
            alloc.copy_or_promote(0x2000, 32).unwrap();
        }
        let (_, promoted) = alloc.copy_or_promote(0x2000, 32).unwrap();
        assert!(promoted);
        assert_eq!(alloc.promotion_count(), 1);
    }

    #[test]
    fn minor_gc_swaps_to_survivor_and_resets_eden() {
        let alloc = test_allocator();
        alloc.allocate_young(64).unwrap();
        let to_before = alloc.to_survivor.load(Ordering::Relaxed);
        alloc.minor_gc();
        let to_after = alloc.to_survivor.load(Ordering::Relaxed);
        assert_ne!(to_before, to_after);
        assert_eq!(alloc.young_usage(), 0);
    }

    #[test]
    fn full_gc_clears_age_tracking() {
        let alloc = test_allocator();
        alloc.copy_or_promote(0x3000, 32).unwrap();
        alloc.full_gc();
        assert_eq!(alloc.ages.get_age(0x3000), 0);
    }
}
