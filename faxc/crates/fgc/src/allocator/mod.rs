//! Allocator Module - Memory Allocation Strategies
//!
//! Manages all memory allocation strategies in FGC.
//! Allocator is responsible for high-speed, thread-safe object allocation.
//!
//! ## Allocation Strategies
//!
//! - **Bump Pointer Allocation**: O(1) allocation for small/medium objects
//! - **TLAB (Thread-Local Allocation Buffer)**: Lock-free per-thread allocation
//! - **Generational Allocation**: Young/Old generation separation
//!
//! These building blocks are driven from `GarbageCollector::allocate`
//! (see `crate::gc`), which dispatches by size class (§4.2/§4.3): small
//! and medium requests go through a thread's `TlabManager`-owned TLAB,
//! large requests bypass the TLAB and go straight to the heap's region
//! allocator.

pub mod bump;
pub mod generational;
pub mod tlab;

pub use bump::{BumpPointerAllocator, MultiBumpAllocator};
pub use generational::{AgeTracker, GenerationalAllocator, GenerationalStats};
pub use tlab::{ThreadId, Tlab, TlabManager};
