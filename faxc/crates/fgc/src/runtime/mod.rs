//! Runtime Module - GC Runtime Integration
//!
//! Module ini mengintegrasikan GC dengan runtime Fax.
//! Mengelola:
//! - GC initialization
//! - Safepoint management
//! - Finalizer queue
//! - GC thread lifecycle

pub mod init;
pub mod safepoint;
pub mod finalizer;

pub use init::RuntimeInitializer;
pub use safepoint::SafepointManager;
pub use finalizer::Finalizer;

use std::sync::Arc;

/// Runtime - GC runtime orchestrator
///
/// Mengkoordinasikan seluruh GC runtime components.
pub struct Runtime {
    /// GC instance
    gc: Arc<crate::gc::GarbageCollector>,

    /// Safepoint manager
    safepoint_manager: SafepointManager,

    /// Runtime state
    state: std::sync::Mutex<RuntimeState>,
}

impl Runtime {
    /// Create new runtime
    pub fn new(config: crate::config::GcConfig) -> Result<Self, crate::error::FgcError> {
        let gc = Arc::new(crate::gc::GarbageCollector::new(config.clone())?);

        Ok(Self {
            gc,
            safepoint_manager: SafepointManager::new(),
            state: std::sync::Mutex::new(RuntimeState::Initialized),
        })
    }

    /// Start runtime
    pub fn start(&self) -> Result<(), crate::error::FgcError> {
        *self.state.lock().unwrap() = RuntimeState::Running;
        self.safepoint_manager.start()?;
        self.gc.reference_processor().start_finalizer_thread()?;
        self.gc.start_background_controller();
        Ok(())
    }

    /// Stop runtime
    pub fn stop(&self) -> Result<(), crate::error::FgcError> {
        *self.state.lock().unwrap() = RuntimeState::Stopping;

        self.gc.shutdown()?;
        self.safepoint_manager.stop()?;
        self.gc.reference_processor().stop_finalizer_thread()?;

        *self.state.lock().unwrap() = RuntimeState::Stopped;

        Ok(())
    }

    /// Get GC instance
    pub fn gc(&self) -> &Arc<crate::gc::GarbageCollector> {
        &self.gc
    }

    /// Get runtime state
    pub fn state(&self) -> RuntimeState {
        *self.state.lock().unwrap()
    }

    /// Request GC
    pub fn request_gc(&self, generation: crate::gc::GcGeneration) -> Result<(), crate::error::FgcError> {
        self.gc.request_gc(generation, crate::gc::GcReason::Explicit)
    }

    /// Force an immediate synchronous GC cycle.
    pub fn force_gc(&self) -> Result<(), crate::error::FgcError> {
        self.gc.force_gc()
    }

    /// Get the shared statistics handle.
    pub fn get_stats(&self) -> Arc<crate::stats::GcStats> {
        self.gc.get_stats()
    }

    /// Export collector metrics in the given format ("prometheus", "json", "human").
    pub fn export_metrics(&self, format: &str) -> Result<String, crate::error::FgcError> {
        self.gc.export_metrics(format)
    }

    /// Pin an object so the relocator will not move it.
    pub fn pin(&self, reference: usize, thread_id: u64) -> Option<crate::pin::PinHandle> {
        self.gc.pin(reference, thread_id)
    }

    /// Release a previously acquired pin.
    pub fn unpin(&self, handle: crate::pin::PinHandle) {
        self.gc.unpin(handle)
    }

    /// Health-alert manager (pause time, heap usage, fragmentation, throughput).
    pub fn alerts(&self) -> &crate::stats::AlertManager {
        self.gc.alerts()
    }

    /// Allocate object
    pub fn allocate(&self, size: usize) -> Result<usize, crate::error::FgcError> {
        self.gc.allocate(size)
    }

    /// Register finalizer untuk object
    ///
    /// Routed through the GC's reference processor rather than run
    /// directly, so the object is kept alive through its finalizer
    /// record until a cycle finds it unreachable (see
    /// [`crate::reference_processor::ReferenceProcessor::register_finalizer`]).
    pub fn register_finalizer<F>(&self, object: usize, finalizer_fn: F)
    where
        F: FnOnce(usize) + Send + 'static,
    {
        self.gc.reference_processor().register_finalizer(object, finalizer_fn);
    }

    /// Check safepoint
    pub fn check_safepoint(&self) {
        if self.safepoint_manager.should_block() {
            self.safepoint_manager.block_at_safepoint();
        }
    }
}

/// Runtime state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    /// Runtime belum di-start
    Initialized,
    /// Runtime berjalan normal
    Running,
    /// Runtime sedang stop
    Stopping,
    /// Runtime sudah stop
    Stopped,
}

/// GC trigger helper
pub struct GcTrigger;

impl GcTrigger {
    /// Trigger full GC
    pub fn full_gc(runtime: &Runtime) -> Result<(), crate::error::FgcError> {
        runtime.request_gc(crate::gc::GcGeneration::Full)
    }

    /// Trigger young GC
    pub fn young_gc(runtime: &Runtime) -> Result<(), crate::error::FgcError> {
        runtime.request_gc(crate::gc::GcGeneration::Young)
    }
}
