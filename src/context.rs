use crate::{
    backend::SimdBackend,
    error::{Error, Result},
    threads::Threads,
};

/// Execution context threaded through every kernel call: the vector
/// backend plus the worker-count coordinator.
///
/// One context serves many kernel calls. Like the coordinator it carries,
/// a context belongs to one calling thread at a time.
pub struct ExecCtx {
    backend: SimdBackend,
    threads: Threads,
}

impl ExecCtx {
    /// Context with the process-wide probed backend and default workers.
    pub fn new() -> Self {
        Self {
            backend: SimdBackend::global(),
            threads: Threads::new(),
        }
    }

    /// Pin the worker-pool ceiling; per-kernel difficulty gating still
    /// applies.
    pub fn with_workers(workers: usize) -> Self {
        Self {
            backend: SimdBackend::global(),
            threads: Threads::with_workers(workers),
        }
    }

    /// Force a specific backend, e.g. to compare against the scalar
    /// reference. Fails when the host cannot run it.
    pub fn with_backend(backend: SimdBackend) -> Result<Self> {
        if !backend.is_available() {
            return Err(Error::Unsupported(backend.name()));
        }
        Ok(Self {
            backend,
            threads: Threads::new(),
        })
    }

    pub fn backend(&self) -> SimdBackend {
        self.backend
    }

    pub fn threads(&self) -> &Threads {
        &self.threads
    }
}

impl Default for ExecCtx {
    fn default() -> Self {
        Self::new()
    }
}
