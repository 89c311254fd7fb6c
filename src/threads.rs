//! Worker-count coordination for kernel dispatch.
//!
//! Every kernel entry selects a worker count from the state dimension and a
//! per-kernel difficulty hint before running its body, and restores the
//! previous selection on return. Selections nest in LIFO order on one
//! calling thread; the coordinator is not meant to be shared between
//! concurrently calling threads.

#[cfg(feature = "multi-thread")]
use std::cell::RefCell;

#[cfg(feature = "multi-thread")]
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::math::N;

/// Difficulty hint for in-place transformation kernels.
pub(crate) const UPDATE_DIFFICULTY: u32 = 13;
/// Difficulty hint for expectation-value reductions.
pub(crate) const REDUCE_DIFFICULTY: u32 = 10;

#[cfg(feature = "multi-thread")]
pub struct Threads {
    configured: usize,
    pools: RefCell<Vec<(usize, ThreadPool)>>,
    stack: RefCell<Vec<usize>>,
}

#[cfg(feature = "multi-thread")]
impl Threads {
    pub fn new() -> Self {
        Self::with_workers(rayon::current_num_threads())
    }

    pub fn with_workers(configured: usize) -> Self {
        Self {
            configured: configured.max(1),
            pools: RefCell::new(Vec::new()),
            stack: RefCell::new(Vec::new()),
        }
    }

    /// The configured pool ceiling.
    pub fn configured(&self) -> usize {
        self.configured
    }

    /// The innermost active selection, 1 outside any kernel.
    pub fn current_workers(&self) -> usize {
        self.stack.borrow().last().copied().unwrap_or(1)
    }

    /// States below the difficulty threshold run serially, everything else
    /// gets the full configured pool.
    fn select(&self, dim: N, difficulty: u32) -> usize {
        if dim.trailing_zeros() < difficulty {
            1
        } else {
            self.configured
        }
    }

    /// Push a selection for a kernel over `dim` amplitudes.
    pub fn set_workers(&self, dim: N, difficulty: u32) -> usize {
        let workers = self.select(dim, difficulty);
        self.stack.borrow_mut().push(workers);
        workers
    }

    /// Pop the innermost selection.
    pub fn reset_workers(&self) {
        self.stack.borrow_mut().pop();
    }

    /// Run `op` under the selection for `(dim, difficulty)`.
    ///
    /// The body runs inside a pool of the selected size, so parallel
    /// iterators inside `op` degrade to sequential execution on a serial
    /// selection.
    pub(crate) fn install<OP, T>(&self, dim: N, difficulty: u32, op: OP) -> T
    where
        OP: FnOnce() -> T + Send,
        T: Send,
    {
        let workers = self.set_workers(dim, difficulty);
        let out = self.run(workers, op);
        self.reset_workers();
        out
    }

    fn run<OP, T>(&self, workers: usize, op: OP) -> T
    where
        OP: FnOnce() -> T + Send,
        T: Send,
    {
        let mut pools = self.pools.borrow_mut();
        if !pools.iter().any(|(count, _)| *count == workers) {
            let pool = ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|idx| format!("quvec worker #{}", idx))
                .build()
                .unwrap();
            pools.push((workers, pool));
        }
        let pool = &pools.iter().find(|(count, _)| *count == workers).unwrap().1;
        pool.install(op)
    }
}

#[cfg(feature = "multi-thread")]
impl Default for Threads {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-threaded build: every operation is a no-op and kernel bodies run
/// inline on the calling thread.
#[cfg(not(feature = "multi-thread"))]
pub struct Threads;

#[cfg(not(feature = "multi-thread"))]
impl Threads {
    pub fn new() -> Self {
        Threads
    }

    pub fn with_workers(_configured: usize) -> Self {
        Threads
    }

    pub fn configured(&self) -> usize {
        1
    }

    pub fn current_workers(&self) -> usize {
        1
    }

    pub fn set_workers(&self, _dim: N, _difficulty: u32) -> usize {
        1
    }

    pub fn reset_workers(&self) {}

    pub(crate) fn install<OP, T>(&self, _dim: N, _difficulty: u32, op: OP) -> T
    where
        OP: FnOnce() -> T,
    {
        op()
    }
}

#[cfg(not(feature = "multi-thread"))]
impl Default for Threads {
    fn default() -> Self {
        Threads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_states_run_serially() {
        let threads = Threads::with_workers(8);
        assert_eq!(threads.set_workers(1 << 10, UPDATE_DIFFICULTY), 1);
        threads.reset_workers();
        assert_eq!(threads.set_workers(1 << 10, REDUCE_DIFFICULTY), 1);
        threads.reset_workers();
    }

    #[cfg(feature = "multi-thread")]
    #[test]
    fn large_states_get_the_pool() {
        let threads = Threads::with_workers(4);
        assert_eq!(threads.set_workers(1 << 13, UPDATE_DIFFICULTY), 4);
        threads.reset_workers();
        assert_eq!(threads.set_workers(1 << 12, UPDATE_DIFFICULTY), 1);
        threads.reset_workers();
    }

    #[test]
    fn selections_nest_lifo() {
        let threads = Threads::with_workers(2);
        assert_eq!(threads.current_workers(), 1);
        threads.set_workers(1 << 20, REDUCE_DIFFICULTY);
        let outer = threads.current_workers();
        threads.set_workers(1 << 4, REDUCE_DIFFICULTY);
        assert_eq!(threads.current_workers(), 1);
        threads.reset_workers();
        assert_eq!(threads.current_workers(), outer);
        threads.reset_workers();
        assert_eq!(threads.current_workers(), 1);
    }

    #[cfg(feature = "multi-thread")]
    #[test]
    fn install_runs_in_selected_pool() {
        let threads = Threads::with_workers(2);
        let count = threads.install(1 << 20, REDUCE_DIFFICULTY, rayon::current_num_threads);
        assert_eq!(count, 2);
        let count = threads.install(1 << 2, REDUCE_DIFFICULTY, rayon::current_num_threads);
        assert_eq!(count, 1);
    }
}
