//! Expectation-value reductions over the amplitude vector.
//!
//! All kernels here are pure reductions to a real scalar. Partial sums are
//! taken over fixed-size index ranges and combined in range order, so a
//! result is identical for every worker count, including the
//! single-threaded entry points.

pub use self::{
    multi::{
        multi_qubit_pauli_masked, multi_qubit_pauli_masked_single_thread,
        multi_qubit_pauli_partial, multi_qubit_pauli_partial_single_thread,
        multi_qubit_pauli_whole,
    },
    single::single_qubit_pauli,
};

mod multi;
mod single;

use std::ops::Range;

#[cfg(feature = "multi-thread")]
use rayon::prelude::*;

use crate::{
    context::ExecCtx,
    error::{require_dim, Result},
    math::{C, N, R},
    threads::REDUCE_DIFFICULTY,
};

/// Index range handled by one reduction task.
const GRAIN: N = 1 << 12;

/// Σ |amp|², the ⟨I⟩ observable.
pub fn state_norm_sqr(state: &[C], ctx: &ExecCtx) -> Result<R> {
    require_dim(state.len())?;
    let dim = state.len();
    Ok(ctx.threads().install(dim, REDUCE_DIFFICULTY, || {
        reduce(dim, false, |range| {
            state[range].iter().map(C::norm_sqr).sum()
        })
    }))
}

/// Deterministic split reduction over `0..count`.
///
/// `seq` skips the active pool and runs the same ranges on the calling
/// thread; the summation order is unchanged either way.
pub(crate) fn reduce<F>(count: N, seq: bool, f: F) -> R
where
    F: Fn(Range<N>) -> R + Sync,
{
    if count <= GRAIN {
        return f(0..count);
    }
    let tasks = (count + GRAIN - 1) / GRAIN;
    #[cfg(feature = "multi-thread")]
    {
        if !seq {
            let partials: Vec<R> = (0..tasks)
                .into_par_iter()
                .map(|task| f(task * GRAIN..((task + 1) * GRAIN).min(count)))
                .collect();
            return partials.iter().sum();
        }
    }
    #[cfg(not(feature = "multi-thread"))]
    let _ = seq;
    (0..tasks)
        .map(|task| f(task * GRAIN..((task + 1) * GRAIN).min(count)))
        .sum()
}
