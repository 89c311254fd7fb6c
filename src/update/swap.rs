use super::update_pairs;
use crate::{
    context::ExecCtx,
    error::{require_dim, require_qubit, Error, Result},
    math::{C, Mask, N},
    threads::UPDATE_DIFFICULTY,
};

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use crate::{backend::SimdBackend, math::flat_real_mut};

/// Exchange qubits `target0` and `target1`, in place.
///
/// Only the basis pairs whose target bits read `(1, 0)` and `(0, 1)` move;
/// `(0, 0)` and `(1, 1)` stay put.
pub fn swap_gate(target0: N, target1: N, state: &mut [C], ctx: &ExecCtx) -> Result<()> {
    let qubit_count = require_dim(state.len())?;
    require_qubit(target0, qubit_count)?;
    require_qubit(target1, qubit_count)?;
    if target0 == target1 {
        return Err(Error::SwapTargetsEqual(target0));
    }
    let dim = state.len();
    let min_mask = 1 << target0.min(target1);
    let max_mask = 1 << target0.max(target1);
    let backend = ctx.backend();

    ctx.threads().install(dim, UPDATE_DIFFICULTY, || match backend {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        SimdBackend::Avx2
            if backend.covers_pairs(dim) && min_mask >= backend.vector_len() =>
        {
            update_pairs(state, max_mask, min_mask << 1, |lo, hi| unsafe {
                swap_halves_avx2(lo, hi, min_mask)
            })
        }
        _ => update_pairs(state, max_mask, min_mask << 1, |lo, hi| {
            swap_halves(lo, hi, min_mask)
        }),
    });
    Ok(())
}

/// `lo` holds the max-qubit-clear half of a block, `hi` the set half.
/// Within each `2 * min_mask` period the min-set part of `lo` trades with
/// the min-clear part of `hi`.
fn swap_halves(lo: &mut [C], hi: &mut [C], min_mask: Mask) {
    let period = min_mask << 1;
    let mut base = 0;
    while base < lo.len() {
        for offset in 0..min_mask {
            std::mem::swap(&mut lo[base + min_mask + offset], &mut hi[base + offset]);
        }
        base += period;
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn swap_halves_avx2(lo: &mut [C], hi: &mut [C], min_mask: Mask) {
    use std::arch::x86_64::*;

    debug_assert!(min_mask >= 2);
    let period = min_mask << 1;
    let len = lo.len();
    let lo = flat_real_mut(lo);
    let hi = flat_real_mut(hi);

    let mut base = 0;
    while base < len {
        let mut offset = 0;
        while offset < min_mask {
            let p0 = lo.as_mut_ptr().add(2 * (base + min_mask + offset));
            let p1 = hi.as_mut_ptr().add(2 * (base + offset));
            let a = _mm256_loadu_pd(p0);
            let b = _mm256_loadu_pd(p1);
            _mm256_storeu_pd(p0, b);
            _mm256_storeu_pd(p1, a);
            offset += 2;
        }
        base += period;
    }
}
