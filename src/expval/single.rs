use std::ops::Range;

use super::{reduce, state_norm_sqr};
use crate::{
    context::ExecCtx,
    error::{require_dim, require_qubit, Result},
    math::{insert_zero_bit, C, Mask, N, R},
    pauli::Pauli,
    threads::REDUCE_DIFFICULTY,
};

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use crate::{
    backend::{avx::hsum256_pd, SimdBackend},
    math::flat_real,
};

/// Expectation value of a single-qubit Pauli operator on `target`.
pub fn single_qubit_pauli(target: N, op: Pauli, state: &[C], ctx: &ExecCtx) -> Result<R> {
    let qubit_count = require_dim(state.len())?;
    let mask = require_qubit(target, qubit_count)?;
    if op == Pauli::I {
        return state_norm_sqr(state, ctx);
    }
    let dim = state.len();
    let backend = ctx.backend();

    Ok(ctx.threads().install(dim, REDUCE_DIFFICULTY, || match op {
        Pauli::I => unreachable!(),
        Pauli::X => match backend {
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            SimdBackend::Avx2 if backend.covers_pairs(dim) && mask > 1 => {
                reduce(dim / 2, false, |range| unsafe {
                    x_sum_avx2(state, mask, range)
                })
            }
            _ => reduce(dim / 2, false, |range| x_sum(state, mask, range)),
        },
        Pauli::Y => match backend {
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            SimdBackend::Avx2 if backend.covers_pairs(dim) && mask > 1 => {
                reduce(dim / 2, false, |range| unsafe {
                    y_sum_avx2(state, mask, range)
                })
            }
            _ => reduce(dim / 2, false, |range| y_sum(state, mask, range)),
        },
        Pauli::Z => match backend {
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            SimdBackend::Avx2 if backend.covers(dim) => {
                reduce(dim, false, |range| unsafe { z_sum_avx2(state, mask, range) })
            }
            _ => reduce(dim, false, |range| z_sum(state, mask, range)),
        },
    }))
}

/// ⟨X⟩ over a range of pair indices: `2 Re(conj(a) b)` per pair, the
/// factor two covering the mirrored half of the sum.
fn x_sum(state: &[C], mask: Mask, range: Range<N>) -> R {
    let mut sum = 0.;
    for state_index in range {
        let basis_0 = insert_zero_bit(state_index, mask);
        let basis_1 = basis_0 ^ mask;
        sum += (state[basis_0].conj() * state[basis_1]).re * 2.;
    }
    sum
}

/// ⟨Y⟩ over a range of pair indices: `2 Im(conj(a) b)` per pair.
fn y_sum(state: &[C], mask: Mask, range: Range<N>) -> R {
    let mut sum = 0.;
    for state_index in range {
        let basis_0 = insert_zero_bit(state_index, mask);
        let basis_1 = basis_0 ^ mask;
        sum += (state[basis_0].conj() * state[basis_1]).im * 2.;
    }
    sum
}

/// ⟨Z⟩ over a range of basis indices: `|amp|²` signed by the target bit.
fn z_sum(state: &[C], mask: Mask, range: Range<N>) -> R {
    let mut sum = 0.;
    for state_index in range {
        let norm_sqr = state[state_index].norm_sqr();
        if state_index & mask == 0 {
            sum += norm_sqr;
        } else {
            sum -= norm_sqr;
        }
    }
    sum
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn x_sum_avx2(state: &[C], mask: Mask, range: Range<N>) -> R {
    use std::arch::x86_64::*;

    debug_assert!(mask > 1);
    debug_assert_eq!(range.start & 1, 0);
    debug_assert_eq!(range.len() & 1, 0);
    let ptr = flat_real(state).as_ptr();

    let mut acc = _mm256_setzero_pd();
    let mut state_index = range.start;
    while state_index < range.end {
        let basis_0 = insert_zero_bit(state_index, mask);
        let basis_1 = basis_0 ^ mask;
        let a = _mm256_loadu_pd(ptr.add(2 * basis_0));
        let b = _mm256_loadu_pd(ptr.add(2 * basis_1));
        acc = _mm256_fmadd_pd(a, b, acc);
        state_index += 2;
    }
    2. * hsum256_pd(acc)
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn y_sum_avx2(state: &[C], mask: Mask, range: Range<N>) -> R {
    use std::arch::x86_64::*;

    debug_assert!(mask > 1);
    debug_assert_eq!(range.start & 1, 0);
    debug_assert_eq!(range.len() & 1, 0);
    let ptr = flat_real(state).as_ptr();

    // Im(conj(a) b) = re(a) im(b) - im(a) re(b)
    let flip_odd = _mm256_setr_pd(0., -0., 0., -0.);
    let mut acc = _mm256_setzero_pd();
    let mut state_index = range.start;
    while state_index < range.end {
        let basis_0 = insert_zero_bit(state_index, mask);
        let basis_1 = basis_0 ^ mask;
        let a = _mm256_loadu_pd(ptr.add(2 * basis_0));
        let b = _mm256_loadu_pd(ptr.add(2 * basis_1));
        let b_swapped = _mm256_permute_pd::<0b0101>(b);
        let prod = _mm256_mul_pd(a, b_swapped);
        acc = _mm256_add_pd(acc, _mm256_xor_pd(prod, flip_odd));
        state_index += 2;
    }
    2. * hsum256_pd(acc)
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn z_sum_avx2(state: &[C], mask: Mask, range: Range<N>) -> R {
    use std::arch::x86_64::*;

    debug_assert_eq!(range.start & 1, 0);
    debug_assert_eq!(range.len() & 1, 0);
    let ptr = flat_real(state).as_ptr();

    let mut acc = _mm256_setzero_pd();
    let mut state_index = range.start;
    if mask == 1 {
        // adjacent amplitudes alternate sign
        let flip_high = _mm256_setr_pd(0., 0., -0., -0.);
        while state_index < range.end {
            let v = _mm256_loadu_pd(ptr.add(2 * state_index));
            let sq = _mm256_mul_pd(v, v);
            acc = _mm256_add_pd(acc, _mm256_xor_pd(sq, flip_high));
            state_index += 2;
        }
    } else {
        // both amplitudes of a block share the target bit
        while state_index < range.end {
            let v = _mm256_loadu_pd(ptr.add(2 * state_index));
            let sq = _mm256_mul_pd(v, v);
            if state_index & mask == 0 {
                acc = _mm256_add_pd(acc, sq);
            } else {
                acc = _mm256_sub_pd(acc, sq);
            }
            state_index += 2;
        }
    }
    hsum256_pd(acc)
}
