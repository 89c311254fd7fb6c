use std::ops::Range;

use super::reduce;
use crate::{
    backend::SimdBackend,
    context::ExecCtx,
    error::{require_dim, require_qubit, Error, Result},
    math::{count_bits, insert_zero_bit, C, Mask, N, R, I_POW_TABLE},
    pauli::{Pauli, PauliMasks},
    threads::REDUCE_DIFFICULTY,
};

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use crate::{backend::avx::hsum256_pd, math::flat_real};

/// Expectation value of a Pauli string given as a sparse
/// `(qubit, operator)` list.
pub fn multi_qubit_pauli_partial(
    qubits: &[N],
    ops: &[Pauli],
    state: &[C],
    ctx: &ExecCtx,
) -> Result<R> {
    let qubit_count = require_dim(state.len())?;
    for &qubit in qubits {
        require_qubit(qubit, qubit_count)?;
    }
    let masks = PauliMasks::from_partial_list(qubits, ops)?;
    Ok(coordinated(&masks, state, ctx))
}

/// Expectation value of a Pauli string given as one operator per qubit.
pub fn multi_qubit_pauli_whole(ops: &[Pauli], state: &[C], ctx: &ExecCtx) -> Result<R> {
    let qubit_count = require_dim(state.len())?;
    if ops.len() != qubit_count as N {
        return Err(Error::ListLengthMismatch {
            qubits: qubit_count as N,
            ops: ops.len(),
        });
    }
    let masks = PauliMasks::from_whole_list(ops);
    Ok(coordinated(&masks, state, ctx))
}

/// Expectation value of a Pauli string already in mask form.
pub fn multi_qubit_pauli_masked(masks: &PauliMasks, state: &[C], ctx: &ExecCtx) -> Result<R> {
    validate_masks(masks, state.len())?;
    Ok(coordinated(masks, state, ctx))
}

/// Sparse-list expectation value that never touches the worker
/// coordinator, for callers parallelising over observable terms.
pub fn multi_qubit_pauli_partial_single_thread(
    qubits: &[N],
    ops: &[Pauli],
    state: &[C],
    ctx: &ExecCtx,
) -> Result<R> {
    let qubit_count = require_dim(state.len())?;
    for &qubit in qubits {
        require_qubit(qubit, qubit_count)?;
    }
    let masks = PauliMasks::from_partial_list(qubits, ops)?;
    Ok(masked_sum(&masks, state, ctx.backend(), true))
}

/// Mask-form expectation value without the worker coordinator.
pub fn multi_qubit_pauli_masked_single_thread(
    masks: &PauliMasks,
    state: &[C],
    ctx: &ExecCtx,
) -> Result<R> {
    validate_masks(masks, state.len())?;
    Ok(masked_sum(masks, state, ctx.backend(), true))
}

fn validate_masks(masks: &PauliMasks, dim: N) -> Result<()> {
    let qubit_count = require_dim(dim)?;
    let touched = masks.bit_flip | masks.phase_flip;
    if touched >= dim && touched != 0 {
        let qubit = (usize::BITS - 1 - touched.leading_zeros()) as N;
        return Err(Error::QubitOutOfRange { qubit, qubit_count });
    }
    if masks.bit_flip != 0 && masks.bit_flip & (1 << masks.pivot) == 0 {
        return Err(Error::PivotOutsideBitFlipMask(masks.pivot));
    }
    Ok(())
}

fn coordinated(masks: &PauliMasks, state: &[C], ctx: &ExecCtx) -> R {
    let dim = state.len();
    let backend = ctx.backend();
    let masks = *masks;
    ctx.threads()
        .install(dim, REDUCE_DIFFICULTY, move || {
            masked_sum(&masks, state, backend, false)
        })
}

fn masked_sum(masks: &PauliMasks, state: &[C], backend: SimdBackend, seq: bool) -> R {
    let dim = state.len();
    if masks.bit_flip == 0 {
        let phase_flip = masks.phase_flip;
        match backend {
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            SimdBackend::Avx2 if backend.covers(dim) => reduce(dim, seq, |range| unsafe {
                z_mask_sum_avx2(state, phase_flip, range)
            }),
            _ => reduce(dim, seq, |range| z_mask_sum(state, phase_flip, range)),
        }
    } else {
        let pivot_mask = 1 << masks.pivot;
        let masks = *masks;
        match backend {
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            SimdBackend::Avx2
                if backend.covers_pairs(dim) && pivot_mask >= backend.vector_len() =>
            {
                reduce(dim / 2, seq, |range| unsafe {
                    xz_mask_sum_avx2(state, &masks, pivot_mask, range)
                })
            }
            _ => reduce(dim / 2, seq, |range| {
                xz_mask_sum(state, &masks, pivot_mask, range)
            }),
        }
    }
}

/// Z-only string: `|amp|²` signed by the parity of the phase-flip bits.
fn z_mask_sum(state: &[C], phase_flip: Mask, range: Range<N>) -> R {
    let mut sum = 0.;
    for state_index in range {
        let parity = count_bits(state_index & phase_flip) & 1;
        let norm_sqr = state[state_index].norm_sqr();
        if parity == 0 {
            sum += norm_sqr;
        } else {
            sum -= norm_sqr;
        }
    }
    sum
}

/// String with bit-flip factors: paired traversal over the pivot-clear
/// half, each pair phased by `i^rot (-1)^parity` and doubled to cover the
/// mirrored half.
fn xz_mask_sum(state: &[C], masks: &PauliMasks, pivot_mask: Mask, range: Range<N>) -> R {
    let mut sum = 0.;
    for state_index in range {
        let basis_0 = insert_zero_bit(state_index, pivot_mask);
        let basis_1 = basis_0 ^ masks.bit_flip;
        let sign_0 = count_bits(basis_0 & masks.phase_flip) & 1;
        let phase = I_POW_TABLE[(masks.rot_count as N + 2 * sign_0) & 3];
        sum += (state[basis_0] * state[basis_1].conj() * phase).re * 2.;
    }
    sum
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn z_mask_sum_avx2(state: &[C], phase_flip: Mask, range: Range<N>) -> R {
    use std::arch::x86_64::*;

    debug_assert_eq!(range.start & 1, 0);
    debug_assert_eq!(range.len() & 1, 0);
    let ptr = flat_real(state).as_ptr();

    // sign pattern per (parity of amp 0, parity of amp 1)
    let sign_table = [
        _mm256_setr_pd(0., 0., 0., 0.),
        _mm256_setr_pd(0., 0., -0., -0.),
        _mm256_setr_pd(-0., -0., 0., 0.),
        _mm256_setr_pd(-0., -0., -0., -0.),
    ];

    let mut acc = _mm256_setzero_pd();
    let mut state_index = range.start;
    while state_index < range.end {
        let v = _mm256_loadu_pd(ptr.add(2 * state_index));
        let sq = _mm256_mul_pd(v, v);
        let parity_0 = count_bits(state_index & phase_flip) & 1;
        let parity_1 = parity_0 ^ (phase_flip & 1);
        acc = _mm256_add_pd(acc, _mm256_xor_pd(sq, sign_table[(parity_0 << 1) | parity_1]));
        state_index += 2;
    }
    hsum256_pd(acc)
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn xz_mask_sum_avx2(
    state: &[C],
    masks: &PauliMasks,
    pivot_mask: Mask,
    range: Range<N>,
) -> R {
    use std::arch::x86_64::*;

    debug_assert!(pivot_mask >= 2);
    debug_assert_eq!(range.start & 1, 0);
    debug_assert_eq!(range.len() & 1, 0);
    let ptr = flat_real(state).as_ptr();

    // i^rot = (-1)^(rot>>1) * i^(rot&1); the real/imag split below follows
    // the low bit, the base sign the high bit, and the per-pair parity
    // flips the sign again.
    let imag_part = masks.rot_count & 1 == 1;
    let base_sign = if masks.rot_count & 2 == 2 { -1. } else { 1. };
    let partner_low = masks.bit_flip & 1 == 1;

    let sign_table = [
        _mm256_setr_pd(0., 0., 0., 0.),
        _mm256_setr_pd(0., 0., -0., -0.),
        _mm256_setr_pd(-0., -0., 0., 0.),
        _mm256_setr_pd(-0., -0., -0., -0.),
    ];
    let flip_odd = _mm256_setr_pd(0., -0., 0., -0.);

    let mut acc = _mm256_setzero_pd();
    let mut state_index = range.start;
    while state_index < range.end {
        let basis_0 = insert_zero_bit(state_index, pivot_mask);
        let a = _mm256_loadu_pd(ptr.add(2 * basis_0));

        // partner block; a bit-flip on qubit 0 reverses it in memory
        let b = if partner_low {
            let block = (basis_0 ^ masks.bit_flip) & !1;
            let v = _mm256_loadu_pd(ptr.add(2 * block));
            _mm256_permute2f128_pd::<0x01>(v, v)
        } else {
            _mm256_loadu_pd(ptr.add(2 * (basis_0 ^ masks.bit_flip)))
        };

        let sign_0 = count_bits(basis_0 & masks.phase_flip) & 1;
        let sign_1 = sign_0 ^ (masks.phase_flip & 1);
        let signs = sign_table[(sign_0 << 1) | sign_1];

        // Re(a conj(b)) = re re' + im im'; Re(a conj(b) i) = re im' - im re'
        let prod = if imag_part {
            let b_swapped = _mm256_permute_pd::<0b0101>(b);
            _mm256_xor_pd(_mm256_mul_pd(a, b_swapped), flip_odd)
        } else {
            _mm256_mul_pd(a, b)
        };
        acc = _mm256_add_pd(acc, _mm256_xor_pd(prod, signs));

        state_index += 2;
    }
    base_sign * 2. * hsum256_pd(acc)
}
