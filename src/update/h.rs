#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use super::update_adjacent;
use super::update_pairs;
use crate::{
    context::ExecCtx,
    error::{require_dim, require_qubit, Result},
    math::{C, FRAC_1_SQRT_2, N},
    threads::UPDATE_DIFFICULTY,
};

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use crate::{backend::SimdBackend, math::flat_real_mut};

/// Apply the Hadamard gate to `target`, in place.
pub fn h_gate(target: N, state: &mut [C], ctx: &ExecCtx) -> Result<()> {
    let qubit_count = require_dim(state.len())?;
    let mask = require_qubit(target, qubit_count)?;
    let dim = state.len();
    let backend = ctx.backend();

    ctx.threads().install(dim, UPDATE_DIFFICULTY, || match backend {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        SimdBackend::Avx2 if target == 0 && backend.covers(dim) => {
            update_adjacent(state, |chunk| unsafe { h_adjacent_avx2(chunk) })
        }
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        SimdBackend::Avx2 if target != 0 && backend.covers_pairs(dim) => {
            update_pairs(state, mask, 1, |lo, hi| unsafe { h_pairs_avx2(lo, hi) })
        }
        _ => update_pairs(state, mask, 1, h_pairs),
    });
    Ok(())
}

fn h_pairs(lo: &mut [C], hi: &mut [C]) {
    for (a, b) in lo.iter_mut().zip(hi) {
        let sum = *a + *b;
        let diff = *a - *b;
        *a = sum.scale(FRAC_1_SQRT_2);
        *b = diff.scale(FRAC_1_SQRT_2);
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn h_pairs_avx2(lo: &mut [C], hi: &mut [C]) {
    use std::arch::x86_64::*;

    let len = lo.len();
    debug_assert_eq!(len & 1, 0);
    let lo = flat_real_mut(lo);
    let hi = flat_real_mut(hi);
    let factor = _mm256_set1_pd(FRAC_1_SQRT_2);

    let mut i = 0;
    while i < len {
        let p0 = lo.as_mut_ptr().add(2 * i);
        let p1 = hi.as_mut_ptr().add(2 * i);
        let a = _mm256_loadu_pd(p0);
        let b = _mm256_loadu_pd(p1);
        let sum = _mm256_mul_pd(_mm256_add_pd(a, b), factor);
        let diff = _mm256_mul_pd(_mm256_sub_pd(a, b), factor);
        _mm256_storeu_pd(p0, sum);
        _mm256_storeu_pd(p1, diff);
        i += 2;
    }
}

/// Target-0 body: each 256-bit register holds one adjacent pair, mixed by
/// a cross-half permute and a blend.
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn h_adjacent_avx2(chunk: &mut [C]) {
    use std::arch::x86_64::*;

    let len = chunk.len();
    debug_assert_eq!(len & 1, 0);
    let buf = flat_real_mut(chunk);
    let factor = _mm256_set1_pd(FRAC_1_SQRT_2);

    let mut i = 0;
    while i < len {
        let ptr = buf.as_mut_ptr().add(2 * i);
        let data = _mm256_loadu_pd(ptr);
        // (re0, im0, re1, im1) -> (re1, im1, re0, im0)
        let swapped = _mm256_permute4x64_pd::<0b0100_1110>(data);
        let sum = _mm256_add_pd(data, swapped);
        let diff = _mm256_sub_pd(swapped, data);
        // low half a+b, high half a-b
        let mixed = _mm256_blend_pd::<0b0011>(diff, sum);
        _mm256_storeu_pd(ptr, _mm256_mul_pd(mixed, factor));
        i += 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{C_ONE, C_ZERO, R};
    use crate::testutil::{assert_states_close, random_state};

    #[test]
    fn plus_state_from_zero() {
        let ctx = ExecCtx::new();
        let mut state = vec![C_ONE, C_ZERO, C_ZERO, C_ZERO];
        h_gate(0, &mut state, &ctx).unwrap();
        let expect = [
            C { re: FRAC_1_SQRT_2, im: 0. },
            C { re: FRAC_1_SQRT_2, im: 0. },
            C_ZERO,
            C_ZERO,
        ];
        assert_states_close(&state, &expect, 1e-15);

        h_gate(1, &mut state, &ctx).unwrap();
        let expect = [C { re: 0.5, im: 0. }; 4];
        assert_states_close(&state, &expect, 1e-15);
    }

    #[test]
    fn self_inverse() {
        let ctx = ExecCtx::new();
        for qubit in 0..6 {
            let original = random_state(6, 11 + qubit as u64);
            let mut state = original.clone();
            h_gate(qubit, &mut state, &ctx).unwrap();
            h_gate(qubit, &mut state, &ctx).unwrap();
            assert_states_close(&state, &original, 1e-12);
        }
    }

    #[test]
    fn preserves_norm() {
        let ctx = ExecCtx::new();
        let mut state = random_state(5, 3);
        h_gate(2, &mut state, &ctx).unwrap();
        let norm: R = state.iter().map(C::norm_sqr).sum();
        assert!((norm - 1.).abs() < 1e-12);
    }

    #[test]
    fn single_qubit_state() {
        let ctx = ExecCtx::new();
        let mut state = vec![C_ZERO, C_ONE];
        h_gate(0, &mut state, &ctx).unwrap();
        assert_states_close(
            &state,
            &[
                C { re: FRAC_1_SQRT_2, im: 0. },
                C { re: -FRAC_1_SQRT_2, im: 0. },
            ],
            1e-15,
        );
    }

    #[test]
    fn rejects_bad_arguments() {
        let ctx = ExecCtx::new();
        let mut state = vec![C_ONE, C_ZERO];
        assert!(h_gate(1, &mut state, &ctx).is_err());
        let mut odd = vec![C_ONE; 3];
        assert!(h_gate(0, &mut odd, &ctx).is_err());
    }

    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    #[test]
    fn avx2_matches_scalar() {
        use crate::backend::SimdBackend;
        if !SimdBackend::Avx2.is_available() {
            return;
        }
        let avx = ExecCtx::with_backend(SimdBackend::Avx2).unwrap();
        let scalar = ExecCtx::with_backend(SimdBackend::Scalar).unwrap();
        for qubit_count in 1..=6 {
            for qubit in 0..qubit_count {
                let original = random_state(qubit_count as u32, 40 + qubit as u64);
                let mut lhs = original.clone();
                let mut rhs = original;
                h_gate(qubit, &mut lhs, &avx).unwrap();
                h_gate(qubit, &mut rhs, &scalar).unwrap();
                assert_states_close(&lhs, &rhs, 1e-14);
            }
        }
    }
}
