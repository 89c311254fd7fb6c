use lazy_static::lazy_static;

use crate::math::N;

/// Vector backend for the inner kernel loops.
///
/// One backend is probed per process; every kernel keeps a scalar body as
/// the portable fallback and the dispatcher re-checks a dimension guard per
/// call, so a vector backend never runs on a state too small for a full
/// register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimdBackend {
    /// Portable scalar loops.
    Scalar,
    /// 256-bit AVX2 loops, two complex amplitudes per register.
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    Avx2,
}

lazy_static! {
    static ref PROBED: SimdBackend = SimdBackend::probe();
}

impl SimdBackend {
    /// Probe the host CPU.
    pub fn probe() -> Self {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        {
            if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
                return SimdBackend::Avx2;
            }
        }
        SimdBackend::Scalar
    }

    /// The backend probed once for this process.
    pub fn global() -> Self {
        *PROBED
    }

    pub fn is_available(self) -> bool {
        match self {
            SimdBackend::Scalar => true,
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            SimdBackend::Avx2 => {
                is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SimdBackend::Scalar => "scalar",
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            SimdBackend::Avx2 => "avx2",
        }
    }

    /// Complex amplitudes held by one vector register.
    pub fn vector_len(self) -> N {
        match self {
            SimdBackend::Scalar => 1,
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            SimdBackend::Avx2 => 2,
        }
    }

    /// Guard for kernels striding single amplitudes.
    #[inline]
    pub fn covers(self, dim: N) -> bool {
        dim >= self.vector_len()
    }

    /// Guard for kernels striding amplitude pairs; one vector iteration
    /// consumes `2 * vector_len` amplitudes.
    #[inline]
    pub fn covers_pairs(self, dim: N) -> bool {
        dim > self.vector_len()
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub(crate) mod avx {
    use std::arch::x86_64::*;

    /// Sum of the four lanes.
    #[inline]
    #[target_feature(enable = "avx2")]
    pub unsafe fn hsum256_pd(v: __m256d) -> f64 {
        let hi = _mm256_extractf128_pd::<1>(v);
        let lo = _mm256_castpd256_pd128(v);
        let pair = _mm_add_pd(lo, hi);
        let swapped = _mm_unpackhi_pd(pair, pair);
        _mm_cvtsd_f64(_mm_add_sd(pair, swapped))
    }
}
