pub use float_cmp::*;

use super::types::*;

const ULPS: i64 = 4;

#[inline]
pub fn approx_eq_real(x: R, y: R) -> bool {
    approx_eq!(R, x, y, ulps = ULPS)
}

#[inline]
pub fn approx_eq_complex(a: &C, b: &C) -> bool {
    approx_eq!(R, a.re, b.re, ulps = ULPS) && approx_eq!(R, a.im, b.im, ulps = ULPS)
}
