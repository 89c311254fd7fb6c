use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::math::{C, N, R};

/// Seeded random normalised state over `qubit_count` qubits.
pub fn random_state(qubit_count: u32, seed: u64) -> Vec<C> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dim: N = 1 << qubit_count;
    let mut state: Vec<C> = (0..dim)
        .map(|_| C {
            re: rng.gen::<R>() * 2. - 1.,
            im: rng.gen::<R>() * 2. - 1.,
        })
        .collect();
    let norm = state.iter().map(C::norm_sqr).sum::<R>().sqrt();
    state.iter_mut().for_each(|amp| *amp = amp.unscale(norm));
    state
}

pub fn max_dist(lhs: &[C], rhs: &[C]) -> R {
    assert_eq!(lhs.len(), rhs.len());
    lhs.iter()
        .zip(rhs)
        .map(|(a, b)| (a - b).norm())
        .fold(0., R::max)
}

pub fn assert_states_close(lhs: &[C], rhs: &[C], tolerance: R) {
    let dist = max_dist(lhs, rhs);
    assert!(
        dist <= tolerance,
        "states differ by {} (tolerance {})",
        dist,
        tolerance
    );
}
