use super::update_pairs;
use crate::{
    context::ExecCtx,
    error::{require_dim, require_qubit, Result},
    math::{C, C_ZERO, N},
    threads::UPDATE_DIFFICULTY,
};

/// Project onto the `target = 0` subspace: zero every amplitude whose
/// target bit is set. Non-unitary, no renormalisation.
pub fn p0_gate(target: N, state: &mut [C], ctx: &ExecCtx) -> Result<()> {
    let qubit_count = require_dim(state.len())?;
    let mask = require_qubit(target, qubit_count)?;
    let dim = state.len();

    ctx.threads().install(dim, UPDATE_DIFFICULTY, || {
        update_pairs(state, mask, 1, |_, hi| hi.fill(C_ZERO));
    });
    Ok(())
}

/// Project onto the `target = 1` subspace: zero every amplitude whose
/// target bit is clear. Non-unitary, no renormalisation.
pub fn p1_gate(target: N, state: &mut [C], ctx: &ExecCtx) -> Result<()> {
    let qubit_count = require_dim(state.len())?;
    let mask = require_qubit(target, qubit_count)?;
    let dim = state.len();

    ctx.threads().install(dim, UPDATE_DIFFICULTY, || {
        update_pairs(state, mask, 1, |lo, _| lo.fill(C_ZERO));
    });
    Ok(())
}
