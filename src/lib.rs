#![doc = include_str!("../README.md")]

pub mod backend;
pub mod context;
pub mod error;
pub mod expval;
pub mod math;
pub mod pauli;
pub mod threads;
pub mod update;

#[cfg(test)]
mod testutil;


pub use crate::{
    context::ExecCtx,
    error::{Error, Result},
};

#[doc(hidden)]
pub mod prelude {
    pub use crate::{
        backend::SimdBackend,
        context::ExecCtx,
        error::{Error, Result},
        expval,
        pauli::{Pauli, PauliMasks},
        update::{h_gate, p0_gate, p1_gate, swap_gate},
    };
}
