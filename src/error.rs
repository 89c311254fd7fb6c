use std::fmt;

use crate::math::{Mask, N};

/// Errors reported by kernel entry points.
///
/// Arguments are validated once on entry; the inner loops never fail and
/// floating-point results are returned as produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Qubit index at or above the qubit count of the state.
    QubitOutOfRange { qubit: N, qubit_count: u32 },
    /// Buffer length is not a positive power of two.
    DimNotPowerOfTwo(N),
    /// Pauli operator code outside `{0, 1, 2, 3}`.
    InvalidPauliCode(u8),
    /// The two SWAP targets must differ.
    SwapTargetsEqual(N),
    /// Qubit list and operator list have different lengths.
    ListLengthMismatch { qubits: N, ops: N },
    /// The pivot qubit's bit is not set in the bit-flip mask.
    PivotOutsideBitFlipMask(N),
    /// The requested backend is not available on this host.
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::QubitOutOfRange { qubit, qubit_count } => {
                write!(f, "qubit index {} out of range for {} qubits", qubit, qubit_count)
            }
            Error::DimNotPowerOfTwo(dim) => {
                write!(f, "state length {} is not a positive power of two", dim)
            }
            Error::InvalidPauliCode(code) => write!(f, "invalid Pauli operator code {}", code),
            Error::SwapTargetsEqual(qubit) => {
                write!(f, "SWAP targets must differ, both are {}", qubit)
            }
            Error::ListLengthMismatch { qubits, ops } => {
                write!(f, "{} qubits listed against {} operators", qubits, ops)
            }
            Error::PivotOutsideBitFlipMask(pivot) => {
                write!(f, "pivot qubit {} has no bit-flip factor", pivot)
            }
            Error::Unsupported(backend) => {
                write!(f, "backend {} is not available on this host", backend)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Validate the buffer length and return the qubit count.
pub(crate) fn require_dim(len: N) -> Result<u32> {
    if len == 0 || !len.is_power_of_two() {
        return Err(Error::DimNotPowerOfTwo(len));
    }
    Ok(len.trailing_zeros())
}

/// Validate a qubit index against the qubit count and return its mask.
pub(crate) fn require_qubit(qubit: N, qubit_count: u32) -> Result<Mask> {
    if qubit >= qubit_count as N {
        return Err(Error::QubitOutOfRange { qubit, qubit_count });
    }
    Ok(1 << qubit)
}
