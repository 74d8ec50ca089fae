//! Standard errors that may occur when working with the crate.
//!
//! Per-frame decode problems never reach this type: the call state machines
//! absorb them and report only whether a frame was consumed. What remains is
//! cipher misuse and configuration mistakes.

use thiserror::Error;

/// NXDN runtime errors.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum NxdnError {
    /// A cipher input whose length is not a multiple of the AES block size.
    #[error("input length must be a multiple of the 16-byte AES block")]
    BlockLength,
    /// A configuration field outside the range the air interface permits.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Standard result using `NxdnError`.
pub type Result<T> = std::result::Result<T, NxdnError>;
