//! The `error` module defines the error taxonomy shared across the bus.
//!
//! User-facing variants (`InvalidCredentials`, `NotJoined`, `Oversize`) are
//! returned to the transport layer, which renders them as protocol lines.
//! `NotSingleWorker` signals corrupted subscriber bookkeeping and is not
//! expected to occur in correct operation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Login under an existing username with a non-matching password.
    #[error("invalid password")]
    InvalidCredentials,

    /// An operation that requires topic membership was attempted without one.
    #[error("client has not joined a topic")]
    NotJoined,

    /// A reject-policy bounded container would exceed its capacity.
    #[error("limit is {limit}")]
    Oversize { limit: usize },

    /// A subscriber's worker lookup did not yield exactly one match.
    #[error("expected exactly one delivery worker, found {found}")]
    NotSingleWorker { found: usize },
}
