// vim: tw=80
//! Errors returned by the collaborator traits.

use thiserror::Error;

/// Errors from looking up chains in a [`LegacyChainContainer`].
///
/// [`LegacyChainContainer`]: crate::LegacyChainContainer
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ChainError {
    #[error("chain {0} not found")]
    NotFound(String),

    #[error("chain {0} is disabled")]
    Disabled(String),
}

/// Errors from sending a batch of RPC calls.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum RpcError {
    #[error("batch of {len} calls exceeds the limit of {limit}")]
    BatchTooLarge {
        len: usize,
        limit: usize,
    },

    #[error("context cancelled")]
    Cancelled,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type for RPC operations
pub type RpcResult<T> = Result<T, RpcError>;
