// vim: tw=80
//! Mock collaborators of an EVM chain client.
//!
//! This crate defines the two traits a chain client depends on,
//! [`BatchSender`] and [`LegacyChainContainer`], and mock implementations of
//! both built on [`callmock`].  The traits carry no behavior of their own.
//!
//! # Examples
//! ```
//! use callmock::TestCase;
//! use callmock_evm::*;
//!
//! let t = TestCase::new("lookup");
//! let chains = MockLegacyChainContainer::new(&t);
//! chains.expect_get()
//!     .with("1")
//!     .return_const(Chain::new("1", 1));
//! chains.expect_len().return_const(1);
//!
//! assert_eq!(Ok(Chain::new("1", 1)), chains.get("1"));
//! assert_eq!(1, chains.len());
//! assert!(t.finish().is_empty());
//! ```

mod error;
pub mod mocks;
mod types;

pub use error::{ChainError, RpcError, RpcResult};
pub use mocks::{MockBatchSender, MockLegacyChainContainer};
pub use types::{BatchElem, Chain, Configs, Context, NodeConfig};

/// Sends batches of JSON-RPC calls.
pub trait BatchSender: Send + Sync {
    /// Send every element of `b` in one round trip, filling in each element's
    /// result or error.
    fn batch_call_context(&self, ctx: &Context, b: &mut [BatchElem])
        -> RpcResult<()>;
}

/// The set of EVM chains a node knows about.
#[allow(clippy::len_without_is_empty)]
pub trait LegacyChainContainer: Send + Sync {
    fn chain_node_configs(&self) -> Configs;

    fn get(&self, id: &str) -> Result<Chain, ChainError>;

    fn len(&self) -> usize;

    /// The chains with the given ids, or every chain if `ids` is empty.
    fn list(&self, ids: &[&str]) -> Result<Vec<Chain>, ChainError>;

    fn slice(&self) -> Vec<Chain>;
}
