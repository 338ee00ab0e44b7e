// vim: tw=80
//! Plain data exchanged with the collaborator traits.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc
    },
    time::{Duration, Instant}
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A handle to one EVM chain known to the node.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Chain {
    /// Identifier the container looks chains up by
    pub id: String,
    pub chain_id: u64,
    pub enabled: bool,
}

impl Chain {
    pub fn new(id: impl Into<String>, chain_id: u64) -> Self {
        Chain{id: id.into(), chain_id, enabled: true}
    }
}

/// How to reach one node of a chain.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NodeConfig {
    pub name: String,
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_url: Option<String>,
}

/// The node configuration of every chain in a container.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Configs {
    pub nodes: Vec<NodeConfig>,
}

impl Configs {
    pub fn new(nodes: Vec<NodeConfig>) -> Self {
        Configs{nodes}
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by name.
    pub fn node(&self, name: &str) -> Option<&NodeConfig> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// All nodes serving `chain_id`.
    pub fn nodes_for(&self, chain_id: u64) -> impl Iterator<Item = &NodeConfig> {
        self.nodes.iter().filter(move |n| n.chain_id == chain_id)
    }
}

/// One call of an RPC batch.  The sender fills in `result` or `error`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct BatchElem {
    pub method: String,
    pub args: Vec<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl BatchElem {
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        BatchElem{method: method.into(), args, ..Default::default()}
    }
}

/// Cancellation and deadline for an outgoing request.
///
/// Clones share the same cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancelled explicitly, or past its deadline?
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed) ||
            self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// A child context that also expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Context {
            deadline: Some(self.deadline.map_or(deadline, |d| d.min(deadline))),
            cancelled: self.cancelled.clone(),
        }
    }
}
