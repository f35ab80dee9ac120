//! Test doubles shared by the integration tests.
//!
//! [`FakeLsp`] plays the LSP end of the protocol with a real key pair: it
//! opens sealed requests, records them, and seals replies to the key each
//! request carries. [`MockNode`] is an in-memory Lightning node with
//! scripted send results and an event log for ordering checks.
//! [`MemoryCloseWatcher`] stands in for the on-chain close watcher.

pub mod lsp;
pub mod watch;

use std::sync::Arc;

use lspc_client::LspClient;
use lspc_core::{ClientConfig, RebalanceConfig};

pub use lsp::{lsp_route, FakeLsp, LspState};
pub use node::{channel, MockNode, NodeState, SendBehavior};
pub use watch::MemoryCloseWatcher;

/// Default config with rebalance pauses short enough for tests.
pub fn test_config() -> ClientConfig {
    ClientConfig {
        rebalance: RebalanceConfig {
            settle_delay_ms: 20,
            close_retry_delay_ms: 1,
            close_sat_per_vbyte: 1,
        },
        ..ClientConfig::default()
    }
}

/// Client wired to a fresh fake LSP and mock node.
pub fn test_client() -> (LspClient, Arc<FakeLsp>, Arc<MockNode>) {
    let lsp = Arc::new(FakeLsp::new());
    let node = Arc::new(MockNode::new());
    let client = LspClient::new(test_config(), lsp.clone(), node.clone());
    (client, lsp, node)
}
