//! Integration test: submarine swap lifecycle.
//!
//! Register against the fake LSP (which derives the address on its own side),
//! reject tampered replies, then sweep the output back through the refund
//! path and check the broadcast transaction.

use bitcoin::consensus::deserialize;
use bitcoin::{Address, Amount, ScriptBuf, Sequence, Transaction};

use lspc_client::ErrorKind;
use lspc_integration_tests::test_client;
use lspc_swap::{RepayData, SCRIPT_VERSION};

fn destination(node: &lspc_integration_tests::MockNode) -> String {
    Address::p2wsh(&ScriptBuf::from_bytes(vec![0x51]), node.network()).to_string()
}

#[tokio::test]
async fn test_register_swap() {
    let (client, lsp, node) = test_client();
    let keys = client.submarine_create_keys();

    let swap = client
        .submarine_register(&keys.payment_hash, &keys.refund_pubkey)
        .await
        .unwrap();

    assert!(swap.script_address.starts_with("bcrt1"));
    assert_eq!(swap.htlc_pubkey, lsp.htlc_pubkey());
    assert_eq!(swap.payment_hash, keys.payment_hash.to_vec());
    assert_eq!(swap.height, 800_000);

    let lsp_state = lsp.state();
    assert_eq!(lsp_state.swaps.len(), 1);
    assert_eq!(lsp_state.swaps[0].destination, node.identity_bytes());
    assert_eq!(lsp_state.swaps[0].swap_script_version, SCRIPT_VERSION);
    assert_eq!(lsp_state.swaps[0].repay_pubkey, keys.refund_pubkey.to_vec());

    assert_eq!(node.state().watched, vec![swap.script.clone()]);
}

#[tokio::test]
async fn test_tampered_htlc_key_is_rejected() {
    let (client, lsp, node) = test_client();
    lsp.state().tamper_htlc_key = true;
    let keys = client.submarine_create_keys();

    let err = client
        .submarine_register(&keys.payment_hash, &keys.refund_pubkey)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ScriptMismatch);
    assert!(!err.is_recoverable());
    // nothing is watched for an address we would never fund
    assert!(node.state().watched.is_empty());
}

#[tokio::test]
async fn test_watch_address_must_match() {
    let (client, _lsp, node) = test_client();
    node.state().watch_address_override = Some(destination(&node));
    let keys = client.submarine_create_keys();

    let err = client
        .submarine_register(&keys.payment_hash, &keys.refund_pubkey)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ScriptMismatch);
}

#[tokio::test]
async fn test_short_payment_hash_rejected() {
    let (client, lsp, _node) = test_client();
    let keys = client.submarine_create_keys();

    let err = client
        .submarine_register(&keys.payment_hash[..20], &keys.refund_pubkey)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(lsp.state().swaps.is_empty());
}

#[tokio::test]
async fn test_receive_swap() {
    let (client, lsp, _node) = test_client();
    let keys = client.submarine_create_keys();

    client
        .submarine_receive(&keys.payment_hash, "lnbcrt500u1swap")
        .await
        .unwrap();

    let state = lsp.state();
    assert_eq!(state.swap_receives.len(), 1);
    assert_eq!(state.swap_receives[0].invoice, "lnbcrt500u1swap");
    assert_eq!(state.swap_receives[0].payment_hash, keys.payment_hash.to_vec());
}

#[tokio::test]
async fn test_repay_swap_output() {
    let (client, _lsp, node) = test_client();
    let keys = client.submarine_create_keys();
    let swap = client
        .submarine_register(&keys.payment_hash, &keys.refund_pubkey)
        .await
        .unwrap();

    let input = RepayData {
        script: swap.script.clone(),
        txid: "aa".repeat(32),
        index: 1,
        amount_sat: 100_000,
        refund_privkey: keys.refund_privkey,
    };
    let address = destination(&node);
    let txid = client
        .submarine_repayment(&[input], &address, "swap refund")
        .await
        .unwrap();

    let state = node.state();
    let (raw, label) = &state.published[0];
    assert_eq!(label, "swap refund");

    let tx: Transaction = deserialize(raw).unwrap();
    assert_eq!(tx.compute_txid().to_string(), txid);
    assert_eq!(tx.input.len(), 1);
    assert_eq!(tx.input[0].sequence, Sequence(client.submarine_refund_block()));
    assert_eq!(tx.input[0].previous_output.vout, 1);

    let witness: Vec<&[u8]> = tx.input[0].witness.iter().collect();
    assert_eq!(witness.len(), 3);
    assert!(witness[1].is_empty());
    assert_eq!(witness[2], swap.script.as_slice());

    assert_eq!(tx.output.len(), 1);
    assert!(tx.output[0].value < Amount::from_sat(100_000));
    assert!(tx.output[0].value > Amount::from_sat(99_000));
}

#[tokio::test]
async fn test_repay_rejects_foreign_network_address() {
    let (client, _lsp, node) = test_client();
    let keys = client.submarine_create_keys();
    let input = RepayData {
        script: vec![0x51],
        txid: "aa".repeat(32),
        index: 0,
        amount_sat: 100_000,
        refund_privkey: keys.refund_privkey,
    };
    let mainnet = Address::p2wsh(&ScriptBuf::from_bytes(vec![0x51]), bitcoin::Network::Bitcoin);

    let err = client
        .submarine_repayment(&[input], &mainnet.to_string(), "")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(node.state().published.is_empty());
}

#[tokio::test]
async fn test_reregister_returns_watched_address() {
    let (client, _lsp, node) = test_client();
    let keys = client.submarine_create_keys();
    let swap = client
        .submarine_register(&keys.payment_hash, &keys.refund_pubkey)
        .await
        .unwrap();

    let address = client.submarine_reregister(&swap.script).await.unwrap();
    assert_eq!(address, swap.script_address);
    assert_eq!(node.state().watched.len(), 2);
}
