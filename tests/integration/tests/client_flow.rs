//! Integration test: session lifecycle and the account operations of
//! `LspClient`.

use std::sync::Arc;

use lspc_client::{ErrorKind, HINT_CHAN_ID};
use lspc_core::proto::lspd::{IntegrityResult, ReportLevel};
use lspc_core::InvoiceMode;
use lspc_integration_tests::{channel, test_client, MemoryCloseWatcher};

// =========================================================================
// Session
// =========================================================================

#[tokio::test]
async fn test_accessors_need_handshake() {
    let (client, lsp, _node) = test_client();

    let err = client.version().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotInitialized);
    assert!(err.is_recoverable());
    assert!(client.fee_permyriad().is_err());
    assert!(client.payment_fee(10_000).is_err());
    assert_eq!(lsp.state().handshakes, 0);
}

#[tokio::test]
async fn test_ping_handshakes_and_caches_terms() {
    let (client, lsp, _node) = test_client();

    assert_eq!(client.ping(7).await.unwrap(), 7);
    assert_eq!(client.version().unwrap(), "v2");
    assert_eq!(
        client.hub_node_string().unwrap(),
        format!("{}@127.0.0.1:9735", lsp.node_pubkey())
    );
    assert_eq!(client.fee_permyriad().unwrap(), 40);

    client.ping(8).await.unwrap();
    assert_eq!(lsp.state().handshakes, 1);
    assert_eq!(lsp.state().pings, 2);
}

#[tokio::test]
async fn test_failed_ping_clears_session() {
    let (client, lsp, _node) = test_client();
    client.ping(1).await.unwrap();
    assert!(client.session().is_initialized());

    lsp.state().fail_ping = true;
    let err = client.ping(2).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(!client.session().is_initialized());
    assert_eq!(client.version().unwrap_err().kind(), ErrorKind::NotInitialized);

    // next call handshakes again
    lsp.state().fail_ping = false;
    client.ping(3).await.unwrap();
    assert_eq!(lsp.state().handshakes, 2);
}

#[tokio::test]
async fn test_payment_fee_has_a_floor() {
    let (client, _lsp, _node) = test_client();
    client.ping(0).await.unwrap();

    // 40 permyriad of 1M sat
    assert_eq!(client.payment_fee(1_000_000).unwrap(), 4_000);
    // below the 2000 sat minimum
    assert_eq!(client.payment_fee(10_000).unwrap(), 2_000);
}

#[tokio::test]
async fn test_fee_hint_only_for_lsp_node() {
    let (client, lsp, _node) = test_client();
    assert!(client.fee_hint(&hex::decode(lsp.node_pubkey()).unwrap()).is_none());

    client.ping(0).await.unwrap();
    let hint = client
        .fee_hint(&hex::decode(lsp.node_pubkey()).unwrap())
        .unwrap();
    assert_eq!(hint.fee_base_msat, 1_000);
    assert_eq!(hint.fee_proportional_millionths, 1);
    assert_eq!(hint.time_lock_delta, 40);
    assert!(client.fee_hint(&[2u8; 33]).is_none());
}

// =========================================================================
// Payment registration
// =========================================================================

#[tokio::test]
async fn test_register_payment() {
    let (client, lsp, node) = test_client();
    node.state().channels = vec![channel(1, 100_000, 90_000, 10_000)];

    let invoice = client.register_payment(1_000_000, "coffee").await.unwrap();
    assert_eq!(invoice, "lnbcrt1000000n1mock1");

    let node_state = node.state();
    let [registered, for_payer] = node_state.invoices.as_slice() else {
        panic!("expected two invoices");
    };
    assert_eq!(registered.mode, InvoiceMode::Register);
    assert_eq!(registered.amount_sat, 996_000);
    assert_eq!(for_payer.mode, InvoiceMode::CreateOnly);
    assert_eq!(for_payer.amount_sat, 1_000_000);
    assert_eq!(registered.preimage, for_payer.preimage);
    assert_eq!(for_payer.payment_addr, Some(vec![0x10; 32]));

    let hint = registered.route_hint.as_ref().unwrap();
    assert_eq!(hint.chan_id, HINT_CHAN_ID);
    assert_eq!(hint.node_id, lsp.node_pubkey());
    assert_eq!(hint.cltv_expiry_delta, 40);

    let lsp_state = lsp.state();
    let payment = &lsp_state.payments[0];
    assert_eq!(payment.incoming_amount_msat, 1_000_000_000);
    assert_eq!(payment.outgoing_amount_msat, 996_000_000);
    assert_eq!(payment.payment_secret, vec![0x10; 32]);
    assert_eq!(payment.destination, node.identity_bytes());
}

#[tokio::test]
async fn test_register_payment_when_channel_suffices() {
    let (client, lsp, node) = test_client();
    node.state().channels = vec![channel(1, 2_000_000, 100_000, 1_900_000)];

    let err = client.register_payment(1_000_000, "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(node.state().invoices.is_empty());
    assert!(lsp.state().payments.is_empty());
}

#[tokio::test]
async fn test_register_payment_addr_mismatch() {
    let (client, lsp, node) = test_client();
    node.state().ignore_payment_addr = true;

    let err = client.register_payment(50_000, "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Node);
    assert!(lsp.state().payments.is_empty());
}

#[tokio::test]
async fn test_receive_max() {
    let (client, _lsp, node) = test_client();
    node.state().channels = vec![
        channel(1, 100_000, 90_000, 10_000),
        channel(2, 500_000, 100_000, 400_000),
    ];
    assert_eq!(client.receive_max().await.unwrap(), 400_000);
}

// =========================================================================
// Account and integrity
// =========================================================================

#[tokio::test]
async fn test_user_info_and_report() {
    let (client, lsp, _node) = test_client();

    client.register_user_info("alice@example.com").await.unwrap();
    client
        .report_message("Backup", ReportLevel::Critical, "disk full")
        .await
        .unwrap();

    let state = lsp.state();
    assert_eq!(state.user_infos[0].mail_address, "alice@example.com");
    assert_eq!(state.reports[0].category, "Backup");
    assert_eq!(state.reports[0].level(), ReportLevel::Critical);
    assert_eq!(state.reports[0].message, "disk full");
}

#[tokio::test]
async fn test_open_channel_sends_node_id() {
    let (client, lsp, node) = test_client();
    client.request_open_channel().await.unwrap();
    assert_eq!(lsp.state().open_requests[0].pubkey, node.identity_pubkey());
}

#[tokio::test]
async fn test_integrity_round_trip() {
    let (client, lsp, _node) = test_client();

    let nonce = client.integrity_nonce("device-1").await.unwrap();
    assert_eq!(nonce, "nonce-device-1");
    assert_eq!(lsp.state().integrity_ids, vec!["device-1".to_string()]);

    let token = format!("signed-{nonce}");
    assert_eq!(
        client.integrity_verify("device-1", &token).await.unwrap(),
        IntegrityResult::Ok
    );
    assert_eq!(
        client.integrity_verify("device-1", "forged").await.unwrap(),
        IntegrityResult::Ng
    );
}

// =========================================================================
// Channel close watch
// =========================================================================

#[tokio::test]
async fn test_close_watch_needs_watcher() {
    let (client, _lsp, _node) = test_client();
    let err = client.check_closed_channels().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_close_watch_counts_spent_points() {
    let (client, _lsp, _node) = test_client();
    let watcher = Arc::new(MemoryCloseWatcher::new());
    let client = client.with_close_watcher(watcher.clone());

    let a = format!("{}:0", "aa".repeat(32));
    let b = format!("{}:1", "bb".repeat(32));
    client.watch_channel_close(&a).await.unwrap();
    client.watch_channel_close(&b).await.unwrap();
    assert_eq!(client.check_closed_channels().await.unwrap(), 0);

    watcher.mark_spent(&a);
    assert_eq!(client.check_closed_channels().await.unwrap(), 1);

    client.unwatch_channel_close(&a).await.unwrap();
    assert_eq!(client.check_closed_channels().await.unwrap(), 0);
    assert_eq!(watcher.watched(), vec![b]);
}

#[tokio::test]
async fn test_close_watch_rejects_bad_point() {
    let (client, _lsp, _node) = test_client();
    let watcher = Arc::new(MemoryCloseWatcher::new());
    let client = client.with_close_watcher(watcher.clone());

    let bad_index = format!("{}:x", "aa".repeat(32));
    for bad in ["nocolon", "abcd:0", bad_index.as_str()] {
        let err = client.watch_channel_close(bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
    assert!(watcher.watched().is_empty());
}
