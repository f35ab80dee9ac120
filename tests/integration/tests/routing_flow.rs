//! Integration test: route-and-pay through the LSP.
//!
//! Exercises lspc-routing over the fake LSP and mock node: route splicing,
//! failing-edge exclusion, the attempt cap and failure reports.

use lspc_core::proto::lspd::ReportLevel;
use lspc_core::{PayReq, PaymentFailureReason, PaymentStatus};
use lspc_integration_tests::{channel, lsp_route, test_client, SendBehavior};
use lspc_routing::MAX_ROUTE_ATTEMPTS;

const AMOUNT_MSAT: i64 = 100_000_000;

fn payee() -> String {
    format!("03{}", "ab".repeat(32))
}

fn pay_req() -> PayReq {
    PayReq {
        destination: payee(),
        payment_hash: "07".repeat(32),
        num_msat: AMOUNT_MSAT,
        num_satoshis: AMOUNT_MSAT / 1000,
        timestamp: chrono::Utc::now().timestamp(),
        expiry: 3_600,
        payment_addr: vec![5; 32],
    }
}

fn setup() -> (
    lspc_client::LspClient,
    std::sync::Arc<lspc_integration_tests::FakeLsp>,
    std::sync::Arc<lspc_integration_tests::MockNode>,
) {
    let (client, lsp, node) = test_client();
    lsp.state().default_route = Some(lsp_route(&payee(), AMOUNT_MSAT));
    {
        let mut state = node.state();
        state.pay_req = Some(pay_req());
        state.channels = vec![channel(11, 200_000, 50_000, 150_000), channel(12, 500_000, 400_000, 100_000)];
    }
    (client, lsp, node)
}

// =========================================================================
// Success
// =========================================================================

#[tokio::test]
async fn test_pay_first_route() {
    let (client, lsp, node) = setup();

    let outcome = client.query_route_payment("lnbcrt1m1invoice", 10, 0).await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.status, PaymentStatus::Succeeded);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.payment_hash, "07".repeat(32));

    let state = node.state();
    let (hash, route) = &state.sent[0];
    assert_eq!(hash, &vec![7u8; 32]);

    // our hop to the LSP over the first channel with enough balance
    let hops = route.hops();
    assert_eq!(hops.len(), 2);
    assert_eq!(hops[0].chan_id, 12);
    assert_eq!(hops[0].pub_key, lsp.node_pubkey());
    assert_eq!(hops[0].fee_msat, 1_100);
    assert_eq!(route.total_amt_msat(), AMOUNT_MSAT + 1_100);
    assert_eq!(route.total_time_lock(), 800_080);

    let mpp = hops[1].mpp_record.as_ref().unwrap();
    assert_eq!(mpp.payment_addr, vec![5; 32]);
    assert_eq!(mpp.total_amt_msat, AMOUNT_MSAT);

    assert!(lsp.state().reports.is_empty());
}

#[tokio::test]
async fn test_pay_handshakes_once() {
    let (client, lsp, _node) = setup();
    client.query_route_payment("lnbcrt1m1invoice", 10, 0).await.unwrap();
    client.query_route_payment("lnbcrt1m1invoice", 10, 0).await.unwrap();
    assert_eq!(lsp.state().handshakes, 1);
}

// =========================================================================
// Retries around failing edges
// =========================================================================

#[tokio::test]
async fn test_failed_edge_is_excluded_on_retry() {
    let (client, lsp, node) = setup();
    node.state().send_plan.push_back(SendBehavior::FailAt {
        source_index: 1,
        reason: PaymentFailureReason::NoRoute,
    });

    let outcome = client.query_route_payment("lnbcrt1m1invoice", 10, 0).await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.excluded_pairs, 1);

    let state = lsp.state();
    assert_eq!(state.route_queries.len(), 2);
    assert!(state.route_queries[0].ignored_pairs.is_empty());
    let pair = &state.route_queries[1].ignored_pairs[0];
    assert_eq!(hex::encode(&pair.from), lsp.node_pubkey());
    assert_eq!(hex::encode(&pair.to), payee());
}

#[tokio::test]
async fn test_attempts_are_capped() {
    let (client, lsp, node) = setup();
    {
        let mut state = node.state();
        for _ in 0..MAX_ROUTE_ATTEMPTS + 5 {
            state.send_plan.push_back(SendBehavior::FailAt {
                source_index: 1,
                reason: PaymentFailureReason::NoRoute,
            });
        }
    }

    let outcome = client.query_route_payment("lnbcrt1m1invoice", 10, 0).await.unwrap();
    assert_eq!(outcome.status, PaymentStatus::Failed);
    assert_eq!(outcome.failure_reason, PaymentFailureReason::NoRoute);
    assert_eq!(outcome.attempts, MAX_ROUTE_ATTEMPTS);
    assert_eq!(node.state().sent.len(), MAX_ROUTE_ATTEMPTS);

    let state = lsp.state();
    assert_eq!(state.reports.len(), 1);
    assert_eq!(state.reports[0].category, "QueryRoutes");
    assert_eq!(state.reports[0].level(), ReportLevel::Notify);
}

#[tokio::test]
async fn test_unattributed_failure_stops() {
    let (client, lsp, node) = setup();
    node.state().send_plan.push_back(SendBehavior::FailUnrecorded);

    let outcome = client.query_route_payment("lnbcrt1m1invoice", 10, 0).await.unwrap();
    assert_eq!(outcome.status, PaymentStatus::Failed);
    assert_eq!(outcome.failure_reason, PaymentFailureReason::Error);
    assert_eq!(outcome.attempts, 1);

    let state = lsp.state();
    assert_eq!(state.reports.len(), 1);
    assert_eq!(state.reports[0].level(), ReportLevel::Normal);
    assert!(state.reports[0].message.contains("errPairs=0"));
}

#[tokio::test]
async fn test_node_send_error_is_returned_and_reported() {
    let (client, lsp, node) = setup();
    node.state().send_plan.push_back(SendBehavior::Error);

    let err = client
        .query_route_payment("lnbcrt1m1invoice", 10, 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), lspc_client::ErrorKind::Transport);
    assert_eq!(node.state().sent.len(), 1);

    let state = lsp.state();
    assert_eq!(state.reports.len(), 1);
    assert_eq!(state.reports[0].level(), ReportLevel::Normal);
    assert!(state.reports[0].message.ends_with("last_reason=FAILURE_REASON_ERROR"));
}

#[tokio::test]
async fn test_failed_report_leaves_outcome_unchanged() {
    let (client, lsp, node) = setup();
    lsp.state().fail_report = true;
    node.state().send_plan.push_back(SendBehavior::FailUnrecorded);

    let outcome = client.query_route_payment("lnbcrt1m1invoice", 10, 0).await.unwrap();
    assert_eq!(outcome.status, PaymentStatus::Failed);
    assert_eq!(outcome.failure_reason, PaymentFailureReason::Error);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.excluded_pairs, 0);
    assert_eq!(lsp.state().reports.len(), 1);
}

#[tokio::test]
async fn test_zero_amount_invoice_overflowing_amount() {
    let (client, lsp, node) = setup();
    node.state().pay_req = Some(PayReq {
        num_msat: 0,
        num_satoshis: 0,
        ..pay_req()
    });

    let err = client
        .query_route_payment("lnbcrt1invoice", 10, i64::MAX / 10)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), lspc_client::ErrorKind::InvalidInput);
    assert!(lsp.state().route_queries.is_empty());
}

// =========================================================================
// No route
// =========================================================================

#[tokio::test]
async fn test_no_route_from_lsp() {
    let (client, lsp, node) = setup();
    lsp.state().default_route = None;

    let outcome = client.query_route_payment("lnbcrt1m1invoice", 10, 0).await.unwrap();
    assert_eq!(outcome.status, PaymentStatus::Failed);
    assert_eq!(outcome.failure_reason, PaymentFailureReason::NoRoute);
    assert_eq!(outcome.attempts, 0);
    assert!(node.state().sent.is_empty());

    let state = lsp.state();
    assert_eq!(state.reports.len(), 1);
    assert_eq!(state.reports[0].level(), ReportLevel::Notify);
    // the payee is hashed before it leaves the device
    assert!(!state.reports[0].message.contains(&payee()));
    assert!(state.reports[0].message.contains("FAILURE_REASON_NO_ROUTE"));
}

#[tokio::test]
async fn test_fee_limit_counts_as_no_route() {
    let (client, _lsp, node) = setup();
    let outcome = client.query_route_payment("lnbcrt1m1invoice", 1, 0).await.unwrap();
    assert_eq!(outcome.failure_reason, PaymentFailureReason::NoRoute);
    assert!(node.state().sent.is_empty());
}

// =========================================================================
// Invoice checks
// =========================================================================

#[tokio::test]
async fn test_expired_invoice_rejected() {
    let (client, lsp, node) = setup();
    node.state().pay_req = Some(PayReq {
        timestamp: chrono::Utc::now().timestamp() - 7_200,
        ..pay_req()
    });

    let err = client
        .query_route_payment("lnbcrt1m1invoice", 10, 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), lspc_client::ErrorKind::InvalidInput);
    assert!(lsp.state().route_queries.is_empty());
}

#[tokio::test]
async fn test_zero_amount_invoice_uses_requested_amount() {
    let (client, lsp, node) = setup();
    node.state().pay_req = Some(PayReq {
        num_msat: 0,
        num_satoshis: 0,
        ..pay_req()
    });

    let outcome = client
        .query_route_payment("lnbcrt1invoice", 10, AMOUNT_MSAT / 1000)
        .await
        .unwrap();
    assert!(outcome.is_success());
    assert_eq!(lsp.state().route_queries[0].amount, AMOUNT_MSAT / 1000);

    let state = node.state();
    let mpp = state.sent[0].1.hops()[1].mpp_record.clone().unwrap();
    assert_eq!(mpp.total_amt_msat, AMOUNT_MSAT);
}
