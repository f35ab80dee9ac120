use bitcoin::hashes::{sha256, Hash};
use lspc_core::proto::lspd::ReportLevel;
use lspc_core::{
    ChannelInformation, CoreError, LnNode, LspTransport, NodePair, PayReq, Payment,
    PaymentFailureReason, PaymentStatus, Route, MSAT_PER_SAT,
};

use crate::builder::{RouteBuilder, RouteQuery};
use crate::error::RoutingError;
use crate::report::report_message;

/// Upper bound on route-and-send rounds for one payment.
pub const MAX_ROUTE_ATTEMPTS: usize = 10;

/// Report category of failed route-and-pay sequences.
pub const REPORT_CATEGORY: &str = "QueryRoutes";

/// Final state of a route-and-pay sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    /// Hex payment hash of the invoice.
    pub payment_hash: String,
    pub status: PaymentStatus,
    pub failure_reason: PaymentFailureReason,
    /// Edges excluded by the time the sequence ended.
    pub excluded_pairs: usize,
    /// Routes sent to the node.
    pub attempts: usize,
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        self.status == PaymentStatus::Succeeded
    }
}

/// What came of sending one route.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SendOutcome {
    Succeeded,
    Failed {
        reason: PaymentFailureReason,
        edge: Option<NodePair>,
    },
}

/// Pays an invoice over LSP-supplied routes, excluding failing edges.
pub struct PaymentDispatcher<'a> {
    transport: &'a dyn LspTransport,
    node: &'a dyn LnNode,
    info: &'a ChannelInformation,
}

impl<'a> PaymentDispatcher<'a> {
    pub fn new(
        transport: &'a dyn LspTransport,
        node: &'a dyn LnNode,
        info: &'a ChannelInformation,
    ) -> Self {
        Self {
            transport,
            node,
            info,
        }
    }

    /// Route and pay `invoice`.
    ///
    /// `amount_sat` is used for zero-amount invoices. A non-success outcome is
    /// `Ok`; `Err` means the invoice could not be used or the node's payment
    /// API failed.
    pub async fn pay(
        &self,
        invoice: &str,
        fee_limit_sat: i64,
        amount_sat: i64,
    ) -> Result<PaymentOutcome, RoutingError> {
        let mut pay_req = self.node.decode_pay_req(invoice).await?;
        let expires_at = pay_req.timestamp + pay_req.expiry;
        if expires_at < chrono::Utc::now().timestamp() {
            return Err(RoutingError::InvoiceExpired {
                expired_at: expires_at,
            });
        }
        if pay_req.num_msat == 0 {
            tracing::debug!(amount_sat, "zero-amount invoice, using requested amount");
            pay_req.num_msat = amount_sat.checked_mul(MSAT_PER_SAT).ok_or_else(|| {
                CoreError::InvalidInput(format!("amount {amount_sat} sat overflows msat"))
            })?;
        }
        let payment_hash = hex::decode(&pay_req.payment_hash)
            .map_err(|e| CoreError::InvalidInput(format!("payment hash is not hex: {e}")))?;

        let builder = RouteBuilder::new(self.transport, self.node, self.info);
        let mut excluded: Vec<NodePair> = Vec::new();
        let mut reason = PaymentFailureReason::Error;
        let mut level = ReportLevel::Normal;
        let mut attempts = 0;

        for round in 0..MAX_ROUTE_ATTEMPTS {
            let query = RouteQuery {
                invoice,
                payment_addr: &pay_req.payment_addr,
                total_amt_msat: pay_req.num_msat,
                fee_limit_sat,
                amount_sat,
                ignored_pairs: &excluded,
            };
            let route = match builder.build(&query).await {
                Ok(route) => route,
                Err(e) => {
                    tracing::debug!(round, error = %e, "no route");
                    reason = PaymentFailureReason::NoRoute;
                    level = ReportLevel::Notify;
                    break;
                }
            };

            attempts += 1;
            let sent = match self.send_route(&payment_hash, &route).await {
                Ok(sent) => sent,
                Err(e) => {
                    tracing::error!(round, error = %e, "send to route failed");
                    self.report_failure(
                        &pay_req,
                        excluded.len(),
                        PaymentFailureReason::Error,
                        ReportLevel::Normal,
                    )
                    .await;
                    return Err(e);
                }
            };

            match sent {
                SendOutcome::Succeeded => {
                    tracing::info!(payment_hash = %pay_req.payment_hash, attempts, "payment succeeded");
                    return Ok(PaymentOutcome {
                        payment_hash: pay_req.payment_hash,
                        status: PaymentStatus::Succeeded,
                        failure_reason: PaymentFailureReason::None,
                        excluded_pairs: excluded.len(),
                        attempts,
                    });
                }
                SendOutcome::Failed { reason: r, edge: None } => {
                    tracing::debug!(round, reason = %r, "payment failed without attributable edge");
                    reason = r;
                    level = ReportLevel::Normal;
                    break;
                }
                SendOutcome::Failed { reason: r, edge: Some(pair) } => {
                    tracing::debug!(
                        round,
                        reason = %r,
                        from = %hex::encode(&pair.from),
                        to = %hex::encode(&pair.to),
                        "excluding failed edge"
                    );
                    reason = r;
                    level = ReportLevel::Notify;
                    excluded.push(pair);
                }
            }
        }

        self.report_failure(&pay_req, excluded.len(), reason, level).await;
        Ok(PaymentOutcome {
            payment_hash: pay_req.payment_hash,
            status: PaymentStatus::Failed,
            failure_reason: reason,
            excluded_pairs: excluded.len(),
            attempts,
        })
    }

    async fn send_route(&self, payment_hash: &[u8], route: &Route) -> Result<SendOutcome, RoutingError> {
        let resp = self.node.send_to_route_sync(payment_hash, route).await?;
        if resp.payment_error.is_empty() {
            return Ok(SendOutcome::Succeeded);
        }
        tracing::debug!(error = %resp.payment_error, "route payment failed");

        let hash_hex = hex::encode(payment_hash);
        let payments = self.node.list_payments().await?;
        let Some(payment) = payments.iter().find(|p| p.payment_hash == hash_hex) else {
            return Ok(SendOutcome::Failed {
                reason: PaymentFailureReason::Error,
                edge: None,
            });
        };
        if payment.failure_reason == PaymentFailureReason::None {
            // the node has no failure on record, likely paid before
            return Ok(SendOutcome::Failed {
                reason: PaymentFailureReason::Error,
                edge: None,
            });
        }
        Ok(SendOutcome::Failed {
            reason: payment.failure_reason,
            edge: failing_edge(payment),
        })
    }

    async fn report_failure(
        &self,
        pay_req: &PayReq,
        excluded: usize,
        reason: PaymentFailureReason,
        level: ReportLevel,
    ) {
        let destination = match hex::decode(&pay_req.destination) {
            Ok(bytes) => hex::encode(sha256::Hash::hash(&bytes).to_byte_array()),
            Err(e) => format!("(destination not hex: {e})"),
        };
        let message = format!(
            "FAIL: hashed_destination={destination}, errPairs={excluded}, last_reason={reason}"
        );
        if let Err(e) =
            report_message(self.transport, self.info, REPORT_CATEGORY, level, &message).await
        {
            tracing::warn!(error = %e, "failed to report payment failure");
        }
    }
}

/// Edge that failed the payment's single HTLC attempt.
///
/// The failure source index names the node that reported the failure; the
/// edge leading into it is `(hops[i-1], hops[i])`. Index 0 is ourselves and
/// indices at or past the route length are the payee or garbage, so neither
/// names an edge. Payments with other than one attempt are not attributed.
pub fn failing_edge(payment: &Payment) -> Option<NodePair> {
    let [attempt] = payment.htlcs.as_slice() else {
        return None;
    };
    let failure = attempt.failure.as_ref()?;
    let hops = attempt.route.hops();
    let to = failure.failure_source_index as usize;
    if to == 0 || to >= hops.len() {
        return None;
    }
    NodePair::from_hex(&hops[to - 1].pub_key, &hops[to].pub_key).ok()
}
