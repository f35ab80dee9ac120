use lspc_core::fees::hop_fee_msat;
use lspc_core::proto::lnrpc::QueryRoutesResponse;
use lspc_core::proto::lspd::QueryRoutesRequest;
use lspc_core::{
    Channel, ChannelInformation, LnNode, LspTransport, MppRecord, NodePair, Route, MSAT_PER_SAT,
};
use lspc_crypto::{ReplyKey, SecureChannel};

use crate::error::RoutingError;

/// One route request: what to pay and which edges to avoid.
#[derive(Debug, Clone)]
pub struct RouteQuery<'a> {
    pub invoice: &'a str,
    /// Payment address of the invoice; empty when it has none.
    pub payment_addr: &'a [u8],
    /// Invoice amount, carried in the MPP record.
    pub total_amt_msat: i64,
    pub fee_limit_sat: i64,
    pub amount_sat: i64,
    pub ignored_pairs: &'a [NodePair],
}

/// Builds a payable route: LSP route to the payee plus our hop to the LSP.
pub struct RouteBuilder<'a> {
    transport: &'a dyn LspTransport,
    node: &'a dyn LnNode,
    info: &'a ChannelInformation,
}

impl<'a> RouteBuilder<'a> {
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

    pub async fn build(&self, query: &RouteQuery<'_>) -> Result<Route, RoutingError> {
        let mut route = self.request_lsp_route(query).await?;

        if !query.payment_addr.is_empty() {
            route.attach_mpp(MppRecord {
                payment_addr: query.payment_addr.to_vec(),
                total_amt_msat: query.total_amt_msat,
            });
        }

        let channels = self.node.list_channels().await?;
        let chan_id = splice_local_hop(self.info, &mut route, &channels, query.fee_limit_sat)?;
        tracing::debug!(
            chan_id,
            total_amt_msat = route.total_amt_msat(),
            total_fees_msat = route.total_fees_msat(),
            total_time_lock = route.total_time_lock(),
            "route built"
        );
        trace_route(&route);
        Ok(route)
    }

    /// Ask the LSP for a route from its node to the payee.
    async fn request_lsp_route(&self, query: &RouteQuery<'_>) -> Result<Route, RoutingError> {
        let channel = SecureChannel::new(&self.info.lsp_pubkey)?;
        let reply_key = ReplyKey::generate();
        let req = QueryRoutesRequest {
            encrypt_pubkey: reply_key.public_bytes(),
            invoice: query.invoice.to_string(),
            ignored_pairs: query.ignored_pairs.iter().map(Into::into).collect(),
            amount: query.amount_sat,
        };

        let reply = self.transport.query_routes(channel.seal(&req)?).await?;
        let resp: QueryRoutesResponse = reply_key.open(&reply)?;
        tracing::debug!(
            routes = resp.routes.len(),
            ignored = query.ignored_pairs.len(),
            "LSP answered route query"
        );

        let route = resp
            .routes
            .into_iter()
            .next()
            .map(Route::from)
            .ok_or_else(|| RoutingError::NoRoute("LSP returned no route".into()))?;
        if route.is_empty() {
            return Err(RoutingError::NoRoute("LSP route has no hops".into()));
        }
        Ok(route)
    }
}

/// Prepend the `self -> LSP` hop over the first channel that can carry it.
///
/// The LSP's hop fee is charged on the route's total amount; the resulting
/// total fee must stay under `fee_limit_sat`. Returns the chosen channel id.
pub fn splice_local_hop(
    info: &ChannelInformation,
    route: &mut Route,
    channels: &[Channel],
    fee_limit_sat: i64,
) -> Result<u64, RoutingError> {
    let hub_fee_msat = hop_fee_msat(info, route.total_amt_msat());
    let amount_sat = (route.total_amt_msat() + hub_fee_msat) / MSAT_PER_SAT;
    let fee_sat = (route.total_fees_msat() + hub_fee_msat) / MSAT_PER_SAT;
    tracing::trace!(amount_sat, fee_sat, fee_limit_sat, "selecting local channel");

    if fee_sat >= fee_limit_sat {
        return Err(RoutingError::FeeLimitExceeded {
            fee_sat,
            fee_limit_sat,
        });
    }
    let channel = channels
        .iter()
        .find(|ch| ch.chan_id != 0 && ch.local_balance >= amount_sat)
        .ok_or(RoutingError::NoLocalChannel { amount_sat })?;

    route.prepend_hop(
        channel.chan_id,
        info.node_pubkey.clone(),
        hub_fee_msat,
        info.time_lock_delta,
    )?;
    Ok(channel.chan_id)
}

fn trace_route(route: &Route) {
    for (idx, hop) in route.hops().iter().enumerate() {
        tracing::trace!(
            idx,
            chan_id = hop.chan_id,
            amt_to_forward_msat = hop.amt_to_forward_msat,
            fee_msat = hop.fee_msat,
            expiry = hop.expiry,
            pub_key = %hop.pub_key,
            mpp = hop.mpp_record.is_some(),
            "hop"
        );
    }
}
