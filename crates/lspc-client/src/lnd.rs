//! [`LnNode`] over LND's REST gateway.
//!
//! LND encodes 64-bit integers as JSON strings and bytes as base64; the
//! `de_num` / `de_b64` helpers accept either form. The watch-script and
//! invoice `only_create` / `is_nompp` fields belong to the wallet's LND
//! build and are ignored by upstream LND.

use std::fmt::Display;
use std::str::FromStr;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{json, Value};

use lspc_core::{
    AddedInvoice, Channel, CoreError, Hop, HopHint, HtlcAttempt, HtlcFailure, InvoiceMode,
    InvoiceRequest, LndConfig, LnNode, MppRecord, NodeInfo, PayReq, Payment,
    PaymentFailureReason, PaymentStatus, Route, SendResponse,
};

/// Invoice lifetime, seconds.
const INVOICE_EXPIRY_SECS: i64 = 3600;

pub struct LndRestNode {
    base: String,
    http: reqwest::Client,
}

impl LndRestNode {
    pub fn new(config: &LndConfig) -> Result<Self, CoreError> {
        let mut headers = HeaderMap::new();
        if let Some(path) = &config.macaroon_path {
            let macaroon = std::fs::read(path)
                .map_err(|e| CoreError::Configuration(format!("read {}: {e}", path.display())))?;
            let value = HeaderValue::from_str(&hex::encode(macaroon))
                .map_err(|e| CoreError::Configuration(format!("macaroon header: {e}")))?;
            headers.insert("Grpc-Metadata-macaroon", value);
        }

        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.call_timeout())
            .default_headers(headers);
        if let Some(path) = &config.cert_path {
            let pem = std::fs::read(path)
                .map_err(|e| CoreError::Configuration(format!("read {}: {e}", path.display())))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| CoreError::Configuration(format!("LND certificate: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }
        let http = builder
            .build()
            .map_err(|e| CoreError::Configuration(format!("LND client: {e}")))?;

        Ok(Self {
            base: config.rest_address.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CoreError> {
        tracing::trace!(path, "LND GET");
        let resp = self
            .http
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .map_err(|e| CoreError::Transport(format!("LND {path}: {e}")))?;
        decode(path, resp).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, CoreError> {
        tracing::trace!(path, "LND POST");
        let resp = self
            .http
            .post(format!("{}{path}", self.base))
            .json(body)
            .send()
            .await
            .map_err(|e| CoreError::Transport(format!("LND {path}: {e}")))?;
        decode(path, resp).await
    }
}

async fn decode<T: DeserializeOwned>(path: &str, resp: reqwest::Response) -> Result<T, CoreError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(CoreError::Node(format!("LND {path}: HTTP {status}: {body}")));
    }
    resp.json::<T>()
        .await
        .map_err(|e| CoreError::Node(format!("LND {path}: bad response: {e}")))
}

fn de_num<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
    T::Err: Display,
{
    match Value::deserialize(d)? {
        Value::Null => Ok(T::default()),
        Value::String(s) if s.is_empty() => Ok(T::default()),
        Value::String(s) => s.parse().map_err(de::Error::custom),
        Value::Number(n) => n.to_string().parse().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected number, got {other}"))),
    }
}

fn de_b64<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
    let s = Option::<String>::deserialize(d)?.unwrap_or_default();
    STANDARD.decode(s).map_err(de::Error::custom)
}

fn b64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RestChain {
    #[serde(default)]
    network: String,
}

#[derive(Deserialize)]
struct RestInfo {
    identity_pubkey: String,
    #[serde(default, deserialize_with = "de_num")]
    block_height: u32,
    #[serde(default)]
    block_hash: String,
    #[serde(default)]
    chains: Vec<RestChain>,
}

#[derive(Deserialize, Default)]
struct RestConstraints {
    #[serde(default, deserialize_with = "de_num")]
    chan_reserve_sat: u64,
}

#[derive(Deserialize)]
struct RestChannel {
    #[serde(default, deserialize_with = "de_num")]
    chan_id: u64,
    #[serde(default, deserialize_with = "de_num")]
    remote_chan_id: u64,
    #[serde(default, deserialize_with = "de_num")]
    peer_scid_alias: u64,
    #[serde(default)]
    remote_pubkey: String,
    #[serde(default)]
    channel_point: String,
    #[serde(default, deserialize_with = "de_num")]
    capacity: i64,
    #[serde(default, deserialize_with = "de_num")]
    local_balance: i64,
    #[serde(default, deserialize_with = "de_num")]
    remote_balance: i64,
    #[serde(default, deserialize_with = "de_num")]
    commit_fee: i64,
    #[serde(default)]
    local_constraints: RestConstraints,
    #[serde(default)]
    remote_constraints: RestConstraints,
}

impl From<RestChannel> for Channel {
    fn from(c: RestChannel) -> Self {
        let remote_chan_id = if c.remote_chan_id != 0 {
            c.remote_chan_id
        } else {
            c.peer_scid_alias
        };
        Self {
            chan_id: c.chan_id,
            remote_chan_id,
            remote_pubkey: c.remote_pubkey,
            channel_point: c.channel_point,
            capacity: c.capacity,
            local_balance: c.local_balance,
            remote_balance: c.remote_balance,
            commit_fee: c.commit_fee,
            local_chan_reserve_sat: c.local_constraints.chan_reserve_sat,
            remote_chan_reserve_sat: c.remote_constraints.chan_reserve_sat,
        }
    }
}

#[derive(Deserialize)]
struct RestChannels {
    #[serde(default)]
    channels: Vec<RestChannel>,
}

#[derive(Deserialize)]
struct RestMpp {
    #[serde(default, deserialize_with = "de_b64")]
    payment_addr: Vec<u8>,
    #[serde(default, deserialize_with = "de_num")]
    total_amt_msat: i64,
}

#[derive(Deserialize)]
struct RestHop {
    #[serde(default, deserialize_with = "de_num")]
    chan_id: u64,
    #[serde(default, deserialize_with = "de_num")]
    expiry: u32,
    #[serde(default, deserialize_with = "de_num")]
    amt_to_forward_msat: i64,
    #[serde(default, deserialize_with = "de_num")]
    fee_msat: i64,
    #[serde(default)]
    pub_key: String,
    #[serde(default)]
    tlv_payload: bool,
    #[serde(default)]
    mpp_record: Option<RestMpp>,
}

#[derive(Deserialize, Default)]
struct RestRoute {
    #[serde(default, deserialize_with = "de_num")]
    total_time_lock: u32,
    #[serde(default, deserialize_with = "de_num")]
    total_fees_msat: i64,
    #[serde(default, deserialize_with = "de_num")]
    total_amt_msat: i64,
    #[serde(default)]
    hops: Vec<RestHop>,
}

impl From<RestRoute> for Route {
    fn from(r: RestRoute) -> Self {
        let hops = r
            .hops
            .into_iter()
            .map(|h| Hop {
                chan_id: h.chan_id,
                amt_to_forward_msat: h.amt_to_forward_msat,
                fee_msat: h.fee_msat,
                expiry: h.expiry,
                pub_key: h.pub_key,
                tlv_payload: h.tlv_payload,
                mpp_record: h.mpp_record.map(|m| MppRecord {
                    payment_addr: m.payment_addr,
                    total_amt_msat: m.total_amt_msat,
                }),
            })
            .collect();
        Route::new(hops, r.total_time_lock, r.total_fees_msat, r.total_amt_msat)
    }
}

fn route_json(route: &Route) -> Value {
    let hops: Vec<Value> = route
        .hops()
        .iter()
        .map(|h| {
            let mut hop = json!({
                "chan_id": h.chan_id.to_string(),
                "expiry": h.expiry,
                "amt_to_forward_msat": h.amt_to_forward_msat.to_string(),
                "fee_msat": h.fee_msat.to_string(),
                "pub_key": h.pub_key,
                "tlv_payload": h.tlv_payload,
            });
            if let Some(mpp) = &h.mpp_record {
                hop["mpp_record"] = json!({
                    "payment_addr": b64(&mpp.payment_addr),
                    "total_amt_msat": mpp.total_amt_msat.to_string(),
                });
            }
            hop
        })
        .collect();
    json!({
        "total_time_lock": route.total_time_lock(),
        "total_fees_msat": route.total_fees_msat().to_string(),
        "total_amt_msat": route.total_amt_msat().to_string(),
        "hops": hops,
    })
}

#[derive(Deserialize)]
struct RestFailure {
    #[serde(default)]
    code: String,
    #[serde(default, deserialize_with = "de_num")]
    failure_source_index: u32,
}

#[derive(Deserialize)]
struct RestHtlc {
    #[serde(default)]
    route: RestRoute,
    #[serde(default)]
    failure: Option<RestFailure>,
}

#[derive(Deserialize)]
struct RestPayment {
    #[serde(default)]
    payment_hash: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    failure_reason: String,
    #[serde(default)]
    htlcs: Vec<RestHtlc>,
}

fn payment_status(name: &str) -> PaymentStatus {
    match name {
        "IN_FLIGHT" => PaymentStatus::InFlight,
        "SUCCEEDED" => PaymentStatus::Succeeded,
        "FAILED" => PaymentStatus::Failed,
        _ => PaymentStatus::Unknown,
    }
}

impl From<RestPayment> for Payment {
    fn from(p: RestPayment) -> Self {
        Self {
            status: payment_status(&p.status),
            failure_reason: PaymentFailureReason::from_name(&p.failure_reason),
            payment_hash: p.payment_hash,
            htlcs: p
                .htlcs
                .into_iter()
                .map(|h| HtlcAttempt {
                    route: h.route.into(),
                    failure: h.failure.map(|f| HtlcFailure {
                        code: f.code,
                        failure_source_index: f.failure_source_index,
                    }),
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct RestPayments {
    #[serde(default)]
    payments: Vec<RestPayment>,
}

#[derive(Deserialize)]
struct RestAddInvoice {
    #[serde(default, deserialize_with = "de_b64")]
    r_hash: Vec<u8>,
    #[serde(default)]
    payment_request: String,
    #[serde(default, deserialize_with = "de_b64")]
    payment_addr: Vec<u8>,
}

impl From<RestAddInvoice> for AddedInvoice {
    fn from(r: RestAddInvoice) -> Self {
        Self {
            payment_request: r.payment_request,
            r_hash: r.r_hash,
            payment_addr: r.payment_addr,
        }
    }
}

#[derive(Deserialize)]
struct RestPayReq {
    #[serde(default)]
    destination: String,
    #[serde(default)]
    payment_hash: String,
    #[serde(default, deserialize_with = "de_num")]
    num_satoshis: i64,
    #[serde(default, deserialize_with = "de_num")]
    num_msat: i64,
    #[serde(default, deserialize_with = "de_num")]
    timestamp: i64,
    #[serde(default, deserialize_with = "de_num")]
    expiry: i64,
    #[serde(default, deserialize_with = "de_b64")]
    payment_addr: Vec<u8>,
}

#[derive(Deserialize)]
struct RestImportScript {
    #[serde(default)]
    address: String,
}

#[derive(Deserialize)]
struct RestPublish {
    #[serde(default)]
    publish_error: String,
}

#[derive(Deserialize)]
struct RestRoutes {
    #[serde(default)]
    routes: Vec<RestRoute>,
}

#[derive(Deserialize)]
struct RestSendResponse {
    #[serde(default)]
    payment_error: String,
    #[serde(default, deserialize_with = "de_b64")]
    payment_preimage: Vec<u8>,
    #[serde(default, deserialize_with = "de_b64")]
    payment_hash: Vec<u8>,
}

fn hop_hint_json(hint: &HopHint) -> Value {
    json!({
        "node_id": hint.node_id,
        "chan_id": hint.chan_id.to_string(),
        "fee_base_msat": hint.fee_base_msat,
        "fee_proportional_millionths": hint.fee_proportional_millionths,
        "cltv_expiry_delta": hint.cltv_expiry_delta,
    })
}

#[async_trait]
impl LnNode for LndRestNode {
    async fn get_info(&self) -> Result<NodeInfo, CoreError> {
        let info: RestInfo = self.get("/v1/getinfo").await?;
        let network = info
            .chains
            .first()
            .map(|c| c.network.clone())
            .ok_or_else(|| CoreError::Node("getinfo reports no chain".into()))?;
        Ok(NodeInfo {
            identity_pubkey: info.identity_pubkey,
            block_height: info.block_height,
            block_hash: info.block_hash,
            network,
        })
    }

    async fn list_channels(&self) -> Result<Vec<Channel>, CoreError> {
        let resp: RestChannels = self.get("/v1/channels?active_only=true").await?;
        Ok(resp.channels.into_iter().map(Channel::from).collect())
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, CoreError> {
        let resp: RestPayments = self
            .get("/v1/payments?include_incomplete=true&reversed=true")
            .await?;
        Ok(resp.payments.into_iter().map(Payment::from).collect())
    }

    async fn add_invoice(&self, req: InvoiceRequest) -> Result<AddedInvoice, CoreError> {
        let mut body = json!({
            "memo": req.memo,
            "expiry": INVOICE_EXPIRY_SECS.to_string(),
            "r_preimage": b64(&req.preimage),
            "value": req.amount_sat.to_string(),
            "only_create": req.mode == InvoiceMode::CreateOnly,
            "is_nompp": true,
        });
        if let Some(hint) = &req.route_hint {
            body["route_hints"] = json!([{ "hop_hints": [hop_hint_json(hint)] }]);
        }
        if let Some(addr) = &req.payment_addr {
            body["payment_addr"] = Value::String(b64(addr));
        }
        let resp: RestAddInvoice = self.post("/v1/invoices", &body).await?;
        Ok(resp.into())
    }

    async fn add_invoice_simple(&self, amount_msat: i64, memo: &str) -> Result<AddedInvoice, CoreError> {
        let body = json!({
            "memo": memo,
            "expiry": INVOICE_EXPIRY_SECS.to_string(),
            "value_msat": amount_msat.to_string(),
        });
        let resp: RestAddInvoice = self.post("/v1/invoices", &body).await?;
        Ok(resp.into())
    }

    async fn decode_pay_req(&self, invoice: &str) -> Result<PayReq, CoreError> {
        let r: RestPayReq = self.get(&format!("/v1/payreq/{invoice}")).await?;
        Ok(PayReq {
            destination: r.destination,
            payment_hash: r.payment_hash,
            num_msat: r.num_msat,
            num_satoshis: r.num_satoshis,
            timestamp: r.timestamp,
            expiry: r.expiry,
            payment_addr: r.payment_addr,
        })
    }

    async fn add_watch_script(
        &self,
        script: &[u8],
        block_hash: &str,
        block_height: u32,
    ) -> Result<String, CoreError> {
        let body = json!({
            "script": b64(script),
            "block_hash_str": block_hash,
            "block_height": block_height,
        });
        let resp: RestImportScript = self.post("/v2/wallet/script/import/witness", &body).await?;
        Ok(resp.address)
    }

    async fn publish_transaction(&self, raw_tx: &[u8], label: &str) -> Result<(), CoreError> {
        let body = json!({ "tx_hex": b64(raw_tx), "label": label });
        let resp: RestPublish = self.post("/v2/wallet/tx", &body).await?;
        if !resp.publish_error.is_empty() {
            return Err(CoreError::Node(format!("publish: {}", resp.publish_error)));
        }
        Ok(())
    }

    async fn query_routes(
        &self,
        pubkey: &str,
        amount_msat: i64,
        fee_limit_msat: i64,
    ) -> Result<Vec<Route>, CoreError> {
        let path = format!(
            "/v1/graph/routes/{pubkey}/{}?fee_limit.fixed_msat={fee_limit_msat}",
            amount_msat / 1000
        );
        let resp: RestRoutes = self.get(&path).await?;
        Ok(resp.routes.into_iter().map(Route::from).collect())
    }

    async fn send_to_route_sync(
        &self,
        payment_hash: &[u8],
        route: &Route,
    ) -> Result<SendResponse, CoreError> {
        let body = json!({
            "payment_hash": b64(payment_hash),
            "route": route_json(route),
        });
        let resp: RestSendResponse = self.post("/v1/channels/transactions/route", &body).await?;
        Ok(SendResponse {
            payment_error: resp.payment_error,
            payment_preimage: resp.payment_preimage,
            payment_hash: resp.payment_hash,
        })
    }

    async fn close_channel(
        &self,
        funding_txid: &str,
        output_index: u32,
        sat_per_vbyte: u64,
    ) -> Result<(), CoreError> {
        let path = format!("/v1/channels/{funding_txid}/{output_index}?sat_per_vbyte={sat_per_vbyte}");
        tracing::trace!(path = %path, "LND DELETE");
        let resp = self
            .http
            .delete(format!("{}{path}", self.base))
            .send()
            .await
            .map_err(|e| CoreError::Transport(format!("LND {path}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CoreError::Node(format!("close {funding_txid}:{output_index}: HTTP {status}: {body}")));
        }
        // the body streams close updates; the close is started once accepted
        Ok(())
    }
}
