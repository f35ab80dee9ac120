use std::collections::VecDeque;

use async_trait::async_trait;
use bitcoin::{Address, Network};
use parking_lot::{Mutex, MutexGuard};
use prost::Message;

use lspc_core::proto::lnrpc::{self, QueryRoutesResponse};
use lspc_core::proto::lspd::{
    ChannelInformationReply, ChannelInformationRequest, Encrypted, IntegrityNonceReply,
    IntegrityNonceRequest, IntegrityResult, IntegrityVerifyReply, IntegrityVerifyRequest,
    OpenChannelReply, OpenChannelRequest, PaymentInformation, PingReply, PingRequest,
    QueryRoutesRequest, ReceiveSubmarineReply, ReceiveSubmarineRequest, RegisterPaymentReply,
    RegisterPaymentRequest, RegisterSubmarineReply, RegisterSubmarineRequest,
    RegisterUserInfoReply, RegisterUserInfoRequest, ReportReply, ReportRequest,
};
use lspc_core::{CoreError, LspTransport};
use lspc_crypto::{decrypt, encrypt, parse_public_key, KeyPair};
use lspc_swap::submarine_script;

/// Everything the fake LSP was asked, plus knobs for misbehaving.
#[derive(Default)]
pub struct LspState {
    pub handshakes: usize,
    pub pings: usize,
    pub fail_ping: bool,
    pub fail_report: bool,
    /// Answer swap registrations with a key other than the one in the address.
    pub tamper_htlc_key: bool,
    /// Routes for successive route queries; `default_route` once drained.
    pub route_replies: VecDeque<Vec<lnrpc::Route>>,
    pub default_route: Option<lnrpc::Route>,
    pub route_queries: Vec<QueryRoutesRequest>,
    pub reports: Vec<ReportRequest>,
    pub payments: Vec<PaymentInformation>,
    pub swaps: Vec<RegisterSubmarineRequest>,
    pub swap_receives: Vec<ReceiveSubmarineRequest>,
    pub user_infos: Vec<RegisterUserInfoRequest>,
    pub open_requests: Vec<OpenChannelRequest>,
    pub integrity_ids: Vec<String>,
}

pub struct FakeLsp {
    key: KeyPair,
    node_key: KeyPair,
    htlc_key: KeyPair,
    network: Network,
    csv_height: u32,
    state: Mutex<LspState>,
}

impl Default for FakeLsp {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLsp {
    pub fn new() -> Self {
        Self {
            key: KeyPair::generate(),
            node_key: KeyPair::generate(),
            htlc_key: KeyPair::generate(),
            network: Network::Regtest,
            csv_height: 144,
            state: Mutex::new(LspState::default()),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, LspState> {
        self.state.lock()
    }

    /// Hex id of the LSP's Lightning node.
    pub fn node_pubkey(&self) -> String {
        hex::encode(self.node_key.public_bytes())
    }

    pub fn htlc_pubkey(&self) -> Vec<u8> {
        self.htlc_key.public_bytes().to_vec()
    }

    pub fn channel_information_reply(&self) -> ChannelInformationReply {
        ChannelInformationReply {
            name: "fake-lsp".into(),
            pubkey: self.node_pubkey(),
            host: "127.0.0.1:9735".into(),
            channel_capacity: 1_000_000,
            target_conf: 6,
            base_fee_msat: 1_000,
            fee_rate: 0.000_001,
            time_lock_delta: 40,
            channel_fee_permyriad: 40,
            lsp_pubkey: self.key.public_bytes().to_vec(),
            max_inactive_duration: 3_600,
            channel_minimum_fee_msat: 2_000_000,
            version: "v2".into(),
        }
    }

    fn open<M: Message + Default>(&self, data: &[u8]) -> Result<M, CoreError> {
        let plaintext = decrypt(self.key.secret_key(), data)
            .map_err(|e| CoreError::Transport(format!("fake lsp cannot open request: {e}")))?;
        Ok(M::decode(plaintext.as_slice())?)
    }

    fn seal_to<M: Message>(&self, pubkey: &[u8], msg: &M) -> Result<Encrypted, CoreError> {
        let key = parse_public_key(pubkey)
            .map_err(|e| CoreError::Transport(format!("bad reply key: {e}")))?;
        let data = encrypt(&key, &msg.encode_to_vec())
            .map_err(|e| CoreError::Transport(format!("fake lsp cannot seal reply: {e}")))?;
        Ok(Encrypted { data })
    }

    fn swap_address(&self, req: &RegisterSubmarineRequest) -> Result<String, CoreError> {
        let hash: [u8; 32] = req
            .payment_hash
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::InvalidInput("payment hash".into()))?;
        let refund = parse_public_key(&req.repay_pubkey)
            .map_err(|e| CoreError::InvalidInput(e.to_string()))?;
        let script = submarine_script(&hash, &self.htlc_key.public_key(), &refund, self.csv_height)
            .map_err(|e| CoreError::InvalidInput(e.to_string()))?;
        Ok(Address::p2wsh(&script, self.network).to_string())
    }
}

/// LSP-side route from the LSP node to `payee`: a single hop.
pub fn lsp_route(payee: &str, amount_msat: i64) -> lnrpc::Route {
    lnrpc::Route {
        total_time_lock: 800_040,
        hops: vec![lnrpc::Hop {
            chan_id: 900,
            expiry: 800_000,
            pub_key: payee.to_string(),
            tlv_payload: true,
            mpp_record: None,
            amt_to_forward_msat: amount_msat,
            fee_msat: 0,
        }],
        total_fees_msat: 0,
        total_amt_msat: amount_msat,
    }
}

#[async_trait]
impl LspTransport for FakeLsp {
    async fn channel_information(
        &self,
        _req: ChannelInformationRequest,
    ) -> Result<ChannelInformationReply, CoreError> {
        self.state.lock().handshakes += 1;
        Ok(self.channel_information_reply())
    }

    async fn ping(&self, req: PingRequest) -> Result<PingReply, CoreError> {
        let mut state = self.state.lock();
        state.pings += 1;
        if state.fail_ping {
            return Err(CoreError::Transport("connection refused".into()));
        }
        Ok(PingReply { nonce: req.nonce })
    }

    async fn register_payment(
        &self,
        req: RegisterPaymentRequest,
    ) -> Result<RegisterPaymentReply, CoreError> {
        let info: PaymentInformation = self.open(&req.blob)?;
        self.state.lock().payments.push(info);
        Ok(RegisterPaymentReply {})
    }

    async fn register_submarine(&self, req: Encrypted) -> Result<Encrypted, CoreError> {
        let req: RegisterSubmarineRequest = self.open(&req.data)?;
        let script_address = self.swap_address(&req)?;
        let htlc_pubkey = if self.state.lock().tamper_htlc_key {
            KeyPair::generate().public_bytes().to_vec()
        } else {
            self.htlc_pubkey()
        };
        let reply = RegisterSubmarineReply {
            htlc_pubkey,
            script_address,
        };
        let sealed = self.seal_to(&req.encrypt_pubkey, &reply)?;
        self.state.lock().swaps.push(req);
        Ok(sealed)
    }

    async fn receive_submarine(&self, req: Encrypted) -> Result<ReceiveSubmarineReply, CoreError> {
        let req: ReceiveSubmarineRequest = self.open(&req.data)?;
        self.state.lock().swap_receives.push(req);
        Ok(ReceiveSubmarineReply {})
    }

    async fn query_routes(&self, req: Encrypted) -> Result<Encrypted, CoreError> {
        let req: QueryRoutesRequest = self.open(&req.data)?;
        let routes = {
            let mut state = self.state.lock();
            let routes = match state.route_replies.pop_front() {
                Some(routes) => routes,
                None => state.default_route.clone().into_iter().collect(),
            };
            state.route_queries.push(req.clone());
            routes
        };
        let reply = QueryRoutesResponse {
            routes,
            success_prob: 0.5,
        };
        self.seal_to(&req.encrypt_pubkey, &reply)
    }

    async fn register_user_info(&self, req: Encrypted) -> Result<RegisterUserInfoReply, CoreError> {
        let req: RegisterUserInfoRequest = self.open(&req.data)?;
        self.state.lock().user_infos.push(req);
        Ok(RegisterUserInfoReply {})
    }

    async fn report_message(&self, req: Encrypted) -> Result<ReportReply, CoreError> {
        let req: ReportRequest = self.open(&req.data)?;
        let mut state = self.state.lock();
        state.reports.push(req);
        if state.fail_report {
            return Err(CoreError::Transport("report service unavailable".into()));
        }
        Ok(ReportReply {})
    }

    async fn open_channel(&self, req: OpenChannelRequest) -> Result<OpenChannelReply, CoreError> {
        self.state.lock().open_requests.push(req);
        Ok(OpenChannelReply {})
    }

    async fn integrity_nonce(&self, req: Encrypted) -> Result<Encrypted, CoreError> {
        let req: IntegrityNonceRequest = self.open(&req.data)?;
        self.state.lock().integrity_ids.push(req.id.clone());
        let reply = IntegrityNonceReply {
            nonce: format!("nonce-{}", req.id),
        };
        self.seal_to(&req.encrypt_pubkey, &reply)
    }

    async fn integrity_verify(&self, req: Encrypted) -> Result<IntegrityVerifyReply, CoreError> {
        let req: IntegrityVerifyRequest = self.open(&req.data)?;
        let result = if req.token == format!("signed-nonce-{}", req.id) {
            IntegrityResult::Ok
        } else {
            IntegrityResult::Ng
        };
        Ok(IntegrityVerifyReply {
            result: result as i32,
        })
    }
}
