//! Client configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CoreError;

/// Full configuration of the LSP client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    /// LSP endpoint settings.
    #[serde(default)]
    pub lsp: LspConfig,

    /// Local LND node settings.
    #[serde(default)]
    pub lnd: LndConfig,

    /// Submarine swap parameters.
    #[serde(default)]
    pub swap: SwapConfig,

    /// Self-rebalance timings.
    #[serde(default)]
    pub rebalance: RebalanceConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LspConfig {
    /// gRPC endpoint, e.g. `https://lsp.example.com:9736`.
    #[serde(default = "default_lsp_address")]
    pub address: String,
    /// Bearer token sent with every call.
    #[serde(default)]
    pub token: String,
    /// PEM certificate to trust instead of the system roots.
    #[serde(default)]
    pub cert_path: Option<PathBuf>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LndConfig {
    /// REST endpoint of the node.
    #[serde(default = "default_lnd_address")]
    pub rest_address: String,
    /// TLS certificate of the node (PEM).
    #[serde(default)]
    pub cert_path: Option<PathBuf>,
    /// Admin macaroon file.
    #[serde(default)]
    pub macaroon_path: Option<PathBuf>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Relative timelock of the refund path, in blocks.
    #[serde(default = "default_csv_height")]
    pub csv_height: u32,
    /// Refund transaction fee rate, sat per kilo-weight.
    #[serde(default = "default_fee_rate_sat_per_kw")]
    pub fee_rate_sat_per_kw: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceConfig {
    /// Pause between the transfer signal and listing channels for close.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Pause between close attempts of one channel.
    #[serde(default = "default_close_retry_delay_ms")]
    pub close_retry_delay_ms: u64,
    #[serde(default = "default_close_sat_per_vbyte")]
    pub close_sat_per_vbyte: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_lsp_address() -> String {
    "https://127.0.0.1:9736".into()
}
fn default_lnd_address() -> String {
    "https://127.0.0.1:8080".into()
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_call_timeout_secs() -> u64 {
    60
}
fn default_csv_height() -> u32 {
    144
}
fn default_fee_rate_sat_per_kw() -> u64 {
    300
}
fn default_settle_delay_ms() -> u64 {
    3_000
}
fn default_close_retry_delay_ms() -> u64 {
    5_000
}
fn default_close_sat_per_vbyte() -> u64 {
    1
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for LspConfig {
    fn default() -> Self {
        Self {
            address: default_lsp_address(),
            token: String::new(),
            cert_path: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

impl Default for LndConfig {
    fn default() -> Self {
        Self {
            rest_address: default_lnd_address(),
            cert_path: None,
            macaroon_path: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            csv_height: default_csv_height(),
            fee_rate_sat_per_kw: default_fee_rate_sat_per_kw(),
        }
    }
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            close_retry_delay_ms: default_close_retry_delay_ms(),
            close_sat_per_vbyte: default_close_sat_per_vbyte(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LspConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

impl LndConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

impl RebalanceConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn close_retry_delay(&self) -> Duration {
        Duration::from_millis(self.close_retry_delay_ms)
    }
}

impl ClientConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| CoreError::Configuration(format!("read {}: {e}", path.display())))?;
            toml::from_str(&contents)
                .map_err(|e| CoreError::Configuration(format!("parse {}: {e}", path.display())))
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CoreError::Configuration(format!("serialize: {e}")))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::Configuration(format!("create {}: {e}", parent.display())))?;
        }
        std::fs::write(path, contents)
            .map_err(|e| CoreError::Configuration(format!("write {}: {e}", path.display())))
    }
}
