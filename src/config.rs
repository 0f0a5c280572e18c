use crate::address::AddressFormat;
use crate::network::Network;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Web server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Directory served at `/` (landing page); nothing is served when unset
    #[serde(default)]
    pub static_dir: Option<String>,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            static_dir: None,
        }
    }
}

/// Address/balance store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// sqlx connection string
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Lookups slower than this are treated as "not found"
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
    /// Delay between background connection attempts
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

fn default_store_url() -> String {
    "sqlite://addresses.db".to_string()
}

fn default_max_connections() -> u32 {
    8
}

fn default_lookup_timeout_ms() -> u64 {
    250
}

fn default_retry_delay_secs() -> u64 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            max_connections: default_max_connections(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl StoreConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Scan pipeline settings
#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    #[serde(default)]
    pub network: Network,
    /// Address formats derived and looked up for every keypair
    #[serde(default = "default_enabled_formats")]
    pub enabled_formats: Vec<AddressFormat>,
    /// Outbound event queue depth per session
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// How long `stop` waits for a loop stuck on a client that stopped reading
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
}

fn default_enabled_formats() -> Vec<AddressFormat> {
    vec![
        AddressFormat::P2pkhCompressed,
        AddressFormat::P2pkhUncompressed,
        AddressFormat::P2wpkh,
    ]
}

fn default_event_buffer() -> usize {
    256
}

fn default_stop_grace_ms() -> u64 {
    5000
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            enabled_formats: default_enabled_formats(),
            event_buffer: default_event_buffer(),
            stop_grace_ms: default_stop_grace_ms(),
        }
    }
}

impl ScanConfig {
    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

/// Root application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default config file
            .add_source(File::with_name("config/default").required(false))
            // Override with local config if present
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (prefix: KEYSCAN_)
            // e.g., KEYSCAN_WEB__PORT, KEYSCAN_STORE__URL
            .add_source(
                Environment::with_prefix("KEYSCAN")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("scan.enabled_formats")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.web.host, self.web.port)
    }
}
