//! Bridge configuration
//!
//! Defaults cover every chain in the static table. A JSON file can replace
//! any field, and a handful of environment variables override the file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::chains::table::{ProfileParams, CHAINS};
use crate::error::{BridgeError, BridgeResult};

pub const ENV_RELAY_URL: &str = "VAULT_BRIDGE_RELAY_URL";
pub const ENV_POLL_INTERVAL_MS: &str = "VAULT_BRIDGE_POLL_INTERVAL_MS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "VAULT_BRIDGE_HTTP_TIMEOUT_SECS";

/// Relay polling never runs faster than once a second
pub const MIN_POLL_INTERVAL_MS: u64 = 1_000;

/// Placeholder replaced by the decimal chain id in `evm_fallback_rpc`
pub const CHAIN_ID_PLACEHOLDER: &str = "{chain_id}";

/// Endpoints for one chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEndpoints {
    /// JSON-RPC (EVM) or Tendermint RPC (Cosmos-family)
    #[serde(default)]
    pub rpc: Option<String>,
    /// Cosmos REST / Thornode API
    #[serde(default)]
    pub rest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub relay_url: String,
    pub poll_interval_ms: u64,
    pub min_participants: usize,
    pub uri_scheme: String,
    pub uri_host: String,
    pub service_name: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub blockchair_url: String,
    pub selector_directory_url: String,
    /// Keyed by chain name, or by EVM chain id for fallback chains
    pub chains: BTreeMap<String, ChainEndpoints>,
    /// RPC URL for EVM chains outside the table, e.g. `https://rpc.example.org/{chain_id}`
    pub evm_fallback_rpc: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            relay_url: "https://api.vultisig.com/router".to_string(),
            poll_interval_ms: 1_000,
            min_participants: 2,
            uri_scheme: "vultisig".to_string(),
            uri_host: "vultisig.com".to_string(),
            service_name: "VaultBridge".to_string(),
            http_timeout_secs: 30,
            user_agent: format!("vault-bridge/{}", env!("CARGO_PKG_VERSION")),
            blockchair_url: "https://api.blockchair.com".to_string(),
            selector_directory_url: "https://www.4byte.directory".to_string(),
            chains: default_chain_endpoints(),
            evm_fallback_rpc: None,
        }
    }
}

fn default_chain_endpoints() -> BTreeMap<String, ChainEndpoints> {
    let mut map = BTreeMap::new();
    for profile in CHAINS {
        let endpoints = match (profile.name, profile.params) {
            ("THORChain", _) => ChainEndpoints {
                rpc: Some("https://rpc.ninerealms.com".to_string()),
                rest: Some("https://thornode.ninerealms.com".to_string()),
            },
            ("MayaChain", _) => ChainEndpoints {
                rpc: Some("https://tendermint.mayachain.info".to_string()),
                rest: Some("https://mayanode.mayachain.info".to_string()),
            },
            (_, ProfileParams::Evm { .. }) => ChainEndpoints {
                rpc: Some(format!("https://{}-rpc.publicnode.com", publicnode_slug(profile.name))),
                rest: None,
            },
            (_, ProfileParams::Cosmos(_)) => ChainEndpoints {
                rpc: Some(format!("https://{}-rpc.publicnode.com", publicnode_slug(profile.name))),
                rest: Some(format!("https://{}-rest.publicnode.com", publicnode_slug(profile.name))),
            },
            // Indexed through Blockchair
            _ => continue,
        };
        map.insert(profile.name.to_string(), endpoints);
    }
    map
}

fn publicnode_slug(name: &str) -> String {
    match name {
        "BSC" => "bsc".to_string(),
        "Avalanche" => "avalanche-c-chain".to_string(),
        "Arbitrum" => "arbitrum-one".to_string(),
        "Polygon" => "polygon-bor".to_string(),
        "Dydx" => "dydx".to_string(),
        "CronosChain" => "cronos-evm".to_string(),
        "Zksync" => "zksync-era".to_string(),
        other => other.to_lowercase(),
    }
}

impl BridgeConfig {
    /// Defaults, then `path` if given, then environment overrides, then validation
    pub fn load(path: Option<&Path>) -> BridgeResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> BridgeResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::config(format!("Cannot read config file: {}", e))
                .with_details(path.display().to_string())
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse JSON; missing fields keep their defaults, missing chains are filled in
    pub fn from_json_str(raw: &str) -> BridgeResult<Self> {
        let mut config: BridgeConfig = serde_json::from_str(raw)
            .map_err(|e| BridgeError::config(format!("Invalid config JSON: {}", e)))?;
        for (name, endpoints) in default_chain_endpoints() {
            config.chains.entry(name).or_insert(endpoints);
        }
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_env<F>(&mut self, lookup: F) -> BridgeResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_RELAY_URL) {
            self.relay_url = url;
        }
        if let Some(ms) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = ms
                .parse()
                .map_err(|_| BridgeError::config(format!("{} must be an integer", ENV_POLL_INTERVAL_MS)))?;
        }
        if let Some(secs) = lookup(ENV_HTTP_TIMEOUT_SECS) {
            self.http_timeout_secs = secs
                .parse()
                .map_err(|_| BridgeError::config(format!("{} must be an integer", ENV_HTTP_TIMEOUT_SECS)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> BridgeResult<()> {
        validate_endpoint_url("relay_url", &self.relay_url)?;
        validate_endpoint_url("blockchair_url", &self.blockchair_url)?;
        validate_endpoint_url("selector_directory_url", &self.selector_directory_url)?;
        for (chain, endpoints) in &self.chains {
            for url in endpoints.rpc.iter().chain(endpoints.rest.iter()) {
                validate_endpoint_url(chain, url)?;
            }
        }

        if let Some(template) = &self.evm_fallback_rpc {
            validate_endpoint_url("evm_fallback_rpc", &template.replace(CHAIN_ID_PLACEHOLDER, "1"))?;
        }

        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(BridgeError::config(format!(
                "poll_interval_ms must be at least {}",
                MIN_POLL_INTERVAL_MS
            )));
        }
        if self.min_participants < 2 {
            return Err(BridgeError::config("min_participants must be at least 2"));
        }
        if self.http_timeout_secs == 0 {
            return Err(BridgeError::config("http_timeout_secs must be positive"));
        }
        if self.uri_scheme.is_empty() || self.uri_host.is_empty() {
            return Err(BridgeError::config("uri_scheme and uri_host are required"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn endpoints(&self, chain: &str) -> Option<&ChainEndpoints> {
        self.chains.get(chain)
    }

    /// RPC for an EVM chain outside the table: the entry keyed by its decimal
    /// id, else the fallback template
    pub fn evm_fallback_rpc(&self, chain_id: u64) -> Option<String> {
        let key = chain_id.to_string();
        self.chains
            .get(&key)
            .and_then(|e| e.rpc.clone())
            .or_else(|| {
                self.evm_fallback_rpc
                    .as_ref()
                    .map(|template| template.replace(CHAIN_ID_PLACEHOLDER, &key))
            })
    }
}

/// HTTPS required except for loopback hosts
fn validate_endpoint_url(label: &str, raw: &str) -> BridgeResult<()> {
    let parsed = Url::parse(raw).map_err(|e| {
        BridgeError::config(format!("Invalid URL for {}: {}", label, e)).with_details(raw.to_string())
    })?;

    match parsed.scheme() {
        "https" => Ok(()),
        "http" if is_loopback(parsed.host_str().unwrap_or_default()) => Ok(()),
        "http" => Err(BridgeError::config(format!("HTTPS required for {}", label))
            .with_details(raw.to_string())),
        other => Err(BridgeError::config(format!("Unsupported scheme '{}' for {}", other, label))),
    }
}

fn is_loopback(host: &str) -> bool {
    host == "localhost" || host == "127.0.0.1" || host == "[::1]" || host == "::1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert!(config.endpoints("Ethereum").and_then(|e| e.rpc.as_ref()).is_some());
        assert!(config.endpoints("THORChain").and_then(|e| e.rest.as_ref()).is_some());
        assert!(config.endpoints("Bitcoin").is_none());
    }

    #[test]
    fn test_json_keeps_defaults() {
        let config = BridgeConfig::from_json_str(r#"{"min_participants": 3}"#).unwrap();
        assert_eq!(config.min_participants, 3);
        assert_eq!(config.poll_interval_ms, 1_000);
        assert!(config.endpoints("Cosmos").is_some());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = BridgeConfig::default();
        config
            .apply_env(|key| match key {
                ENV_RELAY_URL => Some("http://localhost:8080".to_string()),
                ENV_POLL_INTERVAL_MS => Some("2500".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.relay_url, "http://localhost:8080");
        assert_eq!(config.poll_interval_ms, 2_500);
        assert!(config.validate().is_ok());

        let bad = config.apply_env(|key| (key == ENV_HTTP_TIMEOUT_SECS).then(|| "soon".to_string()));
        assert!(bad.is_err());
    }

    #[test]
    fn test_plain_http_rejected_for_remote_hosts() {
        let mut config = BridgeConfig::default();
        config.relay_url = "http://relay.example.com".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Config);
    }

    #[test]
    fn test_single_participant_rejected() {
        let config = BridgeConfig {
            min_participants: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sub_second_poll_interval_rejected() {
        let mut config = BridgeConfig::default();
        config
            .apply_env(|key| (key == ENV_POLL_INTERVAL_MS).then(|| "250".to_string()))
            .unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Config);

        config.poll_interval_ms = MIN_POLL_INTERVAL_MS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_evm_fallback_rpc() {
        let mut config = BridgeConfig::default();
        assert_eq!(config.evm_fallback_rpc(59144), None);

        config.evm_fallback_rpc = Some("https://rpc.example.org/{chain_id}".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(config.evm_fallback_rpc(59144).as_deref(), Some("https://rpc.example.org/59144"));

        config.chains.insert(
            "59144".to_string(),
            ChainEndpoints {
                rpc: Some("https://linea.example.org".to_string()),
                rest: None,
            },
        );
        assert_eq!(config.evm_fallback_rpc(59144).as_deref(), Some("https://linea.example.org"));

        config.evm_fallback_rpc = Some("http://rpc.example.org/{chain_id}".to_string());
        assert!(config.validate().is_err());
    }
}
