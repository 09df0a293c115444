use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

use crate::core_types::{Address32, ChainId};
use crate::error::BridgeError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    /// Bridge deployments keyed by chain name (`ethereum`, `solana`, ...)
    #[serde(default)]
    pub bridges: HashMap<String, ChainContracts>,
}

/// Bridge contract addresses on one chain
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ChainContracts {
    pub core_bridge: String,
    pub token_bridge: String,
    /// Token bridge emitter (hex, 32 bytes) for chains whose logs omit it
    #[serde(default)]
    pub emitter: Option<String>,
    /// Wrapped gas-currency token (hex)
    #[serde(default)]
    pub wrapped_native: Option<String>,
    /// Solana wrapped-mint authority (hex, 32 bytes)
    #[serde(default)]
    pub mint_authority: Option<String>,
    /// Algorand core bridge app
    #[serde(default)]
    pub core_app_id: Option<u64>,
    /// Algorand token bridge app
    #[serde(default)]
    pub token_app_id: Option<u64>,
    /// Algorand token bridge app account
    #[serde(default)]
    pub token_app_address: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "bridge_transfer.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            enable_tracing: false,
            bridges: HashMap::new(),
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", config_path))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        for name in config.bridges.keys() {
            name.parse::<ChainId>()
                .map_err(|e| anyhow::anyhow!("bridges.{}: {}", name, e))?;
        }
        Ok(config)
    }

    pub fn with_bridge(mut self, chain: ChainId, contracts: ChainContracts) -> Self {
        self.bridges.insert(chain.as_str().to_string(), contracts);
        self
    }

    /// Deployment for `chain`; a chain without one is not usable as a source
    pub fn contracts(&self, chain: ChainId) -> Result<&ChainContracts, BridgeError> {
        self.bridges
            .get(chain.as_str())
            .ok_or_else(|| BridgeError::UnsupportedChain(format!("{} (no bridge configured)", chain)))
    }
}

impl ChainContracts {
    pub fn new(core_bridge: impl Into<String>, token_bridge: impl Into<String>) -> Self {
        Self {
            core_bridge: core_bridge.into(),
            token_bridge: token_bridge.into(),
            ..Default::default()
        }
    }

    pub fn emitter(&self) -> Result<Address32, BridgeError> {
        let hex = required(&self.emitter, "emitter")?;
        Address32::from_hex(hex).map_err(|e| BridgeError::Config(format!("emitter: {}", e)))
    }

    pub fn mint_authority(&self) -> Result<Address32, BridgeError> {
        let hex = required(&self.mint_authority, "mint_authority")?;
        Address32::from_hex(hex).map_err(|e| BridgeError::Config(format!("mint_authority: {}", e)))
    }

    pub fn core_app_id(&self) -> Result<u64, BridgeError> {
        self.core_app_id
            .ok_or_else(|| BridgeError::Config("core_app_id is not configured".into()))
    }

    pub fn token_app_id(&self) -> Result<u64, BridgeError> {
        self.token_app_id
            .ok_or_else(|| BridgeError::Config("token_app_id is not configured".into()))
    }

    pub fn token_app_address(&self) -> Result<&str, BridgeError> {
        required(&self.token_app_address, "token_app_address")
    }

    /// Raw bytes of a hex contract address (`0x` optional)
    pub fn core_bridge_bytes(&self) -> Result<Vec<u8>, BridgeError> {
        hex::decode(self.core_bridge.trim_start_matches("0x"))
            .map_err(|e| BridgeError::Config(format!("core_bridge: {}", e)))
    }
}

fn required<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str, BridgeError> {
    field
        .as_deref()
        .ok_or_else(|| BridgeError::Config(format!("{} is not configured", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
log_level: debug
log_dir: ./logs
log_file: bridge.log
use_json: true
rotation: hourly
enable_tracing: true
bridges:
  ethereum:
    core_bridge: "0x98f3c9e6E3fAce36bAAd05FE09d375Ef1464288B"
    token_bridge: "0x3ee18B2214AFF97000D974cf647E7C347E8fa585"
    wrapped_native: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
  algorand:
    core_bridge: "842125965"
    token_bridge: "842126029"
    core_app_id: 842125965
    token_app_id: 842126029
    token_app_address: "M7UT7JWIVROIDGMQVJZUBQGBNNIIVOYRPC7JWMGQES4KYJIZHVCRZEGFRQ"
"#;

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        assert!(config.use_json);
        assert_eq!(config.rotation, "hourly");

        let eth = config.contracts(ChainId::Ethereum).unwrap();
        assert!(eth.emitter.is_none());
        assert_eq!(eth.core_bridge_bytes().unwrap().len(), 20);

        let algo = config.contracts(ChainId::Algorand).unwrap();
        assert_eq!(algo.core_app_id().unwrap(), 842125965);
        assert_eq!(algo.token_app_id().unwrap(), 842126029);
    }

    #[test]
    fn test_unconfigured_chain() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        assert!(matches!(
            config.contracts(ChainId::Solana),
            Err(BridgeError::UnsupportedChain(_))
        ));
    }

    #[test]
    fn test_unknown_chain_key_rejected() {
        let yaml = "log_level: info\nlog_dir: .\nlog_file: x\nuse_json: false\nrotation: never\nenable_tracing: false\nbridges:\n  dogecoin:\n    core_bridge: a\n    token_bridge: b\n";
        assert!(AppConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(AppConfig::load("does-not-exist").is_err());
    }

    #[test]
    fn test_missing_optional_fields() {
        let contracts = ChainContracts::new("a", "b");
        assert!(matches!(contracts.emitter(), Err(BridgeError::Config(_))));
        assert!(matches!(contracts.core_app_id(), Err(BridgeError::Config(_))));
    }
}
