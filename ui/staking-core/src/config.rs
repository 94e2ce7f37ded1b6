//! Runtime configuration, read from the environment.

use std::env;
use std::path::Path;
use std::time::Duration;

use alloy_primitives::Address;
use thiserror::Error;

/// Sepolia, the only network the dashboard talks to unless overridden.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(4_000);
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_millis(6_000);

/// Variable holding the wallet's signing key. Read by the wallet adapter at
/// connect time, never stored in [`StakingConfig`].
pub const WALLET_KEY_VAR: &str = "STAKING_WALLET_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("no RPC endpoint for chain {0}: set STAKING_RPC_URL")]
    NoRpcEndpoint(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingConfig {
    pub chain_id: u64,
    pub contract_address: Address,
    pub rpc_url: String,
    pub poll_interval: Duration,
    pub notification_ttl: Duration,
    pub auto_connect: bool,
}

impl StakingConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let chain_id = match get("STAKING_CHAIN_ID") {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: "STAKING_CHAIN_ID",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => SEPOLIA_CHAIN_ID,
        };

        let raw_address =
            get("STAKING_CONTRACT_ADDRESS").ok_or(ConfigError::Missing("STAKING_CONTRACT_ADDRESS"))?;
        let contract_address = raw_address
            .parse::<Address>()
            .map_err(|e| ConfigError::Invalid {
                var: "STAKING_CONTRACT_ADDRESS",
                value: raw_address.clone(),
                reason: e.to_string(),
            })?;

        let rpc_url = match (get("STAKING_RPC_URL"), get("ALCHEMY_API_KEY")) {
            (Some(url), _) => url,
            (None, Some(key)) => alchemy_url(chain_id, &key).ok_or(ConfigError::NoRpcEndpoint(chain_id))?,
            (None, None) if chain_id == SEPOLIA_CHAIN_ID => {
                return Err(ConfigError::Missing("ALCHEMY_API_KEY"))
            }
            (None, None) => return Err(ConfigError::NoRpcEndpoint(chain_id)),
        };

        let poll_interval = millis(&get, "STAKING_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL)?;
        let notification_ttl =
            millis(&get, "STAKING_NOTIFICATION_TTL_MS", DEFAULT_NOTIFICATION_TTL)?;

        let auto_connect = match get("STAKING_AUTO_CONNECT") {
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "STAKING_AUTO_CONNECT",
                        value: raw,
                        reason: "expected true or false".into(),
                    })
                }
            },
            None => false,
        };

        Ok(Self {
            chain_id,
            contract_address,
            rpc_url,
            poll_interval,
            notification_ttl,
            auto_connect,
        })
    }

    /// Human-readable name of the allowed network.
    pub fn network_name(&self) -> &'static str {
        network_name(self.chain_id)
    }
}

fn millis<G>(get: &G, var: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(var) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "must be greater than zero".into(),
        }),
        Ok(ms) => Ok(Duration::from_millis(ms)),
        Err(e) => Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: e.to_string(),
        }),
    }
}

fn alchemy_url(chain_id: u64, api_key: &str) -> Option<String> {
    let subdomain = match chain_id {
        SEPOLIA_CHAIN_ID => "eth-sepolia",
        1 => "eth-mainnet",
        17_000 => "eth-holesky",
        _ => return None,
    };
    Some(format!("https://{subdomain}.g.alchemy.com/v2/{api_key}"))
}

pub fn network_name(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "Ethereum",
        SEPOLIA_CHAIN_ID => "Sepolia",
        17_000 => "Holesky",
        _ => "configured",
    }
}

/// Load variables from a dotenv file before reading the configuration.
///
/// `STAKING_ENV_FILE` selects the file; otherwise `.env` is used when
/// present. A missing file is not an error.
pub fn load_env_file() {
    let env_file = env::var("STAKING_ENV_FILE").unwrap_or_else(|_| ".env".to_string());
    if !Path::new(&env_file).exists() {
        return;
    }
    match dotenvy::from_filename(&env_file) {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded env file"),
        Err(e) => {
            // tracing may not be initialized yet
            eprintln!("Warning: failed to load {env_file}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_to_sepolia_with_alchemy_endpoint() {
        let config = StakingConfig::from_lookup(lookup(&[
            ("STAKING_CONTRACT_ADDRESS", CONTRACT),
            ("ALCHEMY_API_KEY", "demo-key"),
        ]))
        .unwrap();

        assert_eq!(config.chain_id, SEPOLIA_CHAIN_ID);
        assert_eq!(config.rpc_url, "https://eth-sepolia.g.alchemy.com/v2/demo-key");
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.notification_ttl, DEFAULT_NOTIFICATION_TTL);
        assert!(!config.auto_connect);
        assert_eq!(config.network_name(), "Sepolia");
    }

    #[test]
    fn explicit_rpc_url_wins_over_api_key() {
        let config = StakingConfig::from_lookup(lookup(&[
            ("STAKING_CONTRACT_ADDRESS", CONTRACT),
            ("STAKING_RPC_URL", "http://127.0.0.1:8545"),
            ("ALCHEMY_API_KEY", "ignored"),
            ("STAKING_CHAIN_ID", "31337"),
            ("STAKING_POLL_INTERVAL_MS", "250"),
            ("STAKING_AUTO_CONNECT", "yes"),
        ]))
        .unwrap();

        assert_eq!(config.chain_id, 31_337);
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert!(config.auto_connect);
    }

    #[test]
    fn missing_contract_address_is_reported() {
        let err = StakingConfig::from_lookup(lookup(&[("ALCHEMY_API_KEY", "k")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("STAKING_CONTRACT_ADDRESS"));
    }

    #[test]
    fn api_key_required_without_endpoint() {
        let err = StakingConfig::from_lookup(lookup(&[("STAKING_CONTRACT_ADDRESS", CONTRACT)]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("ALCHEMY_API_KEY"));

        let err = StakingConfig::from_lookup(lookup(&[
            ("STAKING_CONTRACT_ADDRESS", CONTRACT),
            ("STAKING_CHAIN_ID", "31337"),
            ("ALCHEMY_API_KEY", "k"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::NoRpcEndpoint(31_337));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = StakingConfig::from_lookup(lookup(&[
            ("STAKING_CONTRACT_ADDRESS", "0x1234"),
            ("ALCHEMY_API_KEY", "k"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "STAKING_CONTRACT_ADDRESS", .. }));

        let err = StakingConfig::from_lookup(lookup(&[
            ("STAKING_CONTRACT_ADDRESS", CONTRACT),
            ("ALCHEMY_API_KEY", "k"),
            ("STAKING_NOTIFICATION_TTL_MS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "STAKING_NOTIFICATION_TTL_MS", .. }));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = StakingConfig::from_lookup(lookup(&[
            ("STAKING_CONTRACT_ADDRESS", CONTRACT),
            ("ALCHEMY_API_KEY", "k"),
            ("STAKING_CHAIN_ID", "  "),
        ]))
        .unwrap();
        assert_eq!(config.chain_id, SEPOLIA_CHAIN_ID);
    }
}
