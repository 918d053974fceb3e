use crate::errors::{BundlerError, Result};
use crate::utils::retry::RetryPolicy;
use dotenv::dotenv;
use log::{debug, info};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const QUICK_NODE_URL_TEMPLATE: &str = "https://necessary-light-shape.solana-mainnet.quiknode.pro";
pub const DEFAULT_JITO_BLOCK_ENGINE_URL: &str = "https://mainnet.block-engine.jito.wtf";
pub const DEFAULT_RAYDIUM_LIQUIDITY_URL: &str = "https://api.raydium.io/v2/sdk/liquidity/mainnet.json";

pub const MASTER_WALLET_VAR: &str = "MASTER_WALLET_PRIVATE_KEY";
pub const BUNDLE_WALLETS_VAR: &str = "BUNDLE_WALLET_PRIVATE_KEYS";

#[derive(Debug, Clone)]
pub struct Config {
    // Solana configuration
    pub solana_rpc_url: String,
    pub commitment: String,

    // Wallets
    pub master_wallet_private_key: Option<String>,
    pub bundle_wallet_private_keys: Option<String>,
    pub env_file_path: PathBuf,
    pub keys_file_path: Option<PathBuf>,

    // Token / pool
    pub token_mint: Option<Pubkey>,
    pub raydium_liquidity_url: String,

    // Jito configuration
    pub jito_block_engine_url: String,
    pub jito_tip_lamports: u64,

    // RPC retry behaviour
    pub rpc_max_retries: u32,
    pub rpc_retry_delay_ms: u64,
}

impl Config {
    /// Loads configuration from the process environment, after reading `.env`.
    pub fn load() -> Result<Self> {
        dotenv().ok();
        info!("Loading configuration from environment variables.");
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        debug!("Configuration loaded: rpc={} commitment={} jito={}", config.solana_rpc_url, config.commitment, config.jito_block_engine_url);
        Ok(config)
    }

    /// Builds a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let solana_rpc_url = match (get("SOLANA_RPC_URL"), get("QUICK_NODE_API_KEY")) {
            (Some(url), _) => url,
            (None, Some(api_key)) => format!("{}/{}/", QUICK_NODE_URL_TEMPLATE, api_key),
            (None, None) => defaults.solana_rpc_url,
        };

        let token_mint = match get("TOKEN_MINT_ADDRESS") {
            Some(s) => Some(Pubkey::from_str(&s)?),
            None => None,
        };

        let config = Config {
            solana_rpc_url,
            commitment: get("COMMITMENT").unwrap_or(defaults.commitment),
            master_wallet_private_key: get(MASTER_WALLET_VAR),
            bundle_wallet_private_keys: get(BUNDLE_WALLETS_VAR),
            env_file_path: get("ENV_FILE_PATH").map(PathBuf::from).unwrap_or(defaults.env_file_path),
            keys_file_path: get("KEYS_FILE_PATH").map(PathBuf::from),
            token_mint,
            raydium_liquidity_url: get("RAYDIUM_LIQUIDITY_URL").unwrap_or(defaults.raydium_liquidity_url),
            jito_block_engine_url: get("JITO_BLOCK_ENGINE_URL").unwrap_or(defaults.jito_block_engine_url),
            jito_tip_lamports: parse_or(get("JITO_TIP_LAMPORTS"), "JITO_TIP_LAMPORTS", defaults.jito_tip_lamports)?,
            rpc_max_retries: parse_or(get("RPC_MAX_RETRIES"), "RPC_MAX_RETRIES", defaults.rpc_max_retries)?,
            rpc_retry_delay_ms: parse_or(get("RPC_RETRY_DELAY_MS"), "RPC_RETRY_DELAY_MS", defaults.rpc_retry_delay_ms)?,
        };

        config.get_commitment_config()?;
        Ok(config)
    }

    pub fn get_commitment_config(&self) -> Result<CommitmentConfig> {
        match self.commitment.as_str() {
            "processed" => Ok(CommitmentConfig::processed()),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            _ => Err(BundlerError::Config(format!("Invalid commitment level: {}", self.commitment))),
        }
    }

    /// Retry policy for RPC reads (balances, blockhashes).
    pub fn rpc_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.rpc_max_retries, Duration::from_millis(self.rpc_retry_delay_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            solana_rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: "confirmed".to_string(),
            master_wallet_private_key: None,
            bundle_wallet_private_keys: None,
            env_file_path: PathBuf::from(".env"),
            keys_file_path: None,
            token_mint: None,
            raydium_liquidity_url: DEFAULT_RAYDIUM_LIQUIDITY_URL.to_string(),
            jito_block_engine_url: DEFAULT_JITO_BLOCK_ENGINE_URL.to_string(),
            jito_tip_lamports: 10_000,
            rpc_max_retries: 5,
            rpc_retry_delay_ms: 1000,
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        Some(v) => v
            .parse::<T>()
            .map_err(|_| BundlerError::Config(format!("{} has an invalid value: '{}'", key, v))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.solana_rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.commitment, "confirmed");
        assert_eq!(config.rpc_max_retries, 5);
        assert!(config.token_mint.is_none());
    }

    #[test]
    fn test_quick_node_key_builds_rpc_url() {
        let config = Config::from_lookup(lookup_from(&[("QUICK_NODE_API_KEY", "abc123")])).unwrap();
        assert_eq!(config.solana_rpc_url, format!("{}/abc123/", QUICK_NODE_URL_TEMPLATE));

        let explicit = Config::from_lookup(lookup_from(&[
            ("QUICK_NODE_API_KEY", "abc123"),
            ("SOLANA_RPC_URL", "http://localhost:8899"),
        ]))
        .unwrap();
        assert_eq!(explicit.solana_rpc_url, "http://localhost:8899");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("COMMITMENT", "eventually")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("JITO_TIP_LAMPORTS", "lots")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("TOKEN_MINT_ADDRESS", "not-a-key")])).is_err());
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = Config::from_lookup(lookup_from(&[(BUNDLE_WALLETS_VAR, "  "), ("COMMITMENT", "")])).unwrap();
        assert!(config.bundle_wallet_private_keys.is_none());
        assert_eq!(config.commitment, "confirmed");
    }
}
