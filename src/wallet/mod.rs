use crate::config::Config;
use crate::errors::{BundlerError, Result};
use crate::models::wallet::{WalletInfo, WalletKeys};
use crate::utils::balance::get_sol_balance;
use crate::utils::retry::RetryPolicy;
use crate::utils::sleep_ms;
use log::{info, warn};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, SeedDerivable, Signer};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

/// Text encodings a private key may be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum KeyEncoding {
    /// 128 hex characters of the 64-byte keypair.
    Hex,
    /// Base58 of the 64-byte keypair (Phantom / solana-keygen export).
    Base58,
    /// JSON byte array, as written by `solana-keygen`.
    Json,
}

/// Decodes a private key given as hex, a JSON byte array or base58.
///
/// 64 bytes are read as a full keypair, 32 bytes as a seed.
pub fn decode_private_key(raw: &str) -> Result<Keypair> {
    let key = strip_quotes(raw.trim());
    if key.is_empty() {
        return Err(BundlerError::Wallet("Private key is empty".to_string()));
    }

    let bytes: Vec<u8> = if key.starts_with('[') {
        serde_json::from_str(key)?
    } else if (key.len() == 128 || key.len() == 64) && key.chars().all(|c| c.is_ascii_hexdigit()) {
        hex::decode(key)?
    } else {
        bs58::decode(key).into_vec()?
    };

    keypair_from_bytes(&bytes)
}

fn keypair_from_bytes(bytes: &[u8]) -> Result<Keypair> {
    match bytes.len() {
        64 => Keypair::from_bytes(bytes)
            .map_err(|e| BundlerError::Wallet(format!("Failed to create keypair from 64-byte array: {}", e))),
        32 => Keypair::from_seed(bytes)
            .map_err(|e| BundlerError::Wallet(format!("Failed to create keypair from 32-byte seed: {}", e))),
        n => Err(BundlerError::Wallet(format!(
            "Decoded private key has unexpected length: {}. Expected 32 or 64 bytes.",
            n
        ))),
    }
}

pub fn encode_private_key(keypair: &Keypair, encoding: KeyEncoding) -> String {
    let bytes = keypair.to_bytes();
    match encoding {
        KeyEncoding::Hex => hex::encode(bytes),
        KeyEncoding::Base58 => bs58::encode(bytes).into_string(),
        KeyEncoding::Json => {
            let list: Vec<String> = bytes.iter().map(|b| b.to_string()).collect();
            format!("[{}]", list.join(","))
        }
    }
}

/// Splits a comma-separated key list. Commas inside JSON arrays do not split.
pub fn parse_key_list(list: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in list.chars() {
        match c {
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => keys.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    keys.push(current);

    keys.iter()
        .map(|k| strip_quotes(k.trim()).to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Decodes every key in a comma-separated list, keeping per-entry results.
pub fn decode_key_list(list: &str) -> Vec<Result<Keypair>> {
    parse_key_list(list).iter().map(|k| decode_private_key(k)).collect()
}

fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}

pub fn generate_keypairs(count: usize) -> Vec<Keypair> {
    (0..count).map(|_| Keypair::new()).collect()
}

/// Writes `VAR="value"` into an env file.
///
/// Existing non-empty assignments of `VAR` are commented out, an empty
/// `VAR=""` placeholder is replaced in place, otherwise the line is appended.
pub fn update_env_file(path: &Path, var: &str, value: &str) -> Result<()> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let prefix = format!("{}=", var);
    let new_line = format!("{}=\"{}\"", var, value);
    let mut replaced = false;
    let mut lines: Vec<String> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim_start();
        match trimmed.strip_prefix(&prefix) {
            Some(existing) if strip_quotes(existing.trim()).is_empty() => {
                if !replaced {
                    lines.push(new_line.clone());
                    replaced = true;
                }
            }
            Some(_) => lines.push(format!("# {}", trimmed)),
            None => lines.push(line.to_string()),
        }
    }
    if !replaced {
        lines.push(new_line);
    }

    fs::write(path, lines.join("\n") + "\n")?;
    info!("Updated {} in {}", var, path.display());
    Ok(())
}

/// Saves keypairs in the `{"wallets": [...]}` keys-file format.
pub fn save_keys_file(path: &Path, keypairs: &[Keypair], encoding: KeyEncoding) -> Result<()> {
    let keys = WalletKeys {
        wallets: keypairs
            .iter()
            .enumerate()
            .map(|(i, kp)| WalletInfo {
                name: Some(format!("bundle{}", i + 1)),
                public_key: kp.pubkey().to_string(),
                private_key: encode_private_key(kp, encoding),
            })
            .collect(),
    };
    let json_data = serde_json::to_string_pretty(&keys)?;
    fs::write(path, json_data)?;
    info!("Saved {} keypair(s) to {}", keypairs.len(), path.display());
    Ok(())
}

pub fn load_keys_file(path: &Path) -> Result<Vec<Keypair>> {
    let content = fs::read_to_string(path)
        .map_err(|e| BundlerError::Wallet(format!("Failed to read keys file '{}': {}", path.display(), e)))?;
    let keys: WalletKeys = serde_json::from_str(&content)
        .map_err(|e| BundlerError::Wallet(format!("Failed to parse keys file '{}': {}", path.display(), e)))?;

    keys.wallets
        .iter()
        .map(|info| {
            decode_private_key(&info.private_key)
                .map_err(|e| BundlerError::Wallet(format!("Invalid key for {}: {}", info.public_key, e)))
        })
        .collect()
}

/// Master and bundle wallets plus the RPC handle used to act on them.
pub struct WalletManager {
    rpc_client: Arc<RpcClient>,
    master: Option<Keypair>,
    bundle_wallets: Vec<Keypair>,
    retry: RetryPolicy,
}

impl WalletManager {
    pub fn new(rpc_client: Arc<RpcClient>, master: Option<Keypair>, bundle_wallets: Vec<Keypair>, retry: RetryPolicy) -> Self {
        Self { rpc_client, master, bundle_wallets, retry }
    }

    /// Builds the manager from configured keys. Invalid bundle keys are skipped with a warning.
    pub fn from_config(config: &Config) -> Result<Self> {
        let rpc_client = Arc::new(RpcClient::new_with_commitment(
            config.solana_rpc_url.clone(),
            config.get_commitment_config()?,
        ));

        let master = match &config.master_wallet_private_key {
            Some(key) => Some(decode_private_key(key).map_err(|e| {
                BundlerError::Wallet(format!("Failed to decode master wallet private key: {}", e))
            })?),
            None => None,
        };

        let mut bundle_wallets = Vec::new();
        if let Some(list) = &config.bundle_wallet_private_keys {
            for (index, decoded) in decode_key_list(list).into_iter().enumerate() {
                match decoded {
                    Ok(kp) => bundle_wallets.push(kp),
                    Err(e) => warn!("Skipping bundle wallet #{}: {}", index + 1, e),
                }
            }
        }
        if let Some(path) = &config.keys_file_path {
            for kp in load_keys_file(path)? {
                if !bundle_wallets.iter().any(|existing: &Keypair| existing.pubkey() == kp.pubkey()) {
                    bundle_wallets.push(kp);
                }
            }
        }
        info!("Loaded {} bundle wallet(s); master wallet {}", bundle_wallets.len(), if master.is_some() { "present" } else { "missing" });

        Ok(Self::new(rpc_client, master, bundle_wallets, config.rpc_retry_policy()))
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc_client
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn master(&self) -> Result<&Keypair> {
        self.master
            .as_ref()
            .ok_or_else(|| BundlerError::Wallet(format!("{} is not set", crate::config::MASTER_WALLET_VAR)))
    }

    pub fn bundle_wallets(&self) -> &[Keypair] {
        &self.bundle_wallets
    }

    /// Bundle wallets, or an error when none are configured.
    pub fn require_bundle_wallets(&self) -> Result<&[Keypair]> {
        if self.bundle_wallets.is_empty() {
            return Err(BundlerError::Wallet(format!(
                "No bundle wallets available. Set {} or run `wallets --generate`.",
                crate::config::BUNDLE_WALLETS_VAR
            )));
        }
        Ok(&self.bundle_wallets)
    }

    /// Sequential balance reads with a short pause between calls.
    pub async fn balances(&self, pubkeys: &[Pubkey]) -> Vec<(Pubkey, Result<u64>)> {
        let mut results = Vec::with_capacity(pubkeys.len());
        for pubkey in pubkeys {
            let balance = get_sol_balance(&self.rpc_client, pubkey, &self.retry).await;
            results.push((*pubkey, balance));
            sleep_ms(200).await;
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_roundtrips_every_encoding() {
        let keypair = Keypair::new();
        for encoding in [KeyEncoding::Hex, KeyEncoding::Base58, KeyEncoding::Json] {
            let encoded = encode_private_key(&keypair, encoding);
            let decoded = decode_private_key(&encoded).unwrap();
            assert_eq!(decoded.pubkey(), keypair.pubkey(), "{:?}", encoding);
        }
    }

    #[test]
    fn test_decode_accepts_quotes_and_seeds() {
        let keypair = Keypair::new();
        let quoted = format!("  \"{}\" ", encode_private_key(&keypair, KeyEncoding::Base58));
        assert_eq!(decode_private_key(&quoted).unwrap().pubkey(), keypair.pubkey());

        let seed = [7u8; 32];
        let from_seed = decode_private_key(&hex::encode(seed)).unwrap();
        assert_eq!(from_seed.pubkey(), Keypair::from_seed(&seed).unwrap().pubkey());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_private_key("").is_err());
        assert!(decode_private_key("not a key at all!").is_err());
        assert!(decode_private_key("[1,2,3]").is_err());
        assert!(decode_private_key(&bs58::encode([1u8; 10]).into_string()).is_err());
    }

    #[test]
    fn test_parse_key_list_keeps_json_arrays_whole() {
        let a = Keypair::new();
        let b = Keypair::new();
        let list = format!(
            "\"{}\", {} ,,",
            encode_private_key(&a, KeyEncoding::Json),
            encode_private_key(&b, KeyEncoding::Hex)
        );
        let keys = parse_key_list(&list);
        assert_eq!(keys.len(), 2);

        let decoded: Vec<Pubkey> = decode_key_list(&list).into_iter().map(|r| r.unwrap().pubkey()).collect();
        assert_eq!(decoded, vec![a.pubkey(), b.pubkey()]);
    }

    #[test]
    fn test_update_env_file_comments_out_old_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "RPC=foo\nBUNDLE_WALLET_PRIVATE_KEYS=\"old1,old2\"\nOTHER=1\n").unwrap();

        update_env_file(&path, "BUNDLE_WALLET_PRIVATE_KEYS", "new1,new2").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "RPC=foo\n# BUNDLE_WALLET_PRIVATE_KEYS=\"old1,old2\"\nOTHER=1\nBUNDLE_WALLET_PRIVATE_KEYS=\"new1,new2\"\n"
        );
    }

    #[test]
    fn test_update_env_file_fills_placeholder_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "BUNDLE_WALLET_PRIVATE_KEYS=\"\"\nOTHER=1").unwrap();

        update_env_file(&path, "BUNDLE_WALLET_PRIVATE_KEYS", "k1").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "BUNDLE_WALLET_PRIVATE_KEYS=\"k1\"\nOTHER=1\n");
    }

    #[test]
    fn test_update_env_file_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        update_env_file(&path, "MASTER_WALLET_PRIVATE_KEY", "abc").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "MASTER_WALLET_PRIVATE_KEY=\"abc\"\n");
    }

    #[test]
    fn test_keys_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        let keypairs = generate_keypairs(3);

        save_keys_file(&path, &keypairs, KeyEncoding::Base58).unwrap();
        let loaded = load_keys_file(&path).unwrap();

        let expected: Vec<Pubkey> = keypairs.iter().map(|k| k.pubkey()).collect();
        let actual: Vec<Pubkey> = loaded.iter().map(|k| k.pubkey()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_manager_skips_invalid_bundle_keys() {
        let good = Keypair::new();
        let config = Config {
            bundle_wallet_private_keys: Some(format!("garbage,{}", encode_private_key(&good, KeyEncoding::Hex))),
            ..Config::default()
        };
        let manager = WalletManager::from_config(&config).unwrap();
        assert_eq!(manager.bundle_wallets().len(), 1);
        assert_eq!(manager.bundle_wallets()[0].pubkey(), good.pubkey());
        assert!(manager.master().is_err());
    }

    #[test]
    fn test_manager_merges_keys_file_without_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        let shared = Keypair::new();
        let extra = Keypair::new();
        save_keys_file(&path, &[shared.insecure_clone(), extra.insecure_clone()], KeyEncoding::Base58).unwrap();

        let config = Config {
            bundle_wallet_private_keys: Some(encode_private_key(&shared, KeyEncoding::Base58)),
            keys_file_path: Some(path),
            ..Config::default()
        };
        let manager = WalletManager::from_config(&config).unwrap();
        let pubkeys: Vec<Pubkey> = manager.bundle_wallets().iter().map(|k| k.pubkey()).collect();
        assert_eq!(pubkeys, vec![shared.pubkey(), extra.pubkey()]);
    }
}
