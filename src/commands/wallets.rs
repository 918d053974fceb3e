use crate::config::{Config, BUNDLE_WALLETS_VAR};
use crate::errors::{BundlerError, Result};
use crate::wallet::{encode_private_key, generate_keypairs, save_keys_file, update_env_file, KeyEncoding, WalletManager};
use console::{style, Style};
use log::info;
use prettytable::{row, Table};
use solana_sdk::signature::{Keypair, Signer};
use std::path::Path;

/// Lists the configured master and bundle wallets.
pub fn list_wallets(config: &Config) -> Result<()> {
    let manager = WalletManager::from_config(config)?;
    let header = Style::new().cyan().bold();
    println!("\n{}", header.apply_to("👛 Configured Wallets"));

    let mut table = Table::new();
    table.add_row(row!["Wallet", "Public Key"]);
    match manager.master() {
        Ok(master) => table.add_row(row!["Master", master.pubkey()]),
        Err(_) => table.add_row(row!["Master", "(not set)"]),
    };
    for (index, kp) in manager.bundle_wallets().iter().enumerate() {
        table.add_row(row![format!("Bundle {}", index + 1), kp.pubkey()]);
    }
    table.printstd();

    if manager.bundle_wallets().is_empty() {
        println!(
            "{} No bundle wallets configured. Run `wallets --generate N` to create some.",
            style("⚠️").yellow()
        );
    }
    Ok(())
}

/// Value stored in the env file for a list of bundle wallets.
pub fn bundle_wallets_env_value(keypairs: &[Keypair], encoding: KeyEncoding) -> String {
    keypairs
        .iter()
        .map(|kp| encode_private_key(kp, encoding))
        .collect::<Vec<_>>()
        .join(",")
}

/// Generates `count` bundle wallets and stores them in the env file (and
/// optionally a keys file). Previous keys in the env file are commented out,
/// not deleted.
pub fn generate_wallets(count: usize, encoding: KeyEncoding, env_file: &Path, keys_out: Option<&Path>) -> Result<Vec<Keypair>> {
    if count == 0 {
        return Err(BundlerError::InvalidInput("Wallet count must be at least 1".to_string()));
    }

    info!("Generating {} bundle wallet(s) ({:?} encoding)", count, encoding);
    let keypairs = generate_keypairs(count);
    update_env_file(env_file, BUNDLE_WALLETS_VAR, &bundle_wallets_env_value(&keypairs, encoding))?;
    if let Some(path) = keys_out {
        save_keys_file(path, &keypairs, encoding)?;
    }

    println!("{} Generated {} wallet(s):", style("✓").green(), keypairs.len());
    for (index, kp) in keypairs.iter().enumerate() {
        println!("  {:>3}. {}", index + 1, kp.pubkey());
    }
    println!("Saved to {} as {}", env_file.display(), BUNDLE_WALLETS_VAR);
    Ok(keypairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::{decode_key_list, load_keys_file};
    use std::fs;

    #[test]
    fn test_generate_wallets_writes_env_and_keys_file() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join(".env");
        let keys_path = dir.path().join("keys.json");
        fs::write(&env_path, "SOLANA_RPC_URL=\"http://localhost:8899\"\nBUNDLE_WALLET_PRIVATE_KEYS=\"\"\n").unwrap();

        let keypairs = generate_wallets(3, KeyEncoding::Json, &env_path, Some(&keys_path)).unwrap();

        let content = fs::read_to_string(&env_path).unwrap();
        assert!(content.contains("SOLANA_RPC_URL=\"http://localhost:8899\""));
        let line = content.lines().find(|l| l.starts_with("BUNDLE_WALLET_PRIVATE_KEYS=")).unwrap();
        let value = line.trim_start_matches("BUNDLE_WALLET_PRIVATE_KEYS=");
        let decoded: Vec<_> = decode_key_list(value).into_iter().map(|r| r.unwrap().pubkey()).collect();
        let expected: Vec<_> = keypairs.iter().map(|kp| kp.pubkey()).collect();
        assert_eq!(decoded, expected);

        let from_file: Vec<_> = load_keys_file(&keys_path).unwrap().iter().map(|kp| kp.pubkey()).collect();
        assert_eq!(from_file, expected);
    }

    #[test]
    fn test_generate_wallets_rejects_zero() {
        let dir = tempfile::tempdir().unwrap();
        let result = generate_wallets(0, KeyEncoding::Base58, &dir.path().join(".env"), None);
        assert!(matches!(result, Err(BundlerError::InvalidInput(_))));
    }
}
