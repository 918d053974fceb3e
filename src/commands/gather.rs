use super::utils::confirm;
use crate::config::Config;
use crate::errors::Result;
use crate::utils::balance::{get_sol_balance, lamports_to_sol};
use crate::utils::transaction::{build_signed_transaction, get_latest_blockhash, send_and_confirm};
use crate::wallet::WalletManager;
use console::style;
use log::{error, info, warn};
use solana_sdk::{message::Message, signature::Signer, system_instruction};
use tokio::time::Duration;

/// Fee assumed for a single transfer when the RPC cannot estimate one.
pub const DEFAULT_TRANSFER_FEE_LAMPORTS: u64 = 5000;

/// Lamports to sweep from a wallet holding `balance`, leaving `fee` to pay for the transfer.
pub fn gather_amount(balance: u64, fee: u64) -> Option<u64> {
    balance.checked_sub(fee).filter(|amount| *amount > 0)
}

/// Gather SOL from all bundle wallets back to the master wallet.
pub async fn gather_sol(config: &Config, assume_yes: bool) -> Result<()> {
    let manager = WalletManager::from_config(config)?;
    let master = manager.master()?;
    let master_pubkey = master.pubkey();
    let wallets = manager.require_bundle_wallets()?;

    println!("Gathering SOL to Master Wallet...");
    println!("{} {}", style("Master Wallet:").cyan(), master_pubkey);
    if !confirm(&format!("Sweep SOL from {} wallet(s)?", wallets.len()), assume_yes)? {
        println!("Gather cancelled.");
        return Ok(());
    }

    let rpc_client = manager.rpc();
    let mut gathered: u64 = 0;

    for source_keypair in wallets {
        let source_pubkey = source_keypair.pubkey();
        if source_pubkey == master_pubkey {
            info!("[{}] Skipping: source is the master wallet.", source_pubkey);
            continue;
        }

        let balance = match get_sol_balance(rpc_client, &source_pubkey, manager.retry_policy()).await {
            Ok(b) => b,
            Err(e) => {
                error!("[{}] Failed to get balance: {}", source_pubkey, e);
                tokio::time::sleep(Duration::from_millis(200)).await;
                continue;
            }
        };

        let latest_blockhash = match get_latest_blockhash(rpc_client, manager.retry_policy()).await {
            Ok(bh) => bh,
            Err(e) => {
                error!("[{}] Failed to get blockhash: {}", source_pubkey, e);
                tokio::time::sleep(Duration::from_millis(200)).await;
                continue;
            }
        };

        // Amount does not affect the fee.
        let fee_estimate_ix = system_instruction::transfer(&source_pubkey, &master_pubkey, 1);
        let fee_message = Message::new_with_blockhash(&[fee_estimate_ix], Some(&source_pubkey), &latest_blockhash);
        let fee = match rpc_client.get_fee_for_message(&fee_message).await {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    "[{}] Fee estimate failed ({}); using default {} lamports.",
                    source_pubkey, e, DEFAULT_TRANSFER_FEE_LAMPORTS
                );
                DEFAULT_TRANSFER_FEE_LAMPORTS
            }
        };

        let Some(lamports_to_send) = gather_amount(balance, fee) else {
            info!("[{}] Skipping transfer: balance ({}) <= fee ({})", source_pubkey, balance, fee);
            tokio::time::sleep(Duration::from_millis(100)).await;
            continue;
        };

        let transfer = system_instruction::transfer(&source_pubkey, &master_pubkey, lamports_to_send);
        let transaction = build_signed_transaction(&[transfer], source_keypair, latest_blockhash);
        match send_and_confirm(rpc_client, &transaction, &format!("gather {}", source_pubkey)).await {
            Ok(_) => {
                gathered += lamports_to_send;
                info!("[{}] Transferred {:.9} SOL", source_pubkey, lamports_to_sol(lamports_to_send));
            }
            Err(e) => error!("[{}] SOL transfer failed: {}", source_pubkey, e),
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    println!("{} Gathered {:.9} SOL.", style("✓").green(), lamports_to_sol(gathered));
    Ok(())
}
