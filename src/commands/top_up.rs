use super::utils::confirm;
use crate::config::Config;
use crate::errors::{BundlerError, Result};
use crate::utils::balance::{get_sol_balance, lamports_to_sol, sol_to_lamports};
use crate::utils::distribution::allocate;
use crate::utils::sleep_ms;
use crate::utils::transaction::{build_signed_transaction, get_latest_blockhash, send_and_confirm};
use crate::wallet::WalletManager;
use console::style;
use log::{error, info};
use prettytable::{row, Table};
use solana_sdk::{signature::Signer, system_instruction};

pub const DEFAULT_TOP_UP_SOL: f64 = 0.01;

/// Per-wallet lamports to send: `amount` to every wallet, or `total` split
/// randomly with the distributor.
pub fn plan_top_up(amount: Option<f64>, total: Option<f64>, count: usize) -> Result<Vec<u64>> {
    let shares = match (amount, total) {
        (Some(_), Some(_)) => {
            return Err(BundlerError::InvalidInput("Use either --amount or --total, not both".to_string()))
        }
        (_, Some(total)) => allocate(total, count)?,
        (amount, None) => {
            let amount = amount.unwrap_or(DEFAULT_TOP_UP_SOL);
            if !amount.is_finite() || amount < 0.0 {
                return Err(BundlerError::InvalidInput(format!("Invalid top-up amount: {}", amount)));
            }
            vec![amount; count]
        }
    };
    let plan: Vec<u64> = shares.into_iter().map(sol_to_lamports).collect();
    plan_total(&plan)?;
    Ok(plan)
}

/// Lamports a top-up plan spends in total. Errors instead of overflowing.
pub fn plan_total(plan: &[u64]) -> Result<u64> {
    plan.iter()
        .try_fold(0u64, |acc, lamports| acc.checked_add(*lamports))
        .ok_or_else(|| BundlerError::InvalidInput("Top-up total exceeds the maximum lamport amount".to_string()))
}

/// Funds every bundle wallet from the master wallet.
pub async fn top_up_wallets(config: &Config, amount: Option<f64>, total: Option<f64>, assume_yes: bool) -> Result<()> {
    let manager = WalletManager::from_config(config)?;
    let master = manager.master()?;
    let wallets = manager.require_bundle_wallets()?;
    let plan = plan_top_up(amount, total, wallets.len())?;

    let needed = plan_total(&plan)?;
    let master_balance = get_sol_balance(manager.rpc(), &master.pubkey(), manager.retry_policy()).await?;
    println!("{} {} ({:.6} SOL)", style("Master Wallet:").cyan(), master.pubkey(), lamports_to_sol(master_balance));

    let mut table = Table::new();
    table.add_row(row!["Wallet", "Address", "Top-up (SOL)"]);
    for (index, (kp, lamports)) in wallets.iter().zip(&plan).enumerate() {
        table.add_row(row![format!("Bundle {}", index + 1), kp.pubkey(), format!("{:.6}", lamports_to_sol(*lamports))]);
    }
    table.printstd();

    if needed > master_balance {
        return Err(BundlerError::InsufficientBalance(format!(
            "Master wallet holds {:.6} SOL but the top-up needs {:.6} SOL plus fees",
            lamports_to_sol(master_balance),
            lamports_to_sol(needed)
        )));
    }
    if !confirm(&format!("Send {:.6} SOL to {} wallet(s)?", lamports_to_sol(needed), wallets.len()), assume_yes)? {
        println!("Top-up cancelled.");
        return Ok(());
    }

    let mut sent = 0usize;
    for (wallet, lamports) in wallets.iter().zip(plan) {
        let recipient = wallet.pubkey();
        if lamports == 0 {
            info!("[{}] Share rounds to 0 lamports, skipping.", recipient);
            continue;
        }

        let result = async {
            let blockhash = get_latest_blockhash(manager.rpc(), manager.retry_policy()).await?;
            let ix = system_instruction::transfer(&master.pubkey(), &recipient, lamports);
            let transaction = build_signed_transaction(&[ix], master, blockhash);
            send_and_confirm(manager.rpc(), &transaction, &format!("top-up {}", recipient)).await
        }
        .await;

        match result {
            Ok(_) => {
                sent += 1;
                info!("[{}] Sent {:.9} SOL", recipient, lamports_to_sol(lamports));
            }
            Err(e) => error!("[{}] Top-up transfer failed: {}", recipient, e),
        }
        sleep_ms(500).await;
    }

    println!("{} Funded {}/{} wallet(s).", style("✓").green(), sent, wallets.len());
    Ok(())
}
