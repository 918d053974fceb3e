use super::buy::quote_sequence;
use super::utils::{confirm, parse_mint, submit_plans, SubmitMode};
use crate::api::jito::JitoClient;
use crate::api::raydium::{build_sell_instructions, directional_reserves, fetch_pool_keys, fetch_reserves, NATIVE_SOL_MINT};
use crate::config::Config;
use crate::errors::{BundlerError, Result};
use crate::utils::balance::{format_token_amount, get_token_balance, lamports_to_sol};
use crate::utils::sleep_ms;
use crate::wallet::WalletManager;
use console::{style, Style};
use log::{error, info};
use prettytable::{row, Table};
use solana_sdk::{instruction::Instruction, signature::{Keypair, Signer}};

/// Portion of `balance` to sell, `percentage` in `(0, 100]`.
pub fn sell_amount(balance: u64, percentage: f64) -> Result<u64> {
    if !(percentage > 0.0 && percentage <= 100.0) {
        return Err(BundlerError::InvalidInput(format!(
            "Percentage must be between 0 and 100, got {}",
            percentage
        )));
    }
    if percentage == 100.0 {
        return Ok(balance);
    }
    // Basis points keep the multiplication in integers.
    let bps = (percentage * 100.0).round() as u128;
    Ok((balance as u128 * bps / 10_000) as u64)
}

#[derive(Debug, Clone)]
pub struct SellArgs {
    pub mint: Option<String>,
    pub percentage: f64,
    pub slippage_bps: u16,
    pub use_bundle: bool,
    pub jito_tip_lamports: Option<u64>,
    pub assume_yes: bool,
}

/// Sells a percentage of every bundle wallet's token balance back to SOL.
pub async fn sell_token(config: &Config, args: SellArgs) -> Result<()> {
    let header = Style::new().cyan().bold();
    println!("\n{}", header.apply_to("💸 Bundled Sell"));

    let manager = WalletManager::from_config(config)?;
    let wallets = manager.require_bundle_wallets()?;
    let mint = parse_mint(args.mint.as_deref(), config.token_mint)?;
    sell_amount(0, args.percentage)?;

    let mut holdings: Vec<(&Keypair, u64)> = Vec::new();
    for wallet in wallets {
        let balance = match get_token_balance(manager.rpc(), &wallet.pubkey(), &mint, manager.retry_policy()).await {
            Ok(balance) => balance,
            Err(e) => {
                error!("[{}] Failed to read token balance, wallet left out of the sell: {}", wallet.pubkey(), e);
                sleep_ms(200).await;
                continue;
            }
        };
        let amount = sell_amount(balance, args.percentage)?;
        if amount == 0 {
            info!("[{}] No tokens to sell.", wallet.pubkey());
        } else {
            holdings.push((wallet, amount));
        }
        sleep_ms(200).await;
    }
    if holdings.is_empty() {
        println!("{} No bundle wallet holds {}.", style("⚠️").yellow(), mint);
        return Ok(());
    }

    let pool = fetch_pool_keys(&config.raydium_liquidity_url, &mint, &NATIVE_SOL_MINT).await?;
    let (base, quote) = fetch_reserves(manager.rpc(), &pool).await?;
    let (reserve_in, reserve_out) = directional_reserves(&pool, &mint, base, quote)?;
    let decimals = pool.decimals_of(&mint).unwrap_or(0);

    let amounts: Vec<u64> = holdings.iter().map(|(_, a)| *a).collect();
    let quotes = quote_sequence(&amounts, reserve_in, reserve_out, args.slippage_bps);

    let mut table = Table::new();
    table.add_row(row!["Wallet", "Tokens In", "Expected SOL", "Min SOL"]);
    let mut plans: Vec<(&Keypair, Vec<Instruction>)> = Vec::with_capacity(holdings.len());
    for ((wallet, _), q) in holdings.iter().zip(&quotes) {
        table.add_row(row![
            wallet.pubkey(),
            format_token_amount(q.amount_in, decimals),
            format!("{:.6}", lamports_to_sol(q.expected_out)),
            format!("{:.6}", lamports_to_sol(q.min_amount_out))
        ]);
        let instructions = build_sell_instructions(&wallet.pubkey(), &pool, &mint, q.amount_in, q.min_amount_out)?;
        plans.push((*wallet, instructions));
    }
    table.printstd();

    if !confirm(&format!("Sell {}% from {} wallet(s)?", args.percentage, plans.len()), args.assume_yes)? {
        println!("Sell cancelled.");
        return Ok(());
    }

    let mode = if args.use_bundle {
        SubmitMode::Bundle { tip_lamports: args.jito_tip_lamports.unwrap_or(config.jito_tip_lamports) }
    } else {
        SubmitMode::Sequential
    };
    let jito = JitoClient::new(&config.jito_block_engine_url);
    let summary = submit_plans(&manager, &jito, &plans, mode, "sell").await?;
    println!(
        "{} Sell finished: {} bundle(s), {} transaction(s), {} failure(s)",
        style("✓").green(),
        summary.bundle_ids.len(),
        summary.signatures.len(),
        summary.failures
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sell_amount_percentages() {
        assert_eq!(sell_amount(1_000, 100.0).unwrap(), 1_000);
        assert_eq!(sell_amount(1_000, 50.0).unwrap(), 500);
        assert_eq!(sell_amount(1_000, 12.5).unwrap(), 125);
        assert_eq!(sell_amount(u64::MAX, 100.0).unwrap(), u64::MAX);
        assert_eq!(sell_amount(0, 30.0).unwrap(), 0);
    }

    #[test]
    fn test_sell_amount_rejects_out_of_range() {
        assert!(sell_amount(1_000, 0.0).is_err());
        assert!(sell_amount(1_000, 100.5).is_err());
        assert!(sell_amount(1_000, f64::NAN).is_err());
    }
}
