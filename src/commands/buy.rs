use super::utils::{confirm, parse_mint, submit_plans, SubmitMode};
use crate::api::jito::JitoClient;
use crate::api::raydium::{
    build_buy_instructions, directional_reserves, fetch_pool_keys, fetch_reserves, min_amount_out_with_slippage,
    quote_amount_out, NATIVE_SOL_MINT,
};
use crate::config::Config;
use crate::errors::{BundlerError, Result};
use crate::utils::balance::{format_token_amount, lamports_to_sol, sol_to_lamports};
use crate::utils::distribution::allocate;
use crate::wallet::WalletManager;
use console::{style, Style};
use log::info;
use prettytable::{row, Table};
use solana_sdk::{instruction::Instruction, signature::{Keypair, Signer}};

pub const DEFAULT_SLIPPAGE_BPS: u16 = 500;

/// One swap in a batch: what goes in and the minimum accepted out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    pub amount_in: u64,
    pub expected_out: u64,
    pub min_amount_out: u64,
}

/// Quotes a sequence of swaps against the same pool, in order.
///
/// Reserves are moved after every quote so later swaps in a bundle see the
/// price impact of the earlier ones.
pub fn quote_sequence(amounts_in: &[u64], reserve_in: u64, reserve_out: u64, slippage_bps: u16) -> Vec<SwapQuote> {
    let mut reserve_in = reserve_in;
    let mut reserve_out = reserve_out;
    amounts_in
        .iter()
        .map(|&amount_in| {
            let expected_out = quote_amount_out(amount_in, reserve_in, reserve_out);
            reserve_in = reserve_in.saturating_add(amount_in);
            reserve_out = reserve_out.saturating_sub(expected_out);
            SwapQuote {
                amount_in,
                expected_out,
                min_amount_out: min_amount_out_with_slippage(expected_out, slippage_bps),
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct BuyArgs {
    pub mint: Option<String>,
    pub total_sol: f64,
    pub slippage_bps: u16,
    pub use_bundle: bool,
    pub jito_tip_lamports: Option<u64>,
    pub assume_yes: bool,
}

/// Buys `total_sol` worth of the token, split randomly across bundle wallets.
pub async fn buy_token(config: &Config, args: BuyArgs) -> Result<()> {
    let header = Style::new().cyan().bold();
    println!("\n{}", header.apply_to("🛒 Bundled Buy"));

    let manager = WalletManager::from_config(config)?;
    let wallets = manager.require_bundle_wallets()?;
    let mint = parse_mint(args.mint.as_deref(), config.token_mint)?;
    if args.slippage_bps > 10_000 {
        return Err(BundlerError::InvalidInput(format!("Slippage {} bps exceeds 100%", args.slippage_bps)));
    }

    let shares = allocate(args.total_sol, wallets.len())?;
    let lamports: Vec<u64> = shares.iter().map(|s| sol_to_lamports(*s)).collect();

    let pool = fetch_pool_keys(&config.raydium_liquidity_url, &NATIVE_SOL_MINT, &mint).await?;
    let (base, quote) = fetch_reserves(manager.rpc(), &pool).await?;
    let (reserve_in, reserve_out) = directional_reserves(&pool, &NATIVE_SOL_MINT, base, quote)?;
    info!("Pool {} reserves: {} lamports in, {} tokens out", pool.id, reserve_in, reserve_out);

    let funded: Vec<(&Keypair, u64)> = wallets.iter().zip(lamports).filter(|(_, l)| *l > 0).collect();
    let amounts: Vec<u64> = funded.iter().map(|(_, l)| *l).collect();
    let quotes = quote_sequence(&amounts, reserve_in, reserve_out, args.slippage_bps);
    let decimals = pool.decimals_of(&mint).unwrap_or(0);

    let mut table = Table::new();
    table.add_row(row!["Wallet", "SOL In", "Expected Out", "Min Out"]);
    let mut plans: Vec<(&Keypair, Vec<Instruction>)> = Vec::with_capacity(funded.len());
    for ((wallet, _), q) in funded.iter().zip(&quotes) {
        table.add_row(row![
            wallet.pubkey(),
            format!("{:.6}", lamports_to_sol(q.amount_in)),
            format_token_amount(q.expected_out, decimals),
            format_token_amount(q.min_amount_out, decimals)
        ]);
        let instructions = build_buy_instructions(&wallet.pubkey(), &pool, &mint, q.amount_in, q.min_amount_out)?;
        plans.push((*wallet, instructions));
    }
    table.printstd();

    let mode = if args.use_bundle {
        SubmitMode::Bundle { tip_lamports: args.jito_tip_lamports.unwrap_or(config.jito_tip_lamports) }
    } else {
        SubmitMode::Sequential
    };
    if !confirm(&format!("Buy with {:.6} SOL across {} wallet(s)?", args.total_sol, plans.len()), args.assume_yes)? {
        println!("Buy cancelled.");
        return Ok(());
    }

    let jito = JitoClient::new(&config.jito_block_engine_url);
    let summary = submit_plans(&manager, &jito, &plans, mode, "buy").await?;
    println!(
        "{} Buy finished: {} bundle(s), {} transaction(s), {} failure(s)",
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
    fn test_quote_sequence_accounts_for_price_impact() {
        let quotes = quote_sequence(&[1_000_000_000, 1_000_000_000], 100_000_000_000, 1_000_000_000_000, 0);
        assert_eq!(quotes.len(), 2);
        assert!(quotes[1].expected_out < quotes[0].expected_out);
        assert_eq!(quotes[0].expected_out, quote_amount_out(1_000_000_000, 100_000_000_000, 1_000_000_000_000));
        assert_eq!(quotes[0].min_amount_out, quotes[0].expected_out);
    }

    #[test]
    fn test_quote_sequence_applies_slippage() {
        let quotes = quote_sequence(&[10_000], 1_000_000, 1_000_000, 100);
        let q = quotes[0];
        assert_eq!(q.min_amount_out, q.expected_out * 99 / 100);
        assert!(quote_sequence(&[], 1, 1, 0).is_empty());
    }
}
