use crate::config::Config;
use crate::errors::Result;
use crate::models::WalletBalance;
use crate::utils::balance::{get_token_balance, lamports_to_sol};
use crate::wallet::WalletManager;
use console::{style, Style};
use log::error;
use prettytable::{row, Table};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;

/// Check wallet balances
pub async fn check_wallets(config: &Config, mint: Option<Pubkey>) -> Result<()> {
    let manager = WalletManager::from_config(config)?;
    let info_style = Style::new().cyan();

    println!("\n{}", info_style.apply_to("🔍 Checking Wallet Balances...").bold());
    let mint = mint.or(config.token_mint);
    match &mint {
        Some(m) => println!("{} {}", info_style.apply_to("Token mint:"), m),
        None => println!("{} No token mint set; showing SOL only.", style("⚠️").yellow()),
    }

    let mut wallets: Vec<(String, Pubkey)> = Vec::new();
    if let Ok(master) = manager.master() {
        wallets.push(("Master".to_string(), master.pubkey()));
    }
    for (index, kp) in manager.bundle_wallets().iter().enumerate() {
        wallets.push((format!("Bundle {}", index + 1), kp.pubkey()));
    }

    let mut table = Table::new();
    table.add_row(row!["Wallet", "Address", "SOL Balance", "Token Balance"]);

    let mut total_sol: u64 = 0;
    let mut total_tokens: u64 = 0;

    let pubkeys: Vec<Pubkey> = wallets.iter().map(|(_, address)| *address).collect();
    let balances = manager.balances(&pubkeys).await;

    for ((name, address), (_, sol)) in wallets.into_iter().zip(balances) {
        let sol = match sol {
            Ok(lamports) => lamports,
            Err(e) => {
                error!("[{}] Failed to get balance: {}", address, e);
                table.add_row(row![name, address, "error", "-"]);
                continue;
            }
        };
        let tokens = match &mint {
            Some(m) => match get_token_balance(manager.rpc(), &address, m, manager.retry_policy()).await {
                Ok(amount) => Some(amount),
                Err(e) => {
                    error!("[{}] Failed to get token balance: {}", address, e);
                    None
                }
            },
            None => None,
        };

        total_sol = total_sol.saturating_add(sol);
        total_tokens = total_tokens.saturating_add(tokens.unwrap_or(0));

        let balance = WalletBalance { address, balance: lamports_to_sol(sol) };
        table.add_row(row![
            name,
            balance.address,
            format!("{:.6} SOL", balance.balance),
            tokens.map_or("-".to_string(), |t| t.to_string())
        ]);
    }

    table.add_row(row![
        "TOTAL",
        "",
        format!("{:.6} SOL", lamports_to_sol(total_sol)),
        if mint.is_some() { total_tokens.to_string() } else { "-".to_string() }
    ]);
    table.printstd();
    Ok(())
}
