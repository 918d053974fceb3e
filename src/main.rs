use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use raydium_bundler::commands::{
    buy_and_sell_token, buy_token, check_bundle_status, check_wallets, gather_sol, generate_wallets, list_wallets,
    sell_token, top_up_wallets, BuyAndSellArgs, BuyArgs, SellArgs,
};
use raydium_bundler::commands::buy::DEFAULT_SLIPPAGE_BPS;
use raydium_bundler::commands::utils::parse_mint;
use raydium_bundler::config::Config;
use raydium_bundler::wallet::KeyEncoding;

#[derive(Parser, Debug)]
#[command(
    name = "raydium-bundler",
    version,
    about = "Fund wallets and run bundled Raydium buys and sells on Solana",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List bundle wallets, or generate new ones
    Wallets {
        /// Generate new bundle wallets (5 when no count is given)
        #[arg(long, num_args = 0..=1, default_missing_value = "5")]
        generate: Option<usize>,
        /// Encoding used when storing generated keys
        #[arg(long, value_enum, default_value_t = KeyEncoding::Hex)]
        encoding: KeyEncoding,
        /// Env file to store generated keys in (defaults to ENV_FILE_PATH or .env)
        #[arg(long)]
        env_file: Option<PathBuf>,
        /// Also write generated keys to this JSON keys file
        #[arg(long)]
        keys_out: Option<PathBuf>,
    },
    /// Show SOL and token balances of the master and bundle wallets
    Check {
        /// Token mint address (defaults to TOKEN_MINT_ADDRESS)
        #[arg(short, long)]
        mint: Option<String>,
    },
    /// Send SOL from the master wallet to every bundle wallet
    TopUp {
        /// SOL sent to each wallet (default 0.01)
        #[arg(long, conflicts_with = "total")]
        amount: Option<f64>,
        /// Total SOL split randomly across wallets
        #[arg(long)]
        total: Option<f64>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Sweep SOL from bundle wallets back to the master wallet
    Gather {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Buy a token with all bundle wallets
    Buy {
        /// Token mint address (defaults to TOKEN_MINT_ADDRESS)
        #[arg(short, long)]
        mint: Option<String>,
        /// Total SOL to spend, split randomly across wallets
        #[arg(short, long)]
        total: f64,
        /// Slippage tolerance in basis points
        #[arg(long, default_value_t = DEFAULT_SLIPPAGE_BPS)]
        slippage_bps: u16,
        /// Send transactions one by one instead of as Jito bundles
        #[arg(long)]
        no_bundle: bool,
        /// Jito tip per bundle in lamports (defaults to JITO_TIP_LAMPORTS)
        #[arg(long)]
        jito_tip: Option<u64>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Sell a token from all bundle wallets
    Sell {
        /// Token mint address (defaults to TOKEN_MINT_ADDRESS)
        #[arg(short, long)]
        mint: Option<String>,
        /// Percentage of each wallet's balance to sell (0-100)
        #[arg(short, long, default_value_t = 100.0)]
        percentage: f64,
        /// Slippage tolerance in basis points
        #[arg(long, default_value_t = DEFAULT_SLIPPAGE_BPS)]
        slippage_bps: u16,
        /// Send transactions one by one instead of as Jito bundles
        #[arg(long)]
        no_bundle: bool,
        /// Jito tip per bundle in lamports (defaults to JITO_TIP_LAMPORTS)
        #[arg(long)]
        jito_tip: Option<u64>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Buy with all bundle wallets, then sell from them
    BuyAndSell {
        /// Token mint address (defaults to TOKEN_MINT_ADDRESS)
        #[arg(short, long)]
        mint: Option<String>,
        /// Total SOL to spend, split randomly across wallets
        #[arg(short, long)]
        total: f64,
        /// Percentage of each wallet's balance to sell afterwards (0-100)
        #[arg(short, long, default_value_t = 100.0)]
        percentage: f64,
        /// Slippage tolerance in basis points
        #[arg(long, default_value_t = DEFAULT_SLIPPAGE_BPS)]
        slippage_bps: u16,
        /// Send transactions one by one instead of as Jito bundles
        #[arg(long)]
        no_bundle: bool,
        /// Jito tip per bundle in lamports (defaults to JITO_TIP_LAMPORTS)
        #[arg(long)]
        jito_tip: Option<u64>,
        /// Milliseconds to wait between the buy and the sell
        #[arg(long, default_value_t = 0)]
        sell_delay_ms: u64,
        /// Skip the confirmation prompts
        #[arg(short, long)]
        yes: bool,
    },
    /// Check the status of submitted Jito bundles
    BundleStatus {
        /// Bundle ids returned by `buy` or `sell`
        #[arg(required = true)]
        bundle_ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;
    info!("Using RPC endpoint {}", config.solana_rpc_url);

    match cli.command {
        Commands::Wallets { generate: Some(count), encoding, env_file, keys_out } => {
            let env_file = env_file.unwrap_or_else(|| config.env_file_path.clone());
            generate_wallets(count, encoding, &env_file, keys_out.as_deref())
                .context("Failed to generate bundle wallets")?;
        }
        Commands::Wallets { generate: None, .. } => {
            list_wallets(&config).context("Failed to list wallets")?;
        }
        Commands::Check { mint } => {
            let mint = mint.as_deref().map(|m| parse_mint(Some(m), None)).transpose()?;
            check_wallets(&config, mint).await.context("Failed to check balances")?;
        }
        Commands::TopUp { amount, total, yes } => {
            top_up_wallets(&config, amount, total, yes).await.context("Top-up failed")?;
        }
        Commands::Gather { yes } => {
            gather_sol(&config, yes).await.context("Gather failed")?;
        }
        Commands::Buy { mint, total, slippage_bps, no_bundle, jito_tip, yes } => {
            let args = BuyArgs {
                mint,
                total_sol: total,
                slippage_bps,
                use_bundle: !no_bundle,
                jito_tip_lamports: jito_tip,
                assume_yes: yes,
            };
            buy_token(&config, args).await.context("Buy failed")?;
        }
        Commands::Sell { mint, percentage, slippage_bps, no_bundle, jito_tip, yes } => {
            let args = SellArgs {
                mint,
                percentage,
                slippage_bps,
                use_bundle: !no_bundle,
                jito_tip_lamports: jito_tip,
                assume_yes: yes,
            };
            sell_token(&config, args).await.context("Sell failed")?;
        }
        Commands::BuyAndSell { mint, total, percentage, slippage_bps, no_bundle, jito_tip, sell_delay_ms, yes } => {
            let args = BuyAndSellArgs {
                mint,
                total_sol: total,
                percentage,
                slippage_bps,
                use_bundle: !no_bundle,
                jito_tip_lamports: jito_tip,
                sell_delay_ms,
                assume_yes: yes,
            };
            buy_and_sell_token(&config, args).await.context("Buy and sell failed")?;
        }
        Commands::BundleStatus { bundle_ids } => {
            check_bundle_status(&config, &bundle_ids).await.context("Bundle status lookup failed")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_buy_defaults() {
        let cli = Cli::try_parse_from(["raydium-bundler", "buy", "--total", "1.5"]).unwrap();
        match cli.command {
            Commands::Buy { total, slippage_bps, no_bundle, mint, .. } => {
                assert_eq!(total, 1.5);
                assert_eq!(slippage_bps, DEFAULT_SLIPPAGE_BPS);
                assert!(!no_bundle);
                assert!(mint.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_top_up_amount_conflicts_with_total() {
        assert!(Cli::try_parse_from(["raydium-bundler", "top-up", "--amount", "1", "--total", "2"]).is_err());
    }

    #[test]
    fn test_wallets_generate_encoding() {
        let cli = Cli::try_parse_from(["raydium-bundler", "wallets", "--generate", "3", "--encoding", "hex"]).unwrap();
        assert!(matches!(cli.command, Commands::Wallets { generate: Some(3), encoding: KeyEncoding::Hex, .. }));
    }

    #[test]
    fn test_parse_buy_and_sell_defaults() {
        let cli = Cli::try_parse_from(["raydium-bundler", "buy-and-sell", "--total", "2", "--jito-tip", "5000"]).unwrap();
        match cli.command {
            Commands::BuyAndSell { total, percentage, slippage_bps, no_bundle, jito_tip, sell_delay_ms, yes, mint } => {
                assert_eq!(total, 2.0);
                assert_eq!(percentage, 100.0);
                assert_eq!(slippage_bps, DEFAULT_SLIPPAGE_BPS);
                assert!(!no_bundle);
                assert_eq!(jito_tip, Some(5000));
                assert_eq!(sell_delay_ms, 0);
                assert!(!yes);
                assert!(mint.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["raydium-bundler", "buy-and-sell"]).is_err());
    }

    #[test]
    fn test_wallets_generate_defaults_to_five_hex_keys() {
        let cli = Cli::try_parse_from(["raydium-bundler", "wallets", "--generate"]).unwrap();
        assert!(matches!(cli.command, Commands::Wallets { generate: Some(5), encoding: KeyEncoding::Hex, .. }));

        let cli = Cli::try_parse_from(["raydium-bundler", "wallets"]).unwrap();
        assert!(matches!(cli.command, Commands::Wallets { generate: None, .. }));
    }
}
