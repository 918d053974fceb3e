use crate::errors::{BundlerError, Result};
use crate::utils::retry::{is_transient_client_error, RetryPolicy};
use log::debug;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;

/// Get SOL balance for a wallet, retrying transient RPC failures.
pub async fn get_sol_balance(rpc_client: &RpcClient, wallet_address: &Pubkey, retry: &RetryPolicy) -> Result<u64> {
    debug!("Getting SOL balance for address: {}", wallet_address);

    let label = format!("balance {}", wallet_address);
    let balance = retry
        .run(&label, || rpc_client.get_balance(wallet_address), is_transient_client_error)
        .await?;

    debug!("SOL balance: {} lamports ({} SOL)", balance, lamports_to_sol(balance));
    Ok(balance)
}

/// Raw token balance of the wallet's associated account for `mint`; 0 when the account does not exist.
///
/// Transient RPC failures are retried and then returned as errors.
pub async fn get_token_balance(
    rpc_client: &RpcClient,
    wallet_address: &Pubkey,
    mint: &Pubkey,
    retry: &RetryPolicy,
) -> Result<u64> {
    let token_account = get_associated_token_address(wallet_address, mint);
    debug!("Getting token balance for wallet: {} and mint: {} (ATA {})", wallet_address, mint, token_account);

    let label = format!("token balance {}", token_account);
    let account = retry
        .run(&label, || rpc_client.get_token_account(&token_account), is_transient_client_error)
        .await?;

    let amount = token_amount_from(account.as_ref().map(|a| a.token_amount.amount.as_str()))?;
    debug!("Token balance of {}: {}", token_account, amount);
    Ok(amount)
}

/// Raw amount of a token account; a missing account holds 0.
fn token_amount_from(raw_amount: Option<&str>) -> Result<u64> {
    match raw_amount {
        None => Ok(0),
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|e| BundlerError::Api(format!("Invalid token amount '{}': {}", raw, e))),
    }
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Converts a SOL amount to lamports. Negative and NaN amounts map to 0.
pub fn sol_to_lamports(sol: f64) -> u64 {
    if !(sol > 0.0) {
        return 0;
    }
    (sol * LAMPORTS_PER_SOL as f64).round() as u64
}

/// Format a raw token amount with its decimals.
pub fn format_token_amount(amount: u64, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }

    let divisor = 10u64.pow(decimals as u32);
    let whole_part = amount / divisor;
    let fractional_part = amount % divisor;
    if fractional_part == 0 {
        return whole_part.to_string();
    }

    let fractional_str = format!("{:0width$}", fractional_part, width = decimals as usize);
    format!("{}.{}", whole_part, fractional_str.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sol_lamport_conversions() {
        assert_eq!(sol_to_lamports(1.0), 1_000_000_000);
        assert_eq!(sol_to_lamports(0.01), 10_000_000);
        assert_eq!(sol_to_lamports(0.123456), 123_456_000);
        assert_eq!(sol_to_lamports(-0.5), 0);
        assert_eq!(sol_to_lamports(f64::NAN), 0);
        assert_eq!(lamports_to_sol(2_500_000_000), 2.5);
    }

    #[test]
    fn test_format_token_amount() {
        assert_eq!(format_token_amount(1_500_000, 6), "1.5");
        assert_eq!(format_token_amount(2_000_000, 6), "2");
        assert_eq!(format_token_amount(42, 0), "42");
        assert_eq!(format_token_amount(1, 9), "0.000000001");
    }

    #[test]
    fn test_token_amount_missing_account_is_zero() {
        assert_eq!(token_amount_from(None).unwrap(), 0);
        assert_eq!(token_amount_from(Some("123456")).unwrap(), 123_456);
    }

    #[test]
    fn test_token_amount_rejects_malformed_values() {
        assert!(matches!(token_amount_from(Some("12.5")), Err(BundlerError::Api(_))));
        assert!(matches!(token_amount_from(Some("")), Err(BundlerError::Api(_))));
    }
}
