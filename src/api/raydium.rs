// Raydium AMM v4 pool lookup and swap instruction building.

use crate::errors::{BundlerError, Result};
use crate::models::pool::{PoolKeys, RawPoolInfo};
use log::{debug, info};
use reqwest::Client;
use serde_json::Value;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_instruction,
};
use spl_associated_token_account::{get_associated_token_address, instruction::create_associated_token_account_idempotent};

pub const NATIVE_SOL_MINT: Pubkey = solana_sdk::pubkey!("So11111111111111111111111111111111111111112");

/// `swap_base_in` instruction tag of the AMM v4 program.
pub const SWAP_BASE_IN_DISCRIMINATOR: u8 = 9;

/// AMM v4 trade fee: 25 bps.
pub const TRADE_FEE_NUMERATOR: u128 = 25;
pub const TRADE_FEE_DENOMINATOR: u128 = 10_000;

const POOL_SECTIONS: [&str; 3] = ["official", "unOfficial", "fusion"];

/// Downloads Raydium's liquidity pool list.
pub async fn fetch_liquidity_list(url: &str) -> Result<Value> {
    info!("Fetching pool data from Raydium API: {}", url);
    let response = Client::new().get(url).send().await?;
    if !response.status().is_success() {
        return Err(BundlerError::Api(format!("Raydium pool list request failed with status {}", response.status())));
    }
    let data: Value = response.json().await?;
    Ok(data)
}

/// Finds the pool trading `mint_a` against `mint_b`, in either order.
///
/// Searches the `official`, `unOfficial` and `fusion` sections in that order;
/// sections that are missing or not arrays are skipped.
pub fn find_pool_keys(list: &Value, mint_a: &Pubkey, mint_b: &Pubkey) -> Result<PoolKeys> {
    let a = mint_a.to_string();
    let b = mint_b.to_string();

    let pools = POOL_SECTIONS
        .iter()
        .filter_map(|section| list.get(section).and_then(Value::as_array))
        .flatten();

    let mut scanned = 0usize;
    for pool in pools {
        scanned += 1;
        let base = pool.get("baseMint").and_then(Value::as_str);
        let quote = pool.get("quoteMint").and_then(Value::as_str);
        let matches = matches!((base, quote), (Some(x), Some(y)) if (x == a && y == b) || (x == b && y == a));
        if matches {
            debug!("Matching pool found after scanning {} pools.", scanned);
            let raw: RawPoolInfo = serde_json::from_value(pool.clone())?;
            return PoolKeys::try_from(raw);
        }
    }

    Err(BundlerError::PoolNotFound(format!("no pool for {} / {} among {} pools", a, b, scanned)))
}

pub async fn fetch_pool_keys(url: &str, mint_a: &Pubkey, mint_b: &Pubkey) -> Result<PoolKeys> {
    let list = fetch_liquidity_list(url).await?;
    let keys = find_pool_keys(&list, mint_a, mint_b)?;
    info!("Pool {} resolved for {} / {}", keys.id, mint_a, mint_b);
    Ok(keys)
}

/// AMM v4 `swap_base_in`: spend exactly `amount_in`, receive at least `min_amount_out`.
pub fn swap_base_in_instruction(
    pool: &PoolKeys,
    user_source_token_account: &Pubkey,
    user_destination_token_account: &Pubkey,
    user_owner: &Pubkey,
    amount_in: u64,
    min_amount_out: u64,
) -> Instruction {
    let mut data = Vec::with_capacity(17);
    data.push(SWAP_BASE_IN_DISCRIMINATOR);
    data.extend_from_slice(&amount_in.to_le_bytes());
    data.extend_from_slice(&min_amount_out.to_le_bytes());

    let accounts = vec![
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new(pool.id, false),
        AccountMeta::new_readonly(pool.authority, false),
        AccountMeta::new(pool.open_orders, false),
        AccountMeta::new(pool.target_orders, false),
        AccountMeta::new(pool.base_vault, false),
        AccountMeta::new(pool.quote_vault, false),
        AccountMeta::new_readonly(pool.market_program_id, false),
        AccountMeta::new(pool.market_id, false),
        AccountMeta::new(pool.market_bids, false),
        AccountMeta::new(pool.market_asks, false),
        AccountMeta::new(pool.market_event_queue, false),
        AccountMeta::new(pool.market_base_vault, false),
        AccountMeta::new(pool.market_quote_vault, false),
        AccountMeta::new_readonly(pool.market_authority, false),
        AccountMeta::new(*user_source_token_account, false),
        AccountMeta::new(*user_destination_token_account, false),
        AccountMeta::new_readonly(*user_owner, true),
    ];

    Instruction {
        program_id: pool.program_id,
        accounts,
        data,
    }
}

/// Constant-product output for `amount_in`, after the trade fee.
pub fn quote_amount_out(amount_in: u64, reserve_in: u64, reserve_out: u64) -> u64 {
    let amount_in = amount_in as u128;
    let in_after_fee = amount_in * (TRADE_FEE_DENOMINATOR - TRADE_FEE_NUMERATOR) / TRADE_FEE_DENOMINATOR;
    let denominator = reserve_in as u128 + in_after_fee;
    if denominator == 0 {
        return 0;
    }
    (reserve_out as u128 * in_after_fee / denominator) as u64
}

pub fn min_amount_out_with_slippage(expected_out: u64, slippage_bps: u16) -> u64 {
    let bps = (slippage_bps as u128).min(10_000);
    (expected_out as u128 * (10_000 - bps) / 10_000) as u64
}

/// Vault balances of the pool as `(base, quote)`.
pub async fn fetch_reserves(rpc_client: &RpcClient, pool: &PoolKeys) -> Result<(u64, u64)> {
    let base = rpc_client.get_token_account_balance(&pool.base_vault).await?;
    let quote = rpc_client.get_token_account_balance(&pool.quote_vault).await?;
    let parse = |amount: &str| {
        amount
            .parse::<u64>()
            .map_err(|e| BundlerError::Api(format!("Invalid vault balance '{}': {}", amount, e)))
    };
    Ok((parse(&base.amount)?, parse(&quote.amount)?))
}

/// Orders `(base, quote)` reserves as `(reserve_in, reserve_out)` for a swap paying `input_mint`.
pub fn directional_reserves(pool: &PoolKeys, input_mint: &Pubkey, base: u64, quote: u64) -> Result<(u64, u64)> {
    if *input_mint == pool.base_mint {
        Ok((base, quote))
    } else if *input_mint == pool.quote_mint {
        Ok((quote, base))
    } else {
        Err(BundlerError::InvalidInput(format!("Mint {} is not part of pool {}", input_mint, pool.id)))
    }
}

fn ensure_sol_pair(pool: &PoolKeys, token_mint: &Pubkey) -> Result<()> {
    let pair = (pool.base_mint, pool.quote_mint);
    if pair == (NATIVE_SOL_MINT, *token_mint) || pair == (*token_mint, NATIVE_SOL_MINT) {
        Ok(())
    } else {
        Err(BundlerError::InvalidInput(format!(
            "Pool {} does not pair {} with SOL",
            pool.id, token_mint
        )))
    }
}

/// Wrap `lamports_in` SOL, swap it for `token_mint`, then unwrap the leftover WSOL.
pub fn build_buy_instructions(
    owner: &Pubkey,
    pool: &PoolKeys,
    token_mint: &Pubkey,
    lamports_in: u64,
    min_amount_out: u64,
) -> Result<Vec<Instruction>> {
    ensure_sol_pair(pool, token_mint)?;
    let wsol_account = get_associated_token_address(owner, &NATIVE_SOL_MINT);
    let token_account = get_associated_token_address(owner, token_mint);

    Ok(vec![
        create_associated_token_account_idempotent(owner, owner, &NATIVE_SOL_MINT, &spl_token::id()),
        system_instruction::transfer(owner, &wsol_account, lamports_in),
        spl_token::instruction::sync_native(&spl_token::id(), &wsol_account)?,
        create_associated_token_account_idempotent(owner, owner, token_mint, &spl_token::id()),
        swap_base_in_instruction(pool, &wsol_account, &token_account, owner, lamports_in, min_amount_out),
        spl_token::instruction::close_account(&spl_token::id(), &wsol_account, owner, owner, &[])?,
    ])
}

/// Swap `amount_in` of `token_mint` into WSOL and close the WSOL account to unwrap.
pub fn build_sell_instructions(
    owner: &Pubkey,
    pool: &PoolKeys,
    token_mint: &Pubkey,
    amount_in: u64,
    min_amount_out: u64,
) -> Result<Vec<Instruction>> {
    ensure_sol_pair(pool, token_mint)?;
    let wsol_account = get_associated_token_address(owner, &NATIVE_SOL_MINT);
    let token_account = get_associated_token_address(owner, token_mint);

    Ok(vec![
        create_associated_token_account_idempotent(owner, owner, &NATIVE_SOL_MINT, &spl_token::id()),
        swap_base_in_instruction(pool, &token_account, &wsol_account, owner, amount_in, min_amount_out),
        spl_token::instruction::close_account(&spl_token::id(), &wsol_account, owner, owner, &[])?,
    ])
}
