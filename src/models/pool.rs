use crate::errors::{BundlerError, Result};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// One pool entry as published in Raydium's `liquidity/mainnet.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPoolInfo {
    pub id: String,
    pub base_mint: String,
    pub quote_mint: String,
    pub lp_mint: String,
    pub base_decimals: u8,
    pub quote_decimals: u8,
    #[serde(default)]
    pub lp_decimals: u8,
    #[serde(default = "default_pool_version")]
    pub version: u8,
    pub program_id: String,
    pub authority: String,
    pub open_orders: String,
    pub target_orders: String,
    pub base_vault: String,
    pub quote_vault: String,
    #[serde(default)]
    pub withdraw_queue: Option<String>,
    #[serde(default)]
    pub lp_vault: Option<String>,
    #[serde(default = "default_market_version")]
    pub market_version: u8,
    pub market_program_id: String,
    pub market_id: String,
    pub market_authority: String,
    pub market_base_vault: String,
    pub market_quote_vault: String,
    pub market_bids: String,
    pub market_asks: String,
    pub market_event_queue: String,
    #[serde(default)]
    pub lookup_table_account: Option<String>,
}

fn default_pool_version() -> u8 {
    4
}

fn default_market_version() -> u8 {
    3
}

/// Account set of a Raydium AMM v4 pool, needed to build swap instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolKeys {
    pub id: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub lp_mint: Pubkey,
    pub base_decimals: u8,
    pub quote_decimals: u8,
    pub lp_decimals: u8,
    pub version: u8,
    pub program_id: Pubkey,
    pub authority: Pubkey,
    pub open_orders: Pubkey,
    pub target_orders: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub withdraw_queue: Option<Pubkey>,
    pub lp_vault: Option<Pubkey>,
    pub market_version: u8,
    pub market_program_id: Pubkey,
    pub market_id: Pubkey,
    pub market_authority: Pubkey,
    pub market_base_vault: Pubkey,
    pub market_quote_vault: Pubkey,
    pub market_bids: Pubkey,
    pub market_asks: Pubkey,
    pub market_event_queue: Pubkey,
    pub lookup_table_account: Option<Pubkey>,
}

impl PoolKeys {
    /// Decimals of `mint` within this pool, if it is one of the pool's two sides.
    pub fn decimals_of(&self, mint: &Pubkey) -> Option<u8> {
        if *mint == self.base_mint {
            Some(self.base_decimals)
        } else if *mint == self.quote_mint {
            Some(self.quote_decimals)
        } else {
            None
        }
    }
}

fn parse_key(field: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value)
        .map_err(|e| BundlerError::Api(format!("Pool field '{}' is not a valid address '{}': {}", field, value, e)))
}

fn parse_optional_key(field: &str, value: &Option<String>) -> Result<Option<Pubkey>> {
    match value.as_deref() {
        Some(s) if !s.is_empty() => parse_key(field, s).map(Some),
        _ => Ok(None),
    }
}

impl TryFrom<RawPoolInfo> for PoolKeys {
    type Error = BundlerError;

    fn try_from(raw: RawPoolInfo) -> Result<Self> {
        Ok(PoolKeys {
            id: parse_key("id", &raw.id)?,
            base_mint: parse_key("baseMint", &raw.base_mint)?,
            quote_mint: parse_key("quoteMint", &raw.quote_mint)?,
            lp_mint: parse_key("lpMint", &raw.lp_mint)?,
            base_decimals: raw.base_decimals,
            quote_decimals: raw.quote_decimals,
            lp_decimals: raw.lp_decimals,
            version: raw.version,
            program_id: parse_key("programId", &raw.program_id)?,
            authority: parse_key("authority", &raw.authority)?,
            open_orders: parse_key("openOrders", &raw.open_orders)?,
            target_orders: parse_key("targetOrders", &raw.target_orders)?,
            base_vault: parse_key("baseVault", &raw.base_vault)?,
            quote_vault: parse_key("quoteVault", &raw.quote_vault)?,
            withdraw_queue: parse_optional_key("withdrawQueue", &raw.withdraw_queue)?,
            lp_vault: parse_optional_key("lpVault", &raw.lp_vault)?,
            market_version: raw.market_version,
            market_program_id: parse_key("marketProgramId", &raw.market_program_id)?,
            market_id: parse_key("marketId", &raw.market_id)?,
            market_authority: parse_key("marketAuthority", &raw.market_authority)?,
            market_base_vault: parse_key("marketBaseVault", &raw.market_base_vault)?,
            market_quote_vault: parse_key("marketQuoteVault", &raw.market_quote_vault)?,
            market_bids: parse_key("marketBids", &raw.market_bids)?,
            market_asks: parse_key("marketAsks", &raw.market_asks)?,
            market_event_queue: parse_key("marketEventQueue", &raw.market_event_queue)?,
            lookup_table_account: parse_optional_key("lookupTableAccount", &raw.lookup_table_account)?,
        })
    }
}
