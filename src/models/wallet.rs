use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletBalance {
    pub address: Pubkey,
    pub balance: f64,
}

impl fmt::Display for WalletBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} SOL", self.address, self.balance)
    }
}

/// On-disk keys file: `{"wallets": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletKeys {
    pub wallets: Vec<WalletInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletInfo {
    #[serde(default)]
    pub name: Option<String>,
    pub public_key: String,
    pub private_key: String,
}
