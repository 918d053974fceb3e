pub mod api;
pub mod pool;
pub mod wallet;

pub use pool::PoolKeys;
pub use wallet::{WalletBalance, WalletInfo, WalletKeys};
