pub mod jito;
pub mod raydium;

pub use jito::JitoClient;
pub use raydium::{fetch_pool_keys, find_pool_keys};
