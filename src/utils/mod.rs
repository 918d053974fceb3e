// src/utils/mod.rs

use rand::Rng;
use std::time::Duration;

pub mod balance;
pub mod distribution;
pub mod retry;
pub mod transaction;

pub use balance::{format_token_amount, get_sol_balance, get_token_balance, lamports_to_sol, sol_to_lamports};
pub use distribution::{allocate, allocate_with_rng};
pub use retry::RetryPolicy;

/// Sleep for the specified milliseconds
pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Get a random number between min and max (inclusive)
pub fn get_random_number(min: usize, max: usize) -> usize {
    let mut rng = rand::thread_rng();
    rng.gen_range(min..=max)
}
