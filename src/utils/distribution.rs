//! Random proportional split of a total across wallets.
//!
//! Each share is rounded to [`AMOUNT_DECIMALS`] places and the rounding
//! residual is folded into the first share, so the result always reconciles
//! to the requested total.

use crate::errors::{BundlerError, Result};
use log::{debug, warn};
use rand::Rng;

/// Precision every allocated share is rounded to.
pub const AMOUNT_DECIMALS: i32 = 6;

/// Splits `total` into `count` randomly weighted shares using the thread RNG.
pub fn allocate(total: f64, count: usize) -> Result<Vec<f64>> {
    allocate_with_rng(total, count, &mut rand::thread_rng())
}

/// Same as [`allocate`] with a caller-provided random source.
///
/// The first element absorbs the whole rounding residual. For very large
/// `count` relative to `total` this can push it below zero; that case is
/// logged, not corrected.
pub fn allocate_with_rng<R: Rng + ?Sized>(total: f64, count: usize, rng: &mut R) -> Result<Vec<f64>> {
    if count == 0 {
        return Err(BundlerError::InvalidInput("Wallet count must be at least 1".to_string()));
    }
    if !total.is_finite() || total < 0.0 {
        return Err(BundlerError::InvalidInput(format!(
            "Total amount must be a finite non-negative number, got {}",
            total
        )));
    }

    debug!("Distributing total amount {} among {} wallets.", total, count);

    let draws: Vec<f64> = (0..count).map(|_| rng.gen::<f64>()).collect();
    let weights = normalize(&draws);

    let mut amounts: Vec<f64> = weights
        .iter()
        .map(|weight| round_to_decimals(weight * total, AMOUNT_DECIMALS))
        .collect();

    let rounded_sum: f64 = amounts.iter().sum();
    let residual = total - rounded_sum;
    amounts[0] += residual;
    debug!("Sum of rounded amounts: {}, residual {} added to first share.", rounded_sum, residual);

    if amounts[0] < 0.0 {
        warn!(
            "Rounding residual {} drove the first share negative ({}); total {} is too small for {} shares.",
            residual, amounts[0], total, count
        );
    }

    Ok(amounts)
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to_decimals(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn normalize(draws: &[f64]) -> Vec<f64> {
    let sum: f64 = draws.iter().sum();
    if sum > 0.0 {
        draws.iter().map(|draw| draw / sum).collect()
    } else {
        warn!("All {} random draws were zero, falling back to equal weights.", draws.len());
        vec![1.0 / draws.len() as f64; draws.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_sums_to(amounts: &[f64], total: f64) {
        let sum: f64 = amounts.iter().sum();
        let tolerance = 1e-9 * total.max(1.0);
        assert!((sum - total).abs() <= tolerance, "sum {} != total {}", sum, total);
    }

    #[test]
    fn test_returns_one_share_per_wallet() {
        let mut rng = StdRng::seed_from_u64(7);
        for count in [1usize, 2, 5, 17, 100] {
            let amounts = allocate_with_rng(1234.5, count, &mut rng).unwrap();
            assert_eq!(amounts.len(), count);
        }
    }

    #[test]
    fn test_shares_reconcile_to_total() {
        let mut rng = StdRng::seed_from_u64(42);
        for &(total, count) in &[(20000.0, 5), (0.0000001, 3), (1.0, 10), (0.01, 7), (987654.321, 50)] {
            let amounts = allocate_with_rng(total, count, &mut rng).unwrap();
            assert_sums_to(&amounts, total);
        }
    }

    #[test]
    fn test_single_wallet_gets_everything() {
        for total in [20000.0, 0.1234567891, 0.0] {
            assert_eq!(allocate(total, 1).unwrap(), vec![total]);
        }
    }

    #[test]
    fn test_zero_total_yields_zeros() {
        let amounts = allocate(0.0, 8).unwrap();
        assert_eq!(amounts, vec![0.0; 8]);
    }

    #[test]
    fn test_shares_are_rounded_to_six_decimals() {
        let mut rng = StdRng::seed_from_u64(3);
        let amounts = allocate_with_rng(20000.0, 5, &mut rng).unwrap();
        for amount in &amounts[1..] {
            let scaled = amount * 1e6;
            assert!((scaled - scaled.round()).abs() < 1e-3, "{} has more than 6 decimals", amount);
        }
    }

    #[test]
    fn test_shares_non_negative_for_reasonable_inputs() {
        let mut rng = StdRng::seed_from_u64(2024);
        for count in 1..=50 {
            let amounts = allocate_with_rng(20000.0, count, &mut rng).unwrap();
            assert!(amounts.iter().all(|a| *a >= 0.0), "negative share in {:?}", amounts);
        }
    }

    #[test]
    fn test_twenty_thousand_over_five_wallets() {
        let amounts = allocate(20000.0, 5).unwrap();
        assert_eq!(amounts.len(), 5);
        assert!(amounts.iter().all(|a| *a > 0.0 && *a < 20000.0));
        assert_sums_to(&amounts, 20000.0);
        assert_eq!(format!("{:.6}", amounts.iter().sum::<f64>()), "20000.000000");
    }

    #[test]
    fn test_repeated_calls_vary() {
        let first = allocate(20000.0, 5).unwrap();
        let differs = (0..10).any(|_| allocate(20000.0, 5).unwrap() != first);
        assert!(differs);
    }

    // Many shares of a tiny total: rounding drift lands on the first share and
    // may make it negative. Only the sum is guaranteed here.
    #[test]
    fn test_tiny_total_many_wallets_still_reconciles() {
        let mut rng = StdRng::seed_from_u64(11);
        let amounts = allocate_with_rng(0.000001, 1000, &mut rng).unwrap();
        assert_eq!(amounts.len(), 1000);
        assert!(amounts[1..].iter().all(|a| *a >= 0.0));
        assert_sums_to(&amounts, 0.000001);
    }

    #[test]
    fn test_all_zero_draws_fall_back_to_equal_weights() {
        let mut rng = StepRng::new(0, 0);
        let amounts = allocate_with_rng(10.0, 4, &mut rng).unwrap();
        assert_eq!(amounts, vec![2.5; 4]);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        assert!(matches!(allocate(10.0, 0), Err(BundlerError::InvalidInput(_))));
        assert!(matches!(allocate(-1.0, 3), Err(BundlerError::InvalidInput(_))));
        assert!(matches!(allocate(f64::NAN, 3), Err(BundlerError::InvalidInput(_))));
        assert!(matches!(allocate(f64::INFINITY, 3), Err(BundlerError::InvalidInput(_))));
    }

    #[test]
    fn test_round_to_decimals() {
        assert_eq!(round_to_decimals(1.23456789, 6), 1.234568);
        assert_eq!(round_to_decimals(2.0000004, 6), 2.0);
        assert_eq!(round_to_decimals(0.0, 6), 0.0);
    }
}
