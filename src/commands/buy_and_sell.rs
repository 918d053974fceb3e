use super::buy::{buy_token, BuyArgs};
use super::sell::{sell_token, SellArgs};
use crate::config::Config;
use crate::errors::Result;
use crate::utils::sleep_ms;
use log::info;

#[derive(Debug, Clone)]
pub struct BuyAndSellArgs {
    pub mint: Option<String>,
    pub total_sol: f64,
    pub percentage: f64,
    pub slippage_bps: u16,
    pub use_bundle: bool,
    pub jito_tip_lamports: Option<u64>,
    pub sell_delay_ms: u64,
    pub assume_yes: bool,
}

impl BuyAndSellArgs {
    /// Buy and sell legs sharing the same mint, slippage and submission settings.
    pub fn legs(&self) -> (BuyArgs, SellArgs) {
        let buy = BuyArgs {
            mint: self.mint.clone(),
            total_sol: self.total_sol,
            slippage_bps: self.slippage_bps,
            use_bundle: self.use_bundle,
            jito_tip_lamports: self.jito_tip_lamports,
            assume_yes: self.assume_yes,
        };
        let sell = SellArgs {
            mint: self.mint.clone(),
            percentage: self.percentage,
            slippage_bps: self.slippage_bps,
            use_bundle: self.use_bundle,
            jito_tip_lamports: self.jito_tip_lamports,
            assume_yes: self.assume_yes,
        };
        (buy, sell)
    }
}

/// Runs a bundled buy, then sells from the same wallets.
pub async fn buy_and_sell_token(config: &Config, args: BuyAndSellArgs) -> Result<()> {
    let (buy, sell) = args.legs();

    buy_token(config, buy).await?;
    if args.sell_delay_ms > 0 {
        info!("Waiting {} ms before selling.", args.sell_delay_ms);
        sleep_ms(args.sell_delay_ms).await;
    }
    sell_token(config, sell).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legs_share_settings() {
        let args = BuyAndSellArgs {
            mint: Some("So11111111111111111111111111111111111111112".to_string()),
            total_sol: 2.0,
            percentage: 50.0,
            slippage_bps: 300,
            use_bundle: false,
            jito_tip_lamports: Some(20_000),
            sell_delay_ms: 0,
            assume_yes: true,
        };
        let (buy, sell) = args.legs();

        assert_eq!(buy.mint, sell.mint);
        assert_eq!(buy.total_sol, 2.0);
        assert_eq!(sell.percentage, 50.0);
        assert_eq!((buy.slippage_bps, sell.slippage_bps), (300, 300));
        assert!(!buy.use_bundle && !sell.use_bundle);
        assert_eq!(buy.jito_tip_lamports, sell.jito_tip_lamports);
        assert!(buy.assume_yes && sell.assume_yes);
    }
}
