use crate::api::jito::{assemble_bundles, JitoClient};
use crate::errors::{BundlerError, Result};
use crate::utils::sleep_ms;
use crate::utils::transaction::{build_signed_transaction, explorer_tx_url, get_latest_blockhash, simulate_and_send};
use crate::wallet::WalletManager;
use console::{style, Term};
use log::{error, info, warn};
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use std::str::FromStr;

/// How a batch of per-wallet transactions reaches the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Jito bundles of up to five transactions, each bundle tipping `tip_lamports`.
    Bundle { tip_lamports: u64 },
    /// One simulated-then-sent transaction per wallet.
    Sequential,
}

#[derive(Debug, Default)]
pub struct SubmitSummary {
    pub bundle_ids: Vec<String>,
    pub signatures: Vec<Signature>,
    pub failures: usize,
}

/// Asks for confirmation on the terminal unless `assume_yes` is set.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let term = Term::stdout();
    term.write_str(&format!("{} [y/N]: ", style(prompt).yellow()))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub fn parse_mint(mint: Option<&str>, fallback: Option<Pubkey>) -> Result<Pubkey> {
    match mint {
        Some(s) => Ok(Pubkey::from_str(s.trim())?),
        None => fallback.ok_or_else(|| {
            BundlerError::InvalidInput("No token mint given. Pass --mint or set TOKEN_MINT_ADDRESS.".to_string())
        }),
    }
}

/// Signs and submits one transaction per `(signer, instructions)` plan.
///
/// Failures of individual bundles or transactions are logged and counted;
/// only a failure shared by every plan (blockhash) is returned as an error.
pub async fn submit_plans(
    manager: &WalletManager,
    jito: &JitoClient,
    plans: &[(&Keypair, Vec<Instruction>)],
    mode: SubmitMode,
    label: &str,
) -> Result<SubmitSummary> {
    let mut summary = SubmitSummary::default();
    if plans.is_empty() {
        warn!("[{}] Nothing to submit.", label);
        return Ok(summary);
    }

    match mode {
        SubmitMode::Bundle { tip_lamports } => {
            let blockhash = get_latest_blockhash(manager.rpc(), manager.retry_policy()).await?;
            let bundles = assemble_bundles(plans, tip_lamports, blockhash)?;
            for (index, bundle) in bundles.iter().enumerate() {
                match jito.send_bundle(bundle).await {
                    Ok(bundle_id) => {
                        println!("{} Bundle {} accepted: {}", style("✓").green(), index + 1, bundle_id);
                        summary.bundle_ids.push(bundle_id);
                    }
                    Err(e) => {
                        error!("[{}] Bundle {} failed: {}", label, index + 1, e);
                        summary.failures += bundle.len();
                    }
                }
            }
        }
        SubmitMode::Sequential => {
            for (signer, instructions) in plans {
                let tx_label = format!("{} {}", label, signer.pubkey());
                let result = async {
                    let blockhash = get_latest_blockhash(manager.rpc(), manager.retry_policy()).await?;
                    let transaction = build_signed_transaction(instructions, signer, blockhash);
                    simulate_and_send(manager.rpc(), &transaction, &tx_label).await
                }
                .await;

                match result {
                    Ok(signature) => {
                        println!("{} {}", style("✓").green(), explorer_tx_url(&signature));
                        summary.signatures.push(signature);
                    }
                    Err(e) => {
                        error!("[{}] Failed: {}", tx_label, e);
                        summary.failures += 1;
                    }
                }
                sleep_ms(500).await;
            }
        }
    }

    info!(
        "[{}] Submitted: {} bundle(s), {} transaction(s), {} failure(s)",
        label,
        summary.bundle_ids.len(),
        summary.signatures.len(),
        summary.failures
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_assume_yes_skips_prompt() {
        assert!(confirm("Proceed?", true).unwrap());
    }

    #[test]
    fn test_parse_mint_prefers_argument() {
        let configured = Pubkey::new_unique();
        let given = Pubkey::new_unique();
        assert_eq!(parse_mint(Some(&given.to_string()), Some(configured)).unwrap(), given);
        assert_eq!(parse_mint(None, Some(configured)).unwrap(), configured);
        assert!(matches!(parse_mint(None, None), Err(BundlerError::InvalidInput(_))));
        assert!(parse_mint(Some("not-a-key"), None).is_err());
    }
}
