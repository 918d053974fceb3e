use crate::errors::{BundlerError, Result};
use crate::utils::retry::{is_transient_client_error, RetryPolicy};
use log::{debug, error, info};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};

pub const EXPLORER_TX_URL: &str = "https://explorer.solana.com/tx";

/// Latest blockhash, retrying transient RPC failures.
pub async fn get_latest_blockhash(rpc_client: &RpcClient, retry: &RetryPolicy) -> Result<Hash> {
    let blockhash = retry
        .run("latest blockhash", || rpc_client.get_latest_blockhash(), is_transient_client_error)
        .await?;
    debug!("Latest blockhash: {}", blockhash);
    Ok(blockhash)
}

/// Builds a legacy transaction paid and signed by `payer`.
pub fn build_signed_transaction(instructions: &[Instruction], payer: &Keypair, recent_blockhash: Hash) -> Transaction {
    Transaction::new_signed_with_payer(instructions, Some(&payer.pubkey()), &[payer], recent_blockhash)
}

/// Simulates first and refuses to send a transaction the node says would fail.
pub async fn simulate_and_send(rpc_client: &RpcClient, transaction: &Transaction, label: &str) -> Result<Signature> {
    let simulation = rpc_client.simulate_transaction(transaction).await?;
    if let Some(err) = simulation.value.err {
        let logs = simulation.value.logs.unwrap_or_default();
        error!("[{}] Simulation failed: {}. Logs: {:?}", label, err, logs);
        return Err(BundlerError::Transaction(format!("[{}] simulation failed: {}", label, err)));
    }
    send_and_confirm(rpc_client, transaction, label).await
}

pub async fn send_and_confirm(rpc_client: &RpcClient, transaction: &Transaction, label: &str) -> Result<Signature> {
    info!("[{}] Sending transaction...", label);
    let signature = rpc_client.send_and_confirm_transaction(transaction).await?;
    info!("[{}] Confirmed: {}", label, explorer_tx_url(&signature));
    Ok(signature)
}

pub fn explorer_tx_url(signature: &Signature) -> String {
    format!("{}/{}", EXPLORER_TX_URL, signature)
}
