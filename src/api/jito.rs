use crate::errors::{BundlerError, Result};
use crate::models::api::{BundleStatus, BundleStatusesResult, JsonRpcRequest, JsonRpcResponse};
use crate::utils::get_random_number;
use log::{debug, error, info};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
    transaction::Transaction,
};
use std::str::FromStr;
use std::time::Duration;

/// Jito accepts at most this many transactions per bundle.
pub const MAX_BUNDLE_SIZE: usize = 5;

pub const JITO_TIP_ACCOUNTS: [&str; 8] = [
    "96gYZGLnJYVFmbjzopPSU6QiEV5fGqZNyN9nmNhvrZU5",
    "HFqU5x63VTqvQss8hp11i4wVV8bD44PvwucfZ2bU7gRe",
    "Cw8CFyM9FkoMi7K7Crf6HNQqf4uEMzpKw6QNghXLvLkY",
    "ADaUMid9yfUytqMBgopwjb2DTLSokTSzL1zt6iGPaS49",
    "DfXygSm4jCyNCybVYYK6DwvWqjKee8pbDmJGcLWNDXjh",
    "ADuUkR4vqLUMWXxW9gh6D6L8pMSawimctcNZ5pGwDcEt",
    "DttWaMuVvTiduZRnguLF7jNxTgiMBZ1hyAumKUiL2KRL",
    "3AVi9Tg9Uo68tJfuvoKvqKNWKkC5wPdSSdeBnizKZ6jT",
];

/// Transfer of `lamports` from `payer` to a randomly chosen Jito tip account.
pub fn tip_instruction(payer: &Pubkey, lamports: u64) -> Result<Instruction> {
    let tip_account = Pubkey::from_str(JITO_TIP_ACCOUNTS[get_random_number(0, JITO_TIP_ACCOUNTS.len() - 1)])?;
    Ok(system_instruction::transfer(payer, &tip_account, lamports))
}

/// Serializes a signed transaction and encodes it as base58, the encoding
/// `sendBundle` defaults to.
pub fn encode_transaction(transaction: &Transaction) -> Result<String> {
    let serialized = bincode::serialize(transaction)
        .map_err(|e| BundlerError::Transaction(format!("Failed to serialize transaction: {}", e)))?;
    Ok(bs58::encode(serialized).into_string())
}

pub fn build_send_bundle_request(transactions: &[Transaction]) -> Result<JsonRpcRequest> {
    if transactions.is_empty() {
        return Err(BundlerError::Jito("No transactions to send in bundle".to_string()));
    }
    if transactions.len() > MAX_BUNDLE_SIZE {
        return Err(BundlerError::Jito(format!(
            "Bundle has {} transactions; Jito accepts at most {}",
            transactions.len(),
            MAX_BUNDLE_SIZE
        )));
    }

    let encoded = transactions.iter().map(encode_transaction).collect::<Result<Vec<String>>>()?;
    Ok(JsonRpcRequest::new("sendBundle", json!([encoded])))
}

/// Signs one transaction per `(signer, instructions)` pair and groups them
/// into bundles of at most [`MAX_BUNDLE_SIZE`]. With a non-zero tip, the last
/// transaction of every bundle also pays the tip.
pub fn assemble_bundles(
    plans: &[(&Keypair, Vec<Instruction>)],
    tip_lamports: u64,
    recent_blockhash: Hash,
) -> Result<Vec<Vec<Transaction>>> {
    let mut bundles = Vec::new();
    for chunk in plans.chunks(MAX_BUNDLE_SIZE) {
        let mut bundle = Vec::with_capacity(chunk.len());
        for (index, (signer, instructions)) in chunk.iter().enumerate() {
            let mut instructions = instructions.clone();
            if tip_lamports > 0 && index == chunk.len() - 1 {
                instructions.push(tip_instruction(&signer.pubkey(), tip_lamports)?);
            }
            let transaction = Transaction::new_signed_with_payer(
                &instructions,
                Some(&signer.pubkey()),
                &[*signer],
                recent_blockhash,
            );
            bundle.push(transaction);
        }
        bundles.push(bundle);
    }
    debug!("Assembled {} transaction(s) into {} bundle(s)", plans.len(), bundles.len());
    Ok(bundles)
}

/// JSON-RPC client for the Jito block engine.
pub struct JitoClient {
    client: Client,
    base_url: String,
}

impl JitoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn bundles_endpoint(&self) -> String {
        format!("{}/api/v1/bundles", self.base_url)
    }

    /// Submits a bundle and returns the bundle id assigned by the block engine.
    pub async fn send_bundle(&self, transactions: &[Transaction]) -> Result<String> {
        let request = build_send_bundle_request(transactions)?;
        info!("Sending bundle of {} transaction(s) to {}", transactions.len(), self.bundles_endpoint());
        let bundle_id: String = self.call(&request).await?;
        info!("Jito bundle submitted successfully. Bundle ID: {}", bundle_id);
        Ok(bundle_id)
    }

    pub async fn bundle_statuses(&self, bundle_ids: &[String]) -> Result<Vec<Option<BundleStatus>>> {
        if bundle_ids.is_empty() || bundle_ids.len() > MAX_BUNDLE_SIZE {
            return Err(BundlerError::InvalidInput(format!(
                "getBundleStatuses takes 1 to {} bundle ids, got {}",
                MAX_BUNDLE_SIZE,
                bundle_ids.len()
            )));
        }
        let request = JsonRpcRequest::new("getBundleStatuses", json!([bundle_ids]));
        let result: BundleStatusesResult = self.call(&request).await?;
        Ok(result.value)
    }

    async fn call<T: DeserializeOwned>(&self, request: &JsonRpcRequest) -> Result<T> {
        debug!("Jito request: {}", serde_json::to_string(request).unwrap_or_default());

        let response = self
            .client
            .post(self.bundles_endpoint())
            .json(request)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Jito response ({}): {}", status, body);

        if !status.is_success() {
            error!("Jito API Error ({}): {}", status, body);
            return Err(BundlerError::Jito(format!("{} request failed with status {}: {}", request.method, status, body)));
        }
        parse_rpc_response(&request.method, &body)
    }
}

fn parse_rpc_response<T: DeserializeOwned>(method: &str, body: &str) -> Result<T> {
    let response: JsonRpcResponse<T> = serde_json::from_str(body)
        .map_err(|e| BundlerError::Jito(format!("Failed to parse {} response: {}", method, e)))?;

    match (response.result, response.error) {
        (_, Some(err)) => Err(BundlerError::Jito(format!("{} error {}: {}", method, err.code, err.message))),
        (Some(result), None) => Ok(result),
        (None, None) => Err(BundlerError::Jito(format!("{} response has neither result nor error", method))),
    }
}
