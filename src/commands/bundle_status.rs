use crate::api::jito::JitoClient;
use crate::config::Config;
use crate::errors::Result;
use crate::models::api::BundleStatus;
use console::Style;
use prettytable::{row, Table};

fn status_label(status: &Option<BundleStatus>) -> String {
    match status {
        None => "not found".to_string(),
        Some(s) if s.err.as_ref().map_or(false, |e| !e.is_null() && e.get("Ok").is_none()) => "failed".to_string(),
        Some(s) => s.confirmation_status.clone().unwrap_or_else(|| "pending".to_string()),
    }
}

/// Look up landed bundles on the block engine.
pub async fn check_bundle_status(config: &Config, bundle_ids: &[String]) -> Result<()> {
    let jito = JitoClient::new(&config.jito_block_engine_url);
    let header = Style::new().cyan().bold();
    println!("\n{}", header.apply_to("📦 Bundle Status"));

    let mut table = Table::new();
    table.add_row(row!["Bundle", "Status", "Slot", "Transactions"]);
    for chunk in bundle_ids.chunks(crate::api::jito::MAX_BUNDLE_SIZE) {
        let statuses = jito.bundle_statuses(chunk).await?;
        for (id, status) in chunk.iter().zip(statuses.iter().chain(std::iter::repeat(&None))) {
            let slot = status.as_ref().and_then(|s| s.slot).map_or("-".to_string(), |s| s.to_string());
            let txs = status.as_ref().map_or(0, |s| s.transactions.len());
            table.add_row(row![id, status_label(status), slot, txs]);
        }
    }
    table.printstd();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(value: serde_json::Value) -> Option<BundleStatus> {
        Some(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(&None), "not found");
        let landed = status(json!({
            "bundle_id": "abc", "transactions": ["sig"], "slot": 1,
            "confirmation_status": "finalized", "err": {"Ok": null}
        }));
        assert_eq!(status_label(&landed), "finalized");
        let failed = status(json!({
            "bundle_id": "abc", "slot": 1, "confirmation_status": "processed",
            "err": {"Err": "BundleDropped"}
        }));
        assert_eq!(status_label(&failed), "failed");
        let pending = status(json!({ "bundle_id": "abc" }));
        assert_eq!(status_label(&pending), "pending");
    }
}
