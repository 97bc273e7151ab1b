use anyhow::{Context, Result};
use colored::Colorize;
use ec2_price::{
    config,
    pricing::{resolve, PriceStore, Resolved},
    server,
};
use std::{path::Path, sync::Arc};
use tracing::info;

/// Execute the fetch command
///
/// Runs a single fetch cycle against the pricing API and prints the table
/// (or one region of it) as JSON on stdout. Progress goes to stderr so the
/// output can be piped.
pub async fn execute(config_path: &Path, region: Option<String>) -> Result<()> {
    let cfg = config::load_config(config_path)?;

    eprintln!("{}", "Fetching prices from the pricing API...".yellow());
    let store = Arc::new(PriceStore::new());
    let updater = server::build_updater(&cfg, store.clone())?;
    let summary = updater.refresh().await?;

    eprintln!(
        "{} {} instance types in {} regions",
        "✓ Fetched".green(),
        summary.instance_types,
        summary.regions
    );
    info!("One-off fetch completed");

    let table = store.current_table();
    let output = match resolve(&table, region.as_deref(), None)
        .with_context(|| match &region {
            Some(region) => format!("No prices for region '{}'", region),
            None => "The pricing API returned no prices".to_string(),
        })? {
        Resolved::Table(table) => serde_json::to_string_pretty(table)?,
        Resolved::Region(prices) => serde_json::to_string_pretty(prices)?,
        Resolved::Price(price) => price.to_string(),
    };

    println!("{}", output);
    Ok(())
}
