// This is the entry point of the Légifrance watch job.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (HTTP APIs)
//
// This file's job is to:
// 1. Load configuration
// 2. Build the API clients (dependency injection)
// 3. Run one pass of the pipeline and report the outcome
//
// The job is single-pass: it reads at most one pending search request, writes
// the results back, and exits. Recurring runs come from an external scheduler.

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with a handful of mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use anyhow::Result;
use tracing::{error, info};

use crate::config::Config;
use crate::core::watch::{RunOutcome, WatchService};
use crate::infra::grist::GristApiClient;
use crate::infra::legifrance::LegifranceApiClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = Config::from_env()?;

    // One shared HTTP client for both APIs.
    let http = reqwest::Client::new();
    let search = LegifranceApiClient::new(http.clone(), config.legifrance.clone());
    let store = GristApiClient::new(http, config.grist.clone());

    let service = WatchService::new(search, store, config.insert_delay);

    // Pipeline errors are logged, not bubbled into the exit code.
    match service.run_once().await {
        Ok(RunOutcome::Idle) => info!("No active search request; nothing to do"),
        Ok(RunOutcome::Completed { inserted, failed }) => {
            info!("Run finished: {inserted} row(s) inserted, {failed} failed")
        }
        Ok(RunOutcome::Aborted) => info!("Run aborted; trigger was still reset"),
        Err(err) => error!("Watch run failed: {err}"),
    }

    Ok(())
}
