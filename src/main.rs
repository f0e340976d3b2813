//! PumpAlert - pump.fun launch watcher
//!
//! Streams new token launches and alerts when a name matches your search.

use anyhow::Result;

use pump_alert::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (PUMP_ALERT_WS_URL, RUST_LOG)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
