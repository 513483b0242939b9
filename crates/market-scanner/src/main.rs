//! market-scanner: scan a fixed equity universe, compute RSI, beta and the
//! 50-day trend per ticker, and write a formatted spreadsheet dashboard.
//!
//! The universe, lookback window and smoothing period are design constants,
//! not flags.

use report_xlsx::XlsxReportWriter;
use scan_core::ReportRenderer;
use scan_orchestrator::{ScanConfig, ScanOrchestrator};
use std::path::Path;
use std::sync::Arc;
use yahoo_client::YahooClient;

/// NSE large-cap universe, benchmarked against the NIFTY 50 index
const UNIVERSE: &[&str] = &[
    "ADANIENT.NS", "ADANIPORTS.NS", "APOLLOHOSP.NS", "ASIANPAINT.NS", "AXISBANK.NS",
    "BAJAJ-AUTO.NS", "BAJFINANCE.NS", "BAJAJFINSV.NS", "BEL.NS", "BPCL.NS",
    "BHARTIARTL.NS", "BRITANNIA.NS", "CIPLA.NS", "COALINDIA.NS", "DIVISLAB.NS",
    "DRREDDY.NS", "EICHERMOT.NS", "GRASIM.NS", "HCLTECH.NS", "HDFCBANK.NS",
    "HDFCLIFE.NS", "HEROMOTOCO.NS", "HINDALCO.NS", "HINDUNILVR.NS", "ICICIBANK.NS",
    "ITC.NS", "INDUSINDBK.NS", "INFY.NS", "JSWSTEEL.NS", "KOTAKBANK.NS",
    "LTIM.NS", "LT.NS", "M&M.NS", "MARUTI.NS", "NESTLEIND.NS",
    "NTPC.NS", "ONGC.NS", "POWERGRID.NS", "RELIANCE.NS", "SBILIFE.NS",
    "SBIN.NS", "SHRIRAMFIN.NS", "SUNPHARMA.NS", "TATASTEEL.NS", "TCS.NS",
    "TATACONSUM.NS", "TECHM.NS", "TITAN.NS", "TRENT.NS",
    "ULTRACEMCO.NS", "WIPRO.NS", "PIDILITIND.NS", "VEDL.NS",
];
const BENCHMARK: &str = "^NSEI";
const OUTPUT_FILE: &str = "market_dashboard.xlsx";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "market_scanner=info,scan_orchestrator=info,yahoo_client=warn".into()
            }),
        )
        .init();

    let config = ScanConfig {
        universe: UNIVERSE.iter().map(|s| s.to_string()).collect(),
        benchmark: BENCHMARK.to_string(),
        display_suffix: Some(".NS".to_string()),
        ..ScanConfig::default()
    };

    tracing::info!("🚀 Starting market scan of {} tickers", config.universe.len());

    let provider = Arc::new(YahooClient::new());
    let orchestrator = ScanOrchestrator::new(provider, config);
    let report = orchestrator.run().await?;

    if report.rows.is_empty() {
        tracing::warn!("No data collected; skipping report output");
        return Ok(());
    }

    tracing::info!(
        "Scan complete: {}/{} tickers analyzed ({} skipped)",
        report.rows.len(),
        report.total_scanned,
        report.total_skipped
    );

    let writer = XlsxReportWriter::new().with_auto_open();
    writer.render(&report, Path::new(OUTPUT_FILE))?;

    tracing::info!("📊 Dashboard written to {}", OUTPUT_FILE);
    Ok(())
}
