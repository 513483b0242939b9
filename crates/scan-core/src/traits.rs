use crate::{RawPriceData, ScanError, ScanReport};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::Path;

/// Market data collaborator. Returns raw, shape-varying price data;
/// callers resolve the shape once with `normalize`.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawPriceData, ScanError>;
}

/// Report rendering collaborator
pub trait ReportRenderer: Send + Sync {
    fn render(&self, report: &ScanReport, path: &Path) -> Result<(), ScanError>;
}
