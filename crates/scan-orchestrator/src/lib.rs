//! Scan pipeline: fetch the benchmark once, fan out per-ticker computation,
//! and assemble the report in universe order.

use chrono::{Duration, NaiveDate, Utc};
use indicator_engine::{align, beta, daily_returns, momentum_label, rsi, trend_label};
use scan_core::{
    normalize, IndicatorResult, MarketDataProvider, ReturnSeries, ScanError, ScanReport,
    SkipReason,
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Fixed scan parameters. Universe order determines report row order.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub universe: Vec<String>,
    pub benchmark: String,
    pub lookback_days: i64,
    pub rsi_period: usize,
    pub trend_period: usize,
    pub min_history: usize,
    pub concurrency: usize,
    /// Exchange suffix stripped from tickers in report rows (".NS" etc.)
    pub display_suffix: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            universe: Vec::new(),
            benchmark: "^NSEI".to_string(),
            lookback_days: 365,
            rsi_period: 14,
            trend_period: 50,
            min_history: 50,
            concurrency: 8,
            display_suffix: None,
        }
    }
}

pub struct ScanOrchestrator {
    provider: Arc<dyn MarketDataProvider>,
    config: ScanConfig,
}

impl ScanOrchestrator {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: ScanConfig) -> Self {
        Self { provider, config }
    }

    /// Run the full scan. A benchmark failure is fatal; per-ticker failures
    /// are skips, logged and excluded without aborting the batch.
    pub async fn run(&self) -> Result<ScanReport, ScanError> {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(self.config.lookback_days);

        tracing::info!("Fetching benchmark {} history", self.config.benchmark);
        let bench_returns = Arc::new(self.benchmark_returns(start, end).await?);

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (index, ticker) in self.config.universe.iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let config = self.config.clone();
            let bench_returns = Arc::clone(&bench_returns);
            let semaphore = Arc::clone(&semaphore);
            let ticker = ticker.clone();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result =
                    scan_ticker(provider.as_ref(), &config, &ticker, &bench_returns, start, end)
                        .await;
                (index, ticker, result)
            });
        }

        let mut emitted: Vec<(usize, IndicatorResult)> = Vec::new();
        let mut skipped = 0usize;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, ticker, Ok(row))) => {
                    tracing::info!(
                        "✅ {}: {} | RSI {:.0}",
                        ticker,
                        row.trend.as_str(),
                        row.rsi.unwrap_or(f64::NAN)
                    );
                    emitted.push((index, row));
                }
                Ok((_, ticker, Err(reason))) => {
                    skipped += 1;
                    tracing::warn!("Skipping {}: {}", ticker, reason);
                }
                Err(e) => {
                    skipped += 1;
                    tracing::error!("Ticker task failed: {}", e);
                }
            }
        }

        // Completion order is nondeterministic; report order is not.
        emitted.sort_by_key(|(index, _)| *index);

        Ok(ScanReport {
            rows: emitted.into_iter().map(|(_, row)| row).collect(),
            total_scanned: self.config.universe.len(),
            total_skipped: skipped,
            timestamp: Utc::now(),
        })
    }

    /// The benchmark return series is computed exactly once, before any
    /// per-ticker work; without it no beta is defined for any ticker.
    async fn benchmark_returns(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ReturnSeries, ScanError> {
        let raw = self
            .provider
            .fetch_daily_prices(&self.config.benchmark, start, end)
            .await
            .map_err(|e| ScanError::BenchmarkUnavailable(e.to_string()))?;

        let series = normalize(raw).ok_or_else(|| {
            ScanError::BenchmarkUnavailable(format!("{} returned no data", self.config.benchmark))
        })?;

        let returns = daily_returns(&series);
        if returns.is_empty() {
            return Err(ScanError::BenchmarkUnavailable(format!(
                "{} has no usable return history",
                self.config.benchmark
            )));
        }
        Ok(returns)
    }
}

/// Per-ticker state machine: Fetch → Normalize → Compute → Classify.
/// Every failure mode maps to a `SkipReason` instead of propagating.
async fn scan_ticker(
    provider: &dyn MarketDataProvider,
    config: &ScanConfig,
    ticker: &str,
    bench_returns: &ReturnSeries,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<IndicatorResult, SkipReason> {
    let raw = provider
        .fetch_daily_prices(ticker, start, end)
        .await
        .map_err(|e| SkipReason::Fetch(e.to_string()))?;

    let series = normalize(raw).ok_or(SkipReason::NoData)?;
    if series.len() < config.min_history {
        return Err(SkipReason::InsufficientHistory {
            got: series.len(),
            need: config.min_history,
        });
    }

    let closes = series.closes();
    let current_rsi = rsi(&closes, config.rsi_period)
        .last()
        .copied()
        .ok_or(SkipReason::MomentumUnavailable)?;

    let stock_returns = daily_returns(&series);
    let aligned = align(&stock_returns, bench_returns);
    let beta_value = beta(&aligned).ok_or(SkipReason::BetaUnavailable)?;

    let price = series.latest().map(|p| p.close).ok_or(SkipReason::NoData)?;
    let trend = trend_label(&closes, config.trend_period).ok_or(SkipReason::InsufficientHistory {
        got: closes.len(),
        need: config.trend_period,
    })?;

    Ok(IndicatorResult {
        ticker: display_ticker(ticker, config).to_string(),
        price,
        trend,
        rsi: Some(current_rsi),
        momentum: momentum_label(current_rsi),
        beta: Some(beta_value),
    })
}

fn display_ticker<'a>(ticker: &'a str, config: &ScanConfig) -> &'a str {
    match &config.display_suffix {
        Some(suffix) => ticker.strip_suffix(suffix.as_str()).unwrap_or(ticker),
        None => ticker,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use scan_core::{PricePoint, RawPriceData, TrendLabel};
    use std::collections::HashMap;

    struct MockProvider {
        data: HashMap<String, RawPriceData>,
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        async fn fetch_daily_prices(
            &self,
            symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<RawPriceData, ScanError> {
            match self.data.get(symbol) {
                Some(raw) => Ok(raw.clone()),
                None => Err(ScanError::Api(format!("no route for {}", symbol))),
            }
        }
    }

    fn rising_series(base: f64, len: usize) -> RawPriceData {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        RawPriceData::Series(
            (0..len)
                .map(|i| PricePoint {
                    date: start + Duration::days(i as i64),
                    close: base + i as f64,
                })
                .collect(),
        )
    }

    fn config(universe: Vec<&str>) -> ScanConfig {
        ScanConfig {
            universe: universe.into_iter().map(|s| s.to_string()).collect(),
            benchmark: "^BENCH".to_string(),
            ..ScanConfig::default()
        }
    }

    fn orchestrator_with(data: HashMap<String, RawPriceData>, cfg: ScanConfig) -> ScanOrchestrator {
        ScanOrchestrator::new(Arc::new(MockProvider { data }), cfg)
    }

    #[tokio::test]
    async fn empty_fetch_skips_one_ticker_and_preserves_order() {
        let tickers: Vec<String> = (0..10).map(|i| format!("T{}", i)).collect();
        let mut data = HashMap::new();
        data.insert("^BENCH".to_string(), rising_series(1000.0, 60));
        for (i, ticker) in tickers.iter().enumerate() {
            let raw = if i == 3 {
                RawPriceData::Empty
            } else {
                rising_series(100.0 + i as f64, 60)
            };
            data.insert(ticker.clone(), raw);
        }

        let orchestrator =
            orchestrator_with(data, config(tickers.iter().map(|s| s.as_str()).collect()));
        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.rows.len(), 9);
        assert_eq!(report.total_scanned, 10);
        assert_eq!(report.total_skipped, 1);

        let expected: Vec<String> = tickers
            .iter()
            .filter(|t| t.as_str() != "T3")
            .cloned()
            .collect();
        let got: Vec<String> = report.rows.iter().map(|r| r.ticker.clone()).collect();
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn benchmark_failure_is_fatal() {
        let mut data = HashMap::new();
        data.insert("T0".to_string(), rising_series(100.0, 60));

        let orchestrator = orchestrator_with(data, config(vec!["T0"]));
        let result = orchestrator.run().await;

        assert!(matches!(result, Err(ScanError::BenchmarkUnavailable(_))));
    }

    #[tokio::test]
    async fn empty_benchmark_is_fatal() {
        let mut data = HashMap::new();
        data.insert("^BENCH".to_string(), RawPriceData::Empty);
        data.insert("T0".to_string(), rising_series(100.0, 60));

        let orchestrator = orchestrator_with(data, config(vec!["T0"]));
        let result = orchestrator.run().await;

        assert!(matches!(result, Err(ScanError::BenchmarkUnavailable(_))));
    }

    #[tokio::test]
    async fn short_history_never_reaches_the_report() {
        let mut data = HashMap::new();
        data.insert("^BENCH".to_string(), rising_series(1000.0, 60));
        data.insert("SHORT".to_string(), rising_series(100.0, 30));
        data.insert("LONG".to_string(), rising_series(100.0, 60));

        let orchestrator = orchestrator_with(data, config(vec!["SHORT", "LONG"]));
        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].ticker, "LONG");
        assert_eq!(report.total_skipped, 1);
    }

    #[tokio::test]
    async fn rising_ticker_classifies_bullish_and_overbought() {
        let mut data = HashMap::new();
        data.insert("^BENCH".to_string(), rising_series(1000.0, 60));
        data.insert("UP.NS".to_string(), rising_series(100.0, 60));

        let cfg = ScanConfig {
            display_suffix: Some(".NS".to_string()),
            ..config(vec!["UP.NS"])
        };
        let orchestrator = orchestrator_with(data, cfg);
        let report = orchestrator.run().await.unwrap();

        let row = &report.rows[0];
        assert_eq!(row.ticker, "UP");
        assert_eq!(row.trend, TrendLabel::Bullish);
        assert_eq!(row.rsi, Some(100.0));
        assert_eq!(row.momentum.as_str(), "overbought (risk)");
        assert!(row.beta.is_some());
        assert_eq!(row.price, 159.0);
    }
}
