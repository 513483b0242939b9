use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::Client;
use scan_core::{MarketDataProvider, PriceColumn, PriceTable, RawPriceData, ScanError};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; market-scanner/0.1)";

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Need to wait until the oldest request falls out of the window
            let wait_until = match ts.front().and_then(|front| front.checked_add(self.window)) {
                Some(deadline) => deadline,
                None => return,
            };
            let sleep_dur = wait_until.duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!(
                "Rate limiter: waiting {:.1}s for Yahoo API slot",
                sleep_dur.as_secs_f64()
            );
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Daily-bars client for the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl YahooClient {
    pub fn new() -> Self {
        // Yahoo throttles unauthenticated clients hard; default well under
        // the observed ceiling. Override with YAHOO_RATE_LIMIT.
        let rate_limit: usize = std::env::var("YAHOO_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ScanError> {
        let request = builder.build().map_err(|e| ScanError::Api(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| ScanError::Api("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| ScanError::Api(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            let wait_secs = 15u64;
            tracing::warn!(
                "Yahoo 429 rate limited, waiting {}s before retry {}/3",
                wait_secs,
                attempt + 1
            );
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(ScanError::Api(
            "Rate limited by Yahoo after 3 retries".to_string(),
        ))
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn fetch_daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawPriceData, ScanError> {
        let url = format!("{}/v8/finance/chart/{}", BASE_URL, symbol);
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive of the final day
        let period2 = (end + chrono::Duration::days(1))
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ]))
            .await?;

        if !response.status().is_success() {
            return Err(ScanError::Api(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let chart: ChartResponse = response
            .json()
            .await
            .map_err(|e| ScanError::Api(e.to_string()))?;

        if let Some(error) = chart.chart.error {
            return Err(ScanError::Api(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        Ok(chart
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .map(into_raw)
            .unwrap_or(RawPriceData::Empty))
    }
}

/// Map one chart result onto the provider-neutral table shape. Both the
/// plain and adjusted close columns are carried so the normalizer can apply
/// its own preference; null feed entries stay `None`.
fn into_raw(result: ChartResult) -> RawPriceData {
    let timestamps = match result.timestamp {
        Some(ts) if !ts.is_empty() => ts,
        _ => return RawPriceData::Empty,
    };

    let mut dates = Vec::with_capacity(timestamps.len());
    let mut keep = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        if let Some(dt) = DateTime::from_timestamp(*ts, 0) {
            dates.push(dt.date_naive());
            keep.push(i);
        }
    }

    let mut columns = Vec::new();
    if let Some(close) = result
        .indicators
        .quote
        .into_iter()
        .next()
        .and_then(|q| q.close)
    {
        columns.push(PriceColumn {
            name: "Close".to_string(),
            values: select(&close, &keep),
        });
    }
    if let Some(adj) = result
        .indicators
        .adjclose
        .and_then(|blocks| blocks.into_iter().next())
    {
        columns.push(PriceColumn {
            name: "Adj Close".to_string(),
            values: select(&adj.adjclose, &keep),
        });
    }

    if columns.is_empty() {
        return RawPriceData::Empty;
    }

    RawPriceData::Table(PriceTable { dates, columns })
}

/// Feed arrays occasionally run short of the date axis; absent entries
/// become gaps rather than misaligned rows.
fn select(values: &[Option<f64>], keep: &[usize]) -> Vec<Option<f64>> {
    keep.iter()
        .map(|&i| values.get(i).copied().flatten())
        .collect()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Option<Vec<AdjCloseBlock>>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    adjclose: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use scan_core::normalize;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1735776000, 1735862400, 1735948800],
                "indicators": {
                    "quote": [{"close": [101.5, null, 103.25]}],
                    "adjclose": [{"adjclose": [100.9, null, 102.6]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn chart_response_maps_to_two_column_table() {
        let chart: ChartResponse = serde_json::from_str(SAMPLE).unwrap();
        let raw = into_raw(chart.chart.result.unwrap().into_iter().next().unwrap());

        match &raw {
            RawPriceData::Table(table) => {
                assert_eq!(table.dates.len(), 3);
                assert_eq!(table.columns.len(), 2);
                assert_eq!(table.columns[0].name, "Close");
                assert_eq!(table.columns[1].name, "Adj Close");
                assert_eq!(table.columns[1].values[1], None);
            }
            other => panic!("expected table, got {:?}", other),
        }

        // The normalizer prefers the adjusted close and drops the null row
        let series = normalize(raw).unwrap();
        assert_eq!(series.closes(), vec![100.9, 102.6]);
    }

    #[test]
    fn missing_timestamps_map_to_empty() {
        let chart: ChartResponse = serde_json::from_str(
            r#"{"chart": {"result": [{"timestamp": [], "indicators": {"quote": []}}], "error": null}}"#,
        )
        .unwrap();
        let raw = into_raw(chart.chart.result.unwrap().into_iter().next().unwrap());
        assert!(matches!(raw, RawPriceData::Empty));
    }

    #[test]
    fn error_payload_deserializes() {
        let chart: ChartResponse = serde_json::from_str(
            r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}}"#,
        )
        .unwrap();
        let error = chart.chart.error.unwrap();
        assert_eq!(error.code, "Not Found");
    }
}
