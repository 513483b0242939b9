use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One daily closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily closing prices, strictly increasing by date, positive finite values.
/// Built once per ticker by the normalizer and never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

/// One daily fractional return
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Percent-change returns derived from a price series. One entry shorter
/// than its source; the first date has no prior close and is dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnSeries {
    pub points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Stock and benchmark returns restricted to their common dates.
/// Position i in `stock` and position i in `bench` refer to the same date.
#[derive(Debug, Clone, Default)]
pub struct AlignedReturnPair {
    pub stock: Vec<f64>,
    pub bench: Vec<f64>,
}

impl AlignedReturnPair {
    pub fn len(&self) -> usize {
        self.stock.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stock.is_empty()
    }
}

/// Raw price data as returned by a market data provider. Providers return
/// whichever shape their feed produces; `normalize` resolves it exactly once.
#[derive(Debug, Clone)]
pub enum RawPriceData {
    Empty,
    Series(Vec<PricePoint>),
    Table(PriceTable),
}

/// Multi-column tabular price data over a shared date axis. Missing values
/// (halted sessions, partial feeds) are `None`.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<PriceColumn>,
}

#[derive(Debug, Clone)]
pub struct PriceColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Trend classification against the trailing moving average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendLabel {
    Bullish,
    Bearish,
}

impl TrendLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::Bullish => "bullish",
            TrendLabel::Bearish => "bearish",
        }
    }
}

/// Momentum state derived from the oscillator's current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MomentumLabel {
    Neutral,
    Overbought,
    Oversold,
}

impl MomentumLabel {
    /// Report label; the risk/value qualifiers match what reviewers expect
    /// to filter on in the rendered sheet.
    pub fn as_str(&self) -> &'static str {
        match self {
            MomentumLabel::Neutral => "neutral",
            MomentumLabel::Overbought => "overbought (risk)",
            MomentumLabel::Oversold => "oversold (value)",
        }
    }
}

/// One finished report row. Created once at the end of a ticker's
/// computation; either emitted into the report or discarded on skip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorResult {
    pub ticker: String,
    pub price: f64,
    pub trend: TrendLabel,
    pub rsi: Option<f64>,
    pub momentum: MomentumLabel,
    pub beta: Option<f64>,
}

/// Final result set. Row order equals the configured universe order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub rows: Vec<IndicatorResult>,
    pub total_scanned: usize,
    pub total_skipped: usize,
    pub timestamp: DateTime<Utc>,
}
