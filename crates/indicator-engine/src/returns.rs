use scan_core::{PriceSeries, ReturnPoint, ReturnSeries};

/// Daily percent-change returns, keyed by date. The first date has no prior
/// close to compare against and is dropped; fewer than two prices yield an
/// empty series.
pub fn daily_returns(series: &PriceSeries) -> ReturnSeries {
    if series.len() < 2 {
        return ReturnSeries::default();
    }

    let points = series
        .points
        .windows(2)
        .map(|w| ReturnPoint {
            date: w[1].date,
            value: (w[1].close - w[0].close) / w[0].close,
        })
        .collect();

    ReturnSeries { points }
}
