use scan_core::{AlignedReturnPair, ReturnSeries};
use statrs::statistics::Statistics;
use std::cmp::Ordering;

/// Restrict two return series to the intersection of their dates. Both
/// inputs are date-ordered, so a two-pointer merge suffices; dates present
/// in only one series (exchange holidays, halts) are dropped from both.
pub fn align(stock: &ReturnSeries, bench: &ReturnSeries) -> AlignedReturnPair {
    let mut pair = AlignedReturnPair::default();
    let (mut i, mut j) = (0, 0);

    while i < stock.points.len() && j < bench.points.len() {
        let s = &stock.points[i];
        let b = &bench.points[j];
        match s.date.cmp(&b.date) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                pair.stock.push(s.value);
                pair.bench.push(b.value);
                i += 1;
                j += 1;
            }
        }
    }

    pair
}

/// Systematic risk against the benchmark: sample covariance over sample
/// variance. `None` when fewer than two aligned points exist or the
/// benchmark is flat (zero variance has no defined beta).
pub fn beta(pair: &AlignedReturnPair) -> Option<f64> {
    if pair.len() < 2 {
        return None;
    }

    let variance = pair.bench.iter().variance();
    if !variance.is_finite() || variance == 0.0 {
        return None;
    }

    let covariance = pair.stock.iter().covariance(pair.bench.iter());
    Some(covariance / variance)
}
