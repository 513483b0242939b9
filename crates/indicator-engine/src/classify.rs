use crate::indicators::sma;
use scan_core::{MomentumLabel, TrendLabel};

pub const OVERBOUGHT_THRESHOLD: f64 = 70.0;
pub const OVERSOLD_THRESHOLD: f64 = 30.0;

/// Trend of the latest close against the trailing `period` moving average.
/// Strictly above reads bullish; a tie reads bearish. Undefined until
/// `period` closes exist.
pub fn trend_label(closes: &[f64], period: usize) -> Option<TrendLabel> {
    let average = sma(closes, period).last().copied()?;
    let latest = closes.last().copied()?;
    Some(if latest > average {
        TrendLabel::Bullish
    } else {
        TrendLabel::Bearish
    })
}

/// Momentum state from the oscillator's current value. The bands are
/// exclusive, so 70.0 and 30.0 themselves read as neutral.
pub fn momentum_label(rsi: f64) -> MomentumLabel {
    if rsi > OVERBOUGHT_THRESHOLD {
        MomentumLabel::Overbought
    } else if rsi < OVERSOLD_THRESHOLD {
        MomentumLabel::Oversold
    } else {
        MomentumLabel::Neutral
    }
}
