//! Channel breakout over the previous N bars.
//!
//! BUY when the close exceeds the highest high of the previous
//! `period` bars, SELL when it falls below their lowest low. The current bar
//! never counts toward its own channel, so the first `period` bars are HOLD.

use crate::domain::indicator::{prior_high, prior_low};
use crate::domain::ohlcv::Bar;
use crate::domain::signal::Signal;

use super::require_positive;

#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutParams {
    pub period: usize,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        BreakoutParams { period: 20 }
    }
}

impl BreakoutParams {
    pub fn validate(&self) -> Result<(), String> {
        require_positive("breakout_period", self.period)
    }
}

pub fn signals(params: &BreakoutParams, bars: &[Bar]) -> Vec<Signal> {
    let upper = prior_high(bars, params.period);
    let lower = prior_low(bars, params.period);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| match (upper.value_at(i), lower.value_at(i)) {
            (Some(hi), _) if bar.close > hi => Signal::Buy,
            (_, Some(lo)) if bar.close < lo => Signal::Sell,
            _ => Signal::Hold,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::bars_from_closes;

    #[test]
    fn first_period_bars_hold() {
        let bars = bars_from_closes(&[10.0, 20.0, 30.0, 40.0]);
        let out = signals(&BreakoutParams { period: 3 }, &bars);
        assert_eq!(&out[..3], &[Signal::Hold; 3]);
        assert_eq!(out[3], Signal::Buy);
    }

    #[test]
    fn breakdown_sells() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0, 9.0]);
        let out = signals(&BreakoutParams { period: 3 }, &bars);
        assert_eq!(out[3], Signal::Sell);
    }

    #[test]
    fn inside_channel_holds() {
        let bars = bars_from_closes(&[10.0, 12.0, 11.0, 11.5]);
        let out = signals(&BreakoutParams { period: 3 }, &bars);
        assert_eq!(out[3], Signal::Hold);
    }

    #[test]
    fn flat_series_holds_after_lookback() {
        let bars = bars_from_closes(&[100.0; 40]);
        let out = signals(&BreakoutParams { period: 20 }, &bars);
        assert!(out.iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn zero_period_is_invalid() {
        assert!(BreakoutParams { period: 0 }.validate().is_err());
    }
}
