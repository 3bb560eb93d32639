//! RSI exhaustion confirmed by MACD momentum.
//!
//! BUY when RSI is oversold and MACD is above its signal line; SELL when RSI
//! is overbought and MACD is below its signal line; otherwise HOLD.

use crate::domain::indicator::calculate_rsi;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::Signal;

use super::macd_crossover::MacdParams;
use super::rsi_crossover::RsiThresholds;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RsiMacdParams {
    pub rsi: RsiThresholds,
    pub macd: MacdParams,
}

pub fn signals(params: &RsiMacdParams, bars: &[Bar]) -> Vec<Signal> {
    let rsi = calculate_rsi(bars, params.rsi.period);
    let histogram = params.macd.histogram(bars);

    histogram
        .iter()
        .enumerate()
        .map(|(i, h)| match (rsi.value_at(i), *h) {
            (Some(r), Some(h)) if r < params.rsi.oversold && h > 0.0 => Signal::Buy,
            (Some(r), Some(h)) if r > params.rsi.overbought && h < 0.0 => Signal::Sell,
            _ => Signal::Hold,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::bars_from_closes;

    fn params() -> RsiMacdParams {
        RsiMacdParams {
            rsi: RsiThresholds {
                period: 3,
                overbought: 70.0,
                oversold: 30.0,
            },
            macd: MacdParams {
                fast: 2,
                slow: 3,
                signal: 2,
            },
        }
    }

    #[test]
    fn warmup_is_hold() {
        let bars = bars_from_closes(&[10.0, 9.0, 8.0]);
        assert!(signals(&params(), &bars).iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn oversold_with_fading_selloff_buys() {
        // decline that decelerates: RSI pinned low, MACD turning up
        let bars = bars_from_closes(&[20.0, 16.0, 13.0, 11.0, 10.0, 9.8, 9.7]);
        let out = signals(&params(), &bars);
        assert_eq!(out[6], Signal::Buy);
    }

    #[test]
    fn overbought_with_fading_rally_sells() {
        let bars = bars_from_closes(&[10.0, 14.0, 17.0, 19.0, 20.0, 20.2, 20.3]);
        let out = signals(&params(), &bars);
        assert_eq!(out[6], Signal::Sell);
    }

    #[test]
    fn accelerating_selloff_holds() {
        // RSI oversold but MACD still under its signal line
        let bars = bars_from_closes(&[20.0, 19.8, 19.5, 19.0, 18.0, 16.0, 13.0]);
        assert_eq!(signals(&params(), &bars)[6], Signal::Hold);
    }
}
