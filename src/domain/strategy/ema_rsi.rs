//! Combined EMA trend and RSI exhaustion.
//!
//! BUY when the short EMA is below the long EMA and RSI is oversold; SELL
//! when the short EMA is above the long EMA and RSI is overbought; otherwise
//! HOLD.

use crate::domain::indicator::calculate_rsi;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::Signal;

use super::ema_crossover::{ema_spread, EmaCrossoverParams};
use super::rsi_crossover::RsiThresholds;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmaRsiParams {
    pub ema: EmaCrossoverParams,
    pub rsi: RsiThresholds,
}

pub fn signals(params: &EmaRsiParams, bars: &[Bar]) -> Vec<Signal> {
    let spread = ema_spread(&params.ema, bars);
    let rsi = calculate_rsi(bars, params.rsi.period);

    spread
        .iter()
        .enumerate()
        .map(|(i, s)| match (*s, rsi.value_at(i)) {
            (Some(s), Some(r)) if s < 0.0 && r < params.rsi.oversold => Signal::Buy,
            (Some(s), Some(r)) if s > 0.0 && r > params.rsi.overbought => Signal::Sell,
            _ => Signal::Hold,
        })
        .collect()
}
