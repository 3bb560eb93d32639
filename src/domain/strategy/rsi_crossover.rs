//! RSI threshold strategy with optional smoothed confirmation.
//!
//! BUY when RSI < oversold, SELL when RSI > overbought, HOLD in between.
//! With `higher_tf_period` set, the rolling mean of RSI over that window must
//! sit beyond the same threshold before a signal is emitted.

use crate::domain::indicator::{calculate_rsi, rolling_mean};
use crate::domain::ohlcv::Bar;
use crate::domain::signal::Signal;

use super::require_positive;

#[derive(Debug, Clone, PartialEq)]
pub struct RsiThresholds {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for RsiThresholds {
    fn default() -> Self {
        RsiThresholds {
            period: 14,
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

impl RsiThresholds {
    pub fn validate(&self) -> Result<(), String> {
        require_positive("rsi_period", self.period)?;
        if !(0.0..=100.0).contains(&self.oversold) || !(0.0..=100.0).contains(&self.overbought) {
            return Err("rsi thresholds must lie in [0, 100]".into());
        }
        if self.oversold >= self.overbought {
            return Err(format!(
                "rsi_oversold ({}) must be below rsi_overbought ({})",
                self.oversold, self.overbought
            ));
        }
        Ok(())
    }

    /// Classify a single RSI reading.
    pub fn classify(&self, rsi: f64) -> Signal {
        if rsi < self.oversold {
            Signal::Buy
        } else if rsi > self.overbought {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RsiCrossoverParams {
    pub thresholds: RsiThresholds,
    pub higher_tf_period: Option<usize>,
}

impl RsiCrossoverParams {
    pub fn validate(&self) -> Result<(), String> {
        self.thresholds.validate()?;
        if let Some(window) = self.higher_tf_period {
            require_positive("higher_tf_rsi_period", window)?;
        }
        Ok(())
    }
}

pub fn signals(params: &RsiCrossoverParams, bars: &[Bar]) -> Vec<Signal> {
    let rsi = calculate_rsi(bars, params.thresholds.period);
    let confirmation = params
        .higher_tf_period
        .map(|window| rolling_mean(&rsi, window));

    (0..bars.len())
        .map(|i| {
            let Some(value) = rsi.value_at(i) else {
                return Signal::Hold;
            };
            let signal = params.thresholds.classify(value);
            match &confirmation {
                None => signal,
                Some(mean) => match mean.value_at(i) {
                    Some(m) if params.thresholds.classify(m) == signal => signal,
                    _ => Signal::Hold,
                },
            }
        })
        .collect()
}
