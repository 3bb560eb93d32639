//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values aligned with its bars
//!
//! Points inside an indicator's warmup carry `valid == false`; their values
//! are placeholders and must not be read as signals.

pub mod ema;
pub mod macd;
pub mod rolling;
pub mod rsi;

pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rolling::{log_return_volatility, prior_high, prior_low, rolling_mean};
pub use rsi::calculate_rsi;

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
}

impl IndicatorValue {
    /// The scalar reading; for MACD this is the MACD line.
    pub fn primary(&self) -> f64 {
        match self {
            IndicatorValue::Simple(v) => *v,
            IndicatorValue::Macd { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    RollingMean(usize),
    PriorHigh(usize),
    PriorLow(usize),
    Volatility(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Scalar value at `index`, or `None` while in warmup or out of range.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values
            .get(index)
            .filter(|p| p.valid)
            .map(|p| p.value.primary())
    }

    /// MACD line and signal line at `index`, or `None` while in warmup.
    pub fn macd_at(&self, index: usize) -> Option<(f64, f64)> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Macd { line, signal, .. },
                ..
            }) => Some((*line, *signal)),
            _ => None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_at_hides_warmup() {
        let bars = test_support::bars_from_closes(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 2);
        assert_eq!(series.value_at(0), None);
        assert_eq!(series.value_at(1), Some(15.0));
        assert_eq!(series.value_at(7), None);
    }

    #[test]
    fn macd_at_rejects_simple_values() {
        let bars = test_support::bars_from_closes(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 1);
        assert_eq!(series.macd_at(0), None);
    }
}
