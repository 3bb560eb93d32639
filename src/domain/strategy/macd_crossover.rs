//! MACD crossover: BUY while the MACD line is above its signal line, SELL
//! otherwise.

use crate::domain::indicator::calculate_macd;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::ohlcv::Bar;
use crate::domain::signal::Signal;

use super::require_positive;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        MacdParams {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

impl MacdParams {
    pub fn validate(&self) -> Result<(), String> {
        require_positive("macd_fast", self.fast)?;
        require_positive("macd_slow", self.slow)?;
        require_positive("macd_signal", self.signal)?;
        if self.fast >= self.slow {
            return Err(format!(
                "macd_fast ({}) must be less than macd_slow ({})",
                self.fast, self.slow
            ));
        }
        Ok(())
    }

    /// MACD line minus signal line per bar; `None` during warmup.
    pub(crate) fn histogram(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let macd = calculate_macd(bars, self.fast, self.slow, self.signal);
        (0..bars.len())
            .map(|i| macd.macd_at(i).map(|(line, signal)| line - signal))
            .collect()
    }
}

pub fn signals(params: &MacdParams, bars: &[Bar]) -> Vec<Signal> {
    params
        .histogram(bars)
        .into_iter()
        .map(|h| match h {
            Some(h) if h > 0.0 => Signal::Buy,
            Some(_) => Signal::Sell,
            None => Signal::Hold,
        })
        .collect()
}
