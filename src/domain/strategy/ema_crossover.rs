//! EMA crossover: BUY while the short EMA is above the long EMA, SELL
//! otherwise.

use crate::domain::indicator::calculate_ema;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::Signal;

use super::require_positive;

#[derive(Debug, Clone, PartialEq)]
pub struct EmaCrossoverParams {
    pub short: usize,
    pub long: usize,
}

impl Default for EmaCrossoverParams {
    fn default() -> Self {
        EmaCrossoverParams { short: 9, long: 21 }
    }
}

impl EmaCrossoverParams {
    pub fn validate(&self) -> Result<(), String> {
        require_positive("ema_short", self.short)?;
        require_positive("ema_long", self.long)?;
        if self.short >= self.long {
            return Err(format!(
                "ema_short ({}) must be less than ema_long ({})",
                self.short, self.long
            ));
        }
        Ok(())
    }
}

/// Short-vs-long EMA comparison per bar; `None` during warmup.
pub(crate) fn ema_spread(params: &EmaCrossoverParams, bars: &[Bar]) -> Vec<Option<f64>> {
    let short = calculate_ema(bars, params.short);
    let long = calculate_ema(bars, params.long);
    (0..bars.len())
        .map(|i| Some(short.value_at(i)? - long.value_at(i)?))
        .collect()
}

pub fn signals(params: &EmaCrossoverParams, bars: &[Bar]) -> Vec<Signal> {
    ema_spread(params, bars)
        .into_iter()
        .map(|spread| match spread {
            Some(s) if s > 0.0 => Signal::Buy,
            Some(_) => Signal::Sell,
            None => Signal::Hold,
        })
        .collect()
}
