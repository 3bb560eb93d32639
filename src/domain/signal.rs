//! Directional strategy output.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        })
    }
}

/// Signals aligned one-to-one with the bars they were computed from.
///
/// `fill_prices`, when present, replaces the bar close as the pre-slippage
/// price of any trade the simulator creates at that index.
///
/// A `long_only` series never opens a short: its SELL only closes a long.
/// Strategies that track their own position emit it, so a SELL that was
/// meant as an exit stays inert when the entry never filled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalSeries {
    pub signals: Vec<Signal>,
    pub fill_prices: Option<Vec<f64>>,
    pub long_only: bool,
}

impl SignalSeries {
    pub fn new(signals: Vec<Signal>) -> Self {
        SignalSeries {
            signals,
            fill_prices: None,
            long_only: false,
        }
    }

    pub fn with_fill_prices(signals: Vec<Signal>, fill_prices: Vec<f64>) -> Self {
        SignalSeries {
            signals,
            fill_prices: Some(fill_prices),
            long_only: false,
        }
    }

    pub fn long_only(mut self) -> Self {
        self.long_only = true;
        self
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_only_is_opt_in() {
        let series = SignalSeries::with_fill_prices(vec![Signal::Buy], vec![1.0]);
        assert!(!series.long_only);
        assert!(series.long_only().long_only);
        assert!(!SignalSeries::new(vec![Signal::Sell]).long_only);
    }

    #[test]
    fn serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
        assert_eq!(Signal::Sell.to_string(), "SELL");
    }
}
