//! OHLCV bar representation and input hygiene.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns the first OHLCV invariant this bar breaks, if any.
    pub fn violation(&self) -> Option<&'static str> {
        let values = [self.open, self.high, self.low, self.close, self.volume];
        if values.iter().any(|v| !v.is_finite()) {
            return Some("non-finite value");
        }
        if self.volume < 0.0 {
            return Some("negative volume");
        }
        if self.high < self.open.max(self.close).max(self.low) {
            return Some("high below open/close/low");
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return Some("low above open/close/high");
        }
        None
    }

    /// `Err` names the violated invariant.
    pub fn validate(&self) -> Result<(), &'static str> {
        match self.violation() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }
}

/// Drop bars that break the OHLCV invariants or the strictly increasing
/// timestamp order. Returns the kept bars and the number rejected.
pub fn sanitize_bars(symbol: &str, bars: Vec<Bar>) -> (Vec<Bar>, usize) {
    let mut kept: Vec<Bar> = Vec::with_capacity(bars.len());
    let mut rejected = 0usize;

    for bar in bars {
        if let Some(reason) = bar.violation() {
            warn!(symbol, timestamp = %bar.timestamp, reason, "rejecting bar");
            rejected += 1;
            continue;
        }
        if let Some(last) = kept.last() {
            if bar.timestamp <= last.timestamp {
                warn!(
                    symbol,
                    timestamp = %bar.timestamp,
                    previous = %last.timestamp,
                    "rejecting out-of-order or duplicate bar"
                );
                rejected += 1;
                continue;
            }
        }
        kept.push(bar);
    }

    (kept, rejected)
}
