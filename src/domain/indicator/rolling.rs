//! Rolling-window helpers: mean of another indicator, prior-bar extremes,
//! and realized volatility of log returns.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

fn point(bar_ts: chrono::NaiveDateTime, value: Option<f64>) -> IndicatorPoint {
    IndicatorPoint {
        timestamp: bar_ts,
        valid: value.is_some(),
        value: IndicatorValue::Simple(value.unwrap_or(0.0)),
    }
}

/// Mean of the last `window` points of `series`. Valid only when every point
/// in the window is valid.
pub fn rolling_mean(series: &IndicatorSeries, window: usize) -> IndicatorSeries {
    let values = series
        .values
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let value = if window == 0 || i + 1 < window {
                None
            } else {
                let slice = &series.values[i + 1 - window..=i];
                if slice.iter().all(|q| q.valid) {
                    Some(slice.iter().map(|q| q.value.primary()).sum::<f64>() / window as f64)
                } else {
                    None
                }
            };
            point(p.timestamp, value)
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::RollingMean(window),
        values,
    }
}

/// Highest high of the `period` bars before each bar. The current bar is
/// excluded, so the first `period` points are invalid.
pub fn prior_high(bars: &[Bar], period: usize) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let value = (period > 0 && i >= period).then(|| {
                bars[i - period..i]
                    .iter()
                    .map(|b| b.high)
                    .fold(f64::NEG_INFINITY, f64::max)
            });
            point(bar.timestamp, value)
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::PriorHigh(period),
        values,
    }
}

/// Lowest low of the `period` bars before each bar.
pub fn prior_low(bars: &[Bar], period: usize) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let value = (period > 0 && i >= period).then(|| {
                bars[i - period..i]
                    .iter()
                    .map(|b| b.low)
                    .fold(f64::INFINITY, f64::min)
            });
            point(bar.timestamp, value)
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::PriorLow(period),
        values,
    }
}

/// Sample standard deviation (n-1) of the last `window` close-to-close log
/// returns. Needs `window + 1` bars and a window of at least 2.
pub fn log_return_volatility(bars: &[Bar], window: usize) -> IndicatorSeries {
    let returns: Vec<f64> = bars
        .windows(2)
        .map(|w| {
            if w[0].close > 0.0 && w[1].close > 0.0 {
                (w[1].close / w[0].close).ln()
            } else {
                0.0
            }
        })
        .collect();

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let value = (window >= 2 && i >= window).then(|| {
                let slice = &returns[i - window..i];
                let n = window as f64;
                let mean = slice.iter().sum::<f64>() / n;
                let var = slice.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
                var.sqrt()
            });
            point(bar.timestamp, value)
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Volatility(window),
        values,
    }
}
