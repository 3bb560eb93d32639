//! Performance statistics over realized trades.
//!
//! Only closing trades carry realized profit; opening fills are skipped. All
//! ratios resolve to fixed sentinels instead of dividing by zero:
//! - `sharpe_ratio` with zero dispersion: +inf / -inf by the sign of the mean, 0 if the mean is 0
//! - `profit_factor` with no losses: +inf when there are wins, 0 otherwise
//! - `skewness` / `kurtosis` with zero variance: 0
//!
//! Infinite values serialize as the strings `"inf"` / `"-inf"`.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use super::position::Trade;

fn serialize_ratio<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_infinite() {
        serializer.serialize_str(if *value > 0.0 { "inf" } else { "-inf" })
    } else if value.is_nan() {
        serializer.serialize_str("nan")
    } else {
        serializer.serialize_f64(*value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percentage, 0-100.
    pub win_rate: f64,
    pub total_profit: f64,
    pub average_profit: f64,
    pub average_win: f64,
    /// Mean of losing profits (negative or zero).
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub total_commission: f64,
    /// Largest fall of cumulative realized profit from its running peak, in currency.
    pub max_drawdown: f64,
    #[serde(serialize_with = "serialize_ratio")]
    pub sharpe_ratio: f64,
    #[serde(serialize_with = "serialize_ratio")]
    pub profit_factor: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    /// Percentage of trading days with positive net realized profit.
    pub consistency_ratio: f64,
    pub trades_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PerformanceReport {
    NoTrades,
    Stats(PerformanceStats),
}

impl PerformanceReport {
    pub fn stats(&self) -> Option<&PerformanceStats> {
        match self {
            PerformanceReport::Stats(s) => Some(s),
            PerformanceReport::NoTrades => None,
        }
    }

    pub fn is_no_trades(&self) -> bool {
        matches!(self, PerformanceReport::NoTrades)
    }
}

/// Compute the report for an ordered trade list.
pub fn analyze(trades: &[Trade]) -> PerformanceReport {
    let closing: Vec<&Trade> = trades.iter().filter(|t| t.is_closing()).collect();
    if closing.is_empty() {
        return PerformanceReport::NoTrades;
    }

    let profits: Vec<f64> = closing.iter().map(|t| t.profit).collect();
    let total_trades = profits.len();
    let n = total_trades as f64;

    let wins: Vec<f64> = profits.iter().copied().filter(|p| *p > 0.0).collect();
    let losses: Vec<f64> = profits.iter().copied().filter(|p| *p < 0.0).collect();

    let total_profit: f64 = profits.iter().sum();
    let average_win = mean(&wins);
    let average_loss = mean(&losses);

    let profit_factor = if !losses.is_empty() {
        if wins.is_empty() {
            0.0
        } else {
            -average_win / average_loss
        }
    } else if !wins.is_empty() {
        f64::INFINITY
    } else {
        0.0
    };

    let (skewness, kurtosis) = compute_moments(&profits);

    PerformanceReport::Stats(PerformanceStats {
        total_trades,
        winning_trades: wins.len(),
        losing_trades: losses.len(),
        win_rate: 100.0 * wins.len() as f64 / n,
        total_profit,
        average_profit: total_profit / n,
        average_win,
        average_loss,
        largest_win: wins.iter().copied().fold(0.0, f64::max),
        largest_loss: losses.iter().copied().fold(0.0, f64::min),
        total_commission: trades.iter().map(|t| t.commission).sum(),
        max_drawdown: compute_drawdown(&profits),
        sharpe_ratio: compute_sharpe(&profits),
        profit_factor,
        skewness,
        kurtosis,
        consistency_ratio: compute_consistency(&closing),
        trades_per_day: compute_trades_per_day(&closing),
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population central moment of order `k`.
fn central_moment(values: &[f64], k: i32) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(k)).sum::<f64>() / values.len() as f64
}

fn compute_drawdown(profits: &[f64]) -> f64 {
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;

    for p in profits {
        cumulative += p;
        peak = peak.max(cumulative);
        max_dd = max_dd.max(peak - cumulative);
    }

    max_dd
}

fn compute_sharpe(profits: &[f64]) -> f64 {
    let m = mean(profits);
    let std = central_moment(profits, 2).sqrt();

    if std > 0.0 {
        m / std
    } else if m > 0.0 {
        f64::INFINITY
    } else if m < 0.0 {
        f64::NEG_INFINITY
    } else {
        0.0
    }
}

/// Fisher skewness and excess kurtosis (biased estimators).
fn compute_moments(profits: &[f64]) -> (f64, f64) {
    let m2 = central_moment(profits, 2);
    if m2 <= 0.0 {
        return (0.0, 0.0);
    }
    let skew = central_moment(profits, 3) / m2.powf(1.5);
    let kurt = central_moment(profits, 4) / (m2 * m2) - 3.0;
    (skew, kurt)
}

fn compute_consistency(closing: &[&Trade]) -> f64 {
    let mut by_day: BTreeMap<chrono::NaiveDate, f64> = BTreeMap::new();
    for t in closing {
        *by_day.entry(t.timestamp.date()).or_insert(0.0) += t.profit;
    }
    let positive = by_day.values().filter(|p| **p > 0.0).count();
    100.0 * positive as f64 / by_day.len() as f64
}

fn compute_trades_per_day(closing: &[&Trade]) -> f64 {
    let (Some(first), Some(last)) = (closing.first(), closing.last()) else {
        return 0.0;
    };
    let span = (last.timestamp.date() - first.timestamp.date()).num_days() + 1;
    closing.len() as f64 / span.max(1) as f64
}
