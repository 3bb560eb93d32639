//! Backtest run configuration and the aggregated result.

use chrono::{FixedOffset, NaiveDateTime};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;

use super::execution::ExecutionConfig;
use super::metrics::{analyze, PerformanceReport};
use super::position::{Position, Trade};
use super::resample::Timeframe;
use super::simulator::SimulationParams;
use super::strategy::{NamedStrategy, Strategy};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 1_000_000.0;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub symbols: Vec<String>,
    pub timeframes: Vec<Timeframe>,
    /// Inclusive start of the window, in the `utc_offset` wall clock.
    pub start: NaiveDateTime,
    /// Exclusive end of the window.
    pub end: NaiveDateTime,
    pub initial_capital: f64,
    pub quantity: Option<f64>,
    pub execution: ExecutionConfig,
    pub fetch_timeout: Option<Duration>,
    pub utc_offset: FixedOffset,
    pub strategies: Vec<NamedStrategy>,
    /// Configured strategies that failed to build. Each one is reported as
    /// a failed combination instead of stopping the run.
    pub rejected_strategies: Vec<RejectedStrategy>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedStrategy {
    pub name: String,
    pub reason: String,
}

impl BacktestConfig {
    /// True when the window holds no time at all.
    pub fn is_empty_window(&self) -> bool {
        self.start >= self.end
    }

    /// Simulation inputs for one strategy. Quantity resolves as the
    /// strategy's own lot size, then the configured quantity, then one unit.
    pub fn simulation_params(&self, strategy: &Strategy) -> SimulationParams {
        SimulationParams {
            initial_capital: self.initial_capital,
            quantity: strategy.quantity().or(self.quantity).unwrap_or(1.0),
            execution: self.execution.clone(),
        }
    }

    pub fn combination_count(&self) -> usize {
        (self.strategies.len() + self.rejected_strategies.len())
            * self.symbols.len()
            * self.timeframes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CombinationKey {
    pub strategy: String,
    pub symbol: String,
    pub timeframe: Timeframe,
}

impl CombinationKey {
    pub fn new(strategy: impl Into<String>, symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        CombinationKey {
            strategy: strategy.into(),
            symbol: symbol.into(),
            timeframe,
        }
    }
}

/// A finished simulation for one combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedRun {
    pub bars: usize,
    pub trades: Vec<Trade>,
    pub report: PerformanceReport,
    pub final_capital: f64,
    pub final_equity: f64,
    pub open_position: Option<Position>,
    pub rejected_signals: usize,
}

impl CompletedRun {
    /// No data, no trades.
    pub fn empty(initial_capital: f64) -> Self {
        CompletedRun {
            bars: 0,
            trades: Vec::new(),
            report: PerformanceReport::NoTrades,
            final_capital: initial_capital,
            final_equity: initial_capital,
            open_position: None,
            rejected_signals: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CombinationOutcome {
    Completed(CompletedRun),
    Failed { error: String },
}

impl CombinationOutcome {
    pub fn completed(&self) -> Option<&CompletedRun> {
        match self {
            CombinationOutcome::Completed(run) => Some(run),
            CombinationOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CombinationOutcome::Failed { .. })
    }
}

/// Every combination's outcome plus a per-strategy summary over all realized
/// trades of its completed combinations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BacktestReport {
    pub results: BTreeMap<CombinationKey, CombinationOutcome>,
    pub summary: BTreeMap<String, PerformanceReport>,
}

impl BacktestReport {
    /// Build the report, computing the summary for every strategy in
    /// `strategies` or `results` (including ones with no completed
    /// combination).
    pub fn new(
        results: BTreeMap<CombinationKey, CombinationOutcome>,
        strategies: &[NamedStrategy],
    ) -> Self {
        let mut pooled: BTreeMap<String, Vec<Trade>> = strategies
            .iter()
            .map(|s| (s.name.clone(), Vec::new()))
            .collect();

        for (key, outcome) in &results {
            let trades = pooled.entry(key.strategy.clone()).or_default();
            if let Some(run) = outcome.completed() {
                trades.extend(run.trades.iter().cloned());
            }
        }

        let summary = pooled
            .into_iter()
            .map(|(name, mut trades)| {
                trades.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
                (name, analyze(&trades))
            })
            .collect();

        BacktestReport { results, summary }
    }

    pub fn get(&self, strategy: &str, symbol: &str, timeframe: Timeframe) -> Option<&CombinationOutcome> {
        self.results
            .get(&CombinationKey::new(strategy, symbol, timeframe))
    }

    pub fn failure_count(&self) -> usize {
        self.results.values().filter(|o| o.is_failed()).count()
    }

    pub fn trade_count(&self) -> usize {
        self.results
            .values()
            .filter_map(CombinationOutcome::completed)
            .map(|run| run.trades.len())
            .sum()
    }
}

impl Serialize for BacktestReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Entry<'a> {
            strategy: &'a str,
            symbol: &'a str,
            timeframe: Timeframe,
            #[serde(flatten)]
            outcome: &'a CombinationOutcome,
        }

        let combinations: Vec<Entry<'_>> = self
            .results
            .iter()
            .map(|(key, outcome)| Entry {
                strategy: &key.strategy,
                symbol: &key.symbol,
                timeframe: key.timeframe,
                outcome,
            })
            .collect();

        let mut state = serializer.serialize_struct("BacktestReport", 2)?;
        state.serialize_field("combinations", &combinations)?;
        state.serialize_field("summary", &self.summary)?;
        state.end()
    }
}
