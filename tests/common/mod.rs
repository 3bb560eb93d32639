#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime, Offset, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tradesim::domain::backtest::{BacktestConfig, DEFAULT_INITIAL_CAPITAL};
use tradesim::domain::error::TradesimError;
use tradesim::domain::execution::ExecutionConfig;
pub use tradesim::domain::ohlcv::Bar;
use tradesim::domain::resample::Timeframe;
use tradesim::domain::strategy::{BreakoutParams, NamedStrategy, Strategy};
use tradesim::ports::data_port::HistoricalDataProvider;

#[derive(Debug, Clone)]
pub enum MockFailure {
    Unavailable,
    Database(String),
}

/// In-memory provider. Fetches are counted through a shared counter so the
/// count stays readable after the provider moves into an orchestrator.
pub struct MockProvider {
    pub data: HashMap<String, Vec<Bar>>,
    pub failures: HashMap<String, MockFailure>,
    pub delay: Option<Duration>,
    fetches: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            failures: HashMap::new(),
            delay: None,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_unavailable(mut self, symbol: &str) -> Self {
        self.failures
            .insert(symbol.to_string(), MockFailure::Unavailable);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.failures
            .insert(symbol.to_string(), MockFailure::Database(reason.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }
}

#[async_trait]
impl HistoricalDataProvider for MockProvider {
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        timeframe: Timeframe,
    ) -> Result<Vec<Bar>, TradesimError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.get(symbol) {
            Some(MockFailure::Unavailable) => Err(TradesimError::DataUnavailable {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
                reason: "not in mock".into(),
            }),
            Some(MockFailure::Database(reason)) => Err(TradesimError::Database {
                reason: reason.clone(),
            }),
            None => Ok(self
                .data
                .get(symbol)
                .map(|bars| {
                    bars.iter()
                        .filter(|b| b.timestamp >= start && b.timestamp < end)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()),
        }
    }
}

pub fn ts(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// One-minute bars from 2024-01-02 09:15 with open = high = low = close.
pub fn flat_bars(closes: &[f64]) -> Vec<Bar> {
    let start = ts(2, 9, 15);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(start + ChronoDuration::minutes(i as i64), c, c, c, c, 100.0))
        .collect()
}

/// Rising-then-falling minute series with a little intrabar range.
pub fn generate_bars(count: usize, start_price: f64) -> Vec<Bar> {
    let start = ts(2, 9, 15);
    (0..count)
        .map(|i| {
            let drift = if i < count / 2 { i as f64 } else { (count - i) as f64 };
            let close = start_price + drift;
            Bar::new(
                start + ChronoDuration::minutes(i as i64),
                close - 0.25,
                close + 0.5,
                close - 0.5,
                close,
                1000.0,
            )
        })
        .collect()
}

pub fn breakout(name: &str, period: usize) -> NamedStrategy {
    NamedStrategy::new(name, Strategy::Breakout(BreakoutParams { period }))
}

pub fn sample_config(symbols: &[&str], strategies: Vec<NamedStrategy>) -> BacktestConfig {
    BacktestConfig {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        timeframes: vec![Timeframe::M1],
        start: ts(1, 0, 0),
        end: ts(10, 0, 0),
        initial_capital: DEFAULT_INITIAL_CAPITAL,
        quantity: None,
        execution: ExecutionConfig::default(),
        fetch_timeout: None,
        utc_offset: Utc.fix(),
        strategies,
        rejected_strategies: Vec::new(),
    }
}
