//! Backtest orchestration over strategy x symbol x timeframe.
//!
//! Bars for each (symbol, timeframe) pair are fetched once, concurrently,
//! then every strategy runs against the same prepared series. The only await
//! points are the fetches; everything after runs synchronously.

use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::backtest::{
    BacktestConfig, BacktestReport, CombinationKey, CombinationOutcome, CompletedRun,
    RejectedStrategy,
};
use super::error::TradesimError;
use super::metrics::analyze;
use super::ohlcv::{sanitize_bars, Bar};
use super::resample::{resample, Timeframe};
use super::simulator::simulate_trades;
use super::strategy::NamedStrategy;
use crate::ports::data_port::HistoricalDataProvider;

pub struct BacktestOrchestrator<P> {
    config: BacktestConfig,
    provider: P,
}

impl<P: HistoricalDataProvider> BacktestOrchestrator<P> {
    pub fn new(config: BacktestConfig, provider: P) -> Self {
        BacktestOrchestrator { config, provider }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run every combination. Never fails as a whole: a combination that
    /// cannot complete is recorded as [`CombinationOutcome::Failed`].
    pub async fn run(&self) -> BacktestReport {
        let pairs: Vec<(&str, Timeframe)> = self
            .config
            .symbols
            .iter()
            .flat_map(|symbol| {
                self.config
                    .timeframes
                    .iter()
                    .map(move |tf| (symbol.as_str(), *tf))
            })
            .collect();

        let mut results = BTreeMap::new();

        if self.config.is_empty_window() {
            info!(
                start = %self.config.start,
                end = %self.config.end,
                "empty backtest window, skipping data fetch"
            );
            for (symbol, timeframe) in &pairs {
                self.fill_empty(&mut results, symbol, *timeframe);
                self.fill_rejected(&mut results, symbol, *timeframe);
            }
            return BacktestReport::new(results, &self.config.strategies);
        }

        let fetched = join_all(
            pairs
                .iter()
                .map(|(symbol, timeframe)| self.fetch(symbol, *timeframe)),
        )
        .await;

        for ((symbol, timeframe), fetched) in pairs.iter().zip(fetched) {
            self.fill_rejected(&mut results, symbol, *timeframe);
            match fetched {
                Ok(bars) => {
                    let bars = self.prepare(symbol, *timeframe, bars);
                    for named in &self.config.strategies {
                        let key = CombinationKey::new(&named.name, *symbol, *timeframe);
                        let outcome = self.run_combination(named, symbol, *timeframe, &bars);
                        results.insert(key, outcome);
                    }
                }
                Err(err) if err.is_data_unavailable() => {
                    warn!(symbol, timeframe = %timeframe, error = %err, "no data, skipping");
                    self.fill_empty(&mut results, symbol, *timeframe);
                }
                Err(err) => {
                    warn!(symbol, timeframe = %timeframe, error = %err, "fetch failed");
                    for named in &self.config.strategies {
                        results.insert(
                            CombinationKey::new(&named.name, *symbol, *timeframe),
                            CombinationOutcome::Failed {
                                error: err.to_string(),
                            },
                        );
                    }
                }
            }
        }

        BacktestReport::new(results, &self.config.strategies)
    }

    async fn fetch(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Bar>, TradesimError> {
        let request = self
            .provider
            .fetch_bars(symbol, self.config.start, self.config.end, timeframe);

        match self.config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| TradesimError::FetchTimeout {
                    symbol: symbol.to_string(),
                    timeframe: timeframe.to_string(),
                    seconds: limit.as_secs(),
                })?,
            None => request.await,
        }
    }

    /// Window filter, sanitize, resample.
    fn prepare(&self, symbol: &str, timeframe: Timeframe, mut bars: Vec<Bar>) -> Vec<Bar> {
        let (start, end) = (self.config.start, self.config.end);
        bars.retain(|b| b.timestamp >= start && b.timestamp < end);

        let (bars, rejected) = sanitize_bars(symbol, bars);
        if rejected > 0 {
            warn!(symbol, timeframe = %timeframe, rejected, "dropped invalid bars");
        }
        resample(&bars, timeframe)
    }

    fn run_combination(
        &self,
        named: &NamedStrategy,
        symbol: &str,
        timeframe: Timeframe,
        bars: &[Bar],
    ) -> CombinationOutcome {
        match self.simulate(named, symbol, bars) {
            Ok(run) => {
                info!(
                    strategy = %named.name,
                    symbol,
                    timeframe = %timeframe,
                    bars = run.bars,
                    trades = run.trades.len(),
                    final_capital = run.final_capital,
                    final_equity = run.final_equity,
                    "combination completed"
                );
                CombinationOutcome::Completed(run)
            }
            Err(err) => self.failed(named, symbol, timeframe, err),
        }
    }

    fn simulate(
        &self,
        named: &NamedStrategy,
        symbol: &str,
        bars: &[Bar],
    ) -> Result<CompletedRun, TradesimError> {
        named.strategy.validate(&named.name)?;
        let signals = named.strategy.compute_signals(bars);
        let params = self.config.simulation_params(&named.strategy);
        let sim = simulate_trades(symbol, bars, &signals, &params)?;
        let report = analyze(&sim.trades);

        Ok(CompletedRun {
            bars: bars.len(),
            trades: sim.trades,
            report,
            final_capital: sim.final_capital,
            final_equity: sim.final_equity,
            open_position: sim.open_position,
            rejected_signals: sim.rejected_signals,
        })
    }

    fn failed(
        &self,
        named: &NamedStrategy,
        symbol: &str,
        timeframe: Timeframe,
        cause: TradesimError,
    ) -> CombinationOutcome {
        let err = TradesimError::Aggregation {
            strategy: named.name.clone(),
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            source: Box::new(cause),
        };
        warn!(error = %err, "combination failed");
        CombinationOutcome::Failed {
            error: err.to_string(),
        }
    }

    fn fill_rejected(
        &self,
        results: &mut BTreeMap<CombinationKey, CombinationOutcome>,
        symbol: &str,
        timeframe: Timeframe,
    ) {
        for RejectedStrategy { name, reason } in &self.config.rejected_strategies {
            let error = format!("{name} on {symbol} ({timeframe}) failed: {reason}");
            warn!(%error, "combination failed");
            results.insert(
                CombinationKey::new(name, symbol, timeframe),
                CombinationOutcome::Failed { error },
            );
        }
    }

    fn fill_empty(
        &self,
        results: &mut BTreeMap<CombinationKey, CombinationOutcome>,
        symbol: &str,
        timeframe: Timeframe,
    ) {
        for named in &self.config.strategies {
            results.insert(
                CombinationKey::new(&named.name, symbol, timeframe),
                CombinationOutcome::Completed(CompletedRun::empty(self.config.initial_capital)),
            );
        }
    }
}
