//! Signal-to-trade translation for one symbol.
//!
//! Walks aligned bars and signals with single-position discipline:
//! - BUY while flat opens a long, SELL while flat opens a short
//! - the opposite signal closes the open position
//! - a repeated signal in the direction already held is ignored
//! - for a long-only series, SELL while flat is ignored
//!
//! A position still open after the last bar is reported as-is.

use tracing::{debug, warn};

use super::error::TradesimError;
use super::execution::{enter_position, exit_position, EntryResult, ExecutionConfig};
use super::ledger::Ledger;
use super::ohlcv::Bar;
use super::position::{Position, Trade, TradeAction};
use super::signal::{Signal, SignalSeries};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub initial_capital: f64,
    pub quantity: f64,
    pub execution: ExecutionConfig,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            initial_capital: 1_000_000.0,
            quantity: 1.0,
            execution: ExecutionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub trades: Vec<Trade>,
    /// Cash after every fill.
    pub final_capital: f64,
    /// Cash plus the open position marked at the last bar's price.
    pub final_equity: f64,
    pub open_position: Option<Position>,
    pub rejected_signals: usize,
}

pub fn simulate_trades(
    symbol: &str,
    bars: &[Bar],
    series: &SignalSeries,
    params: &SimulationParams,
) -> Result<SimulationResult, TradesimError> {
    if series.len() != bars.len() {
        return Err(TradesimError::Computation {
            reason: format!(
                "{symbol}: {} signals for {} bars",
                series.len(),
                bars.len()
            ),
        });
    }
    if let Some(fills) = &series.fill_prices {
        if fills.len() != bars.len() {
            return Err(TradesimError::Computation {
                reason: format!("{symbol}: {} fill prices for {} bars", fills.len(), bars.len()),
            });
        }
    }
    if !(params.quantity.is_finite() && params.quantity > 0.0) {
        return Err(TradesimError::Computation {
            reason: format!("{symbol}: trade quantity must be positive, got {}", params.quantity),
        });
    }

    let mut ledger = Ledger::new(symbol, params.initial_capital);
    let config = &params.execution;
    let mut last_price = None;

    for (i, (bar, signal)) in bars.iter().zip(&series.signals).enumerate() {
        let price = series
            .fill_prices
            .as_ref()
            .map_or(bar.close, |fills| fills[i]);

        let holding = ledger.position.as_ref().map(|p| p.is_long());
        match (signal, holding) {
            (Signal::Hold, _) => {}
            (Signal::Sell, None) if series.long_only => {
                debug!(symbol, timestamp = %bar.timestamp, "ignoring exit signal while flat");
            }
            (Signal::Buy, None) | (Signal::Sell, None) => {
                let action = if *signal == Signal::Buy {
                    TradeAction::Buy
                } else {
                    TradeAction::Sell
                };
                let result =
                    enter_position(&mut ledger, action, price, bar.timestamp, params.quantity, config);
                if let EntryResult::InsufficientCapital {
                    required,
                    available,
                } = result
                {
                    warn!(
                        symbol,
                        timestamp = %bar.timestamp,
                        required,
                        available,
                        "rejecting entry: insufficient capital"
                    );
                    ledger.record_rejection();
                }
            }
            (Signal::Sell, Some(true)) | (Signal::Buy, Some(false)) => {
                exit_position(&mut ledger, price, bar.timestamp, config);
            }
            (Signal::Buy, Some(true)) | (Signal::Sell, Some(false)) => {
                debug!(symbol, timestamp = %bar.timestamp, %signal, "ignoring signal, position already open");
            }
        }

        last_price = Some(price);
    }

    let final_equity = last_price.map_or(ledger.cash, |price| ledger.equity(price));
    Ok(SimulationResult {
        trades: ledger.trades,
        final_capital: ledger.cash,
        final_equity,
        open_position: ledger.position,
        rejected_signals: ledger.rejected_signals,
    })
}
