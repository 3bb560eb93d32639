//! Per-symbol position and capital ledger.
//!
//! A ledger holds at most one position. Capital moves with every fill: a BUY
//! debits `price * quantity + commission`, a SELL credits
//! `price * quantity - commission`.

use super::position::{Position, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub symbol: String,
    pub cash: f64,
    pub position: Option<Position>,
    pub trades: Vec<Trade>,
    pub rejected_signals: usize,
}

impl Ledger {
    pub fn new(symbol: impl Into<String>, initial_capital: f64) -> Self {
        Ledger {
            symbol: symbol.into(),
            cash: initial_capital,
            position: None,
            trades: Vec::new(),
            rejected_signals: 0,
        }
    }

    pub fn open_position(&mut self, position: Position) {
        self.position = Some(position);
    }

    /// Take the open position, leaving the ledger flat.
    pub fn take_position(&mut self) -> Option<Position> {
        self.position.take()
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn record_rejection(&mut self) {
        self.rejected_signals += 1;
    }

    /// Cash plus the signed value of the open position at `price`. A short
    /// was credited on entry, so it subtracts its current value.
    pub fn equity(&self, price: f64) -> f64 {
        match &self.position {
            Some(pos) => self.cash + pos.quantity * price,
            None => self.cash,
        }
    }
}
