//! Open positions and executed trades.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// Side of a simulated fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
        })
    }
}

/// Whether a trade opened a position or closed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeEffect {
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub symbol: String,
    /// Positive for long, negative for short.
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_timestamp: NaiveDateTime,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }
}

/// One simulated fill. Opening trades carry zero profit; a closing trade's
/// profit is the price move on the position less its own commission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub action: TradeAction,
    pub price: f64,
    pub quantity: f64,
    pub commission: f64,
    pub profit: f64,
    pub effect: TradeEffect,
}

impl Trade {
    pub fn is_closing(&self) -> bool {
        self.effect == TradeEffect::Close
    }
}
