//! Trade execution and fill simulation.
//!
//! Implements entry/exit against a [`Ledger`] with proportional slippage and
//! commission. Rates are fractions: a slippage of 0.001 moves a BUY fill
//! 0.1% above the market price.

use chrono::NaiveDateTime;

use super::ledger::Ledger;
use super::position::{Position, Trade, TradeAction, TradeEffect};

/// Cost assumptions applied to every fill.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionConfig {
    pub slippage: f64,
    pub commission_rate: f64,
}

/// Commission on a fill: trade_value * commission_rate.
pub fn calculate_commission(trade_value: f64, config: &ExecutionConfig) -> f64 {
    trade_value * config.commission_rate
}

/// Adverse slippage: BUY fills at price * (1 + slippage), SELL at
/// price * (1 - slippage).
pub fn apply_slippage(market_price: f64, action: TradeAction, slippage: f64) -> f64 {
    match action {
        TradeAction::Buy => market_price * (1.0 + slippage),
        TradeAction::Sell => market_price * (1.0 - slippage),
    }
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        quantity: f64,
        execution_price: f64,
        commission: f64,
    },
    InsufficientCapital {
        required: f64,
        available: f64,
    },
}

/// Open a position on a flat ledger.
///
/// A BUY opens a long and must be covered by available cash including
/// commission; a SELL opens a short and credits the proceeds.
pub fn enter_position(
    ledger: &mut Ledger,
    action: TradeAction,
    market_price: f64,
    timestamp: NaiveDateTime,
    quantity: f64,
    config: &ExecutionConfig,
) -> EntryResult {
    let execution_price = apply_slippage(market_price, action, config.slippage);
    let notional = execution_price * quantity;
    let commission = calculate_commission(notional, config);

    let signed_quantity = match action {
        TradeAction::Buy => {
            let required = notional + commission;
            if required > ledger.cash {
                return EntryResult::InsufficientCapital {
                    required,
                    available: ledger.cash,
                };
            }
            ledger.cash -= required;
            quantity
        }
        TradeAction::Sell => {
            ledger.cash += notional - commission;
            -quantity
        }
    };

    ledger.open_position(Position {
        symbol: ledger.symbol.clone(),
        quantity: signed_quantity,
        entry_price: execution_price,
        entry_timestamp: timestamp,
    });

    ledger.record_trade(Trade {
        symbol: ledger.symbol.clone(),
        timestamp,
        action,
        price: execution_price,
        quantity,
        commission,
        profit: 0.0,
        effect: TradeEffect::Open,
    });

    EntryResult::Entered {
        quantity: signed_quantity,
        execution_price,
        commission,
    }
}

/// Result of an exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub action: TradeAction,
    pub exit_price: f64,
    pub commission: f64,
    pub profit: f64,
}

/// Close the open position, if any.
///
/// Steps:
/// 1. Direction is opposite to the position (long exits SELL, short exits BUY)
/// 2. Apply slippage for that direction
/// 3. Profit = signed quantity * (exit - entry) - exit commission
/// 4. Settle cash and record the closing trade
pub fn exit_position(
    ledger: &mut Ledger,
    market_price: f64,
    timestamp: NaiveDateTime,
    config: &ExecutionConfig,
) -> Option<ExitResult> {
    let position = ledger.take_position()?;

    let action = if position.is_long() {
        TradeAction::Sell
    } else {
        TradeAction::Buy
    };
    let exit_price = apply_slippage(market_price, action, config.slippage);
    let quantity = position.quantity.abs();
    let notional = exit_price * quantity;
    let commission = calculate_commission(notional, config);
    let profit = position.quantity * (exit_price - position.entry_price) - commission;

    match action {
        TradeAction::Sell => ledger.cash += notional - commission,
        TradeAction::Buy => ledger.cash -= notional + commission,
    }

    ledger.record_trade(Trade {
        symbol: position.symbol,
        timestamp,
        action,
        price: exit_price,
        quantity,
        commission,
        profit,
        effect: TradeEffect::Close,
    });

    Some(ExitResult {
        action,
        exit_price,
        commission,
        profit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_config() -> ExecutionConfig {
        ExecutionConfig {
            slippage: 0.001,
            commission_rate: 0.0005,
        }
    }

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(9, minute, 0)
            .unwrap()
    }

    #[test]
    fn calculate_commission_basic() {
        let commission = calculate_commission(10000.0, &make_config());
        assert!((commission - 5.0).abs() < 1e-12);
    }

    #[test]
    fn calculate_commission_zero_rate() {
        let commission = calculate_commission(10000.0, &ExecutionConfig::default());
        assert_eq!(commission, 0.0);
    }

    #[test]
    fn slippage_is_adverse() {
        let buy = apply_slippage(100.0, TradeAction::Buy, 0.001);
        let sell = apply_slippage(100.0, TradeAction::Sell, 0.001);
        assert!((buy - 100.1).abs() < 1e-12);
        assert!((sell - 99.9).abs() < 1e-12);
    }

    #[test]
    fn enter_long_debits_cost_and_commission() {
        let mut ledger = Ledger::new("NIFTY", 10000.0);
        let result = enter_position(&mut ledger, TradeAction::Buy, 100.0, ts(15), 10.0, &make_config());

        match result {
            EntryResult::Entered {
                quantity,
                execution_price,
                commission,
            } => {
                assert_eq!(quantity, 10.0);
                assert!((execution_price - 100.1).abs() < 1e-12);
                assert!((commission - 1001.0 * 0.0005).abs() < 1e-12);
                assert!((ledger.cash - (10000.0 - 1001.0 - commission)).abs() < 1e-9);
            }
            other => panic!("expected entry, got {other:?}"),
        }

        let pos = ledger.position.as_ref().unwrap();
        assert!(pos.is_long());
        assert_eq!(ledger.trades.len(), 1);
        assert_eq!(ledger.trades[0].effect, TradeEffect::Open);
        assert_eq!(ledger.trades[0].profit, 0.0);
    }

    #[test]
    fn enter_long_insufficient_capital() {
        let mut ledger = Ledger::new("NIFTY", 50.0);
        let result = enter_position(&mut ledger, TradeAction::Buy, 100.0, ts(15), 1.0, &make_config());

        assert!(matches!(result, EntryResult::InsufficientCapital { .. }));
        assert!(ledger.position.is_none());
        assert!(ledger.trades.is_empty());
        assert_eq!(ledger.cash, 50.0);
    }

    #[test]
    fn cost_plus_commission_exceeding_cash_is_rejected() {
        // 100 * 1 fits exactly, the commission does not
        let config = ExecutionConfig {
            slippage: 0.0,
            commission_rate: 0.01,
        };
        let mut ledger = Ledger::new("NIFTY", 100.0);
        let result = enter_position(&mut ledger, TradeAction::Buy, 100.0, ts(15), 1.0, &config);
        assert!(matches!(result, EntryResult::InsufficientCapital { .. }));
    }

    #[test]
    fn enter_short_credits_proceeds() {
        let mut ledger = Ledger::new("NIFTY", 0.0);
        let result = enter_position(&mut ledger, TradeAction::Sell, 100.0, ts(15), 2.0, &make_config());

        assert!(matches!(result, EntryResult::Entered { quantity, .. } if quantity == -2.0));
        let notional = 99.9 * 2.0;
        assert!((ledger.cash - (notional - notional * 0.0005)).abs() < 1e-9);
        assert!(!ledger.position.as_ref().unwrap().is_long());
    }

    #[test]
    fn exit_long_profit() {
        let config = ExecutionConfig::default();
        let mut ledger = Ledger::new("NIFTY", 1000.0);
        enter_position(&mut ledger, TradeAction::Buy, 100.0, ts(15), 2.0, &config);
        let exit = exit_position(&mut ledger, 110.0, ts(16), &config).unwrap();

        assert_eq!(exit.action, TradeAction::Sell);
        assert!((exit.profit - 20.0).abs() < 1e-12);
        assert!((ledger.cash - 1020.0).abs() < 1e-12);
        assert!(ledger.position.is_none());
        assert_eq!(ledger.trades.len(), 2);
        assert!(ledger.trades[1].is_closing());
    }

    #[test]
    fn exit_short_profit() {
        let config = ExecutionConfig::default();
        let mut ledger = Ledger::new("NIFTY", 1000.0);
        enter_position(&mut ledger, TradeAction::Sell, 100.0, ts(15), 3.0, &config);
        let exit = exit_position(&mut ledger, 90.0, ts(16), &config).unwrap();

        assert_eq!(exit.action, TradeAction::Buy);
        assert!((exit.profit - 30.0).abs() < 1e-12);
        assert!((ledger.cash - 1030.0).abs() < 1e-12);
    }

    #[test]
    fn exit_deducts_only_closing_commission() {
        let config = ExecutionConfig {
            slippage: 0.0,
            commission_rate: 0.01,
        };
        let mut ledger = Ledger::new("NIFTY", 1000.0);
        enter_position(&mut ledger, TradeAction::Buy, 100.0, ts(15), 1.0, &config);
        let exit = exit_position(&mut ledger, 120.0, ts(16), &config).unwrap();

        assert!((exit.commission - 1.2).abs() < 1e-12);
        assert!((exit.profit - (20.0 - 1.2)).abs() < 1e-12);
        // both commissions left the cash balance
        assert!((ledger.cash - (1000.0 - 101.0 + 118.8)).abs() < 1e-9);
    }

    #[test]
    fn exit_long_loss_with_slippage() {
        let config = make_config();
        let mut ledger = Ledger::new("NIFTY", 1000.0);
        enter_position(&mut ledger, TradeAction::Buy, 100.0, ts(15), 1.0, &config);
        let exit = exit_position(&mut ledger, 100.0, ts(16), &config).unwrap();

        // round trip at an unchanged price loses the slippage spread
        assert!(exit.profit < 0.0);
        assert!((exit.exit_price - 99.9).abs() < 1e-12);
    }

    #[test]
    fn exit_when_flat_is_none() {
        let mut ledger = Ledger::new("NIFTY", 1000.0);
        assert!(exit_position(&mut ledger, 100.0, ts(15), &make_config()).is_none());
        assert!(ledger.trades.is_empty());
    }
}
