//! Signal-generating strategies.
//!
//! `Strategy` is a closed set of variants. Every variant maps a bar series to
//! a `SignalSeries` of the same length; indicators still in warmup produce
//! HOLD. EMA and MACD crossovers are binary once warm (always BUY or SELL),
//! the others are three-state.

pub mod breakout;
pub mod ema_crossover;
pub mod ema_rsi;
pub mod macd_crossover;
pub mod rsi_crossover;
pub mod rsi_macd;
pub mod straddle;

pub use breakout::BreakoutParams;
pub use ema_crossover::EmaCrossoverParams;
pub use ema_rsi::EmaRsiParams;
pub use macd_crossover::MacdParams;
pub use rsi_crossover::{RsiCrossoverParams, RsiThresholds};
pub use rsi_macd::RsiMacdParams;
pub use straddle::StraddleParams;

use std::fmt;
use std::str::FromStr;

use crate::domain::error::TradesimError;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::SignalSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    EmaCrossover,
    RsiCrossover,
    MacdCrossover,
    EmaRsi,
    RsiMacd,
    Breakout,
    StraddleStrangle,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::EmaCrossover => "ema_crossover",
            StrategyKind::RsiCrossover => "rsi_crossover",
            StrategyKind::MacdCrossover => "macd_crossover",
            StrategyKind::EmaRsi => "ema_rsi",
            StrategyKind::RsiMacd => "rsi_macd",
            StrategyKind::Breakout => "breakout",
            StrategyKind::StraddleStrangle => "straddle_strangle",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = TradesimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "ema_crossover" | "ema" => Ok(StrategyKind::EmaCrossover),
            "rsi_crossover" | "rsi" => Ok(StrategyKind::RsiCrossover),
            "macd_crossover" | "macd" => Ok(StrategyKind::MacdCrossover),
            "ema_rsi" => Ok(StrategyKind::EmaRsi),
            "rsi_macd" => Ok(StrategyKind::RsiMacd),
            "breakout" => Ok(StrategyKind::Breakout),
            "straddle_strangle" | "straddle" | "strangle" => Ok(StrategyKind::StraddleStrangle),
            _ => Err(TradesimError::UnknownStrategy {
                kind: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    EmaCrossover(EmaCrossoverParams),
    RsiCrossover(RsiCrossoverParams),
    MacdCrossover(MacdParams),
    EmaRsi(EmaRsiParams),
    RsiMacd(RsiMacdParams),
    Breakout(BreakoutParams),
    StraddleStrangle(StraddleParams),
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::EmaCrossover(_) => StrategyKind::EmaCrossover,
            Strategy::RsiCrossover(_) => StrategyKind::RsiCrossover,
            Strategy::MacdCrossover(_) => StrategyKind::MacdCrossover,
            Strategy::EmaRsi(_) => StrategyKind::EmaRsi,
            Strategy::RsiMacd(_) => StrategyKind::RsiMacd,
            Strategy::Breakout(_) => StrategyKind::Breakout,
            Strategy::StraddleStrangle(_) => StrategyKind::StraddleStrangle,
        }
    }

    /// A strategy with default parameters for `kind`.
    pub fn default_for(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::EmaCrossover => Strategy::EmaCrossover(EmaCrossoverParams::default()),
            StrategyKind::RsiCrossover => Strategy::RsiCrossover(RsiCrossoverParams::default()),
            StrategyKind::MacdCrossover => Strategy::MacdCrossover(MacdParams::default()),
            StrategyKind::EmaRsi => Strategy::EmaRsi(EmaRsiParams::default()),
            StrategyKind::RsiMacd => Strategy::RsiMacd(RsiMacdParams::default()),
            StrategyKind::Breakout => Strategy::Breakout(BreakoutParams::default()),
            StrategyKind::StraddleStrangle => {
                Strategy::StraddleStrangle(StraddleParams::default())
            }
        }
    }

    pub fn compute_signals(&self, bars: &[Bar]) -> SignalSeries {
        match self {
            Strategy::EmaCrossover(p) => SignalSeries::new(ema_crossover::signals(p, bars)),
            Strategy::RsiCrossover(p) => SignalSeries::new(rsi_crossover::signals(p, bars)),
            Strategy::MacdCrossover(p) => SignalSeries::new(macd_crossover::signals(p, bars)),
            Strategy::EmaRsi(p) => SignalSeries::new(ema_rsi::signals(p, bars)),
            Strategy::RsiMacd(p) => SignalSeries::new(rsi_macd::signals(p, bars)),
            Strategy::Breakout(p) => SignalSeries::new(breakout::signals(p, bars)),
            Strategy::StraddleStrangle(p) => straddle::signals(p, bars),
        }
    }

    /// Check parameter consistency. `name` is used in the error message.
    pub fn validate(&self, name: &str) -> Result<(), TradesimError> {
        let result = match self {
            Strategy::EmaCrossover(p) => p.validate(),
            Strategy::RsiCrossover(p) => p.validate(),
            Strategy::MacdCrossover(p) => p.validate(),
            Strategy::EmaRsi(p) => p.ema.validate().and_then(|_| p.rsi.validate()),
            Strategy::RsiMacd(p) => p.rsi.validate().and_then(|_| p.macd.validate()),
            Strategy::Breakout(p) => p.validate(),
            Strategy::StraddleStrangle(p) => p.validate(),
        };
        result.map_err(|reason| TradesimError::StrategyInvalid {
            strategy: name.to_string(),
            reason,
        })
    }

    /// Per-trade quantity the strategy prescribes, if any.
    pub fn quantity(&self) -> Option<f64> {
        match self {
            Strategy::StraddleStrangle(p) => p.lot_size,
            _ => None,
        }
    }
}

/// A configured strategy and the identifier results are reported under.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedStrategy {
    pub name: String,
    pub strategy: Strategy,
}

impl NamedStrategy {
    pub fn new(name: impl Into<String>, strategy: Strategy) -> Self {
        NamedStrategy {
            name: name.into(),
            strategy,
        }
    }
}

pub(crate) fn require_positive(name: &str, value: usize) -> Result<(), String> {
    if value == 0 {
        Err(format!("{name} must be positive"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::bars_from_closes;
    use crate::domain::signal::Signal;

    #[test]
    fn kind_parses_names_and_aliases() {
        assert_eq!(
            "ema_crossover".parse::<StrategyKind>().unwrap(),
            StrategyKind::EmaCrossover
        );
        assert_eq!("RSI-MACD".parse::<StrategyKind>().unwrap(), StrategyKind::RsiMacd);
        assert_eq!(
            "strangle".parse::<StrategyKind>().unwrap(),
            StrategyKind::StraddleStrangle
        );
        assert!(matches!(
            "martingale".parse::<StrategyKind>(),
            Err(TradesimError::UnknownStrategy { .. })
        ));
    }

    #[test]
    fn default_for_round_trips_kind() {
        for kind in [
            StrategyKind::EmaCrossover,
            StrategyKind::RsiCrossover,
            StrategyKind::MacdCrossover,
            StrategyKind::EmaRsi,
            StrategyKind::RsiMacd,
            StrategyKind::Breakout,
            StrategyKind::StraddleStrangle,
        ] {
            let strategy = Strategy::default_for(kind);
            assert_eq!(strategy.kind(), kind);
            assert!(strategy.validate("default").is_ok(), "{kind} defaults invalid");
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn every_variant_aligns_with_bars() {
        let closes: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        let bars = bars_from_closes(&closes);

        for kind in [
            StrategyKind::EmaCrossover,
            StrategyKind::RsiCrossover,
            StrategyKind::MacdCrossover,
            StrategyKind::EmaRsi,
            StrategyKind::RsiMacd,
            StrategyKind::Breakout,
            StrategyKind::StraddleStrangle,
        ] {
            let series = Strategy::default_for(kind).compute_signals(&bars);
            assert_eq!(series.len(), bars.len(), "{kind} misaligned");
            if let Some(fills) = &series.fill_prices {
                assert_eq!(fills.len(), bars.len());
            }
        }
    }

    #[test]
    fn empty_bars_give_empty_signals() {
        for kind in [StrategyKind::EmaCrossover, StrategyKind::StraddleStrangle] {
            assert!(Strategy::default_for(kind).compute_signals(&[]).is_empty());
        }
    }

    #[test]
    fn warmup_is_hold() {
        let bars = bars_from_closes(&[100.0, 101.0, 102.0]);
        let series = Strategy::default_for(StrategyKind::MacdCrossover).compute_signals(&bars);
        assert!(series.signals.iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn validate_reports_strategy_name() {
        let strategy = Strategy::EmaCrossover(EmaCrossoverParams { short: 30, long: 10 });
        match strategy.validate("fast_ema") {
            Err(TradesimError::StrategyInvalid { strategy, reason }) => {
                assert_eq!(strategy, "fast_ema");
                assert!(reason.contains("short"));
            }
            other => panic!("expected StrategyInvalid, got {other:?}"),
        }
    }

    #[test]
    fn only_straddle_prescribes_quantity() {
        let straddle = Strategy::StraddleStrangle(StraddleParams {
            lot_size: Some(50.0),
            ..StraddleParams::default()
        });
        assert_eq!(straddle.quantity(), Some(50.0));
        assert_eq!(Strategy::default_for(StrategyKind::Breakout).quantity(), None);
    }
}
