//! Volatility-triggered long straddle / strangle.
//!
//! While flat, a BUY is emitted when the realized volatility of log returns
//! over `volatility_window` bars exceeds `volatility_threshold`. Strikes are
//! taken around the at-the-money level (latest close rounded to
//! `strike_increment`): both legs at ATM for a straddle, or `otm_strikes`
//! increments above (call) and below (put) for a strangle.
//!
//! The position is marked with a synthetic combined premium each bar:
//! intrinsic value plus a time value of `sigma * sqrt(bars_left) * phi(d)`
//! per leg, where `sigma` is the current absolute per-bar volatility and `d`
//! the leg's moneyness in units of `sigma * sqrt(bars_left)`. A SELL closes
//! the position on stop-loss, take-profit, trailing stop from the peak
//! premium, or expiry. Premiums are reported as fill prices.

use crate::domain::indicator::log_return_volatility;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::{Signal, SignalSeries};

const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

#[derive(Debug, Clone, PartialEq)]
pub struct StraddleParams {
    pub strike_increment: f64,
    /// 0 trades a straddle; N > 0 a strangle N increments out of the money.
    pub otm_strikes: u32,
    pub volatility_window: usize,
    pub volatility_threshold: f64,
    pub expiry_bars: usize,
    /// Fractions of the entry premium; 0 disables the check.
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    /// Fraction below the peak premium; 0 disables the check.
    pub trailing_stop_pct: f64,
    pub lot_size: Option<f64>,
}

impl Default for StraddleParams {
    fn default() -> Self {
        StraddleParams {
            strike_increment: 50.0,
            otm_strikes: 0,
            volatility_window: 20,
            volatility_threshold: 0.002,
            expiry_bars: 75,
            stop_loss_pct: 0.3,
            take_profit_pct: 0.5,
            trailing_stop_pct: 0.2,
            lot_size: None,
        }
    }
}

impl StraddleParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.strike_increment.is_finite() && self.strike_increment > 0.0) {
            return Err("strike_increment must be positive".into());
        }
        if self.volatility_window < 2 {
            return Err("volatility_window must be at least 2".into());
        }
        if self.expiry_bars == 0 {
            return Err("expiry_bars must be positive".into());
        }
        for (name, value) in [
            ("volatility_threshold", self.volatility_threshold),
            ("stop_loss_pct", self.stop_loss_pct),
            ("take_profit_pct", self.take_profit_pct),
            ("trailing_stop_pct", self.trailing_stop_pct),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(format!("{name} must be non-negative"));
            }
        }
        if self.stop_loss_pct >= 1.0 || self.trailing_stop_pct >= 1.0 {
            return Err("stop_loss_pct and trailing_stop_pct must be below 1".into());
        }
        if let Some(lot) = self.lot_size {
            if !(lot.is_finite() && lot > 0.0) {
                return Err("lot_size must be positive".into());
            }
        }
        Ok(())
    }

    /// (call strike, put strike) for a given spot.
    pub fn strikes(&self, spot: f64) -> (f64, f64) {
        let atm = (spot / self.strike_increment).round() * self.strike_increment;
        let offset = self.otm_strikes as f64 * self.strike_increment;
        (atm + offset, atm - offset)
    }
}

/// Combined call + put value under the synthetic pricing model.
pub fn combined_premium(
    spot: f64,
    call_strike: f64,
    put_strike: f64,
    sigma: f64,
    bars_left: usize,
) -> f64 {
    let scale = sigma * (bars_left as f64).sqrt();
    let leg = |moneyness: f64| {
        let intrinsic = moneyness.max(0.0);
        if scale > 0.0 {
            let d = moneyness / scale;
            intrinsic + scale * INV_SQRT_2PI * (-0.5 * d * d).exp()
        } else {
            intrinsic
        }
    };
    leg(spot - call_strike) + leg(put_strike - spot)
}

#[derive(Debug, Clone)]
struct OpenPosition {
    call_strike: f64,
    put_strike: f64,
    entry_premium: f64,
    peak_premium: f64,
    bars_left: usize,
    sigma: f64,
}

impl OpenPosition {
    fn should_exit(&self, premium: f64, params: &StraddleParams) -> bool {
        self.bars_left == 0
            || (params.stop_loss_pct > 0.0
                && premium <= self.entry_premium * (1.0 - params.stop_loss_pct))
            || (params.take_profit_pct > 0.0
                && premium >= self.entry_premium * (1.0 + params.take_profit_pct))
            || (params.trailing_stop_pct > 0.0
                && premium <= self.peak_premium * (1.0 - params.trailing_stop_pct))
    }
}

pub fn signals(params: &StraddleParams, bars: &[Bar]) -> SignalSeries {
    let volatility = log_return_volatility(bars, params.volatility_window);
    let mut signals = Vec::with_capacity(bars.len());
    let mut fills = Vec::with_capacity(bars.len());
    let mut open: Option<OpenPosition> = None;

    for (i, bar) in bars.iter().enumerate() {
        let spot = bar.close;
        let vol = volatility.value_at(i);

        match open.as_mut() {
            None => match vol {
                Some(v) if v > params.volatility_threshold => {
                    let (call_strike, put_strike) = params.strikes(spot);
                    let sigma = v * spot;
                    let premium =
                        combined_premium(spot, call_strike, put_strike, sigma, params.expiry_bars);
                    if premium > 0.0 {
                        open = Some(OpenPosition {
                            call_strike,
                            put_strike,
                            entry_premium: premium,
                            peak_premium: premium,
                            bars_left: params.expiry_bars,
                            sigma,
                        });
                        signals.push(Signal::Buy);
                        fills.push(premium);
                    } else {
                        signals.push(Signal::Hold);
                        fills.push(spot);
                    }
                }
                _ => {
                    signals.push(Signal::Hold);
                    fills.push(spot);
                }
            },
            Some(pos) => {
                pos.bars_left = pos.bars_left.saturating_sub(1);
                if let Some(v) = vol {
                    pos.sigma = v * spot;
                }
                let premium = combined_premium(
                    spot,
                    pos.call_strike,
                    pos.put_strike,
                    pos.sigma,
                    pos.bars_left,
                );
                pos.peak_premium = pos.peak_premium.max(premium);
                fills.push(premium);

                if pos.should_exit(premium, params) {
                    signals.push(Signal::Sell);
                    open = None;
                } else {
                    signals.push(Signal::Hold);
                }
            }
        }
    }

    SignalSeries::with_fill_prices(signals, fills).long_only()
}
