//! Configuration validation.
//!
//! Validates all config fields before a backtest runs, and provides the
//! field parsers the config builders share.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use std::str::FromStr;

use crate::domain::error::TradesimError;
use crate::domain::resample::Timeframe;
use crate::domain::strategy::StrategyKind;
use crate::ports::config_port::ConfigPort;

pub const BACKTEST: &str = "backtest";
pub const DATA: &str = "data";

/// Run-level checks. Individual strategy sections are checked by
/// [`validate_strategy_section`] when each strategy is built.
pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    validate_initial_capital(config)?;
    validate_rate(config, "slippage")?;
    validate_rate(config, "commission")?;
    validate_quantity(config)?;
    optional_count(config, BACKTEST, "fetch_timeout_secs")?;
    validate_window(config)?;
    parse_utc_offset(config.get_string(BACKTEST, "utc_offset").as_deref())?;
    parse_timeframes(config)?;
    validate_symbols(config)?;
    validate_strategies(config)?;
    validate_data_source(config)?;
    Ok(())
}

/// Section holding the parameters of strategy `id`.
pub fn strategy_section(id: &str) -> String {
    format!("strategy.{id}")
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TradesimError {
    TradesimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> TradesimError {
    TradesimError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

/// A present key must parse as a number.
pub fn optional_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, TradesimError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("'{raw}' is not a number"))),
    }
}

/// A present key must parse as a non-negative integer.
pub fn optional_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<usize>, TradesimError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("'{raw}' is not a non-negative integer"))),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    if let Some(value) = optional_number(config, BACKTEST, "initial_capital")? {
        if value <= 0.0 || !value.is_finite() {
            return Err(invalid(BACKTEST, "initial_capital", "initial_capital must be positive"));
        }
    }
    Ok(())
}

fn validate_rate(config: &dyn ConfigPort, key: &str) -> Result<(), TradesimError> {
    if let Some(value) = optional_number(config, BACKTEST, key)? {
        if value < 0.0 || !value.is_finite() {
            return Err(invalid(BACKTEST, key, format!("{key} must be non-negative")));
        }
    }
    Ok(())
}

fn validate_quantity(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    if let Some(value) = optional_number(config, BACKTEST, "quantity")? {
        if value <= 0.0 || !value.is_finite() {
            return Err(invalid(BACKTEST, "quantity", "quantity must be positive"));
        }
    }
    Ok(())
}

/// Accepts "YYYY-MM-DD HH:MM:SS", "YYYY-MM-DDTHH:MM:SS" or "YYYY-MM-DD"
/// (midnight).
pub fn parse_datetime(key: &str, value: &str) -> Result<NaiveDateTime, TradesimError> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|_| {
            invalid(
                BACKTEST,
                key,
                format!("invalid {key} '{value}', expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS"),
            )
        })
}

/// Start and end of the backtest window. Equal bounds are allowed and
/// describe an empty window.
pub fn parse_window(config: &dyn ConfigPort) -> Result<(NaiveDateTime, NaiveDateTime), TradesimError> {
    let start = config
        .get_string(BACKTEST, "start_date")
        .ok_or_else(|| missing(BACKTEST, "start_date"))?;
    let end = config
        .get_string(BACKTEST, "end_date")
        .ok_or_else(|| missing(BACKTEST, "end_date"))?;
    Ok((parse_datetime("start_date", &start)?, parse_datetime("end_date", &end)?))
}

fn validate_window(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let (start, end) = parse_window(config)?;
    if start > end {
        return Err(invalid(BACKTEST, "start_date", "start_date must not be after end_date"));
    }
    Ok(())
}

/// "+HH:MM", "-HH:MM", "+HHMM", "+HH", "Z" or "UTC". Missing means UTC.
pub fn parse_utc_offset(value: Option<&str>) -> Result<FixedOffset, TradesimError> {
    let utc = Utc.fix();
    let raw = match value.map(str::trim) {
        None | Some("") => return Ok(utc),
        Some(v) if v.eq_ignore_ascii_case("z") || v.eq_ignore_ascii_case("utc") => return Ok(utc),
        Some(v) => v,
    };

    let bad = || invalid(BACKTEST, "utc_offset", format!("invalid offset '{raw}', expected +HH:MM"));

    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => return Err(bad()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) || !(digits.len() == 2 || digits.len() == 4) {
        return Err(bad());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| bad())?;
    let minutes: i32 = if digits.len() == 4 {
        digits[2..].parse().map_err(|_| bad())?
    } else {
        0
    };
    if minutes >= 60 {
        return Err(bad());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(bad)
}

/// Configured timeframes, "1m" when unset.
pub fn parse_timeframes(config: &dyn ConfigPort) -> Result<Vec<Timeframe>, TradesimError> {
    let labels = config.get_list(BACKTEST, "timeframes");
    if labels.is_empty() {
        return Ok(vec![Timeframe::M1]);
    }
    let mut timeframes = Vec::with_capacity(labels.len());
    for label in labels {
        let tf = Timeframe::from_str(&label).map_err(|e| invalid(BACKTEST, "timeframes", e.to_string()))?;
        if !timeframes.contains(&tf) {
            timeframes.push(tf);
        }
    }
    Ok(timeframes)
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    if config.get_list(BACKTEST, "symbols").is_empty() {
        return Err(missing(BACKTEST, "symbols"));
    }
    Ok(())
}

fn validate_strategies(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let ids = config.get_list(BACKTEST, "strategies");
    if ids.is_empty() {
        return Err(missing(BACKTEST, "strategies"));
    }
    Ok(())
}

const COUNT_KEYS: &[&str] = &[
    "ema_short",
    "ema_long",
    "rsi_period",
    "higher_tf_rsi_period",
    "macd_fast",
    "macd_slow",
    "macd_signal",
    "breakout_period",
    "otm_strikes",
    "volatility_window",
    "expiry_bars",
];

const NUMBER_KEYS: &[&str] = &[
    "rsi_overbought",
    "rsi_oversold",
    "strike_increment",
    "volatility_threshold",
    "stop_loss_pct",
    "take_profit_pct",
    "trailing_stop_pct",
    "lot_size",
];

/// The section for `id` exists with a known `kind`, and every numeric
/// parameter present parses.
pub fn validate_strategy_section(config: &dyn ConfigPort, id: &str) -> Result<StrategyKind, TradesimError> {
    let section = strategy_section(id);
    let kind = config
        .get_string(&section, "kind")
        .ok_or_else(|| missing(&section, "kind"))?;
    let kind = StrategyKind::from_str(kind.trim())?;

    for key in COUNT_KEYS {
        optional_count(config, &section, key)?;
    }
    for key in NUMBER_KEYS {
        optional_number(config, &section, key)?;
    }
    Ok(kind)
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let source = config
        .get_string(DATA, "source")
        .unwrap_or_else(|| "csv".to_string());
    match source.trim().to_ascii_lowercase().as_str() {
        "csv" | "sqlite" => {}
        other => {
            return Err(invalid(
                DATA,
                "source",
                format!("unknown data source '{other}', expected csv or sqlite"),
            ))
        }
    }
    match config.get_string(DATA, "path") {
        Some(p) if !p.trim().is_empty() => Ok(()),
        _ => Err(missing(DATA, "path")),
    }
}
