//! Domain error types.

/// Top-level error type for tradesim.
#[derive(Debug, thiserror::Error)]
pub enum TradesimError {
    #[error("no data for {symbol} ({timeframe}): {reason}")]
    DataUnavailable {
        symbol: String,
        timeframe: String,
        reason: String,
    },

    #[error("fetch for {symbol} ({timeframe}) timed out after {seconds}s")]
    FetchTimeout {
        symbol: String,
        timeframe: String,
        seconds: u64,
    },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy kind '{kind}'")]
    UnknownStrategy { kind: String },

    #[error("invalid strategy parameters for {strategy}: {reason}")]
    StrategyInvalid { strategy: String, reason: String },

    #[error("computation error: {reason}")]
    Computation { reason: String },

    #[error("csv error in {path}: {reason}")]
    Csv { path: String, reason: String },

    #[error("{strategy} on {symbol} ({timeframe}) failed: {source}")]
    Aggregation {
        strategy: String,
        symbol: String,
        timeframe: String,
        #[source]
        source: Box<TradesimError>,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradesimError {
    /// True when the source had nothing for the requested symbol/window.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, TradesimError::DataUnavailable { .. })
    }
}

impl From<&TradesimError> for std::process::ExitCode {
    fn from(err: &TradesimError) -> Self {
        let code: u8 = match err {
            TradesimError::Aggregation { source, .. } => {
                return std::process::ExitCode::from(source.as_ref());
            }
            TradesimError::Io(_) | TradesimError::Json(_) => 1,
            TradesimError::ConfigParse { .. }
            | TradesimError::ConfigMissing { .. }
            | TradesimError::ConfigInvalid { .. } => 2,
            TradesimError::Database { .. } | TradesimError::DatabaseQuery { .. } => 3,
            TradesimError::UnknownStrategy { .. } | TradesimError::StrategyInvalid { .. } => 4,
            TradesimError::DataUnavailable { .. }
            | TradesimError::FetchTimeout { .. }
            | TradesimError::Csv { .. } => 5,
            TradesimError::Computation { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_unavailable_display() {
        let err = TradesimError::DataUnavailable {
            symbol: "BTCUSDT".into(),
            timeframe: "1h".into(),
            reason: "no table".into(),
        };
        assert_eq!(err.to_string(), "no data for BTCUSDT (1h): no table");
        assert!(err.is_data_unavailable());
    }

    #[test]
    fn config_invalid_display() {
        let err = TradesimError::ConfigInvalid {
            section: "backtest".into(),
            key: "slippage".into(),
            reason: "must be non-negative".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [backtest] slippage: must be non-negative"
        );
        assert!(!err.is_data_unavailable());
    }

    #[test]
    fn aggregation_wraps_combination_failure() {
        let err = TradesimError::Aggregation {
            strategy: "fast_ema".into(),
            symbol: "NIFTY".into(),
            timeframe: "5m".into(),
            source: Box::new(TradesimError::Computation {
                reason: "2 signals for 3 bars".into(),
            }),
        };
        assert_eq!(
            err.to_string(),
            "fast_ema on NIFTY (5m) failed: computation error: 2 signals for 3 bars"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
