//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::warn;

use crate::adapters::csv_adapter::{self, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::{JsonReportAdapter, DEFAULT_OUTPUT_PATH};
use crate::domain::backtest::{
    BacktestConfig, BacktestReport, CombinationOutcome, RejectedStrategy, DEFAULT_INITIAL_CAPITAL,
};
use crate::domain::config_validation::{
    optional_count, optional_number, parse_timeframes, parse_utc_offset, parse_window,
    strategy_section, validate_backtest_config, validate_strategy_section, BACKTEST, DATA,
};
use crate::domain::error::TradesimError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::metrics::PerformanceReport;
use crate::domain::orchestrator::BacktestOrchestrator;
use crate::domain::resample::{resample, Timeframe};
use crate::domain::strategy::{
    BreakoutParams, EmaCrossoverParams, EmaRsiParams, MacdParams, NamedStrategy,
    RsiCrossoverParams, RsiMacdParams, RsiThresholds, StraddleParams, Strategy, StrategyKind,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::HistoricalDataProvider;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "tradesim", about = "Multi-strategy OHLCV backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Run only this symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Validate and print the plan without fetching data
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a backtest configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Resample a bar CSV and print it to stdout
    Resample {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        timeframe: Timeframe,
        /// Reference offset for offset-aware timestamps
        #[arg(long)]
        utc_offset: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            output,
            symbol,
            dry_run,
        } => run_backtest(&config, output.as_ref(), symbol.as_deref(), dry_run),
        Command::Validate { config } => run_validate(&config),
        Command::Resample {
            input,
            timeframe,
            utc_offset,
        } => run_resample(&input, timeframe, utc_offset.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, TradesimError> {
    FileConfigAdapter::from_file(path).map_err(|e| TradesimError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn run_backtest(
    config_path: &PathBuf,
    output_path: Option<&PathBuf>,
    symbol_override: Option<&str>,
    dry_run: bool,
) -> Result<(), TradesimError> {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;

    // Stage 2: Build BacktestConfig and strategies
    let mut bt_config = build_backtest_config(&adapter)?;
    if let Some(symbol) = symbol_override {
        bt_config.symbols = vec![symbol.to_string()];
    }

    eprintln!(
        "Backtest plan: {} strategies x {} symbols x {} timeframes, {} to {}",
        bt_config.strategies.len(),
        bt_config.symbols.len(),
        bt_config.timeframes.len(),
        bt_config.start,
        bt_config.end,
    );
    for named in &bt_config.strategies {
        eprintln!("  strategy {}: {}", named.name, named.strategy.kind());
    }
    for rejected in &bt_config.rejected_strategies {
        eprintln!("  strategy {}: rejected ({})", rejected.name, rejected.reason);
    }

    if dry_run {
        eprintln!("Dry run: configuration is valid, {} combinations", bt_config.combination_count());
        return Ok(());
    }

    // Stage 3: Resolve data source
    let provider = build_provider(&adapter, bt_config.utc_offset)?;

    // Stage 4: Run
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let orchestrator = BacktestOrchestrator::new(bt_config, provider);
    let report = runtime.block_on(orchestrator.run());

    // Stage 5: Console summary
    print_summary(&report);

    // Stage 6: Write results
    let output = output_path
        .map(|p| p.display().to_string())
        .or_else(|| adapter.get_string("output", "path"))
        .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string());
    JsonReportAdapter::new().write(&report, &output)?;
    eprintln!("\nResults written to: {output}");

    Ok(())
}

fn run_validate(config_path: &PathBuf) -> Result<(), TradesimError> {
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    for id in adapter.get_list(BACKTEST, "strategies") {
        build_strategy(&adapter, &id)?;
    }
    let bt_config = build_backtest_config(&adapter)?;

    eprintln!("Configuration is valid:");
    eprintln!("  symbols:    {}", bt_config.symbols.join(", "));
    eprintln!(
        "  timeframes: {}",
        bt_config
            .timeframes
            .iter()
            .map(|tf| tf.label())
            .collect::<Vec<_>>()
            .join(", ")
    );
    for named in &bt_config.strategies {
        eprintln!("  strategy {}: {}", named.name, named.strategy.kind());
    }
    Ok(())
}

fn run_resample(
    input: &PathBuf,
    timeframe: Timeframe,
    utc_offset: Option<&str>,
) -> Result<(), TradesimError> {
    let offset = parse_utc_offset(utc_offset)?;
    let bars = csv_adapter::read_bars(input, offset)?;
    let (bars, rejected) = crate::domain::ohlcv::sanitize_bars(&input.display().to_string(), bars);
    if rejected > 0 {
        eprintln!("warning: dropped {rejected} invalid bars");
    }
    let resampled = resample(&bars, timeframe);
    csv_adapter::write_bars(io::stdout().lock(), &resampled)
}

/// Build the run configuration. A strategy whose section does not build is
/// kept as a [`RejectedStrategy`] so the remaining strategies still run.
pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, TradesimError> {
    let (start, end) = parse_window(adapter)?;

    let mut strategies = Vec::new();
    let mut rejected_strategies = Vec::new();
    for id in adapter.get_list(BACKTEST, "strategies") {
        match build_strategy(adapter, &id) {
            Ok(named) => strategies.push(named),
            Err(err) => {
                warn!(strategy = %id, error = %err, "strategy rejected");
                rejected_strategies.push(RejectedStrategy {
                    name: id,
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok(BacktestConfig {
        symbols: adapter.get_list(BACKTEST, "symbols"),
        timeframes: parse_timeframes(adapter)?,
        start,
        end,
        initial_capital: optional_number(adapter, BACKTEST, "initial_capital")?
            .unwrap_or(DEFAULT_INITIAL_CAPITAL),
        quantity: optional_number(adapter, BACKTEST, "quantity")?,
        execution: ExecutionConfig {
            slippage: optional_number(adapter, BACKTEST, "slippage")?.unwrap_or(0.0),
            commission_rate: optional_number(adapter, BACKTEST, "commission")?.unwrap_or(0.0),
        },
        fetch_timeout: optional_count(adapter, BACKTEST, "fetch_timeout_secs")?
            .map(|secs| Duration::from_secs(secs as u64)),
        utc_offset: parse_utc_offset(adapter.get_string(BACKTEST, "utc_offset").as_deref())?,
        strategies,
        rejected_strategies,
    })
}

/// Reads one `[strategy.<id>]` section.
struct StrategySection<'a> {
    adapter: &'a dyn ConfigPort,
    section: String,
}

impl StrategySection<'_> {
    fn count(&self, key: &str, default: usize) -> Result<usize, TradesimError> {
        Ok(optional_count(self.adapter, &self.section, key)?.unwrap_or(default))
    }

    fn number(&self, key: &str, default: f64) -> Result<f64, TradesimError> {
        Ok(optional_number(self.adapter, &self.section, key)?.unwrap_or(default))
    }

    fn ema(&self) -> Result<EmaCrossoverParams, TradesimError> {
        let d = EmaCrossoverParams::default();
        Ok(EmaCrossoverParams {
            short: self.count("ema_short", d.short)?,
            long: self.count("ema_long", d.long)?,
        })
    }

    fn rsi(&self) -> Result<RsiThresholds, TradesimError> {
        let d = RsiThresholds::default();
        Ok(RsiThresholds {
            period: self.count("rsi_period", d.period)?,
            overbought: self.number("rsi_overbought", d.overbought)?,
            oversold: self.number("rsi_oversold", d.oversold)?,
        })
    }

    fn macd(&self) -> Result<MacdParams, TradesimError> {
        let d = MacdParams::default();
        Ok(MacdParams {
            fast: self.count("macd_fast", d.fast)?,
            slow: self.count("macd_slow", d.slow)?,
            signal: self.count("macd_signal", d.signal)?,
        })
    }

    fn straddle(&self) -> Result<StraddleParams, TradesimError> {
        let d = StraddleParams::default();
        Ok(StraddleParams {
            strike_increment: self.number("strike_increment", d.strike_increment)?,
            otm_strikes: u32::try_from(self.count("otm_strikes", d.otm_strikes as usize)?)
                .map_err(|_| TradesimError::ConfigInvalid {
                    section: self.section.clone(),
                    key: "otm_strikes".into(),
                    reason: "otm_strikes is out of range".into(),
                })?,
            volatility_window: self.count("volatility_window", d.volatility_window)?,
            volatility_threshold: self.number("volatility_threshold", d.volatility_threshold)?,
            expiry_bars: self.count("expiry_bars", d.expiry_bars)?,
            stop_loss_pct: self.number("stop_loss_pct", d.stop_loss_pct)?,
            take_profit_pct: self.number("take_profit_pct", d.take_profit_pct)?,
            trailing_stop_pct: self.number("trailing_stop_pct", d.trailing_stop_pct)?,
            lot_size: optional_number(self.adapter, &self.section, "lot_size")?,
        })
    }
}

/// Build and validate the strategy configured in `[strategy.<id>]`.
pub fn build_strategy(adapter: &dyn ConfigPort, id: &str) -> Result<NamedStrategy, TradesimError> {
    let kind = validate_strategy_section(adapter, id)?;
    let s = StrategySection {
        adapter,
        section: strategy_section(id),
    };

    let strategy = match kind {
        StrategyKind::EmaCrossover => Strategy::EmaCrossover(s.ema()?),
        StrategyKind::RsiCrossover => Strategy::RsiCrossover(RsiCrossoverParams {
            thresholds: s.rsi()?,
            higher_tf_period: optional_count(adapter, &s.section, "higher_tf_rsi_period")?,
        }),
        StrategyKind::MacdCrossover => Strategy::MacdCrossover(s.macd()?),
        StrategyKind::EmaRsi => Strategy::EmaRsi(EmaRsiParams {
            ema: s.ema()?,
            rsi: s.rsi()?,
        }),
        StrategyKind::RsiMacd => Strategy::RsiMacd(RsiMacdParams {
            rsi: s.rsi()?,
            macd: s.macd()?,
        }),
        StrategyKind::Breakout => Strategy::Breakout(BreakoutParams {
            period: s.count("breakout_period", BreakoutParams::default().period)?,
        }),
        StrategyKind::StraddleStrangle => Strategy::StraddleStrangle(s.straddle()?),
    };

    strategy.validate(id)?;
    Ok(NamedStrategy::new(id, strategy))
}

fn build_provider(
    adapter: &dyn ConfigPort,
    utc_offset: chrono::FixedOffset,
) -> Result<Box<dyn HistoricalDataProvider>, TradesimError> {
    let source = adapter
        .get_string(DATA, "source")
        .unwrap_or_else(|| "csv".to_string())
        .trim()
        .to_ascii_lowercase();
    let path = adapter
        .get_string(DATA, "path")
        .ok_or_else(|| TradesimError::ConfigMissing {
            section: DATA.into(),
            key: "path".into(),
        })?;

    match source.as_str() {
        "csv" => Ok(Box::new(
            CsvAdapter::new(PathBuf::from(path)).with_utc_offset(utc_offset),
        )),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Box::new(
            crate::adapters::sqlite_adapter::SqliteAdapter::from_config(adapter)?,
        )),
        other => Err(TradesimError::ConfigInvalid {
            section: DATA.into(),
            key: "source".into(),
            reason: format!("data source '{other}' is not available in this build"),
        }),
    }
}

fn fmt_ratio(value: f64) -> String {
    if value.is_infinite() {
        if value > 0.0 { "inf".into() } else { "-inf".into() }
    } else {
        format!("{value:.2}")
    }
}

fn print_summary(report: &BacktestReport) {
    eprintln!("\n=== Combinations ===");
    for (key, outcome) in &report.results {
        let label = format!("{} {} {}", key.strategy, key.symbol, key.timeframe);
        match outcome {
            CombinationOutcome::Completed(run) => match &run.report {
                PerformanceReport::NoTrades => {
                    eprintln!("  {label}: {} bars, no closed trades", run.bars);
                }
                PerformanceReport::Stats(s) => {
                    let pnl_sign = if s.total_profit >= 0.0 { "+" } else { "" };
                    eprintln!(
                        "  {label}: {} trades, {:.1}% win rate, {pnl_sign}{:.2} profit, sharpe {}, max dd {:.2}",
                        s.total_trades,
                        s.win_rate,
                        s.total_profit,
                        fmt_ratio(s.sharpe_ratio),
                        s.max_drawdown,
                    );
                }
            },
            CombinationOutcome::Failed { error } => eprintln!("  {label}: FAILED ({error})"),
        }
    }

    eprintln!("\n=== Strategy Summary ===");
    for (name, summary) in &report.summary {
        match summary.stats() {
            Some(s) => eprintln!(
                "  {name}: {} trades, {:.1}% win rate, {:.2} profit, profit factor {}",
                s.total_trades,
                s.win_rate,
                s.total_profit,
                fmt_ratio(s.profit_factor),
            ),
            None => eprintln!("  {name}: no trades"),
        }
    }

    let failures = report.failure_count();
    if failures > 0 {
        eprintln!("\nwarning: {failures} combination(s) failed");
    }
}
