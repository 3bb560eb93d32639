//! JSON result writer implementing ReportPort.

use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestReport;
use crate::domain::error::TradesimError;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_OUTPUT_PATH: &str = "backtest_results.json";

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, report: &BacktestReport) -> Result<String, TradesimError> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &BacktestReport, output_path: &str) -> Result<(), TradesimError> {
        let json = self.render(report)?;
        let path = Path::new(output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{CombinationKey, CombinationOutcome, CompletedRun};
    use crate::domain::resample::Timeframe;
    use crate::domain::strategy::{NamedStrategy, Strategy, StrategyKind};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample_report() -> BacktestReport {
        let strategies = vec![NamedStrategy::new(
            "ema",
            Strategy::default_for(StrategyKind::EmaCrossover),
        )];
        let mut results = BTreeMap::new();
        results.insert(
            CombinationKey::new("ema", "NIFTY", Timeframe::M15),
            CombinationOutcome::Completed(CompletedRun::empty(1_000_000.0)),
        );
        BacktestReport::new(results, &strategies)
    }

    #[test]
    fn writes_pretty_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.json");
        let adapter = JsonReportAdapter::new();

        adapter
            .write(&sample_report(), path.to_str().unwrap())
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        let combo = &value["combinations"][0];
        assert_eq!(combo["symbol"], "NIFTY");
        assert_eq!(combo["timeframe"], "15m");
        assert_eq!(combo["report"]["status"], "no_trades");
        assert_eq!(combo["final_capital"], 1_000_000.0);
        assert_eq!(combo["final_equity"], 1_000_000.0);
        assert_eq!(value["summary"]["ema"]["status"], "no_trades");
    }

    #[test]
    fn unwritable_path_is_io_error() {
        let dir = TempDir::new().unwrap();
        // a directory cannot be overwritten as a file
        let err = JsonReportAdapter::new()
            .write(&sample_report(), dir.path().to_str().unwrap())
            .unwrap_err();
        assert!(matches!(err, TradesimError::Io(_)));
    }
}
