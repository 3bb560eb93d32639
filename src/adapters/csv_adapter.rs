//! CSV file data adapter.
//!
//! One file per symbol, `<base>/<SYMBOL>.csv`, with a header row and columns
//! `timestamp,open,high,low,close,volume`.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::error::TradesimError;
use crate::domain::ohlcv::Bar;
use crate::domain::resample::{normalize_timestamp, Timeframe};
use crate::ports::data_port::HistoricalDataProvider;

pub struct CsvAdapter {
    base_path: PathBuf,
    utc_offset: FixedOffset,
}

impl CsvAdapter {
    /// Offset-aware timestamps are converted to UTC wall-clock time.
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            utc_offset: Utc.fix(),
        }
    }

    /// Convert offset-aware timestamps to wall-clock time in `offset`.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

/// RFC 3339 (converted into `offset`), naive "YYYY-MM-DD HH:MM:SS" /
/// "YYYY-MM-DDTHH:MM:SS" (taken as already in `offset`), or a bare date.
pub fn parse_timestamp(raw: &str, offset: FixedOffset) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(normalize_timestamp(dt, offset));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Read every bar in `path`, sorted by timestamp.
pub fn read_bars(path: &Path, offset: FixedOffset) -> Result<Vec<Bar>, TradesimError> {
    let csv_err = |line: Option<u64>, reason: String| TradesimError::Csv {
        path: path.display().to_string(),
        reason: match line {
            Some(l) => format!("line {l}: {reason}"),
            None => reason,
        },
    };

    let content = fs::read_to_string(path)
        .map_err(|e| csv_err(None, format!("failed to read: {e}")))?;

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| csv_err(None, e.to_string()))?;
        let line = record.position().map(|p| p.line());

        let raw_ts = record
            .get(0)
            .ok_or_else(|| csv_err(line, "missing timestamp column".into()))?;
        let timestamp = parse_timestamp(raw_ts, offset)
            .ok_or_else(|| csv_err(line, format!("invalid timestamp '{raw_ts}'")))?;

        let mut values = [0.0_f64; 5];
        for (i, (slot, name)) in values
            .iter_mut()
            .zip(["open", "high", "low", "close", "volume"])
            .enumerate()
        {
            let raw = record
                .get(i + 1)
                .ok_or_else(|| csv_err(line, format!("missing {name} column")))?;
            *slot = raw
                .parse()
                .map_err(|e| csv_err(line, format!("invalid {name} value '{raw}': {e}")))?;
        }
        let [open, high, low, close, volume] = values;

        bars.push(Bar::new(timestamp, open, high, low, close, volume));
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

/// Write bars as CSV with the same column layout `read_bars` expects.
pub fn write_bars<W: Write>(writer: W, bars: &[Bar]) -> Result<(), TradesimError> {
    let to_err = |e: csv::Error| TradesimError::Csv {
        path: "<output>".into(),
        reason: e.to_string(),
    };
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["timestamp", "open", "high", "low", "close", "volume"])
        .map_err(to_err)?;
    for bar in bars {
        wtr.write_record([
            bar.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])
        .map_err(to_err)?;
    }
    wtr.flush()?;
    Ok(())
}

#[async_trait]
impl HistoricalDataProvider for CsvAdapter {
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        timeframe: Timeframe,
    ) -> Result<Vec<Bar>, TradesimError> {
        let path = self.csv_path(symbol);
        if !path.is_file() {
            return Err(TradesimError::DataUnavailable {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
                reason: format!("{} not found", path.display()),
            });
        }

        let mut bars = read_bars(&path, self.utc_offset)?;
        bars.retain(|b| b.timestamp >= start && b.timestamp < end);
        Ok(bars)
    }
}
