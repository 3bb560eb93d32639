//! SQLite data adapter.
//!
//! Bars live in one `ohlcv` table keyed by (symbol, timestamp). Timestamps
//! are stored as "YYYY-MM-DD HH:MM:SS" text in the backtest's reference
//! offset, so lexical order is time order.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};

use crate::domain::config_validation::DATA;
use crate::domain::error::TradesimError;
use crate::domain::ohlcv::Bar;
use crate::domain::resample::Timeframe;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::HistoricalDataProvider;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn pool_err(e: r2d2::Error) -> TradesimError {
    TradesimError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> TradesimError {
    TradesimError::DatabaseQuery {
        reason: e.to_string(),
    }
}

#[derive(Clone)]
pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradesimError> {
        let db_path = config
            .get_string(DATA, "path")
            .ok_or_else(|| TradesimError::ConfigMissing {
                section: DATA.into(),
                key: "path".into(),
            })?;

        let pool_size = config.get_int(DATA, "pool_size", 4).clamp(1, 64) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, TradesimError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), TradesimError> {
        let conn = self.pool.get().map_err(pool_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS ohlcv (
                symbol TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume REAL NOT NULL,
                PRIMARY KEY (symbol, timestamp)
            );",
        )
        .map_err(query_err)?;

        Ok(())
    }

    pub fn insert_bars(&self, symbol: &str, bars: &[Bar]) -> Result<(), TradesimError> {
        let mut conn = self.pool.get().map_err(pool_err)?;
        let tx = conn.transaction().map_err(query_err)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO ohlcv (symbol, timestamp, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    symbol,
                    bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(())
    }

    /// Blocking query behind `fetch_bars`. `None` when the symbol has no
    /// rows at all.
    fn query_bars(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<Vec<Bar>>, TradesimError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let known: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM ohlcv WHERE symbol = ?1 LIMIT 1",
                params![symbol],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_err)?;
        if known.is_none() {
            return Ok(None);
        }

        let mut stmt = conn
            .prepare(
                "SELECT timestamp, open, high, low, close, volume
                 FROM ohlcv
                 WHERE symbol = ?1 AND timestamp >= ?2 AND timestamp < ?3
                 ORDER BY timestamp ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(
                params![
                    symbol,
                    start.format(TIMESTAMP_FORMAT).to_string(),
                    end.format(TIMESTAMP_FORMAT).to_string()
                ],
                |row| {
                    let raw: String = row.get(0)?;
                    let timestamp = NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
                        .map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(
                                0,
                                rusqlite::types::Type::Text,
                                Box::new(e),
                            )
                        })?;
                    Ok(Bar::new(
                        timestamp,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .map_err(query_err)?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(row.map_err(query_err)?);
        }
        Ok(Some(bars))
    }
}

#[async_trait]
impl HistoricalDataProvider for SqliteAdapter {
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        timeframe: Timeframe,
    ) -> Result<Vec<Bar>, TradesimError> {
        let adapter = self.clone();
        let owned_symbol = symbol.to_string();
        let fetched = tokio::task::spawn_blocking(move || adapter.query_bars(&owned_symbol, start, end))
            .await
            .map_err(|e| TradesimError::Database {
                reason: format!("query task failed: {e}"),
            })??;

        fetched.ok_or_else(|| TradesimError::DataUnavailable {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            reason: "no rows for symbol".into(),
        })
    }
}
