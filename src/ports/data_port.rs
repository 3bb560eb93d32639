//! Historical bar source port.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::domain::error::TradesimError;
use crate::domain::ohlcv::Bar;
use crate::domain::resample::Timeframe;

/// Source of historical bars for one symbol.
///
/// The window is half-open, `[start, end)`, in the backtest's reference
/// offset. Bars come back in ascending timestamp order and may be finer than
/// `timeframe`; callers resample. A source with nothing for the symbol
/// returns [`TradesimError::DataUnavailable`].
#[async_trait]
pub trait HistoricalDataProvider: Send + Sync {
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        timeframe: Timeframe,
    ) -> Result<Vec<Bar>, TradesimError>;
}

#[async_trait]
impl<T: HistoricalDataProvider + ?Sized> HistoricalDataProvider for Box<T> {
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        timeframe: Timeframe,
    ) -> Result<Vec<Bar>, TradesimError> {
        (**self).fetch_bars(symbol, start, end, timeframe).await
    }
}
