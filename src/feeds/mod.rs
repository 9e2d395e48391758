pub mod csv_file;
pub mod yahoo;

use crate::config::{AppConfig, PriceSource};
use crate::errors::{SimError, SimResult};
use crate::state::PriceSeries;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Supplier of historical daily closes.
#[derive(Clone)]
pub enum HistoryFeed {
    Yahoo(yahoo::YahooClient),
    Csv(PathBuf),
}

impl HistoryFeed {
    pub fn from_config(cfg: &AppConfig) -> Self {
        match cfg.price_source {
            PriceSource::Yahoo => HistoryFeed::Yahoo(yahoo::YahooClient::new(&cfg.yahoo_base_url)),
            PriceSource::Csv => HistoryFeed::Csv(cfg.price_csv_path.clone()),
        }
    }

    /// Closes for `symbol` dated in [start, end).
    pub async fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> SimResult<PriceSeries> {
        if start >= end {
            return Err(SimError::InvalidParameter(format!(
                "start date {start} must be before end date {end}"
            )));
        }

        let points = match self {
            HistoryFeed::Yahoo(client) => client.fetch_daily_closes(symbol, start, end).await?,
            HistoryFeed::Csv(path) => csv_file::load_closes(path, start, end)?,
        };

        if points.is_empty() {
            return Err(SimError::InsufficientData(format!(
                "no closes for {symbol} between {start} and {end}"
            )));
        }

        let series = PriceSeries::new(points)?;
        tracing::info!(symbol = symbol, points = series.len(), "price history loaded");
        Ok(series)
    }
}
