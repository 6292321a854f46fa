//! Börsdata instrument source on top of [`ApiClient`].

use crate::adapters::api_client::ApiClient;
use crate::adapters::delimited_adapter::parse_date;
use crate::domain::error::SnrError;
use crate::domain::series::RawClose;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const INSTRUMENTS_PATH: &str = "/v1/instruments";
pub const INSTRUMENTS_TTL: Duration = Duration::from_secs(24 * 3600);
// New prices are published once a day; an hour keeps intraday reruns cheap.
pub const STOCK_PRICES_TTL: Duration = Duration::from_secs(3600);
pub const KPI_TTL: Duration = Duration::from_secs(24 * 3600);
pub const F_SCORE_KPI_ID: u32 = 167;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Instrument {
    #[serde(rename = "insId")]
    pub id: i64,
    pub name: String,
    pub ticker: String,
}

#[derive(Debug, Deserialize)]
struct InstrumentList {
    instruments: Vec<Instrument>,
}

#[derive(Debug, Deserialize)]
struct StockPrice {
    d: String,
    c: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StockPriceList {
    #[serde(rename = "stockPricesList")]
    stock_prices: Vec<StockPrice>,
}

pub struct BorsdataSource {
    client: ApiClient,
    instruments: Option<Vec<Instrument>>,
}

impl BorsdataSource {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            instruments: None,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// The instrument list is fetched at most once per run.
    pub fn instruments(&mut self) -> Result<&[Instrument], SnrError> {
        if self.instruments.is_none() {
            let value = self.client.fetch(INSTRUMENTS_PATH, INSTRUMENTS_TTL)?;
            let list: InstrumentList = decode(INSTRUMENTS_PATH, value)?;
            debug!(count = list.instruments.len(), "loaded instrument list");
            self.instruments = Some(list.instruments);
        }
        Ok(self.instruments.as_deref().unwrap_or_default())
    }

    pub fn find_instrument(&mut self, ticker: &str) -> Result<Instrument, SnrError> {
        self.instruments()?
            .iter()
            .find(|i| i.ticker.eq_ignore_ascii_case(ticker))
            .cloned()
            .ok_or_else(|| SnrError::not_found(ticker, "no instrument with this ticker"))
    }

    pub fn stock_prices(&mut self, instrument_id: i64) -> Result<Vec<RawClose>, SnrError> {
        let path = format!("/v1/instruments/{instrument_id}/stockprices");
        let value = self.client.fetch(&path, STOCK_PRICES_TTL)?;
        let list: StockPriceList = decode(&path, value)?;

        let mut closes = Vec::with_capacity(list.stock_prices.len());
        for price in list.stock_prices {
            let Some(date) = parse_date(&price.d) else {
                warn!(%path, date = %price.d, "skipping price with unparseable date");
                continue;
            };
            closes.push(RawClose::new(date, price.c.unwrap_or(0.0)));
        }
        Ok(closes)
    }

    /// Latest F-score, or `None` when the upstream has no value.
    pub fn f_score(&mut self, instrument_id: i64) -> Result<Option<i64>, SnrError> {
        let path = format!("/v1/instruments/{instrument_id}/kpis/{F_SCORE_KPI_ID}/last/point");
        let value = self.client.fetch(&path, KPI_TTL)?;
        Ok(value
            .pointer("/value/n")
            .and_then(Value::as_f64)
            .map(|n| n as i64))
    }
}

fn decode<T: serde::de::DeserializeOwned>(path: &str, value: Value) -> Result<T, SnrError> {
    serde_json::from_value(value).map_err(|e| SnrError::TransportFailure {
        path: path.to_string(),
        reason: format!("unexpected response shape: {e}"),
    })
}
