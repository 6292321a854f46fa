#![allow(dead_code)]

use chrono::{Days, Local, NaiveDate};
use snrscan::adapters::api_client::{ApiClient, ApiClientConfig};
use snrscan::adapters::record_cache::RecordCache;
use snrscan::adapters::remote_adapter::BorsdataSource;
use snrscan::analysis::Analyzer;
use snrscan::domain::correction::CorrectionTable;
use snrscan::domain::record::default_record_max_age;
use snrscan::ports::http_port::{HttpTransport, TransportError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

pub const TEST_HOST: &str = "api.test";

/// Answers request paths from a fixed table and records every call.
#[derive(Clone, Default)]
pub struct MockTransport {
    routes: Rc<RefCell<HashMap<String, String>>>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(self, path: &str, body: impl Into<String>) -> Self {
        self.routes.borrow_mut().insert(path.to_string(), body.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl HttpTransport for MockTransport {
    fn get(&self, url: &str) -> Result<String, TransportError> {
        let path = url
            .strip_prefix(&format!("https://{TEST_HOST}"))
            .and_then(|rest| rest.split('?').next())
            .unwrap_or(url)
            .to_string();
        self.calls.borrow_mut().push(path.clone());
        self.routes
            .borrow()
            .get(&path)
            .cloned()
            .ok_or_else(|| TransportError::status(404))
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Daily closes ending today, oldest first: `start * (1 + growth)^(t / 365.25)`
/// times a small sine wobble that is zero on the latest day.
pub fn trajectory(years: f64, growth: f64, wobble: f64) -> Vec<(NaiveDate, f64)> {
    let today = today();
    let days = (years * 365.25) as u64;
    (0..=days)
        .rev()
        .map(|ago| {
            let t = (days - ago) as f64 / 365.25;
            let noise = 1.0 + wobble * (0.1 * ago as f64).sin();
            (today - Days::new(ago), 100.0 * (1.0 + growth).powf(t) * noise)
        })
        .collect()
}

/// Semicolon export, most recent row first, comma decimals.
pub fn semicolon_export(prices: &[(NaiveDate, f64)]) -> String {
    let mut out = String::from("\"Date\";\"Price\"\n\"\";\"Close\"\n");
    for (date, price) in prices.iter().rev() {
        out.push_str(&format!(
            "\"{}\";\"{}\"\n",
            date.format("%Y-%m-%d"),
            format!("{price:.2}").replace('.', ",")
        ));
    }
    out
}

pub fn write_export(dir: &Path, file_name: &str, prices: &[(NaiveDate, f64)]) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, semicolon_export(prices)).unwrap();
    path
}

pub fn instruments_json(entries: &[(i64, &str, &str)]) -> String {
    let items: Vec<String> = entries
        .iter()
        .map(|(id, name, ticker)| {
            format!(r#"{{"insId": {id}, "name": "{name}", "ticker": "{ticker}"}}"#)
        })
        .collect();
    format!(r#"{{"instruments": [{}]}}"#, items.join(","))
}

pub fn stock_prices_json(prices: &[(NaiveDate, f64)]) -> String {
    let items: Vec<String> = prices
        .iter()
        .map(|(date, price)| format!(r#"{{"d": "{}", "c": {price:.4}}}"#, date.format("%Y-%m-%d")))
        .collect();
    format!(r#"{{"stockPricesList": [{}]}}"#, items.join(","))
}

pub fn f_score_json(score: i64) -> String {
    format!(r#"{{"kpiId": 167, "value": {{"i": 0, "n": {score}.0, "s": null}}}}"#)
}

pub struct TestEnv {
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl TestEnv {
    pub fn new(root: &Path) -> Self {
        let env = Self {
            cache_dir: root.join("cache"),
            output_dir: root.join("out"),
        };
        fs::create_dir_all(&env.output_dir).unwrap();
        env
    }

    pub fn analyzer(&self, transport: MockTransport, offline: bool) -> Analyzer {
        self.analyzer_with(transport, offline, CorrectionTable::default())
    }

    pub fn analyzer_with(
        &self,
        transport: MockTransport,
        offline: bool,
        corrections: CorrectionTable,
    ) -> Analyzer {
        let client = ApiClient::new(
            Box::new(transport),
            ApiClientConfig {
                host: TEST_HOST.into(),
                api_key: "test-key".into(),
                cache_dir: self.cache_dir.clone(),
                min_interval: Duration::from_millis(5),
                offline,
            },
        );
        Analyzer::new(
            BorsdataSource::new(client),
            RecordCache::new(&self.cache_dir),
            corrections,
            default_record_max_age(),
            self.output_dir.clone(),
        )
    }
}
