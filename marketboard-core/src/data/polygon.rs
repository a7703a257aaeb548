//! Polygon.io data provider.
//!
//! Fetches daily aggregates from the v2 aggregates API, one request per
//! symbol. The API key is sent as a bearer token and never appears in a URL or
//! an error message. Non-success statuses are mapped to [`DataError`] and returned as-is:
//! a 429 is passed through to the caller and never retried here.

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::decode::{BarDecoder, PolygonAggsDecoder};
use super::provider::{DataError, DataProvider};
use crate::domain::Bar;

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Connection settings for [`PolygonProvider`].
#[derive(Clone)]
pub struct PolygonSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl fmt::Debug for PolygonSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolygonSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PolygonSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Read the API key from the environment variable `var`.
    pub fn from_env(var: &str) -> Result<Self, DataError> {
        let key = std::env::var(var).map_err(|_| {
            DataError::AuthenticationRequired(format!("environment variable {var} is not set"))
        })?;
        if key.trim().is_empty() {
            return Err(DataError::AuthenticationRequired(format!(
                "environment variable {var} is empty"
            )));
        }
        Ok(Self::new(key.trim()))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Polygon.io live data provider.
pub struct PolygonProvider {
    client: reqwest::blocking::Client,
    settings: PolygonSettings,
    decoder: Box<dyn BarDecoder>,
}

impl PolygonProvider {
    pub fn new(settings: PolygonSettings) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("marketboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            settings,
            decoder: Box::new(PolygonAggsDecoder),
        })
    }

    /// Replace the payload decoder (for vendors proxying Polygon's shape).
    pub fn with_decoder(mut self, decoder: Box<dyn BarDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    fn base(&self) -> &str {
        self.settings.base_url.trim_end_matches('/')
    }

    /// Daily aggregates URL for a symbol and inclusive date range.
    ///
    /// The API key travels in the `Authorization` header, never in the URL.
    pub fn range_url(&self, symbol: &str, from: NaiveDate, to: NaiveDate, limit: usize) -> String {
        format!(
            "{}/v2/aggs/ticker/{symbol}/range/1/day/{from}/{to}\
             ?adjusted=true&sort=asc&limit={limit}",
            self.base()
        )
    }

    /// Previous-session aggregate URL for a symbol.
    pub fn prev_url(&self, symbol: &str) -> String {
        format!("{}/v2/aggs/ticker/{symbol}/prev?adjusted=true", self.base())
    }

    /// Execute a single GET and decode the body. No retries.
    fn get_bars(&self, symbol: &str, url: &str) -> Result<Vec<Bar>, DataError> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.settings.api_key)
            .send()
            .map_err(|e| {
                let e = e.without_url();
                if e.is_connect() || e.is_timeout() {
                    DataError::NetworkUnreachable(e.to_string())
                } else {
                    DataError::Other(format!("request for {symbol} failed: {e}"))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(map_status(symbol, status, resp.headers()));
        }

        let body = resp
            .text()
            .map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "unreadable body for {symbol}: {}",
                    e.without_url()
                ))
            })?;
        self.decode(symbol, &body)
    }

    fn decode(&self, symbol: &str, body: &str) -> Result<Vec<Bar>, DataError> {
        self.decoder.decode(symbol, body)
    }
}

fn map_status(
    symbol: &str,
    status: reqwest::StatusCode,
    headers: &reqwest::header::HeaderMap,
) -> DataError {
    match status {
        reqwest::StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = headers
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(60);
            warn!(symbol, retry_after, "rate limited by polygon");
            DataError::RateLimited {
                retry_after_secs: retry_after,
            }
        }
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            DataError::AuthenticationRequired(format!("polygon rejected the API key ({status})"))
        }
        reqwest::StatusCode::NOT_FOUND => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        _ => DataError::Http {
            status: status.as_u16(),
            symbol: symbol.to_string(),
        },
    }
}

impl DataProvider for PolygonProvider {
    fn name(&self) -> &str {
        "polygon"
    }

    fn fetch_daily_bars(
        &self,
        symbols: &[String],
        from: NaiveDate,
        to: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let mut bars = Vec::new();
        for symbol in symbols {
            let url = self.range_url(symbol, from, to, limit);
            let mut fetched = self.get_bars(symbol, &url)?;
            debug!(%symbol, %from, %to, count = fetched.len(), "fetched daily bars");
            fetched.truncate(limit);
            bars.append(&mut fetched);
        }
        Ok(bars)
    }

    fn fetch_latest_bars(&self, symbols: &[String]) -> Result<Vec<Bar>, DataError> {
        let mut bars = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let url = self.prev_url(symbol);
            match self.get_bars(symbol, &url)?.pop() {
                Some(bar) => bars.push(bar),
                None => debug!(%symbol, "no previous-session bar"),
            }
        }
        Ok(bars)
    }
}
