//! Yahoo Finance data provider.
//!
//! Fetches daily bars from Yahoo's v8 chart API, one request per symbol, and
//! assembles them into a single payload. Handles rate limiting, retries with
//! exponential backoff and response parsing.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! The synthetic provider is the fallback when Yahoo is unavailable.

use super::provider::{bars_to_frame, DataError, DataSource, PricePayload, PriceProvider, RawBar};
use crate::domain::Lookback;
use serde::Deserialize;
use std::time::Duration;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::ProviderUnavailable(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Build the chart API URL for a symbol and lookback.
    fn chart_url(symbol: &str, lookback: Lookback) -> String {
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?range={}&interval={}&includeAdjustedClose=true",
            lookback.range, lookback.interval
        )
    }

    /// Parse the chart API response into RawBars.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<RawBar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let bar = RawBar {
                date,
                open: quote.open.get(i).copied().flatten(),
                high: quote.high.get(i).copied().flatten(),
                low: quote.low.get(i).copied().flatten(),
                close: quote.close.get(i).copied().flatten(),
                adj_close: adj_closes.as_ref().and_then(|v| v.get(i).copied().flatten()),
                volume: quote.volume.get(i).copied().flatten(),
            };

            // Holidays come back as all-null rows
            if bar.open.is_none() && bar.close.is_none() && bar.volume.is_none() {
                continue;
            }
            bars.push(bar);
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        Ok(bars)
    }

    /// Execute a single HTTP request with retry logic.
    fn fetch_with_retry(&self, symbol: &str, lookback: Lookback) -> Result<Vec<RawBar>, DataError> {
        let url = Self::chart_url(symbol, lookback);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(symbol, attempt, ?delay, "retrying chart request");
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        return Err(DataError::ProviderUnavailable(format!(
                            "HTTP 403 for {symbol}; access refused"
                        )));
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if !status.is_success() {
                        last_error = Some(DataError::ProviderUnavailable(format!(
                            "HTTP {status} for {symbol}"
                        )));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;

                    return Self::parse_response(symbol, chart);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DataError::ProviderUnavailable("max retries exceeded".into())))
    }
}

/// True for errors that make further requests in the same batch pointless.
fn aborts_batch(err: &DataError) -> bool {
    matches!(
        err,
        DataError::RateLimited { .. }
            | DataError::ProviderUnavailable(_)
            | DataError::NetworkUnreachable(_)
    )
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn download(&self, symbols: &[String], lookback: Lookback) -> Result<PricePayload, DataError> {
        let mut payload = PricePayload::new(DataSource::YahooFinance);

        for symbol in symbols {
            match self.fetch_with_retry(symbol, lookback) {
                Ok(bars) => {
                    let frame = bars_to_frame(&bars)?;
                    payload.insert(symbol.clone(), frame);
                }
                Err(err) if aborts_batch(&err) => {
                    if payload.is_empty() {
                        return Err(err);
                    }
                    tracing::warn!(
                        symbol = symbol.as_str(),
                        error = %err,
                        fetched = payload.len(),
                        "stopping download early; returning partial payload"
                    );
                    payload.mark_incomplete();
                    break;
                }
                Err(err) => {
                    tracing::warn!(symbol = symbol.as_str(), error = %err, "no data for symbol");
                }
            }
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_range_and_interval() {
        let url = YahooProvider::chart_url("SPY", Lookback::FIVE_YEARS_DAILY);
        assert!(url.contains("/chart/SPY?"));
        assert!(url.contains("range=5y"));
        assert!(url.contains("interval=1d"));
    }

    #[test]
    fn parse_skips_holiday_rows() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704153600,1704240000,1704326400],
            "indicators":{"quote":[{"open":[1.0,null,3.0],"high":[1.0,null,3.0],
            "low":[1.0,null,3.0],"close":[1.5,null,3.5],"volume":[10,null,30]}],
            "adjclose":[{"adjclose":[1.4,null,3.4]}]}}],"error":null}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        let bars = YahooProvider::parse_response("SPY", resp).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, Some(3.5));
        assert_eq!(bars[1].adj_close, Some(3.4));
    }

    #[test]
    fn parse_not_found_error() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        let err = YahooProvider::parse_response("NOPE", resp).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn rate_limit_aborts_batch_but_missing_symbol_does_not() {
        assert!(aborts_batch(&DataError::RateLimited {
            retry_after_secs: 60
        }));
        assert!(!aborts_batch(&DataError::SymbolNotFound {
            symbol: "X".into()
        }));
    }
}
