use crate::errors::{SimError, SimResult};
use crate::state::PricePoint;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, Url};

/// Yahoo Finance chart API client for daily closes. All methods return
/// Result, never panic.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .user_agent("options_simulator/0.1")
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `{base}/v8/finance/chart/{symbol}?period1=..&period2=..&interval=1d`,
    /// with the symbol encoded as a single path segment.
    fn chart_url(&self, symbol: &str, period1: i64, period2: i64) -> SimResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SimError::Config(format!("YAHOO_BASE_URL {:?}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| SimError::Config(format!("YAHOO_BASE_URL {:?} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart"])
            .push(symbol);
        url.query_pairs_mut()
            .append_pair("period1", &period1.to_string())
            .append_pair("period2", &period2.to_string())
            .append_pair("interval", "1d");
        Ok(url)
    }

    /// Daily closes in [start, end). Adjusted close is preferred when present.
    pub async fn fetch_daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SimResult<Vec<PricePoint>> {
        let period1 = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let period2 = end.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let url = self.chart_url(symbol, period1, period2)?;

        tracing::info!(symbol = symbol, %start, %end, "fetching daily closes");

        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(SimError::Feed(format!("HTTP {status}: {body}")));
        }

        let data = decode_chart(&body)?;
        parse_chart(data, symbol)
    }
}

// Chart API response format (abridged):
// {
//   "chart": {
//     "result": [{
//       "timestamp": [1672756200, 1672842600],
//       "indicators": {
//         "quote": [{ "close": [125.07, 126.36] }],
//         "adjclose": [{ "adjclose": [123.9, 125.18] }]
//       }
//     }],
//     "error": null
//   }
// }

#[derive(serde::Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(serde::Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(serde::Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(serde::Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(serde::Deserialize)]
struct Indicators {
    quote: Option<Vec<QuoteBlock>>,
    adjclose: Option<Vec<AdjCloseBlock>>,
}

#[derive(serde::Deserialize)]
struct QuoteBlock {
    close: Option<Vec<Option<f64>>>,
}

#[derive(serde::Deserialize)]
struct AdjCloseBlock {
    adjclose: Option<Vec<Option<f64>>>,
}

fn decode_chart(body: &str) -> SimResult<ChartResponse> {
    Ok(serde_json::from_str(body)?)
}

fn parse_chart(data: ChartResponse, symbol: &str) -> SimResult<Vec<PricePoint>> {
    if let Some(err) = data.chart.error {
        return Err(SimError::Feed(format!(
            "{symbol}: {} {}",
            err.code.unwrap_or_default(),
            err.description.unwrap_or_default()
        )));
    }

    let Some(result) = data.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(SimError::Feed(format!("{symbol}: empty chart result")));
    };

    // No timestamps means no trading days in range
    let timestamps = result.timestamp.unwrap_or_default();

    let adjusted = result
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .and_then(|a| a.adjclose);
    let closes = match adjusted {
        Some(c) => c,
        None => result
            .indicators
            .quote
            .and_then(|q| q.into_iter().next())
            .and_then(|q| q.close)
            .unwrap_or_default(),
    };

    if closes.len() != timestamps.len() {
        return Err(SimError::Parse(format!(
            "{symbol}: {} timestamps but {} closes",
            timestamps.len(),
            closes.len()
        )));
    }

    let mut points = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.into_iter().zip(closes) {
        let Some(close) = close.filter(|c| c.is_finite() && *c > 0.0) else {
            tracing::warn!(symbol = symbol, timestamp = ts, "skipping missing close");
            continue;
        };
        let timestamp = DateTime::<Utc>::from_timestamp(ts, 0)
            .ok_or_else(|| SimError::Parse(format!("{symbol}: bad timestamp {ts}")))?;
        points.push(PricePoint { timestamp, close });
    }

    Ok(points)
}
