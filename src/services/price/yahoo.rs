//! Yahoo Finance 日线行情实现
//!
//! 对接 v8 chart 接口: https://query2.finance.yahoo.com/v8/finance/chart/<symbol>
//! 使用未复权的最高价、最低价、收盘价

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::PriceFetcher;
use crate::config::UpstreamConfig;
use crate::models::{PriceRecord, PriceSeries};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
/// 未指定开始日期时取全部历史数据
const EARLIEST_DATE: (i32, u32, u32) = (1900, 1, 1);
const NOT_FOUND_CODE: &str = "Not Found";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
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
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// 交易所相对 UTC 的偏移（秒）
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Yahoo Finance 数据源
pub struct YahooFetcher {
    client: Client,
    base_url: String,
}

impl YahooFetcher {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 构造 chart 接口地址
    ///
    /// `end` 为开区间，取当日 00:00 UTC；未指定时取当前时间
    fn chart_url(&self, symbol: &str, start: Option<&str>, end: Option<&str>) -> Result<Url> {
        let period1 = match start {
            Some(s) => day_start_timestamp(parse_date(s, "start")?),
            None => {
                let (y, m, d) = EARLIEST_DATE;
                let earliest = NaiveDate::from_ymd_opt(y, m, d)
                    .ok_or_else(|| anyhow!("invalid earliest date"))?;
                day_start_timestamp(earliest)
            }
        };
        let period2 = match end {
            Some(e) => day_start_timestamp(parse_date(e, "end")?),
            None => Utc::now().timestamp(),
        };

        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid upstream base url: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("upstream base url cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        url.query_pairs_mut()
            .append_pair("period1", &period1.to_string())
            .append_pair("period2", &period2.to_string())
            .append_pair("interval", "1d")
            .append_pair("includePrePost", "false")
            .append_pair("events", "div,splits");

        Ok(url)
    }
}

#[async_trait]
impl PriceFetcher for YahooFetcher {
    async fn fetch(
        &self,
        symbol: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<PriceSeries> {
        let url = self.chart_url(symbol, start, end)?;
        log::debug!("请求 Yahoo 行情 URL: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request for {} failed", symbol))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("failed to read response for {}", symbol))?;

        match serde_json::from_str::<ChartResponse>(&text) {
            Ok(chart) => parse_chart_response(symbol, chart),
            Err(_) if !status.is_success() => {
                Err(anyhow!("upstream returned HTTP {} for {}", status, symbol))
            }
            Err(e) => Err(anyhow!("failed to parse response for {}: {}", symbol, e)),
        }
    }
}

fn parse_date(value: &str, name: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid {} date '{}', expected YYYY-MM-DD", name, value))
}

fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// 解析 chart 接口响应
///
/// "Not Found" 错误和无时间戳的结果视为无数据，返回空序列
fn parse_chart_response(symbol: &str, chart: ChartResponse) -> Result<PriceSeries> {
    if let Some(err) = chart.chart.error {
        if err.code == NOT_FOUND_CODE {
            log::info!("Yahoo 未找到 {} 的数据: {}", symbol, err.description);
            return Ok(Vec::new());
        }
        bail!("upstream error for {}: {}: {}", symbol, err.code, err.description);
    }

    let data = match chart.chart.result.and_then(|r| r.into_iter().next()) {
        Some(data) => data,
        None => return Ok(Vec::new()),
    };

    let timestamps = match data.timestamp {
        Some(ts) => ts,
        None => return Ok(Vec::new()),
    };

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("response for {} has no quote data", symbol))?;

    let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let mut series = Vec::with_capacity(timestamps.len());

    for (i, &ts) in timestamps.iter().enumerate() {
        let date = DateTime::from_timestamp(ts + offset, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| anyhow!("invalid timestamp {} for {}", ts, symbol))?;

        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();

        // 停牌或节假日的空行直接跳过，部分缺失的记录保留
        if high.is_none() && low.is_none() && close.is_none() {
            continue;
        }
        series.push(PriceRecord { date, high, low, close });
    }

    Ok(series)
}
