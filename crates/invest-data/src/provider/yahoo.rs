//! Yahoo Finance 일봉 데이터 소스.
//!
//! Yahoo Finance v8 chart API로 미국 주식(및 필요 시 국내 주식)의
//! 일봉 데이터를 조회합니다. 조정 종가가 있으면 우선 사용합니다.

use chrono::{NaiveDate, TimeZone, Utc};
use invest_core::DailyCandle;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

use crate::error::{DataError, Result};

/// Yahoo Finance 기본 URL.
const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance chart API 응답 구조.
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
    #[serde(default)]
    adjclose: Option<Vec<YahooAdjClose>>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<i64>>>,
}

#[derive(Debug, Deserialize)]
struct YahooAdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

/// Yahoo Finance 데이터 소스.
pub struct YahooChartSource {
    client: reqwest::Client,
    base_url: String,
}

impl YahooChartSource {
    /// 새 데이터 소스 생성.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: YAHOO_BASE_URL.to_string(),
        }
    }

    /// 테스트용 base URL 재정의.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut source = Self::new();
        source.base_url = base_url.into();
        source
    }

    /// 일봉 데이터 조회.
    ///
    /// # 인자
    /// - `symbol`: Yahoo 심볼 (예: "AAPL", "005930.KS")
    /// - `start_date`, `end_date`: 조회 기간
    pub async fn fetch_daily(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyCandle>> {
        let start_ts = Utc
            .from_utc_datetime(&start_date.and_hms_opt(0, 0, 0).unwrap_or_default())
            .timestamp();
        let end_ts = Utc
            .from_utc_datetime(&end_date.and_hms_opt(23, 59, 59).unwrap_or_default())
            .timestamp();

        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url, symbol, start_ts, end_ts
        );

        debug!(symbol, start = %start_date, end = %end_date, "Yahoo Finance 일봉 조회");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::FetchError(format!("Yahoo Finance 호출 실패: {}", e)))?;

        if !response.status().is_success() {
            return Err(DataError::FetchError(format!(
                "Yahoo Finance API 오류: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DataError::FetchError(format!("응답 읽기 실패: {}", e)))?;

        let chart: YahooChartResponse = serde_json::from_str(&body)
            .map_err(|e| DataError::ParseError(format!("Yahoo 응답 파싱 실패: {}", e)))?;

        if let Some(error) = chart.chart.error {
            return Err(DataError::FetchError(format!(
                "Yahoo Finance 오류: {} - {}",
                error.code, error.description
            )));
        }

        let result = chart
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| DataError::ParseError("Yahoo 응답에 결과 없음".to_string()))?;

        let timestamps = result.timestamp.unwrap_or_default();
        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ParseError("Yahoo 응답에 시세 없음".to_string()))?;

        let opens = quote.open.unwrap_or_default();
        let highs = quote.high.unwrap_or_default();
        let lows = quote.low.unwrap_or_default();
        let closes = quote.close.unwrap_or_default();
        let volumes = quote.volume.unwrap_or_default();

        // 조정 종가 사용 (있는 경우)
        let adj_closes = result
            .indicators
            .adjclose
            .and_then(|ac| ac.into_iter().next())
            .and_then(|ac| ac.adjclose);

        let mut candles = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let close = adj_closes
                .as_ref()
                .and_then(|ac| ac.get(i).copied().flatten())
                .or_else(|| closes.get(i).copied().flatten());

            // 종가가 없는 행(휴장 등)은 건너뜀
            let Some(close) = close else { continue };
            let Some(date) = chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
            else {
                continue;
            };

            candles.push(DailyCandle {
                date,
                open: opens.get(i).copied().flatten().and_then(to_decimal),
                high: highs.get(i).copied().flatten().and_then(to_decimal),
                low: lows.get(i).copied().flatten().and_then(to_decimal),
                close: to_decimal(close)
                    .ok_or_else(|| DataError::ParseError(format!("종가 변환 실패: {}", close)))?,
                volume: volumes.get(i).copied().flatten().unwrap_or(0),
                trading_value: None,
                change_rate: None,
                market_cap: None,
            });
        }

        candles.sort_by_key(|c| c.date);

        Ok(candles)
    }
}

impl Default for YahooChartSource {
    fn default() -> Self {
        Self::new()
    }
}

/// f64 가격을 소수점 4자리 Decimal로 변환.
fn to_decimal(v: f64) -> Option<Decimal> {
    Decimal::from_str(&format!("{:.4}", v)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const CHART_BODY: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1754006400, 1754265600],
                "indicators": {
                    "quote": [{
                        "open": [210.87, 212.1],
                        "high": [213.58, 215.38],
                        "low": [209.53, 211.3],
                        "close": [212.44, 214.75],
                        "volume": [40268800, 47524300]
                    }],
                    "adjclose": [{"adjclose": [211.98, 214.29]}]
                }
            }],
            "error": null
        }
    }"#;

    #[tokio::test]
    async fn test_fetch_daily_prefers_adjclose() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "GET",
                mockito::Matcher::Regex(r"^/v8/finance/chart/AAPL.*".to_string()),
            )
            .with_status(200)
            .with_body(CHART_BODY)
            .create_async()
            .await;

        let source = YahooChartSource::with_base_url(server.url());
        let start = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 8, 4).unwrap();

        let candles = source.fetch_daily("AAPL", start, end).await.unwrap();

        assert_eq!(candles.len(), 2);
        // 조정 종가 우선
        assert_eq!(candles[0].close, dec!(211.98));
        assert_eq!(candles[0].volume, 40_268_800);
        assert_eq!(candles[1].close, dec!(214.29));
    }

    #[tokio::test]
    async fn test_fetch_daily_api_error() {
        let body = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }"#;

        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "GET",
                mockito::Matcher::Regex(r"^/v8/finance/chart/.*".to_string()),
            )
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let source = YahooChartSource::with_base_url(server.url());
        let start = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 8, 4).unwrap();

        let result = source.fetch_daily("NOPE", start, end).await;
        assert!(matches!(result, Err(DataError::FetchError(_))));
    }
}
