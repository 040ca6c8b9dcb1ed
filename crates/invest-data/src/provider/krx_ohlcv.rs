//! KRX(한국거래소) 시세 데이터 소스.
//!
//! KRX 정보데이터시스템에서 두 종류의 시세를 조회합니다:
//! - 개별 종목 일봉 (기간 조회, 수정주가)
//! - 전종목 일별 스냅샷 (시장 + 날짜 단위)
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use invest_data::provider::krx_ohlcv::KrxPriceSource;
//!
//! let krx = KrxPriceSource::new();
//! let candles = krx.get_daily_ohlcv(&code, start, end).await?;
//! ```

use chrono::NaiveDate;
use invest_core::{DailyCandle, Market, StockCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::{DataError, Result};
use crate::provider::parse::{
    format_krx_date, isin_from_short_code, parse_krx_date, parse_krx_decimal, parse_krx_i64,
};

/// KRX 정보데이터시스템 기본 URL.
const KRX_BASE_URL: &str = "http://data.krx.co.kr";

/// 개별종목 시세 조회 bld.
const BLD_STOCK_OHLCV: &str = "dbms/MDC/STAT/standard/MDCSTAT01701";

/// 전종목 시세 조회 bld (일별).
const BLD_MARKET_OHLCV: &str = "dbms/MDC/STAT/standard/MDCSTAT01501";

/// 개별종목 시세 응답.
#[derive(Debug, Deserialize)]
struct KrxOhlcvResponse {
    #[serde(default)]
    output: Vec<KrxOhlcvRecord>,
}

/// 개별종목 시세 레코드.
#[derive(Debug, Deserialize)]
struct KrxOhlcvRecord {
    /// 거래일자 (YYYY/MM/DD)
    #[serde(rename = "TRD_DD")]
    trd_dd: Option<String>,

    /// 시가
    #[serde(rename = "TDD_OPNPRC", default)]
    open: String,

    /// 고가
    #[serde(rename = "TDD_HGPRC", default)]
    high: String,

    /// 저가
    #[serde(rename = "TDD_LWPRC", default)]
    low: String,

    /// 종가
    #[serde(rename = "TDD_CLSPRC", default)]
    close: String,

    /// 거래량
    #[serde(rename = "ACC_TRDVOL", default)]
    volume: String,

    /// 거래대금
    #[serde(rename = "ACC_TRDVAL", default)]
    value: String,

    /// 등락률
    #[serde(rename = "FLUC_RT", default)]
    change_rate: String,

    /// 시가총액
    #[serde(rename = "MKTCAP", default)]
    market_cap: String,
}

/// 전종목 스냅샷 응답.
#[derive(Debug, Deserialize)]
struct KrxSnapshotResponse {
    #[serde(rename = "OutBlock_1", default)]
    out_block: Vec<KrxSnapshotRecord>,
}

/// 전종목 스냅샷 레코드 (종목 하나, 하루).
#[derive(Debug, Deserialize)]
struct KrxSnapshotRecord {
    #[serde(rename = "ISU_SRT_CD")]
    ticker: String,

    #[serde(rename = "ISU_ABBRV", default)]
    name: String,

    #[serde(rename = "TDD_OPNPRC", default)]
    open: String,

    #[serde(rename = "TDD_HGPRC", default)]
    high: String,

    #[serde(rename = "TDD_LWPRC", default)]
    low: String,

    #[serde(rename = "TDD_CLSPRC", default)]
    close: String,

    #[serde(rename = "ACC_TRDVOL", default)]
    volume: String,

    #[serde(rename = "ACC_TRDVAL", default)]
    value: String,

    #[serde(rename = "FLUC_RT", default)]
    change_rate: String,

    #[serde(rename = "MKTCAP", default)]
    market_cap: String,
}

/// 전종목 스냅샷 행.
#[derive(Debug, Clone)]
pub struct MarketSnapshotRow {
    /// 종목코드
    pub code: StockCode,
    /// 종목명
    pub name: String,
    /// 해당 일자 시세
    pub candle: DailyCandle,
}

/// KRX 시세 데이터 소스.
pub struct KrxPriceSource {
    client: reqwest::Client,
    base_url: String,
}

impl KrxPriceSource {
    /// 새로운 KRX 데이터 소스 생성.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: KRX_BASE_URL.to_string(),
        }
    }

    /// 테스트용 base URL 재정의.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut source = Self::new();
        source.base_url = base_url.into();
        source
    }

    /// 개별 종목 일봉 조회.
    ///
    /// # 인자
    /// - `code`: 종목코드 (예: "005930")
    /// - `start_date`, `end_date`: 조회 기간
    ///
    /// 날짜 오름차순으로 정렬된 캔들을 반환합니다.
    pub async fn get_daily_ohlcv(
        &self,
        code: &StockCode,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyCandle>> {
        debug!(
            code = %code,
            start = %start_date,
            end = %end_date,
            "KRX 개별종목 시세 조회"
        );

        let isin = isin_from_short_code(code.as_str());
        let start = format_krx_date(start_date);
        let end = format_krx_date(end_date);

        let params = [
            ("bld", BLD_STOCK_OHLCV),
            ("isuCd", &isin),
            ("strtDd", &start),
            ("endDd", &end),
            ("adjStkPrc", "2"), // 수정주가 사용
        ];

        let data: KrxOhlcvResponse = self.post_form(&params).await?;

        let mut candles: Vec<DailyCandle> = data
            .output
            .into_iter()
            .filter_map(|r| {
                let date = r.trd_dd.as_deref().and_then(parse_krx_date)?;
                let close = parse_krx_decimal(&r.close)?;
                Some(DailyCandle {
                    date,
                    open: parse_krx_decimal(&r.open),
                    high: parse_krx_decimal(&r.high),
                    low: parse_krx_decimal(&r.low),
                    close,
                    volume: parse_krx_i64(&r.volume).unwrap_or(0),
                    trading_value: parse_krx_decimal(&r.value),
                    change_rate: parse_krx_decimal(&r.change_rate),
                    market_cap: parse_krx_decimal(&r.market_cap),
                })
            })
            .collect();

        // KRX는 최신일부터 내려주므로 오름차순으로 재정렬
        candles.sort_by_key(|c| c.date);

        Ok(candles)
    }

    /// 전종목 일별 스냅샷 조회.
    ///
    /// 지정한 시장의 모든 종목에 대해 해당 일자의 시세를 반환합니다.
    /// 휴장일에는 빈 목록을 반환합니다.
    pub async fn get_market_snapshot(
        &self,
        market: Market,
        date: NaiveDate,
    ) -> Result<Vec<MarketSnapshotRow>> {
        let market_id = market
            .krx_market_id()
            .ok_or_else(|| DataError::InvalidData(format!("KRX 미지원 시장: {}", market)))?;
        let trd_dd = format_krx_date(date);

        let params = [
            ("bld", BLD_MARKET_OHLCV),
            ("mktId", market_id),
            ("trdDd", &trd_dd),
            ("share", "1"),
            ("money", "1"),
        ];

        let data: KrxSnapshotResponse = self.post_form(&params).await?;

        let rows: Vec<MarketSnapshotRow> = data
            .out_block
            .into_iter()
            .filter_map(|r| {
                let code = StockCode::new(r.ticker.trim()).ok()?;
                let close = parse_krx_decimal(&r.close)?;
                Some(MarketSnapshotRow {
                    code,
                    name: r.name.trim().to_string(),
                    candle: DailyCandle {
                        date,
                        open: parse_krx_decimal(&r.open),
                        high: parse_krx_decimal(&r.high),
                        low: parse_krx_decimal(&r.low),
                        close,
                        volume: parse_krx_i64(&r.volume).unwrap_or(0),
                        trading_value: parse_krx_decimal(&r.value),
                        change_rate: parse_krx_decimal(&r.change_rate),
                        market_cap: parse_krx_decimal(&r.market_cap),
                    },
                })
            })
            .collect();

        debug!(market = %market, date = %date, rows = rows.len(), "KRX 전종목 스냅샷 조회");

        Ok(rows)
    }

    /// KRX JSON 엔드포인트에 form POST 요청.
    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/comm/bldAttendant/getJsonData.cmd", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(
                "Referer",
                "https://data.krx.co.kr/contents/MDC/MDI/outerLoader/index.cmd",
            )
            .form(params)
            .send()
            .await
            .map_err(|e| DataError::FetchError(format!("KRX API 호출 실패: {}", e)))?;

        if !response.status().is_success() {
            return Err(DataError::FetchError(format!(
                "KRX API 오류: {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| DataError::FetchError(format!("응답 읽기 실패: {}", e)))?;

        serde_json::from_str(&text)
            .map_err(|e| DataError::ParseError(format!("KRX 응답 파싱 실패: {}", e)))
    }
}

impl Default for KrxPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const OHLCV_BODY: &str = r#"{
        "output": [
            {"TRD_DD": "2025/08/04", "TDD_OPNPRC": "70,900", "TDD_HGPRC": "71,700",
             "TDD_LWPRC": "70,100", "TDD_CLSPRC": "71,500", "ACC_TRDVOL": "12,345,678",
             "ACC_TRDVAL": "881,234,567,890", "FLUC_RT": "0.85", "MKTCAP": "426,000,000,000,000"},
            {"TRD_DD": "2025/08/01", "TDD_OPNPRC": "70,000", "TDD_HGPRC": "71,000",
             "TDD_LWPRC": "69,800", "TDD_CLSPRC": "70,900", "ACC_TRDVOL": "9,876,543",
             "ACC_TRDVAL": "-", "FLUC_RT": "-1.25", "MKTCAP": "-"}
        ]
    }"#;

    #[tokio::test]
    async fn test_get_daily_ohlcv_sorted_ascending() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/comm/bldAttendant/getJsonData.cmd")
            .with_status(200)
            .with_body(OHLCV_BODY)
            .create_async()
            .await;

        let source = KrxPriceSource::with_base_url(server.url());
        let code = StockCode::new("005930").unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 8, 4).unwrap();

        let candles = source.get_daily_ohlcv(&code, start, end).await.unwrap();

        assert_eq!(candles.len(), 2);
        // 응답은 최신일 우선, 결과는 오름차순
        assert_eq!(candles[0].date, start);
        assert_eq!(candles[0].close, dec!(70900));
        assert_eq!(candles[0].trading_value, None);
        assert_eq!(candles[1].date, end);
        assert_eq!(candles[1].volume, 12_345_678);
        assert_eq!(candles[1].change_rate, Some(dec!(0.85)));
    }

    #[tokio::test]
    async fn test_get_market_snapshot() {
        let body = r#"{
            "OutBlock_1": [
                {"ISU_SRT_CD": "005930", "ISU_ABBRV": "삼성전자", "TDD_OPNPRC": "70,900",
                 "TDD_HGPRC": "71,700", "TDD_LWPRC": "70,100", "TDD_CLSPRC": "71,500",
                 "ACC_TRDVOL": "12,345,678", "ACC_TRDVAL": "881,234,567,890",
                 "FLUC_RT": "0.85", "MKTCAP": "426,000,000,000,000"},
                {"ISU_SRT_CD": "00104K", "ISU_ABBRV": "CJ4우(전환)", "TDD_CLSPRC": "65,000",
                 "TDD_OPNPRC": "-", "TDD_HGPRC": "-", "TDD_LWPRC": "-", "ACC_TRDVOL": "0",
                 "ACC_TRDVAL": "-", "FLUC_RT": "-", "MKTCAP": "-"}
            ]
        }"#;

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/comm/bldAttendant/getJsonData.cmd")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let source = KrxPriceSource::with_base_url(server.url());
        let date = NaiveDate::from_ymd_opt(2025, 8, 4).unwrap();
        let rows = source
            .get_market_snapshot(Market::Kospi, date)
            .await
            .unwrap();

        // 정규 코드만 포함
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code.as_str(), "005930");
        assert_eq!(rows[0].candle.date, date);
        assert_eq!(rows[0].candle.close, dec!(71500));
    }

    #[tokio::test]
    async fn test_holiday_returns_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/comm/bldAttendant/getJsonData.cmd")
            .with_status(200)
            .with_body(r#"{"OutBlock_1": []}"#)
            .create_async()
            .await;

        let source = KrxPriceSource::with_base_url(server.url());
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let rows = source
            .get_market_snapshot(Market::Kosdaq, date)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
