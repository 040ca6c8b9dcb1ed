//! KRX 종목 목록 Provider.
//!
//! KRX 정보데이터시스템(data.krx.co.kr)에서 KOSPI/KOSDAQ
//! 상장 종목 목록을 조회합니다.

use async_trait::async_trait;
use invest_core::{Market, StockCode};
use serde::Deserialize;

use crate::error::{DataError, Result};

/// KRX 정보데이터시스템 기본 URL.
const KRX_BASE_URL: &str = "http://data.krx.co.kr";

/// 전종목 기본정보 조회 bld.
const BLD_MARKET_LISTING: &str = "dbms/MDC/STAT/standard/MDCSTAT01501";

/// 상장 종목 정보.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolListing {
    /// 종목코드 (6자리)
    pub code: StockCode,
    /// 종목명 (한글)
    pub name: String,
    /// 영문명
    pub name_en: Option<String>,
    /// 시장 구분
    pub market: Market,
    /// 소속부 (섹터)
    pub sector: Option<String>,
}

/// 종목 목록 Provider trait.
#[async_trait]
pub trait SymbolListingProvider: Send + Sync {
    /// Provider 이름.
    fn name(&self) -> &str;

    /// 지원 시장의 전체 상장 종목 조회.
    async fn fetch_all(&self) -> Result<Vec<SymbolListing>>;
}

/// KRX 종목 목록 Provider.
pub struct KrxListingProvider {
    client: reqwest::Client,
    base_url: String,
}

impl KrxListingProvider {
    /// 새 Provider 생성.
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
        let mut provider = Self::new();
        provider.base_url = base_url.into();
        provider
    }

    /// 시장별 상장 종목 조회.
    pub async fn fetch_market(&self, market: Market) -> Result<Vec<SymbolListing>> {
        #[derive(Deserialize)]
        struct KrxResponse {
            #[serde(rename = "OutBlock_1", default)]
            out_block: Vec<KrxStock>,
        }

        #[derive(Deserialize)]
        struct KrxStock {
            #[serde(rename = "ISU_SRT_CD")]
            ticker: String,
            #[serde(rename = "ISU_ABBRV")]
            name: String,
            #[serde(rename = "ISU_ENG_NM", default)]
            name_en: Option<String>,
            #[serde(rename = "SECT_TP_NM", default)]
            sector: Option<String>,
        }

        let market_id = market
            .krx_market_id()
            .ok_or_else(|| DataError::InvalidData(format!("KRX 미지원 시장: {}", market)))?;

        let params = [
            ("bld", BLD_MARKET_LISTING),
            ("mktId", market_id),
            ("share", "1"),
            ("csvxls_isNo", "false"),
        ];

        let url = format!("{}/comm/bldAttendant/getJsonData.cmd", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&params)
            .header(
                "Referer",
                "https://data.krx.co.kr/contents/MDC/MDI/outerLoader/index.cmd",
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DataError::FetchError(format!(
                "KRX API 오류: {}",
                response.status()
            )));
        }

        let data: KrxResponse = response
            .json()
            .await
            .map_err(|e| DataError::ParseError(format!("KRX 응답 파싱 실패: {}", e)))?;

        let total = data.out_block.len();
        let mut listings = Vec::with_capacity(total);
        let mut skipped = 0;

        for s in data.out_block {
            // 정규 6자리 숫자 코드만 수집 (우선주 일부, 채권, ETN 등 제외)
            match StockCode::new(s.ticker.trim()) {
                Ok(code) => listings.push(SymbolListing {
                    code,
                    name: s.name.trim().to_string(),
                    name_en: s.name_en.filter(|n| !n.trim().is_empty()),
                    market,
                    sector: s.sector.filter(|v| !v.trim().is_empty()),
                }),
                Err(_) => skipped += 1,
            }
        }

        tracing::info!(
            market = %market,
            total,
            listed = listings.len(),
            skipped,
            "KRX 종목 목록 조회 완료"
        );

        Ok(listings)
    }
}

impl Default for KrxListingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SymbolListingProvider for KrxListingProvider {
    fn name(&self) -> &str {
        "KRX"
    }

    async fn fetch_all(&self) -> Result<Vec<SymbolListing>> {
        let mut all = Vec::new();
        for market in Market::korean_markets() {
            let listings = self.fetch_market(market).await?;
            all.extend(listings);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_BODY: &str = r#"{
        "OutBlock_1": [
            {"ISU_SRT_CD": "005930", "ISU_ABBRV": "삼성전자", "ISU_ENG_NM": "SamsungElectronics", "SECT_TP_NM": ""},
            {"ISU_SRT_CD": "000660", "ISU_ABBRV": "SK하이닉스", "ISU_ENG_NM": "SK hynix", "SECT_TP_NM": ""},
            {"ISU_SRT_CD": "00104K", "ISU_ABBRV": "CJ4우(전환)", "ISU_ENG_NM": "", "SECT_TP_NM": ""}
        ]
    }"#;

    #[tokio::test]
    async fn test_fetch_market_filters_irregular_codes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/comm/bldAttendant/getJsonData.cmd")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(LISTING_BODY)
            .create_async()
            .await;

        let provider = KrxListingProvider::with_base_url(server.url());
        let listings = provider.fetch_market(Market::Kospi).await.unwrap();

        mock.assert_async().await;

        // 00104K는 정규 코드가 아니므로 제외
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].code.as_str(), "005930");
        assert_eq!(listings[0].name, "삼성전자");
        assert_eq!(listings[0].market, Market::Kospi);
        assert_eq!(listings[1].code.as_str(), "000660");
    }

    #[tokio::test]
    async fn test_fetch_market_empty_block() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/comm/bldAttendant/getJsonData.cmd")
            .with_status(200)
            .with_body(r#"{"OutBlock_1": []}"#)
            .create_async()
            .await;

        let provider = KrxListingProvider::with_base_url(server.url());
        let listings = provider.fetch_market(Market::Kosdaq).await.unwrap();
        assert!(listings.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_market_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/comm/bldAttendant/getJsonData.cmd")
            .with_status(500)
            .create_async()
            .await;

        let provider = KrxListingProvider::with_base_url(server.url());
        let result = provider.fetch_market(Market::Kospi).await;
        assert!(matches!(result, Err(DataError::FetchError(_))));
    }

    #[tokio::test]
    async fn test_us_market_rejected() {
        let provider = KrxListingProvider::new();
        let result = provider.fetch_market(Market::Us).await;
        assert!(matches!(result, Err(DataError::InvalidData(_))));
    }
}
