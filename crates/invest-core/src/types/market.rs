//! 시장 구분 정의.
//!
//! 이 모듈은 수집 대상 시장 관련 타입을 정의합니다:
//! - `Market` - 시장 구분 (KOSPI/KOSDAQ/US)
//! - `kst_today` - 한국 시장 기준 오늘 날짜

use crate::error::CoreError;
use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Seoul;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 시장 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Market {
    /// 유가증권시장 (코스피)
    Kospi,
    /// 코스닥
    Kosdaq,
    /// 미국 주식 시장 (NYSE/NASDAQ)
    Us,
}

impl Market {
    /// DB 저장용 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kospi => "KOSPI",
            Self::Kosdaq => "KOSDAQ",
            Self::Us => "US",
        }
    }

    /// KRX 정보데이터시스템 시장 ID (mktId 파라미터).
    ///
    /// US 시장은 KRX에서 조회할 수 없으므로 None을 반환합니다.
    pub fn krx_market_id(&self) -> Option<&'static str> {
        match self {
            Self::Kospi => Some("STK"),
            Self::Kosdaq => Some("KSQ"),
            Self::Us => None,
        }
    }

    /// Yahoo Finance 심볼 접미사.
    pub fn yahoo_suffix(&self) -> &'static str {
        match self {
            Self::Kospi => ".KS",
            Self::Kosdaq => ".KQ",
            Self::Us => "",
        }
    }

    /// 국내 시장 여부.
    pub fn is_korean(&self) -> bool {
        matches!(self, Self::Kospi | Self::Kosdaq)
    }

    /// 수집 대상 국내 시장 목록.
    pub fn korean_markets() -> [Market; 2] {
        [Self::Kospi, Self::Kosdaq]
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Market {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "KOSPI" | "STK" => Ok(Self::Kospi),
            "KOSDAQ" | "KSQ" => Ok(Self::Kosdaq),
            "US" | "NYSE" | "NASDAQ" | "AMEX" => Ok(Self::Us),
            other => Err(CoreError::UnknownMarket(other.to_string())),
        }
    }
}

/// 한국 시장 기준(Asia/Seoul) 오늘 날짜.
///
/// UTC 자정 전후로 수집 날짜가 하루 어긋나는 것을 막기 위해
/// 국내 시장 날짜 계산은 항상 KST를 사용합니다.
pub fn kst_today() -> NaiveDate {
    Utc::now().with_timezone(&Seoul).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_parse() {
        assert_eq!("KOSPI".parse::<Market>().unwrap(), Market::Kospi);
        assert_eq!("kosdaq".parse::<Market>().unwrap(), Market::Kosdaq);
        assert_eq!("KSQ".parse::<Market>().unwrap(), Market::Kosdaq);
        assert_eq!("nasdaq".parse::<Market>().unwrap(), Market::Us);
        assert!("LSE".parse::<Market>().is_err());
    }

    #[test]
    fn test_krx_market_id() {
        assert_eq!(Market::Kospi.krx_market_id(), Some("STK"));
        assert_eq!(Market::Kosdaq.krx_market_id(), Some("KSQ"));
        assert_eq!(Market::Us.krx_market_id(), None);
    }

    #[test]
    fn test_yahoo_suffix() {
        assert_eq!(Market::Kospi.yahoo_suffix(), ".KS");
        assert_eq!(Market::Kosdaq.yahoo_suffix(), ".KQ");
        assert_eq!(Market::Us.yahoo_suffix(), "");
    }
}
