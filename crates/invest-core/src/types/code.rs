//! 종목코드 검증.
//!
//! 국내 정규 종목은 6자리 숫자 단축코드를 사용합니다.
//! 우선주 일부와 채권, ETN 등 특수 상품은 코드에 영문자가 섞이며
//! (예: 00104K, 37550L) 레지스트리 수집 대상에서 제외됩니다.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 검증된 국내 종목코드 (6자리 숫자).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockCode(String);

impl StockCode {
    /// 종목코드를 검증하여 생성합니다.
    ///
    /// 6자리 숫자가 아니면 `CoreError::InvalidCode`를 반환합니다.
    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        if Self::is_regular(&code) {
            Ok(Self(code))
        } else {
            Err(CoreError::InvalidCode(code))
        }
    }

    /// 정규 종목코드 여부 (6자리 숫자).
    pub fn is_regular(code: &str) -> bool {
        code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
    }

    /// 코드 문자열 참조.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Yahoo Finance 조회용 심볼 (예: "005930.KS").
    pub fn yahoo_symbol(&self, suffix: &str) -> String {
        format!("{}{}", self.0, suffix)
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for StockCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

impl AsRef<str> for StockCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_regular_codes() {
        assert!(StockCode::new("005930").is_ok());
        assert!(StockCode::new("000660").is_ok());
    }

    #[test]
    fn test_special_instruments_rejected() {
        // 코드에 영문자가 섞인 특수 상품은 거부
        assert!(StockCode::new("00104K").is_err());
        assert!(StockCode::new("37550L").is_err());
        assert!(StockCode::new("5930").is_err());
        assert!(StockCode::new("").is_err());
    }

    #[test]
    fn test_yahoo_symbol() {
        let code = StockCode::new("005930").unwrap();
        assert_eq!(code.yahoo_symbol(".KS"), "005930.KS");
    }

    proptest! {
        #[test]
        fn prop_six_digit_codes_accepted(n in 0u32..1_000_000) {
            let code = format!("{:06}", n);
            prop_assert!(StockCode::new(&code).is_ok());
        }

        #[test]
        fn prop_non_digit_codes_rejected(s in "[0-9]{0,5}[A-Za-z][0-9A-Za-z]{0,5}") {
            prop_assert!(StockCode::new(&s).is_err());
        }
    }
}
