//! 일봉 시세 구조체.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 일별 시세 (일봉).
///
/// KRX 전종목 스냅샷과 개별 종목 조회, Yahoo Finance 일봉이
/// 모두 이 타입으로 정규화됩니다. 거래대금, 등락률, 시가총액은
/// 소스에 따라 없을 수 있습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCandle {
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Option<Decimal>,
    /// 고가
    pub high: Option<Decimal>,
    /// 저가
    pub low: Option<Decimal>,
    /// 종가
    pub close: Decimal,
    /// 거래량
    pub volume: i64,
    /// 거래대금
    pub trading_value: Option<Decimal>,
    /// 등락률 (%)
    pub change_rate: Option<Decimal>,
    /// 시가총액
    pub market_cap: Option<Decimal>,
}

impl DailyCandle {
    /// 종가만 있는 최소 캔들 생성 (테스트 및 보간용).
    pub fn close_only(date: NaiveDate, close: Decimal) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: 0,
            trading_value: None,
            change_rate: None,
            market_cap: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_close_only() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        let candle = DailyCandle::close_only(date, dec!(71500));
        assert_eq!(candle.close, dec!(71500));
        assert_eq!(candle.volume, 0);
        assert!(candle.open.is_none());
    }
}
