//! KRX 응답 값 파싱 헬퍼.
//!
//! KRX 정보데이터시스템은 숫자를 천 단위 쉼표가 포함된 문자열로,
//! 결측값을 "-" 또는 빈 문자열로 내려줍니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// 쉼표 구분 숫자 문자열을 Decimal로 파싱.
///
/// "-", "" 는 결측값으로 None을 반환합니다.
pub fn parse_krx_decimal(s: &str) -> Option<Decimal> {
    let cleaned = s.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// 쉼표 구분 숫자 문자열을 i64로 파싱 (거래량 등).
pub fn parse_krx_i64(s: &str) -> Option<i64> {
    let cleaned = s.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse().ok()
}

/// 거래일자 문자열 파싱.
///
/// KRX는 화면에 따라 "YYYY/MM/DD" 또는 "YYYYMMDD" 형식을 사용합니다.
pub fn parse_krx_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .ok()
}

/// 날짜를 KRX API 파라미터 형식(YYYYMMDD)으로 변환.
pub fn format_krx_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// 단축코드에서 ISIN 코드 생성.
///
/// 국내 주식 ISIN은 "KR7" + 단축코드 6자리 + "00" + 체크디지트입니다.
/// 체크디지트는 ISO 6166 표준 방식(문자 전개 후 Luhn)으로 계산합니다.
pub fn isin_from_short_code(code: &str) -> String {
    let body = format!("KR7{}00", code);

    // 문자를 숫자로 전개 (A=10 .. Z=35)
    let mut digits = Vec::new();
    for c in body.chars() {
        if let Some(d) = c.to_digit(10) {
            digits.push(d);
        } else {
            let v = c as u32 - 'A' as u32 + 10;
            digits.push(v / 10);
            digits.push(v % 10);
        }
    }

    // Luhn: 오른쪽 끝부터 홀수 위치 두 배
    let mut sum = 0;
    let mut double = true;
    for &d in digits.iter().rev() {
        let mut v = d;
        if double {
            v *= 2;
            if v > 9 {
                v -= 9;
            }
        }
        sum += v;
        double = !double;
    }
    let check = (10 - sum % 10) % 10;

    format!("{}{}", body, check)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_krx_decimal() {
        assert_eq!(parse_krx_decimal("71,500"), Some(dec!(71500)));
        assert_eq!(parse_krx_decimal("1,234,567.89"), Some(dec!(1234567.89)));
        assert_eq!(parse_krx_decimal("-2.45"), Some(dec!(-2.45)));
        assert_eq!(parse_krx_decimal("-"), None);
        assert_eq!(parse_krx_decimal(""), None);
    }

    #[test]
    fn test_parse_krx_i64() {
        assert_eq!(parse_krx_i64("12,345,678"), Some(12_345_678));
        assert_eq!(parse_krx_i64("0"), Some(0));
        assert_eq!(parse_krx_i64("-"), None);
    }

    #[test]
    fn test_parse_krx_date() {
        let expected = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        assert_eq!(parse_krx_date("2025/08/01"), Some(expected));
        assert_eq!(parse_krx_date("20250801"), Some(expected));
        assert_eq!(parse_krx_date("bad"), None);
    }

    #[test]
    fn test_isin_from_short_code() {
        // 삼성전자, SK하이닉스의 실제 ISIN
        assert_eq!(isin_from_short_code("005930"), "KR7005930003");
        assert_eq!(isin_from_short_code("000660"), "KR7000660001");
    }
}
