//! CSV 내보내기.
//!
//! 레지스트리와 일별 시세를 분석용 CSV 파일로 내보냅니다.
//! 헤더 한 줄 + 데이터 행 형식이며, 쉼표나 따옴표가 포함된
//! 필드만 따옴표로 감쌉니다.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::storage::ohlcv::PriceRow;
use crate::storage::symbols::SymbolRow;

/// CSV 필드 이스케이프.
///
/// 쉼표, 따옴표, 줄바꿈이 포함된 값은 따옴표로 감싸고
/// 내부 따옴표는 이중으로 만듭니다.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Option 값을 CSV 필드로 변환 (None은 빈 문자열).
fn opt_field<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// 출력 파일 생성 (상위 디렉터리 포함).
fn create_writer(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

/// 종목 레지스트리를 CSV로 내보내기.
///
/// 작성된 행 수를 반환합니다.
pub fn export_symbols_csv(rows: &[SymbolRow], path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let mut writer = create_writer(path)?;

    writeln!(
        writer,
        "ticker,name,market,sector,ipo_date,delisting_date,is_active"
    )?;

    for row in rows {
        writeln!(
            writer,
            "{},{},{},{},{},{},{}",
            csv_field(&row.ticker),
            csv_field(&row.name),
            row.market,
            csv_field(row.sector.as_deref().unwrap_or("")),
            opt_field(&row.ipo_date),
            opt_field(&row.delisting_date),
            row.is_active
        )?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "종목 레지스트리 CSV 저장");

    Ok(rows.len())
}

/// 일별 시세를 CSV로 내보내기.
///
/// 작성된 행 수를 반환합니다.
pub fn export_prices_csv(rows: &[PriceRow], path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let mut writer = create_writer(path)?;

    writeln!(
        writer,
        "ticker,trade_date,open,high,low,close,volume,trading_value,change_rate,market_cap"
    )?;

    for row in rows {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{}",
            row.ticker,
            row.trade_date,
            opt_field(&row.open),
            opt_field(&row.high),
            opt_field(&row.low),
            row.close,
            row.volume,
            opt_field(&row.trading_value),
            opt_field(&row.change_rate),
            opt_field(&row.market_cap)
        )?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "일별 시세 CSV 저장");

    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn sample_symbol() -> SymbolRow {
        SymbolRow {
            id: 1,
            ticker: "005930".to_string(),
            name: "삼성전자".to_string(),
            market: "KOSPI".to_string(),
            sector: None,
            ipo_date: NaiveDate::from_ymd_opt(1975, 6, 11),
            delisting_date: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_csv_field_escaping() {
        assert_eq!(csv_field("삼성전자"), "삼성전자");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_export_symbols_csv() {
        let dir = std::env::temp_dir().join("invest_export_test");
        let path = dir.join("symbols.csv");

        let count = export_symbols_csv(&[sample_symbol()], &path).unwrap();
        assert_eq!(count, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ticker,name,market,sector,ipo_date,delisting_date,is_active"
        );
        assert_eq!(lines.next().unwrap(), "005930,삼성전자,KOSPI,,1975-06-11,,true");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_export_prices_csv() {
        let dir = std::env::temp_dir().join("invest_export_price_test");
        let path = dir.join("prices.csv");

        let row = PriceRow {
            ticker: "005930".to_string(),
            trade_date: NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
            open: Some(dec!(70900)),
            high: Some(dec!(71700)),
            low: Some(dec!(70100)),
            close: dec!(71500),
            volume: 12_345_678,
            trading_value: None,
            change_rate: Some(dec!(0.85)),
            market_cap: None,
            fetched_at: Utc::now(),
        };

        let count = export_prices_csv(&[row], &path).unwrap();
        assert_eq!(count, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content
            .lines()
            .nth(1)
            .unwrap()
            .starts_with("005930,2025-08-04,70900,71700,70100,71500,12345678,"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
