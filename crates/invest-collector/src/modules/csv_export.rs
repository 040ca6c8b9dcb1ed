//! CSV 내보내기 모듈.
//!
//! 저장된 레지스트리와 일별 시세를 파일로 내보냅니다.

use crate::Result;
use chrono::NaiveDate;
use invest_data::{export_prices_csv, export_symbols_csv, DailyPriceStore, SymbolRegistry};
use sqlx::PgPool;
use std::path::Path;

/// 종목 레지스트리 전체를 CSV로 내보내기.
///
/// 시장, 티커 순으로 정렬된 전체 레지스트리를 기록하고
/// 작성한 행 수를 반환합니다.
pub async fn export_symbols(pool: &PgPool, output: impl AsRef<Path>) -> Result<usize> {
    let registry = SymbolRegistry::new(pool.clone());
    let rows = registry.list(None, false).await?;
    let count = export_symbols_csv(&rows, output)?;
    Ok(count)
}

/// 한 종목의 일별 시세를 CSV로 내보내기.
///
/// 기간을 지정하면 해당 범위만, 지정하지 않으면 전체를 기록합니다.
pub async fn export_prices(
    pool: &PgPool,
    ticker: &str,
    range: Option<(NaiveDate, NaiveDate)>,
    output: impl AsRef<Path>,
) -> Result<usize> {
    let store = DailyPriceStore::new(pool.clone());
    let rows = match range {
        Some((from, to)) => store.fetch_range(ticker, from, to).await?,
        None => store.fetch_all(ticker).await?,
    };
    let count = export_prices_csv(&rows, output)?;
    Ok(count)
}
