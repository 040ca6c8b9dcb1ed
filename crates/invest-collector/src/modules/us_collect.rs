//! 미국 워치리스트 수집 모듈.
//!
//! Yahoo Finance chart API로 소수의 미국 종목 일봉을 수집합니다.
//! 대상 종목은 레지스트리에 `US` 시장으로 함께 등록됩니다.

use crate::{CollectionStats, CollectorConfig, Result};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use invest_data::{DailyPriceStore, SymbolRegistry, YahooChartSource};
use sqlx::PgPool;
use std::time::Instant;

/// 최초 수집 시 기본 조회 기간 (일).
const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// 미국 워치리스트 수집.
///
/// # 인자
/// - `symbols`: 쉼표로 구분된 티커 (None이면 설정의 워치리스트)
pub async fn collect_us(
    pool: &PgPool,
    config: &CollectorConfig,
    symbols: Option<String>,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::for_tickers();

    let target_symbols: Vec<String> = match symbols {
        Some(ref s) => s.split(',').map(|s| s.trim().to_string()).collect(),
        None => config.us_collect.symbols.clone(),
    };

    tracing::info!(count = target_symbols.len(), "미국 워치리스트 수집 시작");

    let registry = SymbolRegistry::new(pool.clone());
    let store = DailyPriceStore::new(pool.clone());
    let yahoo = YahooChartSource::new();

    // 미국 시장은 UTC 기준 오늘 사용
    let today = Utc::now().date_naive();

    for ticker in &target_symbols {
        match collect_one(&registry, &store, &yahoo, ticker, today).await {
            Ok(Some(0)) => {
                stats.record_no_data();
                tracing::debug!(ticker, "데이터 없음");
            }
            Ok(Some(saved)) => {
                stats.record_success(saved);
                tracing::info!(ticker, rows = saved, "수집 및 저장 완료");
            }
            Ok(None) => {
                stats.record_skip();
                tracing::debug!(ticker, "이미 최신 데이터, 건너뜀");
            }
            Err(e) => {
                stats.record_error();
                tracing::error!(ticker, error = %e, "수집 실패");
            }
        }

        tokio::time::sleep(config.us_collect.request_delay()).await;
    }

    stats.finish(start);
    Ok(stats)
}

/// 티커 하나 수집.
///
/// 이미 최신이면 `None`, 아니면 저장한 행 수를 반환합니다.
/// 한 티커의 실패는 호출부에서 집계만 하고 다음 티커로 진행합니다.
async fn collect_one(
    registry: &SymbolRegistry,
    store: &DailyPriceStore,
    yahoo: &YahooChartSource,
    ticker: &str,
    today: NaiveDate,
) -> Result<Option<usize>> {
    registry.register_us(ticker, ticker).await?;

    let last = store.last_trade_date(ticker).await?;
    let start_date = match fetch_start(last, today) {
        Some(date) => date,
        None => return Ok(None),
    };

    let candles = yahoo.fetch_daily(ticker, start_date, today).await?;
    if candles.is_empty() {
        return Ok(Some(0));
    }

    let saved = store.save_candles(ticker, &candles).await?;
    Ok(Some(saved))
}

/// 증분 조회 시작일 계산.
///
/// 마지막 저장일 다음 날부터 조회하며, 이미 오늘까지 저장돼
/// 있으면 `None`을 반환합니다. 이력이 없으면 기본 기간만큼
/// 과거부터 조회합니다.
fn fetch_start(last_stored: Option<NaiveDate>, today: NaiveDate) -> Option<NaiveDate> {
    let start = match last_stored {
        Some(last) => last + ChronoDuration::days(1),
        None => today - ChronoDuration::days(DEFAULT_LOOKBACK_DAYS),
    };

    (start <= today).then_some(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fetch_start_incremental() {
        let today = date(2025, 8, 25);
        assert_eq!(
            fetch_start(Some(date(2025, 8, 20)), today),
            Some(date(2025, 8, 21))
        );
    }

    #[test]
    fn test_fetch_start_up_to_date() {
        let today = date(2025, 8, 25);
        assert_eq!(fetch_start(Some(today), today), None);
    }

    #[test]
    fn test_fetch_start_no_history() {
        let today = date(2025, 8, 25);
        assert_eq!(
            fetch_start(None, today),
            Some(today - ChronoDuration::days(DEFAULT_LOOKBACK_DAYS))
        );
    }
}
