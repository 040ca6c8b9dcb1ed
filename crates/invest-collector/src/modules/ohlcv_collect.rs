//! 일별 시세 수집 모듈.
//!
//! 레지스트리의 활성 국내 종목(또는 지정된 종목)에 대해
//! 일봉 데이터를 증분 수집합니다.

use crate::modules::symbol_sync::parse_yyyymmdd;
use crate::{CollectionStats, CollectorConfig, Result};
use chrono::{Duration as ChronoDuration, NaiveDate};
use invest_core::{kst_today, StockCode};
use invest_data::{DailyPriceStore, KrxPriceSource, SymbolRegistry};
use sqlx::PgPool;
use std::time::Instant;

/// 시작일 미지정 시 기본 조회 기간 (일).
const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// 일별 시세 수집.
///
/// # 인자
/// - `symbols`: 쉼표로 구분된 종목코드 (None이면 레지스트리의 활성 전체)
pub async fn collect_ohlcv(
    pool: &PgPool,
    config: &CollectorConfig,
    symbols: Option<String>,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::for_tickers();

    tracing::info!("일별 시세 수집 시작");

    let registry = SymbolRegistry::new(pool.clone());
    let store = DailyPriceStore::new(pool.clone());

    // 수집할 종목 목록 결정
    let target_symbols = match symbols {
        Some(ref s) => {
            let syms: Vec<String> = s.split(',').map(|s| s.trim().to_string()).collect();
            tracing::info!(count = syms.len(), "특정 종목 수집");
            syms
        }
        None => {
            let syms = registry.active_kr_tickers().await?;
            tracing::info!(count = syms.len(), "활성 종목 조회 완료");
            syms
        }
    };

    if target_symbols.is_empty() {
        tracing::warn!("수집할 종목이 없습니다");
        stats.finish(start);
        return Ok(stats);
    }

    let today = kst_today();
    let end_date = match &config.ohlcv_collect.end_date {
        Some(s) => parse_yyyymmdd(s)?,
        None => today,
    };
    let explicit_start = config
        .ohlcv_collect
        .start_date
        .as_deref()
        .map(parse_yyyymmdd)
        .transpose()?;

    tracing::info!(
        symbols = target_symbols.len(),
        start_date = ?explicit_start,
        end_date = %end_date,
        "수집 범위 설정 완료"
    );

    let krx = KrxPriceSource::new();
    let fresh_cutoff = today - ChronoDuration::days(config.ohlcv_collect.stale_days);

    for (idx, ticker) in target_symbols.iter().enumerate() {
        tracing::debug!(
            ticker,
            progress = format!("{}/{}", idx + 1, target_symbols.len()),
            "수집 시작"
        );

        match collect_one(
            &store,
            &krx,
            ticker,
            explicit_start,
            end_date,
            fresh_cutoff,
        )
        .await
        {
            Ok(Outcome::Saved(rows)) => {
                stats.record_success(rows);
                tracing::info!(ticker, rows, "수집 및 저장 완료");
            }
            Ok(Outcome::Empty) => {
                stats.record_no_data();
                tracing::debug!(ticker, "데이터 없음");
            }
            Ok(Outcome::Fresh) => {
                stats.record_skip();
                tracing::debug!(ticker, "이미 최신 데이터, 건너뜀");
            }
            Err(e) => {
                stats.record_error();
                tracing::error!(ticker, error = %e, "조회 실패");
            }
        }

        tokio::time::sleep(config.ohlcv_collect.request_delay()).await;
    }

    stats.finish(start);
    Ok(stats)
}

enum Outcome {
    Saved(usize),
    Empty,
    Fresh,
}

/// 종목 하나 수집.
///
/// 시작일 미지정 시 마지막 저장일 다음 날부터 증분 조회하며,
/// 이미 최신 상태면 API 호출 없이 건너뜁니다.
async fn collect_one(
    store: &DailyPriceStore,
    krx: &KrxPriceSource,
    ticker: &str,
    explicit_start: Option<NaiveDate>,
    end_date: NaiveDate,
    fresh_cutoff: NaiveDate,
) -> Result<Outcome> {
    let code = StockCode::new(ticker)
        .map_err(|e| crate::error::CollectorError::DataSource(e.to_string()))?;

    let start_date = match explicit_start {
        Some(date) => date,
        None => match store.last_trade_date(ticker).await? {
            Some(last) if last >= fresh_cutoff => return Ok(Outcome::Fresh),
            Some(last) => last + ChronoDuration::days(1),
            None => end_date - ChronoDuration::days(DEFAULT_LOOKBACK_DAYS),
        },
    };

    if start_date > end_date {
        return Ok(Outcome::Fresh);
    }

    let candles = krx.get_daily_ohlcv(&code, start_date, end_date).await?;
    if candles.is_empty() {
        return Ok(Outcome::Empty);
    }

    let saved = store.save_candles(ticker, &candles).await?;
    Ok(Outcome::Saved(saved))
}
