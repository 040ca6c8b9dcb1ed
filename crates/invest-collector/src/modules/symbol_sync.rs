//! 종목 레지스트리 동기화 모듈.
//!
//! KRX 상장 목록을 레지스트리에 반영한 뒤, 종목별 가격 이력을
//! 조회하여 상장일(최초 거래일)과 상장폐지일(마지막 거래일)의
//! 근사치를 유도합니다. 오늘 목록에서 사라진 활성 종목도 같은
//! 방식으로 재검증합니다.

use crate::{CollectionStats, CollectorConfig, Result};
use chrono::{Duration as ChronoDuration, NaiveDate};
use invest_core::{kst_today, Market, StockCode};
use invest_data::storage::checkpoint::{load_checkpoint, save_checkpoint, CheckpointStatus};
use invest_data::{DailyPriceStore, KrxListingProvider, KrxPriceSource, SymbolRegistry, SymbolRow};
use sqlx::PgPool;
use std::time::Instant;

/// 체크포인트 워크플로우 이름.
const WORKFLOW: &str = "symbol_sync";

/// 종목 레지스트리 동기화.
///
/// # 인자
/// - `resume`: 이전 실행의 체크포인트에서 이어서 진행
/// - `skip_listing_dates`: 상장/상장폐지 일자 유도 생략 (목록 반영만)
pub async fn sync_symbols(
    pool: &PgPool,
    config: &CollectorConfig,
    resume: bool,
    skip_listing_dates: bool,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::for_symbols();

    tracing::info!("종목 레지스트리 동기화 시작");

    let registry = SymbolRegistry::new(pool.clone());
    let store = DailyPriceStore::new(pool.clone());
    let provider = KrxListingProvider::new();

    // 1. 시장별 상장 목록 조회 및 upsert
    let mut markets = Vec::new();
    if config.symbol_sync.enable_kospi {
        markets.push(Market::Kospi);
    }
    if config.symbol_sync.enable_kosdaq {
        markets.push(Market::Kosdaq);
    }

    let mut listed: Vec<(String, Market)> = Vec::new();
    let mut upserted = 0usize;

    for market in markets {
        let listings = provider.fetch_market(market).await?;

        for listing in &listings {
            match registry.upsert_listing(listing).await {
                Ok(()) => upserted += 1,
                Err(e) => {
                    stats.record_error();
                    tracing::warn!(ticker = %listing.code, error = %e, "종목 저장 실패");
                }
            }
        }

        listed.extend(
            listings
                .into_iter()
                .map(|l| (l.code.as_str().to_string(), l.market)),
        );
    }

    tracing::info!(upserted, "상장 목록 반영 완료");

    if skip_listing_dates {
        stats.attempted += upserted;
        stats.succeeded += upserted;
        stats.finish(start);
        return Ok(stats);
    }

    // 2. 이력 검증 대상: 오늘 목록 + 목록에서 사라진 활성 종목
    let listed_tickers: Vec<String> = listed.iter().map(|(t, _)| t.clone()).collect();
    let disappeared = registry.active_kr_not_in(&listed_tickers).await?;

    if !disappeared.is_empty() {
        tracing::info!(count = disappeared.len(), "목록에서 사라진 활성 종목 재검증");
    }

    let mut candidates = listed;
    for row in disappeared {
        if let Ok(market) = row.market.parse::<Market>() {
            candidates.push((row.ticker, market));
        }
    }
    candidates.sort();
    candidates.dedup();

    // 3. 체크포인트 재개 처리
    let resume_from = if resume {
        let position = load_checkpoint(pool, WORKFLOW).await?;
        if let Some(ref ticker) = position {
            tracing::info!(ticker, "체크포인트에서 재개");
        }
        position
    } else {
        None
    };

    let probe_start = parse_yyyymmdd(&config.symbol_sync.probe_start_date)?;
    let today = kst_today();
    let cutoff = today - ChronoDuration::days(config.symbol_sync.recent_window_days);
    let krx = KrxPriceSource::new();

    // 4. 종목별 이력 조회 및 일자 유도
    let mut processed = 0usize;
    for (ticker, market) in &candidates {
        if already_processed(ticker, resume_from.as_deref()) {
            stats.record_skip();
            continue;
        }

        match probe_symbol(
            &registry, &store, &krx, ticker, *market, probe_start, today, cutoff,
        )
        .await
        {
            Ok(0) => stats.record_no_data(),
            Ok(rows) => stats.record_success(rows),
            Err(e) => {
                stats.record_error();
                tracing::warn!(ticker, error = %e, "이력 검증 실패");
            }
        }

        processed += 1;
        if processed % config.symbol_sync.checkpoint_every == 0 {
            save_checkpoint(
                pool,
                WORKFLOW,
                ticker,
                processed as i32,
                CheckpointStatus::Running,
            )
            .await?;
            tracing::info!(
                processed,
                total = candidates.len(),
                ticker,
                "체크포인트 저장"
            );
        }

        tokio::time::sleep(config.symbol_sync.request_delay()).await;
    }

    save_checkpoint(
        pool,
        WORKFLOW,
        "",
        processed as i32,
        CheckpointStatus::Completed,
    )
    .await?;

    stats.finish(start);
    Ok(stats)
}

/// 재개 시 이미 처리한 종목인지 판정.
///
/// 후보 목록은 티커 오름차순으로 처리되므로 체크포인트 위치
/// 이하의 티커는 건너뜁니다.
fn already_processed(ticker: &str, resume_from: Option<&str>) -> bool {
    resume_from.is_some_and(|last| ticker <= last)
}

/// 레지스트리 상태 갱신 마크.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListingMark {
    /// 거래 재개 확인 (상장폐지 마크 해제)
    Active,
    /// 상장폐지 (마지막 거래일)
    Delisted(NaiveDate),
}

/// 이력 검증 후 적용할 레지스트리 갱신 내용.
#[derive(Debug, Default, PartialEq, Eq)]
struct RegistryActions {
    /// 기록할 상장일 (최초 거래일 근사치)
    set_ipo: Option<NaiveDate>,
    /// 활성/상장폐지 상태 변경
    mark: Option<ListingMark>,
}

/// 가격 이력과 현재 레지스트리 행으로부터 갱신 내용을 결정.
///
/// - 상장일이 없는 종목은 최초 거래일을 상장일로 기록한다.
/// - 최근 기간 내 거래가 있으면 이전 상장폐지 마크를 해제한다.
/// - 최근 거래가 없고 마지막 거래일이 있으면 상장폐지로 마크한다.
/// - 이력이 전혀 없는 종목은 상태를 바꾸지 않는다 (신규 상장 등).
fn decide_actions(
    row: Option<&SymbolRow>,
    first_trade: Option<NaiveDate>,
    last_trade: Option<NaiveDate>,
    recently_traded: bool,
) -> RegistryActions {
    let mut actions = RegistryActions::default();

    let needs_ipo = row.map_or(true, |r| r.ipo_date.is_none());
    if needs_ipo {
        actions.set_ipo = first_trade;
    }

    if recently_traded {
        let was_marked = row.is_some_and(|r| !r.is_active || r.delisting_date.is_some());
        if was_marked {
            actions.mark = Some(ListingMark::Active);
        }
    } else if let Some(last) = last_trade {
        actions.mark = Some(ListingMark::Delisted(last));
    }

    actions
}

/// 종목 하나의 가격 이력을 조회하고 상장/상장폐지 상태를 갱신.
///
/// 저장한 시세 행 수를 반환합니다.
#[allow(clippy::too_many_arguments)]
async fn probe_symbol(
    registry: &SymbolRegistry,
    store: &DailyPriceStore,
    krx: &KrxPriceSource,
    ticker: &str,
    market: Market,
    probe_start: NaiveDate,
    today: NaiveDate,
    cutoff: NaiveDate,
) -> Result<usize> {
    let code = StockCode::new(ticker)
        .map_err(|e| crate::error::CollectorError::DataSource(e.to_string()))?;

    // 저장된 이력 이후만 증분 조회
    let fetch_start = match store.last_trade_date(ticker).await? {
        Some(last) => last + ChronoDuration::days(1),
        None => probe_start,
    };

    let mut saved = 0;
    if fetch_start <= today {
        let candles = krx.get_daily_ohlcv(&code, fetch_start, today).await?;
        saved = store.save_candles(ticker, &candles).await?;
    }

    let row = registry.get(ticker, market).await?;
    let first_trade = store.first_trade_date(ticker).await?;
    let last_trade = store.last_trade_date(ticker).await?;
    let recently_traded = store.has_rows_since(ticker, cutoff).await?;

    let actions = decide_actions(row.as_ref(), first_trade, last_trade, recently_traded);

    if let Some(ipo) = actions.set_ipo {
        registry.set_ipo_date(ticker, market, ipo).await?;
    }
    match actions.mark {
        Some(ListingMark::Active) => registry.mark_active(ticker, market).await?,
        Some(ListingMark::Delisted(date)) => registry.mark_delisted(ticker, market, date).await?,
        None => {}
    }

    Ok(saved)
}

/// YYYYMMDD 문자열 파싱.
pub fn parse_yyyymmdd(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .map_err(|e| crate::error::CollectorError::Config(format!("잘못된 날짜 '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(is_active: bool, ipo: Option<NaiveDate>, delisting: Option<NaiveDate>) -> SymbolRow {
        SymbolRow {
            id: 1,
            ticker: "005930".to_string(),
            name: "삼성전자".to_string(),
            market: "KOSPI".to_string(),
            sector: None,
            ipo_date: ipo,
            delisting_date: delisting,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_yyyymmdd() {
        assert_eq!(parse_yyyymmdd("19900101").unwrap(), date(1990, 1, 1));
        assert!(parse_yyyymmdd("1990-01-01").is_err());
        assert!(parse_yyyymmdd("abc").is_err());
    }

    #[test]
    fn test_resume_skips_up_to_checkpoint() {
        // 체크포인트 이하의 티커만 건너뜀
        assert!(already_processed("000660", Some("005930")));
        assert!(already_processed("005930", Some("005930")));
        assert!(!already_processed("035720", Some("005930")));
        assert!(!already_processed("000660", None));
    }

    #[test]
    fn test_new_symbol_gets_ipo_date() {
        let first = date(2020, 3, 2);
        let actions = decide_actions(
            Some(&row(true, None, None)),
            Some(first),
            Some(date(2025, 8, 22)),
            true,
        );
        assert_eq!(actions.set_ipo, Some(first));
        assert_eq!(actions.mark, None);
    }

    #[test]
    fn test_existing_ipo_date_kept() {
        let actions = decide_actions(
            Some(&row(true, Some(date(1975, 6, 11)), None)),
            Some(date(1990, 1, 3)),
            Some(date(2025, 8, 22)),
            true,
        );
        assert_eq!(actions.set_ipo, None);
        assert_eq!(actions.mark, None);
    }

    #[test]
    fn test_stale_symbol_marked_delisted() {
        // 최근 기간 내 거래 없음 → 마지막 거래일로 상장폐지 마크
        let last = date(2025, 6, 13);
        let actions = decide_actions(
            Some(&row(true, Some(date(2001, 5, 2)), None)),
            Some(date(2001, 5, 2)),
            Some(last),
            false,
        );
        assert_eq!(actions.mark, Some(ListingMark::Delisted(last)));
    }

    #[test]
    fn test_delisted_symbol_reactivated_when_trading() {
        // 상장폐지로 마크됐던 종목이 다시 거래되면 마크 해제
        let actions = decide_actions(
            Some(&row(false, Some(date(2001, 5, 2)), Some(date(2025, 1, 10)))),
            Some(date(2001, 5, 2)),
            Some(date(2025, 8, 22)),
            true,
        );
        assert_eq!(actions.mark, Some(ListingMark::Active));
    }

    #[test]
    fn test_no_history_stays_active() {
        // 이력이 전혀 없는 종목(신규 상장 직후 등)은 상태 유지
        let actions = decide_actions(Some(&row(true, None, None)), None, None, false);
        assert_eq!(actions.set_ipo, None);
        assert_eq!(actions.mark, None);
    }

    #[test]
    fn test_unknown_row_without_history() {
        // 레지스트리에 없는 종목도 이력이 없으면 아무 갱신 없음
        let actions = decide_actions(None, None, None, false);
        assert_eq!(actions, RegistryActions::default());
    }
}
