//! 전종목 과거 시세 백필 모듈.
//!
//! 시작일부터 오늘까지 날짜를 순회하며 KRX 전종목 일별
//! 스냅샷을 저장합니다. 주말은 API 호출 없이 건너뛰고,
//! 휴장일(빈 응답)은 no_data로 집계합니다. 완료된 날짜만
//! 체크포인트로 남기며, 조회에 실패한 날짜는 백필을 중단하고
//! 다음 재개 시 같은 날짜부터 다시 시도합니다.

use crate::modules::symbol_sync::parse_yyyymmdd;
use crate::{CollectionStats, CollectorConfig, Result};
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Weekday};
use indicatif::{ProgressBar, ProgressStyle};
use invest_core::{kst_today, DailyCandle, Market};
use invest_data::storage::checkpoint::{load_checkpoint, save_checkpoint, CheckpointStatus};
use invest_data::{DailyPriceStore, KrxPriceSource};
use sqlx::PgPool;
use std::time::Instant;

/// 체크포인트 워크플로우 이름.
const WORKFLOW: &str = "market_history";

/// 전종목 과거 시세 백필.
///
/// # 인자
/// - `from`, `to`: 백필 기간 (YYYYMMDD, 미지정 시 설정값 / 오늘)
/// - `resume`: 이전 실행의 마지막 완료 날짜 다음부터 재개
pub async fn collect_history(
    pool: &PgPool,
    config: &CollectorConfig,
    from: Option<String>,
    to: Option<String>,
    resume: bool,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::for_dates();

    let end_date = match to {
        Some(ref s) => parse_yyyymmdd(s)?,
        None => kst_today(),
    };
    let mut current = match from {
        Some(ref s) => parse_yyyymmdd(s)?,
        None => parse_yyyymmdd(&config.market_history.start_date)?,
    };

    // 체크포인트 재개: 마지막 완료 날짜 다음 날부터
    if resume {
        if let Some(position) = load_checkpoint(pool, WORKFLOW).await? {
            if let Some(next) = resume_start(&position) {
                current = next;
                tracing::info!(resume_from = %current, "체크포인트에서 재개");
            }
        }
    }

    if current > end_date {
        tracing::info!("백필할 기간이 없습니다");
        stats.finish(start);
        return Ok(stats);
    }

    tracing::info!(from = %current, to = %end_date, "전종목 과거 시세 백필 시작");

    let store = DailyPriceStore::new(pool.clone());
    let krx = KrxPriceSource::new();

    let total_days = (end_date - current).num_days() + 1;
    let progress = ProgressBar::new(total_days as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} days ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut completed_dates = 0i32;
    let mut last_completed = String::new();

    while current <= end_date {
        // 주말은 API 호출 없이 건너뜀
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += ChronoDuration::days(1);
            progress.inc(1);
            continue;
        }

        match fetch_day(&krx, current).await {
            Ok(rows) if rows.is_empty() => {
                // 휴장일
                stats.record_no_data();
            }
            Ok(rows) => {
                let saved = store.save_snapshot(&rows).await?;
                stats.record_success(saved);
            }
            Err(e) => {
                // 실패한 날짜는 체크포인트를 남기지 않고 중단하여
                // 재개 시 같은 날짜부터 다시 시도한다.
                stats.record_error();
                tracing::error!(date = %current, error = %e, "스냅샷 조회 실패, 백필 중단");
                save_checkpoint(
                    pool,
                    WORKFLOW,
                    &last_completed,
                    completed_dates,
                    CheckpointStatus::Interrupted,
                )
                .await?;
                progress.finish_and_clear();
                stats.finish(start);
                return Ok(stats);
            }
        }

        completed_dates += 1;
        last_completed = current.format("%Y%m%d").to_string();
        save_checkpoint(
            pool,
            WORKFLOW,
            &last_completed,
            completed_dates,
            CheckpointStatus::Running,
        )
        .await?;

        current += ChronoDuration::days(1);
        progress.inc(1);
        tokio::time::sleep(config.market_history.request_delay()).await;
    }

    progress.finish_and_clear();

    save_checkpoint(pool, WORKFLOW, "", completed_dates, CheckpointStatus::Completed).await?;

    stats.finish(start);
    Ok(stats)
}

/// 하루치 전종목 스냅샷 조회 (KOSPI + KOSDAQ).
///
/// 어느 시장이든 조회에 실패하면 에러를 반환하여 해당 날짜가
/// 완료로 기록되지 않도록 합니다.
async fn fetch_day(krx: &KrxPriceSource, date: NaiveDate) -> Result<Vec<(String, DailyCandle)>> {
    let mut rows = Vec::new();
    for market in Market::korean_markets() {
        let snapshot = krx.get_market_snapshot(market, date).await?;
        rows.extend(
            snapshot
                .into_iter()
                .map(|r| (r.code.as_str().to_string(), r.candle)),
        );
    }
    Ok(rows)
}

/// 체크포인트 위치(마지막 완료 날짜)에서 재개 시작일 계산.
fn resume_start(position: &str) -> Option<NaiveDate> {
    parse_yyyymmdd(position)
        .ok()
        .map(|last_done| last_done + ChronoDuration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_start_day_after_last_completed() {
        assert_eq!(
            resume_start("20250801"),
            NaiveDate::from_ymd_opt(2025, 8, 2)
        );
        assert_eq!(resume_start(""), None);
        assert_eq!(resume_start("bad"), None);
    }

    #[tokio::test]
    async fn test_fetch_day_error_propagates() {
        // 조회 실패 시 에러가 전파되어 해당 날짜가 완료 처리되지 않는다
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/comm/bldAttendant/getJsonData.cmd")
            .with_status(500)
            .create_async()
            .await;

        let krx = KrxPriceSource::with_base_url(server.url());
        let date = NaiveDate::from_ymd_opt(2025, 8, 4).unwrap();

        assert!(fetch_day(&krx, date).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_day_holiday_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/comm/bldAttendant/getJsonData.cmd")
            .with_status(200)
            .with_body(r#"{"OutBlock_1": []}"#)
            .expect(2)
            .create_async()
            .await;

        let krx = KrxPriceSource::with_base_url(server.url());
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let rows = fetch_day(&krx, date).await.unwrap();
        assert!(rows.is_empty());
    }
}
