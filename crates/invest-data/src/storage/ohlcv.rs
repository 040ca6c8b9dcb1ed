//! 일별 시세 저장소.
//!
//! `daily_prices` 테이블에 대한 repository 구현입니다.
//! UNNEST 패턴으로 일괄 삽입하고 ON CONFLICT로 중복 데이터를
//! 자동 갱신합니다. 종목별 최초/최근 거래일 조회는 레지스트리의
//! IPO/상장폐지 일자 유도에 사용됩니다.

use chrono::{DateTime, NaiveDate, Utc};
use invest_core::DailyCandle;
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::{debug, info};

use crate::error::{DataError, Result};

/// UNNEST 일괄 삽입 청크 크기.
const INSERT_CHUNK_SIZE: usize = 500;

/// 일별 시세 행.
#[derive(Debug, Clone, FromRow)]
pub struct PriceRow {
    pub ticker: String,
    pub trade_date: NaiveDate,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Decimal,
    pub volume: i64,
    pub trading_value: Option<Decimal>,
    pub change_rate: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub fetched_at: DateTime<Utc>,
}

/// 일별 시세 저장소.
#[derive(Clone)]
pub struct DailyPriceStore {
    pool: PgPool,
}

impl DailyPriceStore {
    /// 새 저장소 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 단일 종목의 캔들 일괄 저장.
    pub async fn save_candles(&self, ticker: &str, candles: &[DailyCandle]) -> Result<usize> {
        let rows: Vec<(&str, &DailyCandle)> = candles.iter().map(|c| (ticker, c)).collect();
        let inserted = self.insert_rows(&rows).await?;

        if inserted > 0 {
            info!(ticker, inserted, "일별 시세 저장");
        }

        Ok(inserted)
    }

    /// 전종목 스냅샷 저장 (서로 다른 종목, 같은 날짜).
    pub async fn save_snapshot(&self, rows: &[(String, DailyCandle)]) -> Result<usize> {
        let borrowed: Vec<(&str, &DailyCandle)> =
            rows.iter().map(|(t, c)| (t.as_str(), c)).collect();
        let inserted = self.insert_rows(&borrowed).await?;

        debug!(inserted, "스냅샷 저장");
        Ok(inserted)
    }

    /// UNNEST 패턴 일괄 upsert.
    async fn insert_rows(&self, rows: &[(&str, &DailyCandle)]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0;

        for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
            let tickers: Vec<&str> = chunk.iter().map(|(t, _)| *t).collect();
            let dates: Vec<NaiveDate> = chunk.iter().map(|(_, c)| c.date).collect();
            let opens: Vec<Option<Decimal>> = chunk.iter().map(|(_, c)| c.open).collect();
            let highs: Vec<Option<Decimal>> = chunk.iter().map(|(_, c)| c.high).collect();
            let lows: Vec<Option<Decimal>> = chunk.iter().map(|(_, c)| c.low).collect();
            let closes: Vec<Decimal> = chunk.iter().map(|(_, c)| c.close).collect();
            let volumes: Vec<i64> = chunk.iter().map(|(_, c)| c.volume).collect();
            let values: Vec<Option<Decimal>> =
                chunk.iter().map(|(_, c)| c.trading_value).collect();
            let rates: Vec<Option<Decimal>> = chunk.iter().map(|(_, c)| c.change_rate).collect();
            let caps: Vec<Option<Decimal>> = chunk.iter().map(|(_, c)| c.market_cap).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO daily_prices
                    (ticker, trade_date, open, high, low, close, volume,
                     trading_value, change_rate, market_cap, fetched_at)
                SELECT *, NOW() FROM UNNEST(
                    $1::text[], $2::date[],
                    $3::numeric[], $4::numeric[], $5::numeric[], $6::numeric[],
                    $7::bigint[], $8::numeric[], $9::numeric[], $10::numeric[]
                )
                ON CONFLICT (ticker, trade_date) DO UPDATE SET
                    open = EXCLUDED.open,
                    high = EXCLUDED.high,
                    low = EXCLUDED.low,
                    close = EXCLUDED.close,
                    volume = EXCLUDED.volume,
                    trading_value = EXCLUDED.trading_value,
                    change_rate = EXCLUDED.change_rate,
                    market_cap = EXCLUDED.market_cap,
                    fetched_at = NOW()
                "#,
            )
            .bind(&tickers)
            .bind(&dates)
            .bind(&opens)
            .bind(&highs)
            .bind(&lows)
            .bind(&closes)
            .bind(&volumes)
            .bind(&values)
            .bind(&rates)
            .bind(&caps)
            .execute(&self.pool)
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;

            inserted += result.rows_affected() as usize;
        }

        Ok(inserted)
    }

    /// 종목의 최초 거래일 조회 (IPO 일자 근사치).
    pub async fn first_trade_date(&self, ticker: &str) -> Result<Option<NaiveDate>> {
        let row: Option<(NaiveDate,)> = sqlx::query_as(
            r#"
            SELECT trade_date FROM daily_prices
            WHERE ticker = $1
            ORDER BY trade_date
            LIMIT 1
            "#,
        )
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(d,)| d))
    }

    /// 종목의 최근 거래일 조회 (증분 수집 시작점, 상장폐지 근사치).
    pub async fn last_trade_date(&self, ticker: &str) -> Result<Option<NaiveDate>> {
        let row: Option<(NaiveDate,)> = sqlx::query_as(
            r#"
            SELECT trade_date FROM daily_prices
            WHERE ticker = $1
            ORDER BY trade_date DESC
            LIMIT 1
            "#,
        )
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(d,)| d))
    }

    /// 지정 날짜 이후 거래 행 존재 여부.
    pub async fn has_rows_since(&self, ticker: &str, date: NaiveDate) -> Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM daily_prices WHERE ticker = $1 AND trade_date >= $2 LIMIT 1",
        )
        .bind(ticker)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// 종목의 저장된 행 수.
    pub async fn count(&self, ticker: &str) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM daily_prices WHERE ticker = $1")
                .bind(ticker)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// 기간 내 시세 조회 (날짜 오름차순).
    pub async fn fetch_range(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRow>> {
        let rows = sqlx::query_as(
            r#"
            SELECT ticker, trade_date, open, high, low, close, volume,
                   trading_value, change_rate, market_cap, fetched_at
            FROM daily_prices
            WHERE ticker = $1 AND trade_date >= $2 AND trade_date <= $3
            ORDER BY trade_date
            "#,
        )
        .bind(ticker)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// 종목의 전체 시세 조회 (날짜 오름차순).
    pub async fn fetch_all(&self, ticker: &str) -> Result<Vec<PriceRow>> {
        let rows = sqlx::query_as(
            r#"
            SELECT ticker, trade_date, open, high, low, close, volume,
                   trading_value, change_rate, market_cap, fetched_at
            FROM daily_prices
            WHERE ticker = $1
            ORDER BY trade_date
            "#,
        )
        .bind(ticker)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
