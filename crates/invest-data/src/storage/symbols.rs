//! 종목 레지스트리 저장소.
//!
//! `stock_symbols` 테이블에 대한 repository 구현입니다.
//! 반복 수집 실행에서 중복 행이 생기지 않도록 모든 쓰기는
//! (ticker, market) 자연키 기준 upsert로 수행합니다.

use chrono::{DateTime, NaiveDate, Utc};
use invest_core::Market;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::debug;

use crate::error::Result;
use crate::provider::krx::SymbolListing;

/// 레지스트리 행.
#[derive(Debug, Clone, FromRow)]
pub struct SymbolRow {
    pub id: i32,
    pub ticker: String,
    pub name: String,
    pub market: String,
    pub sector: Option<String>,
    /// 최초 거래일 근사치 (가격 이력 기반)
    pub ipo_date: Option<NaiveDate>,
    /// 마지막 거래일 근사치
    pub delisting_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 레지스트리 통계.
#[derive(Debug, Clone, Default, FromRow)]
pub struct RegistryStats {
    pub total: i64,
    pub kospi: i64,
    pub kosdaq: i64,
    pub us: i64,
    pub active: i64,
    pub delisted: i64,
    pub with_ipo_date: i64,
    pub earliest_ipo: Option<NaiveDate>,
    pub latest_ipo: Option<NaiveDate>,
}

/// 종목 레지스트리.
#[derive(Clone)]
pub struct SymbolRegistry {
    pool: PgPool,
}

impl SymbolRegistry {
    /// 새 레지스트리 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 상장 종목 정보 upsert.
    ///
    /// 오늘 목록에 존재하는 종목은 거래 중으로 간주하여
    /// `is_active`를 복원하고 상장폐지 마크를 해제합니다.
    pub async fn upsert_listing(&self, listing: &SymbolListing) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_symbols (ticker, name, market, sector, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, TRUE, NOW(), NOW())
            ON CONFLICT (ticker, market) DO UPDATE SET
                name = EXCLUDED.name,
                sector = COALESCE(EXCLUDED.sector, stock_symbols.sector),
                is_active = TRUE,
                delisting_date = NULL,
                updated_at = NOW()
            "#,
        )
        .bind(listing.code.as_str())
        .bind(&listing.name)
        .bind(listing.market.as_str())
        .bind(&listing.sector)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// US 종목 등록 (워치리스트용).
    pub async fn register_us(&self, ticker: &str, name: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_symbols (ticker, name, market, is_active, created_at, updated_at)
            VALUES ($1, $2, 'US', TRUE, NOW(), NOW())
            ON CONFLICT (ticker, market) DO UPDATE SET
                updated_at = NOW()
            "#,
        )
        .bind(ticker)
        .bind(name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 단일 종목 조회.
    pub async fn get(&self, ticker: &str, market: Market) -> Result<Option<SymbolRow>> {
        let row = sqlx::query_as(
            r#"
            SELECT id, ticker, name, market, sector, ipo_date, delisting_date,
                   is_active, created_at, updated_at
            FROM stock_symbols
            WHERE ticker = $1 AND market = $2
            "#,
        )
        .bind(ticker)
        .bind(market.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// 종목 목록 조회.
    ///
    /// # 인자
    /// - `market`: 시장 필터 (None이면 전체)
    /// - `active_only`: 상장폐지 종목 제외 여부
    pub async fn list(&self, market: Option<Market>, active_only: bool) -> Result<Vec<SymbolRow>> {
        let rows = sqlx::query_as(
            r#"
            SELECT id, ticker, name, market, sector, ipo_date, delisting_date,
                   is_active, created_at, updated_at
            FROM stock_symbols
            WHERE ($1::text IS NULL OR market = $1)
              AND (NOT $2 OR is_active)
            ORDER BY market, ticker
            "#,
        )
        .bind(market.map(|m| m.as_str()))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// 수집 대상 국내 활성 종목 티커 목록.
    pub async fn active_kr_tickers(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT ticker FROM stock_symbols
            WHERE is_active AND market IN ('KOSPI', 'KOSDAQ')
            ORDER BY ticker
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(t,)| t).collect())
    }

    /// IPO 일자 기록 (최초 거래일 근사치).
    pub async fn set_ipo_date(&self, ticker: &str, market: Market, ipo: NaiveDate) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE stock_symbols
            SET ipo_date = $3, updated_at = NOW()
            WHERE ticker = $1 AND market = $2
            "#,
        )
        .bind(ticker)
        .bind(market.as_str())
        .bind(ipo)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 상장폐지 마크 (마지막 거래일 근사치).
    pub async fn mark_delisted(&self, ticker: &str, market: Market, date: NaiveDate) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE stock_symbols
            SET delisting_date = $3, is_active = FALSE, updated_at = NOW()
            WHERE ticker = $1 AND market = $2
            "#,
        )
        .bind(ticker)
        .bind(market.as_str())
        .bind(date)
        .execute(&self.pool)
        .await?;

        debug!(ticker, market = %market, date = %date, "상장폐지 마크");
        Ok(())
    }

    /// 활성 상태 복원 (상장폐지 마크 해제).
    pub async fn mark_active(&self, ticker: &str, market: Market) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE stock_symbols
            SET delisting_date = NULL, is_active = TRUE, updated_at = NOW()
            WHERE ticker = $1 AND market = $2
            "#,
        )
        .bind(ticker)
        .bind(market.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 오늘 목록에 없는 활성 국내 종목 조회 (상장폐지 후보).
    pub async fn active_kr_not_in(&self, listed_tickers: &[String]) -> Result<Vec<SymbolRow>> {
        let rows = sqlx::query_as(
            r#"
            SELECT id, ticker, name, market, sector, ipo_date, delisting_date,
                   is_active, created_at, updated_at
            FROM stock_symbols
            WHERE is_active
              AND market IN ('KOSPI', 'KOSDAQ')
              AND ticker <> ALL($1)
            ORDER BY ticker
            "#,
        )
        .bind(listed_tickers)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// 레지스트리 전체 종목 수.
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stock_symbols")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// 레지스트리 통계 조회.
    pub async fn stats(&self) -> Result<RegistryStats> {
        let stats = sqlx::query_as(
            r#"
            SELECT
                COUNT(*)                                          AS total,
                COUNT(*) FILTER (WHERE market = 'KOSPI')          AS kospi,
                COUNT(*) FILTER (WHERE market = 'KOSDAQ')         AS kosdaq,
                COUNT(*) FILTER (WHERE market = 'US')             AS us,
                COUNT(*) FILTER (WHERE is_active)                 AS active,
                COUNT(*) FILTER (WHERE NOT is_active)             AS delisted,
                COUNT(*) FILTER (WHERE ipo_date IS NOT NULL)      AS with_ipo_date,
                MIN(ipo_date)                                     AS earliest_ipo,
                MAX(ipo_date)                                     AS latest_ipo
            FROM stock_symbols
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
