//! 수집 통계 구조체.
//!
//! 워크플로우마다 처리 단위가 다릅니다: 레지스트리 동기화와
//! 워치리스트는 종목 단위, 시세 수집은 티커 단위, 백필은 날짜
//! 단위로 집계하며 요약 로그에 단위가 함께 남습니다.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// 집계 단위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkUnit {
    /// 레지스트리 종목
    Symbols,
    /// 수집 대상 티커
    Tickers,
    /// 백필 날짜
    Dates,
}

impl WorkUnit {
    /// 로그 출력용 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Symbols => "symbols",
            Self::Tickers => "tickers",
            Self::Dates => "dates",
        }
    }
}

/// 수집 작업 통계.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 집계 단위
    pub unit: WorkUnit,
    /// 처리를 시도한 단위 수
    pub attempted: usize,
    /// 성공한 단위 수
    pub succeeded: usize,
    /// 실패한 단위 수
    pub failed: usize,
    /// 건너뛴 단위 수 (이미 최신이거나 재개 지점 이전)
    pub skipped: usize,
    /// 데이터가 없던 단위 수 (휴장일, 이력 없는 신규 종목 등)
    pub no_data: usize,
    /// 저장된 총 시세 행 수
    pub rows_written: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    fn new(unit: WorkUnit) -> Self {
        Self {
            unit,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            no_data: 0,
            rows_written: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// 종목 단위 통계 (레지스트리 동기화, 워치리스트).
    pub fn for_symbols() -> Self {
        Self::new(WorkUnit::Symbols)
    }

    /// 티커 단위 통계 (시세 수집).
    pub fn for_tickers() -> Self {
        Self::new(WorkUnit::Tickers)
    }

    /// 날짜 단위 통계 (과거 시세 백필).
    pub fn for_dates() -> Self {
        Self::new(WorkUnit::Dates)
    }

    /// 성공 기록 (저장된 행 수 포함).
    pub fn record_success(&mut self, rows: usize) {
        self.attempted += 1;
        self.succeeded += 1;
        self.rows_written += rows;
    }

    /// 실패 기록.
    pub fn record_error(&mut self) {
        self.attempted += 1;
        self.failed += 1;
    }

    /// 건너뜀 기록.
    pub fn record_skip(&mut self) {
        self.attempted += 1;
        self.skipped += 1;
    }

    /// 데이터 없음 기록.
    pub fn record_no_data(&mut self) {
        self.attempted += 1;
        self.no_data += 1;
    }

    /// 소요 시간 기록.
    pub fn finish(&mut self, started: Instant) {
        self.elapsed = started.elapsed();
    }

    /// 성공률 (%). 건너뛴 단위는 모수에서 제외합니다.
    pub fn success_rate(&self) -> f64 {
        let measured = self.attempted - self.skipped;
        if measured == 0 {
            0.0
        } else {
            (self.succeeded as f64 / measured as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력.
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            unit = self.unit.as_str(),
            attempted = self.attempted,
            succeeded = self.succeeded,
            failed = self.failed,
            skipped = self.skipped,
            no_data = self.no_data,
            rows_written = self.rows_written,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counters() {
        let mut stats = CollectionStats::for_tickers();
        stats.record_success(120);
        stats.record_success(30);
        stats.record_error();
        stats.record_no_data();

        assert_eq!(stats.attempted, 4);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.no_data, 1);
        assert_eq!(stats.rows_written, 150);
    }

    #[test]
    fn test_success_rate_excludes_skipped() {
        let mut stats = CollectionStats::for_symbols();
        assert_eq!(stats.success_rate(), 0.0);

        stats.record_success(1);
        stats.record_error();
        stats.record_skip();
        stats.record_skip();

        // 건너뛴 2건은 모수에서 제외: 1/2 = 50%
        assert_eq!(stats.success_rate(), 50.0);
    }
}
