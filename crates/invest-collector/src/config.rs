//! 환경변수 기반 설정 모듈.

use crate::Result;
use std::time::Duration;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// 종목 레지스트리 동기화 설정
    pub symbol_sync: SymbolSyncConfig,
    /// 일별 시세 수집 설정
    pub ohlcv_collect: OhlcvCollectConfig,
    /// 전종목 과거 시세 백필 설정
    pub market_history: MarketHistoryConfig,
    /// 미국 워치리스트 수집 설정
    pub us_collect: UsCollectConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 종목 레지스트리 동기화 설정
#[derive(Debug, Clone)]
pub struct SymbolSyncConfig {
    /// KOSPI 동기화 활성화
    pub enable_kospi: bool,
    /// KOSDAQ 동기화 활성화
    pub enable_kosdaq: bool,
    /// 상장/상장폐지 일자 유도 시 이력 조회 시작일 (YYYYMMDD)
    pub probe_start_date: String,
    /// 상장폐지 판정 기준 일수 (최근 N일 내 거래 없으면 폐지로 간주)
    pub recent_window_days: i64,
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
    /// 체크포인트 저장 주기 (종목 수)
    pub checkpoint_every: usize,
}

/// 일별 시세 수집 설정
#[derive(Debug, Clone)]
pub struct OhlcvCollectConfig {
    /// 갱신 기준 일수 (마지막 수집 후 N일 미경과 시 건너뜀)
    pub stale_days: i64,
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
    /// 수집 시작 날짜 (YYYYMMDD, 미지정 시 종목별 증분)
    pub start_date: Option<String>,
    /// 수집 종료 날짜 (YYYYMMDD, 미지정 시 오늘)
    pub end_date: Option<String>,
}

/// 전종목 과거 시세 백필 설정
#[derive(Debug, Clone)]
pub struct MarketHistoryConfig {
    /// 백필 시작 날짜 (YYYYMMDD)
    pub start_date: String,
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
}

/// 미국 워치리스트 수집 설정
#[derive(Debug, Clone)]
pub struct UsCollectConfig {
    /// 수집 대상 티커 목록
    pub symbols: Vec<String>,
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 워크플로우 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            crate::error::CollectorError::Config(
                "DATABASE_URL 환경변수가 설정되지 않았습니다".to_string(),
            )
        })?;

        Ok(Self {
            database_url,
            symbol_sync: SymbolSyncConfig {
                enable_kospi: env_var_bool("SYMBOL_SYNC_KOSPI", true),
                enable_kosdaq: env_var_bool("SYMBOL_SYNC_KOSDAQ", true),
                probe_start_date: std::env::var("SYMBOL_SYNC_PROBE_START")
                    .unwrap_or_else(|_| "19900101".to_string()),
                recent_window_days: env_var_parse("SYMBOL_SYNC_WINDOW_DAYS", 30),
                request_delay_ms: env_var_parse("SYMBOL_SYNC_DELAY_MS", 500),
                checkpoint_every: env_var_parse("SYMBOL_SYNC_CHECKPOINT_EVERY", 100),
            },
            ohlcv_collect: OhlcvCollectConfig {
                stale_days: env_var_parse("OHLCV_STALE_DAYS", 1),
                request_delay_ms: env_var_parse("OHLCV_REQUEST_DELAY_MS", 500),
                start_date: std::env::var("OHLCV_START_DATE").ok(),
                end_date: std::env::var("OHLCV_END_DATE").ok(),
            },
            market_history: MarketHistoryConfig {
                start_date: std::env::var("HISTORY_START_DATE")
                    .unwrap_or_else(|_| "19900101".to_string()),
                request_delay_ms: env_var_parse("HISTORY_REQUEST_DELAY_MS", 1000),
            },
            us_collect: UsCollectConfig {
                symbols: env_var_list(
                    "US_SYMBOLS",
                    &["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "TSLA"],
                ),
                request_delay_ms: env_var_parse("US_REQUEST_DELAY_MS", 500),
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 60),
            },
        })
    }
}

impl SymbolSyncConfig {
    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl OhlcvCollectConfig {
    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl MarketHistoryConfig {
    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl UsCollectConfig {
    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl DaemonConfig {
    /// 워크플로우 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

/// 환경변수에서 쉼표 구분 목록 파싱
fn env_var_list(key: &str, default: &[&str]) -> Vec<String> {
    std::env::var(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_else(|_| default.iter().map(|s| s.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_list_parsing() {
        std::env::set_var("TEST_US_SYMBOLS_LIST", "AAPL, MSFT ,NVDA,");
        let symbols = env_var_list("TEST_US_SYMBOLS_LIST", &["SPY"]);
        assert_eq!(symbols, vec!["AAPL", "MSFT", "NVDA"]);
        std::env::remove_var("TEST_US_SYMBOLS_LIST");
    }

    #[test]
    fn test_env_var_list_default() {
        let symbols = env_var_list("TEST_MISSING_LIST_VAR", &["SPY", "QQQ"]);
        assert_eq!(symbols, vec!["SPY", "QQQ"]);
    }
}
