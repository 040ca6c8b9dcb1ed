//! 수집 시스템의 공통 에러 타입.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 잘못된 종목코드
    #[error("잘못된 종목코드: {0}")]
    InvalidCode(String),

    /// 알 수 없는 시장
    #[error("알 수 없는 시장: {0}")]
    UnknownMarket(String),

    /// 날짜 파싱 에러
    #[error("날짜 파싱 에러: {0}")]
    DateParse(String),
}

/// Result 타입 별칭.
pub type Result<T> = std::result::Result<T, CoreError>;
