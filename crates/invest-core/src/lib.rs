//! # Invest Core
//!
//! 시장 데이터 수집기의 핵심 도메인 타입을 제공합니다.
//!
//! 이 크레이트는 수집 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 시장 구분 (KOSPI/KOSDAQ/US)
//! - 종목코드 검증
//! - 일봉 시세 구조체
//! - 로깅 인프라

pub mod error;
pub mod logging;
pub mod types;

pub use error::{CoreError, Result};
pub use logging::*;
pub use types::*;
