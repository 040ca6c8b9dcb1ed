//! 독립 실행형 시장 데이터 수집기.
//!
//! 이 crate는 분석 파이프라인과 독립적으로 데이터를 수집하는
//! 바이너리를 제공합니다:
//! - 종목 레지스트리 동기화 (KRX 상장 목록 + 상장/상장폐지 일자 유도)
//! - 일별 시세 수집 (종목별 증분)
//! - 전종목 과거 시세 백필 (일자 단위)
//! - 미국 워치리스트 수집 (Yahoo Finance)
//! - CSV 내보내기

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
