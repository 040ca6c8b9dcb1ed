//! 데이터 수집 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 외부 데이터 소스 (KRX 정보데이터시스템, Yahoo Finance)
//! - PostgreSQL 저장소 (종목 레지스트리, 일별 시세, 체크포인트)
//! - CSV 내보내기

pub mod error;
pub mod export;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};
pub use export::{export_prices_csv, export_symbols_csv};

// 데이터 소스 재내보내기
pub use provider::krx::{KrxListingProvider, SymbolListing, SymbolListingProvider};
pub use provider::krx_ohlcv::{KrxPriceSource, MarketSnapshotRow};
pub use provider::yahoo::YahooChartSource;

// 저장소 타입 재내보내기
pub use storage::checkpoint::{
    clear_checkpoint, list_checkpoints, load_checkpoint, mark_interrupted, save_checkpoint,
    CheckpointInfo, CheckpointStatus,
};
pub use storage::database::{Database, DatabaseConfig};
pub use storage::ohlcv::{DailyPriceStore, PriceRow};
pub use storage::symbols::{RegistryStats, SymbolRegistry, SymbolRow};
