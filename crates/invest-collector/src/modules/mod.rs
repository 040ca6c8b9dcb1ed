//! 데이터 수집 모듈.

pub mod csv_export;
pub mod market_history;
pub mod ohlcv_collect;
pub mod symbol_sync;
pub mod us_collect;

pub use csv_export::{export_prices, export_symbols};
pub use market_history::collect_history;
pub use ohlcv_collect::collect_ohlcv;
pub use symbol_sync::sync_symbols;
pub use us_collect::collect_us;
