//! 외부 데이터 소스 Provider.

pub mod krx;
pub mod krx_ohlcv;
pub mod parse;
pub mod yahoo;

pub use krx::{KrxListingProvider, SymbolListing, SymbolListingProvider};
pub use krx_ohlcv::{KrxPriceSource, MarketSnapshotRow};
pub use yahoo::YahooChartSource;
