//! 도메인 타입 정의.

pub mod candle;
pub mod code;
pub mod market;

pub use candle::DailyCandle;
pub use code::StockCode;
pub use market::{kst_today, Market};
