//! PostgreSQL 저장소.

pub mod checkpoint;
pub mod database;
pub mod ohlcv;
pub mod symbols;

pub use checkpoint::{CheckpointInfo, CheckpointStatus};
pub use database::{Database, DatabaseConfig};
pub use ohlcv::{DailyPriceStore, PriceRow};
pub use symbols::{RegistryStats, SymbolRegistry, SymbolRow};
