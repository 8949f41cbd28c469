//! Poolarb - Solana multi-DEX arbitrage detection engine
//! Built with Domain-Driven Design principles

pub mod application;
pub mod domain;
pub mod math;
pub mod report;
pub mod shared;

// Re-export main types for convenience
pub use domain::arbitrage::{
    ArbitrageEngine, ArbitrageOpportunity, ArbitragePath, ArbitragePathType, ArbitrageStep, ScanResult,
};
pub use domain::pool::{PairGraph, PoolData, PoolReserves};
pub use domain::risk::{MarketContext, Recommendation, RiskAnalysis, RiskAnalyzer};
pub use shared::config::{EngineConfig, ScannerConfig};
pub use shared::errors::{AppError, ArbitrageError};
pub use shared::types::TokenInfo;
