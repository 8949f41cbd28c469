//! Error handling for the engine

use thiserror::Error;

/// Arbitrage computation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArbitrageError {
    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    #[error("Invalid fee: {0} bps (must be 0..=10000)")]
    InvalidFee(u32),

    #[error("Invalid arbitrage route: {0}")]
    InvalidRoute(String),
}

/// Pool-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    #[error("Pool {0} has a zero reserve")]
    ZeroReserve(String),

    #[error("Pool {0} has no on-chain address")]
    MissingAddress(String),

    #[error("Pool {0} has an out-of-range fee: {1} bps")]
    FeeOutOfRange(String, u32),

    #[error("Pool {0} trades a token against itself")]
    SelfPair(String),

    #[error("Pool {0} has a token with {1} decimals (max 38)")]
    UnsupportedDecimals(String, u8),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    #[error("Arbitrage error: {0}")]
    Arbitrage(#[from] ArbitrageError),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
