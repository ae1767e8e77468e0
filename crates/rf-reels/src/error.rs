//! Error types for the reel engine

use thiserror::Error;

use crate::symbols::SymbolType;

/// Reel engine error type
#[derive(Error, Debug)]
pub enum ReelError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Reel {reel}: staged outcome has {actual} symbols, expected {expected}")]
    OutcomeLength {
        reel: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Outcome grid is {rows}x{reels}, machine expects {expected_rows}x{expected_reels}")]
    GridShape {
        expected_rows: usize,
        expected_reels: usize,
        rows: usize,
        reels: usize,
    },

    #[error("Symbol type {symbol_type} is outside the {catalog_len}-entry catalog")]
    UnknownSymbol {
        symbol_type: SymbolType,
        catalog_len: usize,
    },

    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type alias
pub type ReelResult<T> = Result<T, ReelError>;
