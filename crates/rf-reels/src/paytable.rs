//! Settled grid and left-anchored payline evaluation

use serde::{Deserialize, Serialize};

use crate::source::SymbolSource;
use crate::symbols::SymbolType;

/// Minimum run length that pays
pub const MIN_WIN_RUN: usize = 3;

/// rows × reels matrix of symbol types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Vec<SymbolType>>,
}

impl Grid {
    /// Build from row-major data
    pub fn from_rows(rows: Vec<Vec<SymbolType>>) -> Self {
        Self { rows }
    }

    /// Build from one column per reel. Short columns leave their cells out.
    pub fn from_columns(columns: &[Vec<SymbolType>]) -> Self {
        let row_count = columns.iter().map(Vec::len).max().unwrap_or(0);
        let rows = (0..row_count)
            .map(|row| {
                columns
                    .iter()
                    .filter_map(|column| column.get(row).copied())
                    .collect()
            })
            .collect();
        Self { rows }
    }

    /// Draw every cell independently from `source`, reel by reel
    pub fn random(rows: usize, reels: usize, source: &dyn SymbolSource) -> Self {
        let columns: Vec<Vec<SymbolType>> = (0..reels)
            .map(|_| (0..rows).map(|_| source.next()).collect())
            .collect();
        Self::from_columns(&columns)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row
    pub fn reel_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn get(&self, row: usize, reel: usize) -> Option<SymbolType> {
        self.rows.get(row).and_then(|r| r.get(reel)).copied()
    }

    pub fn row(&self, row: usize) -> Option<&[SymbolType]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[SymbolType]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Symbols of one reel, top to bottom
    pub fn column(&self, reel: usize) -> Vec<SymbolType> {
        self.rows.iter().filter_map(|r| r.get(reel).copied()).collect()
    }
}

/// A winning row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WinLine {
    pub row: usize,
    /// Identical symbols counted from reel 0
    pub run_length: usize,
    pub symbol_type: SymbolType,
}

/// Left-anchored straight-line evaluator.
///
/// A run must start at reel 0; a matching run starting further right does
/// not pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinEvaluator {
    min_run: usize,
}

impl WinEvaluator {
    pub fn new(min_run: usize) -> Self {
        Self {
            min_run: min_run.max(1),
        }
    }

    pub fn min_run(&self) -> usize {
        self.min_run
    }

    /// Winning rows in row order
    pub fn evaluate(&self, grid: &Grid) -> Vec<WinLine> {
        grid.rows()
            .enumerate()
            .filter_map(|(row, symbols)| {
                let first = *symbols.first()?;
                let run_length = leading_run(symbols);
                (run_length >= self.min_run).then_some(WinLine {
                    row,
                    run_length,
                    symbol_type: first,
                })
            })
            .collect()
    }
}

impl Default for WinEvaluator {
    fn default() -> Self {
        Self::new(MIN_WIN_RUN)
    }
}

/// Evaluate with the standard minimum run
pub fn evaluate(grid: &Grid) -> Vec<WinLine> {
    WinEvaluator::default().evaluate(grid)
}

/// Length of the run of `symbols[0]` starting at index 0
fn leading_run(symbols: &[SymbolType]) -> usize {
    match symbols.first() {
        Some(first) => symbols.iter().take_while(|s| *s == first).count(),
        None => 0,
    }
}
