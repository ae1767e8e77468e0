//! Symbol sources (the injected RNG)

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rand::prelude::*;

use crate::symbols::{SymbolCatalog, SymbolType};

/// Uniform source of symbol types.
///
/// Draws must stay inside the machine's catalog; a machine refuses to spin
/// onto a type its catalog does not hold.
pub trait SymbolSource: Send + Sync {
    fn next(&self) -> SymbolType;
}

/// Uniform draw over a catalog
pub struct RandomSymbolSource {
    catalog_len: u16,
    rng: Mutex<StdRng>,
}

impl RandomSymbolSource {
    /// Entropy-seeded source
    pub fn new(catalog: &SymbolCatalog) -> Self {
        Self::with_rng(catalog, StdRng::from_os_rng())
    }

    /// Seeded source for reproducible sessions
    pub fn seeded(catalog: &SymbolCatalog, seed: u64) -> Self {
        Self::with_rng(catalog, StdRng::seed_from_u64(seed))
    }

    fn with_rng(catalog: &SymbolCatalog, rng: StdRng) -> Self {
        Self {
            catalog_len: catalog.len().min(u16::MAX as usize) as u16,
            rng: Mutex::new(rng),
        }
    }
}

impl SymbolSource for RandomSymbolSource {
    fn next(&self) -> SymbolType {
        if self.catalog_len == 0 {
            return SymbolType(0);
        }
        SymbolType(self.rng.lock().random_range(0..self.catalog_len))
    }
}

/// Deterministic source cycling through a fixed sequence
#[derive(Debug)]
pub struct SequenceSymbolSource {
    sequence: Vec<SymbolType>,
    cursor: AtomicUsize,
}

impl SequenceSymbolSource {
    pub fn new(sequence: Vec<SymbolType>) -> Self {
        Self {
            sequence,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Always yields the same symbol
    pub fn constant(symbol_type: SymbolType) -> Self {
        Self::new(vec![symbol_type])
    }

    /// Number of draws so far
    pub fn draws(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }
}

impl SymbolSource for SequenceSymbolSource {
    fn next(&self) -> SymbolType {
        if self.sequence.is_empty() {
            return SymbolType(0);
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.sequence[i % self.sequence.len()]
    }
}
