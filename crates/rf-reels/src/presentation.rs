//! Presentation sink, the side-effect boundary to whatever draws the reels

use parking_lot::Mutex;

use crate::symbols::{Symbol, SymbolId, SymbolType};

/// Receives draw-side effects from reels. Return values are never consulted.
pub trait PresentationSink: Send + Sync {
    /// Symbol entered the reel's display tree
    fn attach(&self, reel: usize, symbol: &Symbol);
    /// Symbol left the reel's display tree
    fn detach(&self, reel: usize, symbol: SymbolId);
    /// Symbol moved to (x, y)
    fn place(&self, reel: usize, symbol: SymbolId, x: f64, y: f64);
    /// Motion blur on/off for a whole reel
    fn set_motion_effect(&self, reel: usize, enabled: bool);
}

/// Discards everything (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresentation;

impl PresentationSink for NullPresentation {
    fn attach(&self, _reel: usize, _symbol: &Symbol) {}
    fn detach(&self, _reel: usize, _symbol: SymbolId) {}
    fn place(&self, _reel: usize, _symbol: SymbolId, _x: f64, _y: f64) {}
    fn set_motion_effect(&self, _reel: usize, _enabled: bool) {}
}

/// One recorded presentation call
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationCall {
    Attach {
        reel: usize,
        symbol: SymbolId,
        symbol_type: SymbolType,
    },
    Detach {
        reel: usize,
        symbol: SymbolId,
    },
    Place {
        reel: usize,
        symbol: SymbolId,
        x: f64,
        y: f64,
    },
    MotionEffect {
        reel: usize,
        enabled: bool,
    },
}

/// Records every call in order
#[derive(Debug, Default)]
pub struct RecordingPresentation {
    calls: Mutex<Vec<PresentationCall>>,
}

impl RecordingPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded calls
    pub fn calls(&self) -> Vec<PresentationCall> {
        self.calls.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Motion effect toggles as (reel, enabled)
    pub fn motion_effects(&self) -> Vec<(usize, bool)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match *call {
                PresentationCall::MotionEffect { reel, enabled } => Some((reel, enabled)),
                _ => None,
            })
            .collect()
    }

    /// Net attached symbol count for a reel (attaches minus detaches)
    pub fn attached_count(&self, reel: usize) -> isize {
        self.calls.lock().iter().fold(0, |count, call| match *call {
            PresentationCall::Attach { reel: r, .. } if r == reel => count + 1,
            PresentationCall::Detach { reel: r, .. } if r == reel => count - 1,
            _ => count,
        })
    }

    /// Last recorded position of a symbol
    pub fn last_position(&self, symbol: SymbolId) -> Option<(f64, f64)> {
        self.calls.lock().iter().rev().find_map(|call| match *call {
            PresentationCall::Place { symbol: s, x, y, .. } if s == symbol => Some((x, y)),
            _ => None,
        })
    }

    fn push(&self, call: PresentationCall) {
        self.calls.lock().push(call);
    }
}

impl PresentationSink for RecordingPresentation {
    fn attach(&self, reel: usize, symbol: &Symbol) {
        self.push(PresentationCall::Attach {
            reel,
            symbol: symbol.id(),
            symbol_type: symbol.symbol_type(),
        });
    }

    fn detach(&self, reel: usize, symbol: SymbolId) {
        self.push(PresentationCall::Detach { reel, symbol });
    }

    fn place(&self, reel: usize, symbol: SymbolId, x: f64, y: f64) {
        self.push(PresentationCall::Place { reel, symbol, x, y });
    }

    fn set_motion_effect(&self, reel: usize, enabled: bool) {
        self.push(PresentationCall::MotionEffect { reel, enabled });
    }
}
