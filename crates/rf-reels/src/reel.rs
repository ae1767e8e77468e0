//! Reel: one scrolling column with a double-buffered symbol strip
//!
//! ```text
//!  buffer index   base y (pitch p, lookahead L)
//!  0              (0 - L) * p      ┐
//!  ...                             │ above viewport
//!  L-1            -p               ┘
//!  L              0                ┐
//!  ...                             │ visible window (rows)
//!  L+rows-1                        ┘
//!  ...                               below viewport
//! ```
//!
//! While spinning, every slot is drawn at `base y - offset`. Once the offset
//! has run a full `recycle_count` cells, the trailing `recycle_count` symbols
//! move to the head of the buffer and the offset is corrected by the same
//! distance, so the strip looks endless and nothing jumps on screen.

use std::sync::Arc;

use crate::config::MachineConfig;
use crate::error::{ReelError, ReelResult};
use crate::presentation::PresentationSink;
use crate::resources::ResourceProvider;
use crate::source::SymbolSource;
use crate::symbols::{Symbol, SymbolType};

/// Shared collaborators injected into the machine and every reel
#[derive(Clone)]
pub struct Collaborators {
    pub symbols: Arc<dyn SymbolSource>,
    pub resources: Arc<dyn ResourceProvider>,
    pub presentation: Arc<dyn PresentationSink>,
}

impl Collaborators {
    pub fn new(
        symbols: Arc<dyn SymbolSource>,
        resources: Arc<dyn ResourceProvider>,
        presentation: Arc<dyn PresentationSink>,
    ) -> Self {
        Self {
            symbols,
            resources,
            presentation,
        }
    }
}

/// Per-reel geometry and motion constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReelLayout {
    pub buffer_len: usize,
    pub rows: usize,
    pub lookahead: usize,
    pub recycle_count: usize,
    pub cell_pitch: f64,
    pub base_speed: f64,
    /// Horizontal position of the reel
    pub x: f64,
}

impl ReelLayout {
    pub fn from_config(config: &MachineConfig, index: usize) -> Self {
        Self {
            buffer_len: config.buffer_len,
            rows: config.rows,
            lookahead: config.lookahead,
            recycle_count: config.recycle_count,
            cell_pitch: config.cell_pitch(),
            base_speed: config.base_speed,
            x: config.reel_x(index),
        }
    }

    /// Offset distance that triggers a recycle
    pub fn recycle_threshold(&self) -> f64 {
        self.recycle_count as f64 * self.cell_pitch
    }

    /// Display y of buffer slot `slot` at `offset`
    pub fn slot_y(&self, slot: usize, offset: f64) -> f64 {
        (slot as f64 - self.lookahead as f64) * self.cell_pitch - offset
    }
}

/// Reel spin state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReelState {
    #[default]
    Idle,
    Spinning,
}

/// One reel.
///
/// `stage_outcome` may be called at any time; while spinning it prepares the
/// *next* spin and leaves the current one untouched.
pub struct Reel {
    index: usize,
    layout: ReelLayout,
    deps: Collaborators,
    active: Vec<Symbol>,
    staged: Option<Vec<Symbol>>,
    offset: f64,
    velocity: f64,
    state: ReelState,
    /// Slots moved tail→head since the active buffer was last aligned
    rotation: usize,
    recycles: u64,
}

impl Reel {
    /// Create an empty reel. Call [`Reel::initialize`] before use.
    pub fn new(index: usize, layout: ReelLayout, deps: Collaborators) -> Self {
        Self {
            index,
            layout,
            deps,
            active: Vec::with_capacity(layout.buffer_len),
            staged: None,
            offset: 0.0,
            velocity: 0.0,
            state: ReelState::Idle,
            rotation: 0,
            recycles: 0,
        }
    }

    /// Fill the active buffer with random symbols and show them
    pub fn initialize(&mut self) {
        self.release_active();

        let buffer: Vec<Symbol> = (0..self.layout.buffer_len)
            .map(|_| self.make_symbol(self.deps.symbols.next()))
            .collect();
        self.show(buffer);

        log::debug!(
            "[Reel {}] Created {} initial symbols ({} degraded)",
            self.index,
            self.active.len(),
            self.active.iter().filter(|s| s.is_degraded()).count()
        );
    }

    /// Prepare the buffer the next spin will land on.
    ///
    /// `targets` (one per visible row, top to bottom) go into the visible
    /// window; every other slot is random padding. Replaces any pending stage.
    pub fn stage_outcome(&mut self, targets: &[SymbolType]) -> ReelResult<()> {
        if targets.len() != self.layout.rows {
            return Err(ReelError::OutcomeLength {
                reel: self.index,
                expected: self.layout.rows,
                actual: targets.len(),
            });
        }

        let window = self.layout.lookahead..self.layout.lookahead + self.layout.rows;
        let buffer: Vec<Symbol> = (0..self.layout.buffer_len)
            .map(|slot| {
                let symbol_type = if window.contains(&slot) {
                    targets[slot - window.start]
                } else {
                    self.deps.symbols.next()
                };
                self.make_symbol(symbol_type)
            })
            .collect();

        if self.staged.replace(buffer).is_some() {
            log::debug!("[Reel {}] Replaced pending staged outcome", self.index);
        }
        Ok(())
    }

    /// Start spinning at base speed, swapping in the staged buffer if any
    pub fn start_spin(&mut self) {
        if self.state == ReelState::Spinning {
            log::debug!("[Reel {}] start_spin ignored: already spinning", self.index);
            return;
        }

        self.state = ReelState::Spinning;
        self.velocity = self.layout.base_speed;

        match self.staged.take() {
            Some(buffer) => {
                log::debug!(
                    "[Reel {}] Switching symbols: {} current -> {} staged",
                    self.index,
                    self.active.len(),
                    buffer.len()
                );
                self.release_active();
                self.show(buffer);
            }
            None => {
                log::warn!(
                    "[Reel {}] No staged outcome, spinning current symbols",
                    self.index
                );
            }
        }

        self.deps.presentation.set_motion_effect(self.index, true);
    }

    /// Advance one frame. No-op unless spinning.
    pub fn tick(&mut self) {
        if self.state != ReelState::Spinning {
            return;
        }

        self.offset -= self.velocity;

        let threshold = self.layout.recycle_threshold();
        if threshold.is_finite() && threshold > 0.0 && self.offset <= -threshold {
            let crossings = (-self.offset / threshold).floor();
            self.recycle(crossings as u64);
            self.offset = -((-self.offset) % threshold);
        }

        self.layout_symbols();
    }

    /// Hard stop: snap to rest with the staged outcome in the visible window
    pub fn request_stop(&mut self) {
        if self.state != ReelState::Spinning {
            log::debug!("[Reel {}] request_stop ignored: not spinning", self.index);
            return;
        }

        self.state = ReelState::Idle;
        self.deps.presentation.set_motion_effect(self.index, false);

        self.velocity = 0.0;
        self.offset = 0.0;
        self.realign();
        self.layout_symbols();

        log::debug!(
            "[Reel {}] Stopped cleanly after {} recycles",
            self.index,
            self.recycles
        );
    }

    /// Symbols in the visible window; empty before initialization
    pub fn visible_symbols(&self) -> &[Symbol] {
        let start = self.layout.lookahead;
        self.active
            .get(start..start + self.layout.rows)
            .unwrap_or(&[])
    }

    /// Symbol types in the visible window, top to bottom
    pub fn visible_types(&self) -> Vec<SymbolType> {
        self.visible_symbols()
            .iter()
            .map(Symbol::symbol_type)
            .collect()
    }

    /// Release every symbol and leave the display tree
    pub fn destroy(&mut self) {
        if self.state == ReelState::Spinning {
            self.deps.presentation.set_motion_effect(self.index, false);
        }
        self.release_active();
        self.staged = None;
        self.state = ReelState::Idle;
        self.velocity = 0.0;
        self.offset = 0.0;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> ReelState {
        self.state
    }

    pub fn is_spinning(&self) -> bool {
        self.state == ReelState::Spinning
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// Active buffer, top to bottom
    pub fn symbols(&self) -> &[Symbol] {
        &self.active
    }

    pub fn symbol_count(&self) -> usize {
        self.active.len()
    }

    pub fn visible_symbol_count(&self) -> usize {
        self.visible_symbols().len()
    }

    /// Recycle events since creation
    pub fn recycle_count(&self) -> u64 {
        self.recycles
    }

    pub fn layout(&self) -> &ReelLayout {
        &self.layout
    }

    // ═══════════════════════════════════════════════════════════════════════
    // INTERNALS
    // ═══════════════════════════════════════════════════════════════════════

    fn make_symbol(&self, symbol_type: SymbolType) -> Symbol {
        Symbol::resolve(symbol_type, self.deps.resources.as_ref(), self.index)
    }

    /// Make `buffer` the active one, attach it and lay it out at offset 0
    fn show(&mut self, buffer: Vec<Symbol>) {
        self.active = buffer;
        for symbol in &self.active {
            self.deps.presentation.attach(self.index, symbol);
        }
        self.offset = 0.0;
        self.rotation = 0;
        self.layout_symbols();
    }

    fn release_active(&mut self) {
        for symbol in self.active.drain(..) {
            self.deps.presentation.detach(self.index, symbol.id());
        }
        self.rotation = 0;
    }

    /// Move the trailing symbols to the head `times` times over, keeping
    /// their order. One rotation regardless of `times`.
    fn recycle(&mut self, times: u64) {
        let len = self.active.len();
        if len == 0 || times == 0 {
            return;
        }
        let count = self.layout.recycle_count.min(len);
        let shift = ((times % len as u64) as usize * count) % len;
        self.active.rotate_right(shift);
        self.rotation = (self.rotation + shift) % len;
        self.recycles = self.recycles.saturating_add(times);
        log::trace!(
            "[Reel {}] Recycled {} x {} symbols",
            self.index,
            times,
            count
        );
    }

    /// Undo the net recycle rotation so the buffer sits as it was swapped in
    fn realign(&mut self) {
        if self.rotation != 0 {
            self.active.rotate_left(self.rotation);
            self.rotation = 0;
        }
    }

    fn layout_symbols(&mut self) {
        let x = self.layout.x;
        for (slot, symbol) in self.active.iter_mut().enumerate() {
            let y = self.layout.slot_y(slot, self.offset);
            symbol.set_position(x, y);
            self.deps.presentation.place(self.index, symbol.id(), x, y);
        }
    }
}

impl std::fmt::Debug for Reel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reel")
            .field("index", &self.index)
            .field("state", &self.state)
            .field("offset", &self.offset)
            .field("velocity", &self.velocity)
            .field("symbols", &self.active.len())
            .field("staged", &self.staged.is_some())
            .finish()
    }
}
