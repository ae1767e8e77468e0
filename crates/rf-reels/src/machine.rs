//! Slot machine: owns the reels and drives the spin protocol
//!
//! ```text
//! start_spin()            update() ...
//!   stage outcome           Settling ──settle──► reels start
//!   Idle → Spinning         Holding  ──hold────► Stopping, reel 0 stops
//!                           Cascading ─interval► reel 1 .. N-1 stop
//!                           last stop ─────────► Idle, evaluate grid
//! ```
//!
//! The three delays are deadlines on the injected [`Clock`]; `update()` fires
//! whatever is due before ticking the reels, so a tick never sees a
//! half-finished phase change. The next deadline is measured from the moment
//! the previous phase fired, which keeps consecutive reel stops at least one
//! stop interval apart even with coarse frames.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::MachineConfig;
use crate::error::{ReelError, ReelResult};
use crate::paytable::{Grid, WinEvaluator};
use crate::reel::{Collaborators, Reel, ReelLayout};
use crate::spin::{MachineEvent, SessionStats, SpinOutcome};
use crate::tick::{TickHandle, TickSource};

/// Machine-level state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineState {
    #[default]
    Idle,
    Spinning,
    Stopping,
}

/// Pending step of the spin protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpinPhase {
    Idle,
    /// Outcome staged, reels start at `until`
    Settling { until: Duration },
    /// Reels spinning, first stop at `until`
    Holding { until: Duration },
    /// Reel `next_reel` stops at `until`
    Cascading { next_reel: usize, until: Duration },
}

impl SpinPhase {
    fn deadline(&self) -> Option<Duration> {
        match *self {
            Self::Idle => None,
            Self::Settling { until } | Self::Holding { until } | Self::Cascading { until, .. } => {
                Some(until)
            }
        }
    }
}

/// Machine shared with a tick source
pub type SharedMachine = Arc<Mutex<SlotMachine>>;

struct Subscription {
    source: Arc<dyn TickSource>,
    handle: TickHandle,
}

/// Spin orchestrator
pub struct SlotMachine {
    config: MachineConfig,
    deps: Collaborators,
    clock: Arc<dyn Clock>,
    evaluator: WinEvaluator,
    reels: Vec<Reel>,
    state: MachineState,
    phase: SpinPhase,
    spin_count: u64,
    events: Vec<MachineEvent>,
    last_outcome: Option<SpinOutcome>,
    stats: SessionStats,
    subscription: Option<Subscription>,
    destroyed: bool,
}

impl SlotMachine {
    /// Build the machine and initialize every reel
    pub fn new(config: MachineConfig, deps: Collaborators, clock: Arc<dyn Clock>) -> ReelResult<Self> {
        config.validate()?;

        let reels = (0..config.reels)
            .map(|index| {
                let mut reel = Reel::new(index, ReelLayout::from_config(&config, index), deps.clone());
                reel.initialize();
                reel
            })
            .collect();

        log::info!(
            "[Machine] Created {}x{} machine, {} symbol types",
            config.reels,
            config.rows,
            config.catalog.len()
        );

        Ok(Self {
            config,
            deps,
            clock,
            evaluator: WinEvaluator::default(),
            reels,
            state: MachineState::Idle,
            phase: SpinPhase::Idle,
            spin_count: 0,
            events: Vec::new(),
            last_outcome: None,
            stats: SessionStats::default(),
            subscription: None,
            destroyed: false,
        })
    }

    /// Wrap for sharing with a tick source
    pub fn shared(self) -> SharedMachine {
        Arc::new(Mutex::new(self))
    }

    /// Register `machine.update()` as the tick source's per-frame callback.
    ///
    /// The callback holds a weak reference; a previous registration is
    /// dropped first. `None` once the machine is destroyed.
    pub fn connect(machine: &SharedMachine, source: Arc<dyn TickSource>) -> Option<TickHandle> {
        let mut guard = machine.lock();
        if guard.destroyed {
            log::warn!("[Machine] connect ignored: machine destroyed");
            return None;
        }
        guard.disconnect();

        let weak: Weak<Mutex<SlotMachine>> = Arc::downgrade(machine);
        let handle = source.subscribe(Arc::new(move || {
            if let Some(machine) = weak.upgrade() {
                machine.lock().update();
            }
        }));
        guard.subscription = Some(Subscription { source, handle });
        Some(handle)
    }

    /// Drop the tick registration, if any
    pub fn disconnect(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.source.unsubscribe(subscription.handle);
            log::debug!("[Machine] Disconnected from tick source");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.subscription.is_some()
    }

    /// Spin with a freshly drawn outcome.
    ///
    /// Returns false, changing nothing, unless the machine is idle.
    pub fn start_spin(&mut self) -> bool {
        if self.state != MachineState::Idle || self.destroyed {
            log::debug!("[Machine] start_spin ignored in state {:?}", self.state);
            return false;
        }

        let target = Grid::random(self.config.rows, self.config.reels, self.deps.symbols.as_ref());
        match self.start_spin_with(target) {
            Ok(accepted) => accepted,
            Err(err) => {
                log::error!("[Machine] Drawn outcome rejected: {}", err);
                false
            }
        }
    }

    /// Spin towards a pre-committed outcome grid (rows × reels).
    ///
    /// `Ok(false)` when not idle. A grid of the wrong shape, or holding a type
    /// outside the catalog, is rejected before any reel is touched.
    pub fn start_spin_with(&mut self, target: Grid) -> ReelResult<bool> {
        if self.state != MachineState::Idle || self.destroyed {
            log::debug!("[Machine] start_spin ignored in state {:?}", self.state);
            return Ok(false);
        }

        let shape_ok = target.row_count() == self.config.rows
            && target.rows().all(|row| row.len() == self.config.reels);
        if !shape_ok {
            return Err(ReelError::GridShape {
                expected_rows: self.config.rows,
                expected_reels: self.config.reels,
                rows: target.row_count(),
                reels: target.reel_count(),
            });
        }

        if let Some(symbol_type) = target
            .rows()
            .flatten()
            .copied()
            .find(|symbol_type| !self.config.catalog.contains(*symbol_type))
        {
            return Err(ReelError::UnknownSymbol {
                symbol_type,
                catalog_len: self.config.catalog.len(),
            });
        }

        for (index, reel) in self.reels.iter_mut().enumerate() {
            reel.stage_outcome(&target.column(index))?;
        }

        let now = self.clock.now();
        self.spin_count += 1;
        self.stats.total_spins += 1;
        self.state = MachineState::Spinning;
        self.phase = SpinPhase::Settling {
            until: now + self.config.timing.settle(),
        };

        log::info!("[Machine] Spin {} requested", self.spin_count);
        self.events.push(MachineEvent::SpinRequested {
            spin_id: self.spin_count,
            target,
            at: now,
        });
        Ok(true)
    }

    /// Per-frame entry point: fire due protocol steps, then tick every reel
    pub fn update(&mut self) {
        if self.destroyed {
            return;
        }
        self.advance_protocol();
        for reel in &mut self.reels {
            reel.tick();
        }
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.state, MachineState::Spinning | MachineState::Stopping)
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    /// Grid currently in the reels' visible windows
    pub fn visible_grid(&self) -> Grid {
        let columns: Vec<_> = self.reels.iter().map(Reel::visible_types).collect();
        Grid::from_columns(&columns)
    }

    /// Events since the last drain
    pub fn drain_events(&mut self) -> Vec<MachineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn last_outcome(&self) -> Option<&SpinOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Accepted spins so far
    pub fn spin_count(&self) -> u64 {
        self.spin_count
    }

    pub fn reels(&self) -> &[Reel] {
        &self.reels
    }

    pub fn reel(&self, index: usize) -> Option<&Reel> {
        self.reels.get(index)
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Tear down: drop the tick registration and every reel.
    ///
    /// A spin in flight is abandoned: no evaluation, no rollback.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.disconnect();

        if self.is_spinning() {
            let now = self.clock.now();
            log::warn!("[Machine] Spin {} abandoned by teardown", self.spin_count);
            self.stats.abandoned_spins += 1;
            self.events.push(MachineEvent::SpinAbandoned {
                spin_id: self.spin_count,
                at: now,
            });
        }

        for reel in &mut self.reels {
            reel.destroy();
        }
        self.reels.clear();
        self.phase = SpinPhase::Idle;
        self.state = MachineState::Idle;
        self.destroyed = true;
        log::debug!("[Machine] Destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SPIN PROTOCOL
    // ═══════════════════════════════════════════════════════════════════════

    fn advance_protocol(&mut self) {
        loop {
            let now = self.clock.now();
            match self.phase.deadline() {
                Some(deadline) if now >= deadline => self.fire_phase(now),
                _ => return,
            }
        }
    }

    fn fire_phase(&mut self, now: Duration) {
        match self.phase {
            SpinPhase::Idle => {}
            SpinPhase::Settling { .. } => {
                for reel in &mut self.reels {
                    reel.start_spin();
                }
                self.events.push(MachineEvent::ReelsStarted {
                    spin_id: self.spin_count,
                    at: now,
                });
                self.phase = SpinPhase::Holding {
                    until: now + self.config.timing.hold(),
                };
            }
            SpinPhase::Holding { .. } => {
                self.state = MachineState::Stopping;
                self.stop_reel(0, now);
            }
            SpinPhase::Cascading { next_reel, .. } => {
                self.stop_reel(next_reel, now);
            }
        }
    }

    fn stop_reel(&mut self, index: usize, now: Duration) {
        if let Some(reel) = self.reels.get_mut(index) {
            reel.request_stop();
            self.events.push(MachineEvent::ReelStopped {
                spin_id: self.spin_count,
                reel: index,
                at: now,
            });
        }

        if index + 1 < self.reels.len() {
            self.phase = SpinPhase::Cascading {
                next_reel: index + 1,
                until: now + self.config.timing.stop_interval(),
            };
        } else {
            self.finish_spin(now);
        }
    }

    fn finish_spin(&mut self, now: Duration) {
        self.phase = SpinPhase::Idle;
        self.state = MachineState::Idle;

        let grid = self.visible_grid();
        let wins = self.evaluator.evaluate(&grid);
        for win in &wins {
            log::info!(
                "[Machine] Win on row {}: {} x {}",
                win.row + 1,
                win.run_length,
                self.config.catalog.name(win.symbol_type).unwrap_or("?")
            );
        }
        log::info!(
            "[Machine] Spin {} complete, {} win line(s)",
            self.spin_count,
            wins.len()
        );

        let outcome = SpinOutcome {
            spin_id: self.spin_count,
            grid,
            wins,
        };
        self.stats.record(&outcome);
        self.last_outcome = Some(outcome.clone());
        self.events.push(MachineEvent::SpinCompleted { outcome, at: now });
    }
}

impl Drop for SlotMachine {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for SlotMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotMachine")
            .field("state", &self.state)
            .field("phase", &self.phase)
            .field("reels", &self.reels.len())
            .field("spin_count", &self.spin_count)
            .field("connected", &self.subscription.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::presentation::NullPresentation;
    use crate::resources::CatalogResources;
    use crate::source::SequenceSymbolSource;
    use crate::symbols::{SymbolCatalog, SymbolType};
    use crate::tick::FrameTicker;

    fn machine(clock: Arc<ManualClock>) -> SlotMachine {
        let catalog = SymbolCatalog::ocean();
        let deps = Collaborators::new(
            Arc::new(SequenceSymbolSource::new((0..13).map(SymbolType).collect())),
            Arc::new(CatalogResources::new(catalog)),
            Arc::new(NullPresentation),
        );
        SlotMachine::new(MachineConfig::default(), deps, clock).unwrap()
    }

    fn run_ms(machine: &mut SlotMachine, clock: &ManualClock, ms: u64) {
        for _ in 0..ms / 10 {
            clock.advance_ms(10);
            machine.update();
        }
    }

    #[test]
    fn test_phases_follow_timing() {
        let clock = Arc::new(ManualClock::new());
        let mut machine = machine(clock.clone());

        assert!(machine.start_spin());
        assert_eq!(machine.state(), MachineState::Spinning);
        assert!(machine.reels().iter().all(|r| !r.is_spinning()));

        run_ms(&mut machine, &clock, 100);
        assert!(machine.reels().iter().all(Reel::is_spinning));

        run_ms(&mut machine, &clock, 1000);
        assert_eq!(machine.state(), MachineState::Stopping);
        assert!(!machine.reels()[0].is_spinning());
        assert!(machine.reels()[1].is_spinning());

        run_ms(&mut machine, &clock, 800);
        assert_eq!(machine.state(), MachineState::Idle);
        assert!(!machine.is_spinning());
        assert!(machine.last_outcome().is_some());
    }

    #[test]
    fn test_double_start_rejected() {
        let clock = Arc::new(ManualClock::new());
        let mut machine = machine(clock.clone());
        assert!(machine.start_spin());
        assert!(!machine.start_spin());
        assert_eq!(machine.spin_count(), 1);

        run_ms(&mut machine, &clock, 500);
        assert!(!machine.start_spin());
        assert_eq!(machine.state(), MachineState::Spinning);
    }

    #[test]
    fn test_wrong_grid_shape_rejected() {
        let clock = Arc::new(ManualClock::new());
        let mut machine = machine(clock);
        let grid = Grid::from_rows(vec![vec![SymbolType(0); 5]; 2]);
        assert!(matches!(
            machine.start_spin_with(grid),
            Err(ReelError::GridShape { rows: 2, .. })
        ));
        assert_eq!(machine.state(), MachineState::Idle);
        assert!(machine.reels().iter().all(|r| !r.has_staged()));
    }

    #[test]
    fn test_connect_and_destroy() {
        let clock = Arc::new(ManualClock::new());
        let ticker = Arc::new(FrameTicker::new());
        let shared = machine(clock.clone()).shared();

        SlotMachine::connect(&shared, ticker.clone());
        assert_eq!(ticker.subscriber_count(), 1);

        // reconnecting replaces the registration
        SlotMachine::connect(&shared, ticker.clone());
        assert_eq!(ticker.subscriber_count(), 1);

        shared.lock().start_spin();
        clock.advance_ms(150);
        ticker.tick();
        assert!(shared.lock().reels().iter().all(Reel::is_spinning));

        shared.lock().destroy();
        assert_eq!(ticker.subscriber_count(), 0);
        assert_eq!(shared.lock().stats().abandoned_spins, 1);
    }

    #[test]
    fn test_connect_after_destroy_is_refused() {
        let clock = Arc::new(ManualClock::new());
        let ticker = Arc::new(FrameTicker::new());
        let shared = machine(clock).shared();
        shared.lock().destroy();

        assert!(SlotMachine::connect(&shared, ticker.clone()).is_none());
        assert_eq!(ticker.subscriber_count(), 0);
        assert!(!shared.lock().is_connected());
    }

    #[test]
    fn test_symbol_outside_catalog_rejected() {
        let clock = Arc::new(ManualClock::new());
        let config = MachineConfig::default().with_catalog(SymbolCatalog::with_size(1));
        let deps = Collaborators::new(
            Arc::new(SequenceSymbolSource::constant(SymbolType(12))),
            Arc::new(CatalogResources::new(SymbolCatalog::ocean())),
            Arc::new(NullPresentation),
        );
        let mut machine = SlotMachine::new(config, deps, clock).unwrap();

        let grid = Grid::from_rows(vec![vec![SymbolType(0); 5]; 3]);
        let mut middle = vec![SymbolType(0); 5];
        middle[3] = SymbolType(12);
        let stray = Grid::from_rows(vec![vec![SymbolType(0); 5], middle, vec![SymbolType(0); 5]]);
        assert!(matches!(
            machine.start_spin_with(stray),
            Err(ReelError::UnknownSymbol {
                symbol_type: SymbolType(12),
                catalog_len: 1
            })
        ));
        assert!(machine.reels().iter().all(|r| !r.has_staged()));

        // a source drawing outside the catalog cannot start a spin
        assert!(!machine.start_spin());
        assert_eq!(machine.state(), MachineState::Idle);
        assert_eq!(machine.spin_count(), 0);

        assert!(machine.start_spin_with(grid).unwrap());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let clock = Arc::new(ManualClock::new());
        let ticker = Arc::new(FrameTicker::new());
        let shared = machine(clock).shared();
        SlotMachine::connect(&shared, ticker.clone());
        drop(shared);
        assert_eq!(ticker.subscriber_count(), 0);
        assert_eq!(ticker.tick(), 0);
    }
}
