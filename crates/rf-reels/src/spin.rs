//! Spin outcomes, machine events and session statistics

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::paytable::{Grid, WinLine};

/// Settled result of one spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// 1-based spin number within the machine's session
    pub spin_id: u64,
    /// Grid visible at rest
    pub grid: Grid,
    pub wins: Vec<WinLine>,
}

impl SpinOutcome {
    pub fn is_win(&self) -> bool {
        !self.wins.is_empty()
    }

    pub fn win_count(&self) -> usize {
        self.wins.len()
    }

    /// Longest winning run, 0 if nothing won
    pub fn best_run(&self) -> usize {
        self.wins.iter().map(|w| w.run_length).max().unwrap_or(0)
    }
}

/// Something the machine did, in order. Drained by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MachineEvent {
    /// Outcome committed and staged on every reel
    SpinRequested { spin_id: u64, target: Grid, at: Duration },
    /// All reels received `start_spin` in the same pass
    ReelsStarted { spin_id: u64, at: Duration },
    ReelStopped { spin_id: u64, reel: usize, at: Duration },
    SpinCompleted { outcome: SpinOutcome, at: Duration },
    /// Machine torn down before the last reel stopped
    SpinAbandoned { spin_id: u64, at: Duration },
}

impl MachineEvent {
    pub fn at(&self) -> Duration {
        match self {
            Self::SpinRequested { at, .. }
            | Self::ReelsStarted { at, .. }
            | Self::ReelStopped { at, .. }
            | Self::SpinCompleted { at, .. }
            | Self::SpinAbandoned { at, .. } => *at,
        }
    }
}

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub completed_spins: u64,
    pub abandoned_spins: u64,
    pub winning_spins: u64,
    pub win_lines: u64,
    pub longest_run: usize,
}

impl SessionStats {
    pub fn record(&mut self, outcome: &SpinOutcome) {
        self.completed_spins += 1;
        if outcome.is_win() {
            self.winning_spins += 1;
        }
        self.win_lines += outcome.win_count() as u64;
        self.longest_run = self.longest_run.max(outcome.best_run());
    }

    /// Percentage of completed spins with at least one win line
    pub fn hit_rate(&self) -> f64 {
        if self.completed_spins > 0 {
            (self.winning_spins as f64 / self.completed_spins as f64) * 100.0
        } else {
            0.0
        }
    }
}
