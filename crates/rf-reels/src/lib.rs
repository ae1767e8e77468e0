//! # rf-reels: Reel Spin Engine
//!
//! Drives a multi-reel slot machine: simultaneous spin-up, constant-speed
//! scrolling over an endlessly recycled symbol strip, staggered cascading
//! stops onto a pre-committed outcome, and payline evaluation of the settled
//! grid.
//!
//! Drawing, asset loading and input are external. The engine talks to them
//! only through injected collaborators:
//!
//! - [`SymbolSource`]: uniform symbol-type draws (the RNG)
//! - [`ResourceProvider`]: symbol type → display asset (may fail, never fatal)
//! - [`PresentationSink`]: attach/detach/place symbols, motion blur on/off
//! - [`Clock`]: time base for the spin protocol's delays
//! - [`TickSource`]: per-frame callback registration
//!
//! ## Architecture
//!
//! ```text
//! SlotMachine
//!     │
//!     ├── MachineConfig (grid, geometry, SpinTiming, SymbolCatalog)
//!     ├── Reel × N
//!     │     ├── active buffer  (visible, recycled while spinning)
//!     │     └── staged buffer  (next outcome, swapped in at spin start)
//!     └── WinEvaluator
//!           │
//!           v
//!     SpinOutcome + MachineEvent stream
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod machine;
pub mod paytable;
pub mod presentation;
pub mod reel;
pub mod resources;
pub mod source;
pub mod spin;
pub mod symbols;
pub mod tick;
pub mod timing;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use machine::*;
pub use paytable::*;
pub use presentation::*;
pub use reel::*;
pub use resources::*;
pub use source::*;
pub use spin::*;
pub use symbols::*;
pub use tick::*;
pub use timing::*;
