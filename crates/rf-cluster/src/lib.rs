//! # rf-cluster — Cluster-Pay Tumble Engine
//!
//! Outcome resolution for cluster-pay games on a fixed reels × rows board:
//! clusters of 5+ matching symbols pay, vanish, and the board tumbles until
//! nothing matches. Winning cells keep a multiplier that grows on every
//! repeat win, and scatters on the settled board start or extend a free game.
//!
//! ## Features
//!
//! - **Cluster Detection**: Worklist flood fill, wilds substitute, scatters never cluster
//! - **Cascades**: Detect → pay → remove → refill loop with step bound and win cap
//! - **Multiplier Overlay**: Per-cell x1 activation, increment or doubling, optional cap
//! - **Scatter Trigger**: Base entry (4+) and free re-trigger (3+) on settled boards only
//! - **Round Controller**: Idle → BaseSpin → FreeSpin → RoundComplete state machine
//! - **Event Book**: Ordered presentation events per round
//!
//! ## Architecture
//!
//! ```text
//! RoundController ── owns RoundState (overlay, free spins, payouts)
//!     │
//!     ├── ReelSource ──────────► Grid::populate_initial
//!     │
//!     ├── CascadeEngine
//!     │     ├── ClusterDetector ─► Vec<Cluster>
//!     │     ├── MultiplierOverlay::apply_win
//!     │     ├── Paytable::payout × ClusterMultiplierPolicy
//!     │     └── Grid::remove_and_refill ◄── ReelSource
//!     │
//!     └── ScatterTrigger (settled board) ─► Verdict
//!           │
//!           v
//!     SpinResult → RoundSummary → Vec<RoundEvent>
//! ```

pub mod cascade;
pub mod cluster;
pub mod config;
pub mod error;
pub mod events;
pub mod grid;
pub mod overlay;
pub mod paytable;
pub mod reels;
pub mod round;
pub mod scatter;
pub mod symbols;

pub use cascade::*;
pub use cluster::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use grid::*;
pub use overlay::*;
pub use paytable::*;
pub use reels::*;
pub use round::*;
pub use scatter::*;
pub use symbols::*;
