//! Cascade engine — detect, pay, remove, refill until the board settles

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::cluster::{Cluster, ClusterDetector, DEFAULT_MIN_CLUSTER_SIZE};
use crate::error::TumbleResult;
use crate::grid::{Grid, GridSpec, Position};
use crate::overlay::{MultiplierOverlay, MultiplierUpdate};
use crate::paytable::Paytable;
use crate::reels::ReelSource;
use crate::symbols::Symbol;

// ═══════════════════════════════════════════════════════════════════════════════
// MULTIPLIER POLICY
// ═══════════════════════════════════════════════════════════════════════════════

/// How cell multipliers combine into a cluster's payout multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMultiplierPolicy {
    /// Highest active value among member cells, x1 if none
    #[default]
    Max,
    /// Sum of active member values, at least x1
    Sum,
    /// Pay split evenly across members, each share scaled by its own cell
    /// (inactive cells count as x1)
    PerPosition,
}

impl ClusterMultiplierPolicy {
    /// Effective multiplier for `cluster`, read from the overlay after this
    /// step's update
    pub fn multiplier(&self, cluster: &Cluster, overlay: &MultiplierOverlay) -> f64 {
        let cells = cluster.positions.iter().map(|p| overlay.get(*p));
        match self {
            Self::Max => cells.filter(|c| c.active).map(|c| c.value).max().unwrap_or(1) as f64,
            Self::Sum => {
                let sum: u64 = cells.filter(|c| c.active).map(|c| c.value as u64).sum();
                sum.max(1) as f64
            }
            Self::PerPosition => {
                let sum: u64 = cells.map(|c| c.value as u64).sum();
                sum as f64 / cluster.size().max(1) as f64
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STEP RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// One paid cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterWin {
    pub symbol: Symbol,
    pub size: usize,
    pub positions: BTreeSet<Position>,
    /// Paytable pay before cell multipliers
    pub base_payout: f64,
    /// Cell multiplier applied to `base_payout`
    pub multiplier: f64,
    pub payout: f64,
}

/// One detect → pay → remove → refill iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStep {
    /// 0-based step index within the spin
    pub index: usize,
    pub clusters: Vec<ClusterWin>,
    /// Union of all cluster positions (each cell once)
    pub removed: BTreeSet<Position>,
    /// Overlay cells activated or grown by this step
    pub multiplier_updates: Vec<MultiplierUpdate>,
    /// Step payout after multipliers (clipped when a win cap is hit)
    pub payout: f64,
    /// Board after removal and refill
    pub grid_after: Grid,
}

impl CascadeStep {
    /// Σ paytable pays before multipliers
    pub fn base_payout(&self) -> f64 {
        self.clusters.iter().map(|c| c.base_payout).sum()
    }
}

/// Why a cascade stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No cluster left on the board
    Stabilized,
    /// Step limit reached with clusters still on the board
    StepLimit,
    /// Payout allowance used up
    WinCap,
}

/// Result of resolving one spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeOutcome {
    /// Board as dealt
    pub initial_grid: Grid,
    pub steps: Vec<CascadeStep>,
    /// Board after the last step. Clusters may remain on it unless
    /// `stop_reason` is `Stabilized`.
    pub final_grid: Grid,
    pub total_payout: f64,
    pub stop_reason: StopReason,
}

impl CascadeOutcome {
    pub fn tumbles(&self) -> usize {
        self.steps.len()
    }

    pub fn wincap_hit(&self) -> bool {
        self.stop_reason == StopReason::WinCap
    }

    /// No cluster left on `final_grid`
    pub fn is_settled(&self) -> bool {
        self.stop_reason == StopReason::Stabilized
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Drives the tumble loop for one spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeEngine {
    pub detector: ClusterDetector,
    pub policy: ClusterMultiplierPolicy,
    /// Safety bound on steps per spin
    pub max_steps: usize,
}

impl CascadeEngine {
    /// Engine for `spec` with the default step bound ⌈cells / min_cluster⌉
    pub fn new(spec: GridSpec, min_cluster_size: usize) -> Self {
        Self {
            detector: ClusterDetector::new(min_cluster_size),
            policy: ClusterMultiplierPolicy::default(),
            max_steps: default_max_steps(spec, min_cluster_size),
        }
    }

    pub fn with_policy(mut self, policy: ClusterMultiplierPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Resolve `grid` until it settles.
    ///
    /// `overlay` is updated in place once per step, before the step's
    /// cluster multipliers are read. `payout_cap` is the payout still
    /// allowed this round; reaching it clips the step and stops the cascade.
    ///
    /// A reel source failure aborts with the error. By then `overlay` may
    /// already hold updates from earlier steps, so callers that need the
    /// spin to be all-or-nothing resolve against a copy.
    pub fn resolve(
        &self,
        grid: Grid,
        overlay: &mut MultiplierOverlay,
        paytable: &dyn Paytable,
        source: &mut dyn ReelSource,
        payout_cap: Option<f64>,
    ) -> TumbleResult<CascadeOutcome> {
        let initial_grid = grid.clone();
        let mut grid = grid;
        let mut steps: Vec<CascadeStep> = Vec::new();
        let mut total_payout = 0.0;

        let stop_reason = loop {
            let clusters = self.detector.find_clusters(&grid);
            if clusters.is_empty() {
                break StopReason::Stabilized;
            }
            if steps.len() >= self.max_steps {
                log::warn!(
                    "Cascade stopped after {} steps with {} clusters still on the board",
                    steps.len(),
                    clusters.len()
                );
                break StopReason::StepLimit;
            }

            let removed: BTreeSet<Position> = clusters
                .iter()
                .flat_map(|c| c.positions.iter().copied())
                .collect();
            let multiplier_updates = overlay.apply_win(&removed);

            let wins: Vec<ClusterWin> = clusters
                .into_iter()
                .map(|cluster| {
                    let base_payout = paytable.payout(cluster.symbol, cluster.size());
                    let multiplier = self.policy.multiplier(&cluster, overlay);
                    ClusterWin {
                        symbol: cluster.symbol,
                        size: cluster.size(),
                        base_payout,
                        multiplier,
                        payout: base_payout * multiplier,
                        positions: cluster.positions,
                    }
                })
                .collect();

            let mut payout: f64 = wins.iter().map(|w| w.payout).sum();
            let mut capped = false;
            if let Some(cap) = payout_cap {
                let room = (cap - total_payout).max(0.0);
                if payout >= room {
                    payout = room;
                    capped = true;
                }
            }
            total_payout += payout;

            let grid_after = grid.remove_and_refill(&removed, source)?;
            log::debug!(
                "Cascade step {}: {} clusters, {} cells removed, payout {:.2}",
                steps.len(),
                wins.len(),
                removed.len(),
                payout
            );

            steps.push(CascadeStep {
                index: steps.len(),
                clusters: wins,
                removed,
                multiplier_updates,
                payout,
                grid_after: grid_after.clone(),
            });
            grid = grid_after;

            if capped {
                log::warn!("Win cap reached at cascade step {}", steps.len() - 1);
                break StopReason::WinCap;
            }
        };

        Ok(CascadeOutcome {
            initial_grid,
            steps,
            final_grid: grid,
            total_payout,
            stop_reason,
        })
    }
}

impl Default for CascadeEngine {
    fn default() -> Self {
        Self::new(GridSpec::standard_7x7(), DEFAULT_MIN_CLUSTER_SIZE)
    }
}

/// ⌈cells / min_cluster⌉
pub fn default_max_steps(spec: GridSpec, min_cluster_size: usize) -> usize {
    spec.total_positions().div_ceil(min_cluster_size.max(1))
}
