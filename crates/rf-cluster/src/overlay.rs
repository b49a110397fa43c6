//! Multiplier overlay — persistent per-cell multipliers
//!
//! A cell's multiplier activates at x1 the first time it is part of a
//! winning cluster and grows on every later cascade step it wins in. The
//! overlay outlives single spins: the round controller resets it at the
//! start of a base round and carries it through a free-game session.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grid::{Grid, GridSpec, Position};
use crate::symbols::Symbol;

/// Multiplier state of one cell. Inactive cells always hold 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMultiplier {
    pub active: bool,
    pub value: u32,
}

impl CellMultiplier {
    pub const INACTIVE: Self = Self {
        active: false,
        value: 1,
    };

    pub const fn active(value: u32) -> Self {
        Self {
            active: true,
            value,
        }
    }
}

impl Default for CellMultiplier {
    fn default() -> Self {
        Self::INACTIVE
    }
}

/// How an active cell's value grows on a repeat win
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierProgression {
    /// x1, x2, x3, ...
    #[default]
    Increment,
    /// x1, x2, x4, ...
    Double,
}

/// Overlay growth rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayConfig {
    #[serde(default)]
    pub progression: MultiplierProgression,
    /// Upper bound for any cell value
    #[serde(default)]
    pub max_value: Option<u32>,
}

impl OverlayConfig {
    pub fn with_progression(mut self, progression: MultiplierProgression) -> Self {
        self.progression = progression;
        self
    }

    pub fn with_max_value(mut self, max_value: u32) -> Self {
        self.max_value = Some(max_value);
        self
    }

    /// Doubling multipliers capped at x64
    pub fn doubling() -> Self {
        Self::default()
            .with_progression(MultiplierProgression::Double)
            .with_max_value(64)
    }

    fn next_value(&self, value: u32) -> u32 {
        let next = match self.progression {
            MultiplierProgression::Increment => value.saturating_add(1),
            MultiplierProgression::Double => value.saturating_mul(2),
        };
        self.max_value.map_or(next, |cap| next.min(cap.max(1)))
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            progression: MultiplierProgression::Increment,
            max_value: None,
        }
    }
}

/// Cell update made by one [`MultiplierOverlay::apply_win`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierUpdate {
    pub position: Position,
    pub before: CellMultiplier,
    pub after: CellMultiplier,
}

/// Grid-shaped multiplier state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierOverlay {
    spec: GridSpec,
    config: OverlayConfig,
    cells: Vec<CellMultiplier>,
}

impl MultiplierOverlay {
    pub fn new(spec: GridSpec, config: OverlayConfig) -> Self {
        Self {
            spec,
            config,
            cells: vec![CellMultiplier::INACTIVE; spec.total_positions()],
        }
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.spec
            .contains(pos)
            .then_some(pos.reel * self.spec.rows + pos.row)
    }

    /// Every cell back to inactive x1
    pub fn reset(&mut self) {
        self.cells.fill(CellMultiplier::INACTIVE);
    }

    /// Activate or grow each position once.
    ///
    /// `positions` is a set, so a cell shared by several clusters of the same
    /// cascade step moves exactly one notch.
    pub fn apply_win(&mut self, positions: &BTreeSet<Position>) -> Vec<MultiplierUpdate> {
        let mut updates = Vec::with_capacity(positions.len());
        for &position in positions {
            let Some(idx) = self.index(position) else {
                log::warn!("Ignoring overlay win outside {} grid at {position}", self.spec);
                continue;
            };
            let before = self.cells[idx];
            let after = if before.active {
                CellMultiplier::active(self.config.next_value(before.value))
            } else {
                CellMultiplier::active(1)
            };
            self.cells[idx] = after;
            updates.push(MultiplierUpdate {
                position,
                before,
                after,
            });
        }
        log::debug!(
            "Overlay: {} cells updated, highest x{}",
            updates.len(),
            self.highest()
        );
        updates
    }

    pub fn get(&self, pos: Position) -> CellMultiplier {
        self.index(pos)
            .map(|idx| self.cells[idx])
            .unwrap_or(CellMultiplier::INACTIVE)
    }

    pub fn spec(&self) -> GridSpec {
        self.spec
    }

    pub fn config(&self) -> OverlayConfig {
        self.config
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|c| c.active).count()
    }

    /// Highest value on the board (1 when nothing is active)
    pub fn highest(&self) -> u32 {
        self.cells
            .iter()
            .filter(|c| c.active)
            .map(|c| c.value)
            .max()
            .unwrap_or(1)
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        OverlaySnapshot {
            spec: self.spec,
            reels: self
                .cells
                .chunks(self.spec.rows.max(1))
                .map(<[CellMultiplier]>::to_vec)
                .collect(),
        }
    }
}

/// Read-only copy of the overlay, reel-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySnapshot {
    pub spec: GridSpec,
    pub reels: Vec<Vec<CellMultiplier>>,
}

impl OverlaySnapshot {
    pub fn get(&self, pos: Position) -> CellMultiplier {
        self.reels
            .get(pos.reel)
            .and_then(|r| r.get(pos.row))
            .copied()
            .unwrap_or(CellMultiplier::INACTIVE)
    }

    /// Symbol and multiplier of a cell
    pub fn cell(&self, grid: &Grid, pos: Position) -> Option<Cell> {
        Some(Cell {
            symbol: grid.get(pos)?,
            multiplier: self.get(pos),
        })
    }

    /// Active cells with their values
    pub fn active(&self) -> Vec<(Position, u32)> {
        self.spec
            .positions()
            .filter_map(|p| {
                let cell = self.get(p);
                cell.active.then_some((p, cell.value))
            })
            .collect()
    }
}

/// Presentation view of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub symbol: Symbol,
    pub multiplier: CellMultiplier,
}
