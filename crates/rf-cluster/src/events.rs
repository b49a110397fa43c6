//! Round event book — ordered presentation events for a finished round
//!
//! Events carry meaning, not animation. A presentation layer replays them
//! in order: reveal the board, show the wins, tumble, repeat, then handle
//! the free game.

use serde::{Deserialize, Serialize};

use crate::cascade::ClusterWin;
use crate::grid::Position;
use crate::overlay::MultiplierUpdate;
use crate::round::RoundSummary;
use crate::scatter::{RoundType, Verdict};
use crate::symbols::Symbol;

/// One presentation event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    // ═══════════════════════════════════════════════════════════════════════
    // SPIN
    // ═══════════════════════════════════════════════════════════════════════
    /// Board as dealt
    Reveal {
        spin: usize,
        round_type: RoundType,
        /// Reels, each top to bottom
        board: Vec<Vec<Symbol>>,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // CASCADE / TUMBLE
    // ═══════════════════════════════════════════════════════════════════════
    /// Clusters paid in a cascade step
    WinInfo {
        step: usize,
        wins: Vec<ClusterWin>,
        payout: f64,
    },

    /// Cell multipliers activated or grown
    UpdateGridMultipliers {
        step: usize,
        updates: Vec<MultiplierUpdate>,
    },

    /// Winning cells removed, board refilled
    Tumble {
        step: usize,
        removed: Vec<Position>,
        board: Vec<Vec<Symbol>>,
    },

    /// Running win of the current spin
    SetTumbleWin { amount: f64 },

    /// Spin payout once the board settled
    SetWin { spin: usize, amount: f64 },

    // ═══════════════════════════════════════════════════════════════════════
    // FREE GAME
    // ═══════════════════════════════════════════════════════════════════════
    FreeSpinTrigger {
        positions: Vec<Position>,
        spins: u32,
    },

    FreeSpinRetrigger {
        positions: Vec<Position>,
        spins: u32,
        /// Free spins awarded so far, this re-trigger included
        total: u32,
    },

    /// Free spin about to be shown (1-based)
    FreeSpinUpdate { current: u32, total: u32 },

    FreeSpinEnd { amount: f64, spins_played: u32 },

    // ═══════════════════════════════════════════════════════════════════════
    // ROUND END
    // ═══════════════════════════════════════════════════════════════════════
    WinCap { amount: f64 },

    FinalWin { amount: f64 },
}

impl RoundSummary {
    /// Ordered event book for the round
    pub fn book(&self) -> Vec<RoundEvent> {
        let mut events = Vec::new();
        let mut awarded = 0u32;
        let mut played = 0u32;

        for spin in &self.spins {
            if spin.round_type == RoundType::Free {
                played += 1;
                events.push(RoundEvent::FreeSpinUpdate {
                    current: played,
                    total: awarded,
                });
            }

            events.push(RoundEvent::Reveal {
                spin: spin.index,
                round_type: spin.round_type,
                board: spin.cascade.initial_grid.reels().to_vec(),
            });

            let mut running = 0.0;
            for step in spin.steps() {
                running += step.payout;
                events.push(RoundEvent::WinInfo {
                    step: step.index,
                    wins: step.clusters.clone(),
                    payout: step.payout,
                });
                events.push(RoundEvent::UpdateGridMultipliers {
                    step: step.index,
                    updates: step.multiplier_updates.clone(),
                });
                events.push(RoundEvent::SetTumbleWin { amount: running });
                events.push(RoundEvent::Tumble {
                    step: step.index,
                    removed: step.removed.iter().copied().collect(),
                    board: step.grid_after.reels().to_vec(),
                });
            }

            if spin.total_payout > 0.0 {
                events.push(RoundEvent::SetWin {
                    spin: spin.index,
                    amount: spin.total_payout,
                });
            }

            match spin.verdict() {
                Verdict::EnterFree(spins) => {
                    awarded += spins;
                    events.push(RoundEvent::FreeSpinTrigger {
                        positions: spin.scatter.positions.clone(),
                        spins,
                    });
                }
                Verdict::ReTrigger(spins) => {
                    awarded += spins;
                    events.push(RoundEvent::FreeSpinRetrigger {
                        positions: spin.scatter.positions.clone(),
                        spins,
                        total: awarded,
                    });
                }
                Verdict::None => {}
            }
        }

        if self.wincap_hit {
            events.push(RoundEvent::WinCap {
                amount: self.total_payout,
            });
        }
        if self.free_spins_played > 0 {
            events.push(RoundEvent::FreeSpinEnd {
                amount: self.free_payout,
                spins_played: self.free_spins_played,
            });
        }
        events.push(RoundEvent::FinalWin {
            amount: self.total_payout,
        });
        events
    }
}
