//! Aggregated round statistics

use std::collections::BTreeMap;

use rf_cluster::{RoundSummary, RoundType, StopReason, Symbol};
use serde::{Deserialize, Serialize};

/// Totals over a batch of rounds. Payouts are in bet multiples, one bet per round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimStats {
    pub rounds: u64,
    pub base_spins: u64,
    pub free_spins: u64,
    /// Rounds that entered the free game
    pub free_games: u64,
    pub retriggers: u64,

    pub total_win: f64,
    pub base_win: f64,
    pub free_win: f64,
    pub winning_rounds: u64,
    pub max_round_win: f64,
    pub wincap_hits: u64,

    pub tumbles: u64,
    pub max_tumbles: usize,
    /// Cascades cut short by the step bound
    pub step_limit_hits: u64,

    /// Scatter count on settled base boards
    pub scatter_histogram: BTreeMap<usize, u64>,
    pub near_misses: u64,
    pub cluster_sizes: BTreeMap<usize, u64>,
    pub wins_by_symbol: BTreeMap<Symbol, f64>,
    pub highest_multiplier: u32,

    /// Rounds abandoned after a reel source failure
    pub reel_failures: u64,
}

impl SimStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one finished round into the totals
    pub fn record(&mut self, summary: &RoundSummary) {
        self.rounds += 1;
        self.total_win += summary.total_payout;
        self.base_win += summary.base_payout;
        self.free_win += summary.free_payout;
        self.retriggers += u64::from(summary.retriggers);
        self.max_round_win = self.max_round_win.max(summary.total_payout);
        self.highest_multiplier = self.highest_multiplier.max(summary.highest_multiplier);

        if summary.total_payout > 0.0 {
            self.winning_rounds += 1;
        }
        if summary.triggered_free_game() {
            self.free_games += 1;
        }
        if summary.wincap_hit {
            self.wincap_hits += 1;
        }

        for spin in &summary.spins {
            match spin.round_type {
                RoundType::Base => {
                    self.base_spins += 1;
                    *self.scatter_histogram.entry(spin.scatter.count).or_default() += 1;
                    if spin.scatter.near_miss {
                        self.near_misses += 1;
                    }
                }
                RoundType::Free => self.free_spins += 1,
            }

            let tumbles = spin.cascade.tumbles();
            self.tumbles += tumbles as u64;
            self.max_tumbles = self.max_tumbles.max(tumbles);
            if spin.cascade.stop_reason == StopReason::StepLimit {
                self.step_limit_hits += 1;
            }

            for win in spin.steps().iter().flat_map(|s| &s.clusters) {
                *self.cluster_sizes.entry(win.size).or_default() += 1;
                *self.wins_by_symbol.entry(win.symbol).or_default() += win.payout;
            }
        }
    }

    pub fn record_reel_failure(&mut self) {
        self.reel_failures += 1;
    }

    /// Combine with another batch
    pub fn merge(&mut self, other: &SimStats) {
        self.rounds += other.rounds;
        self.base_spins += other.base_spins;
        self.free_spins += other.free_spins;
        self.free_games += other.free_games;
        self.retriggers += other.retriggers;
        self.total_win += other.total_win;
        self.base_win += other.base_win;
        self.free_win += other.free_win;
        self.winning_rounds += other.winning_rounds;
        self.max_round_win = self.max_round_win.max(other.max_round_win);
        self.wincap_hits += other.wincap_hits;
        self.tumbles += other.tumbles;
        self.max_tumbles = self.max_tumbles.max(other.max_tumbles);
        self.step_limit_hits += other.step_limit_hits;
        self.near_misses += other.near_misses;
        self.highest_multiplier = self.highest_multiplier.max(other.highest_multiplier);
        self.reel_failures += other.reel_failures;

        for (count, n) in &other.scatter_histogram {
            *self.scatter_histogram.entry(*count).or_default() += n;
        }
        for (size, n) in &other.cluster_sizes {
            *self.cluster_sizes.entry(*size).or_default() += n;
        }
        for (symbol, win) in &other.wins_by_symbol {
            *self.wins_by_symbol.entry(*symbol).or_default() += win;
        }
    }

    fn per_round(&self, value: f64) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            value / self.rounds as f64
        }
    }

    /// Return to player
    pub fn rtp(&self) -> f64 {
        self.per_round(self.total_win)
    }

    pub fn base_rtp(&self) -> f64 {
        self.per_round(self.base_win)
    }

    pub fn free_rtp(&self) -> f64 {
        self.per_round(self.free_win)
    }

    /// Fraction of rounds paying anything
    pub fn hit_rate(&self) -> f64 {
        self.per_round(self.winning_rounds as f64)
    }

    /// Fraction of rounds entering the free game
    pub fn trigger_rate(&self) -> f64 {
        self.per_round(self.free_games as f64)
    }

    /// Average free spins per triggered free game
    pub fn avg_free_spins(&self) -> f64 {
        if self.free_games == 0 {
            0.0
        } else {
            self.free_spins as f64 / self.free_games as f64
        }
    }
}
