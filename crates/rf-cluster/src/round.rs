//! Round controller — base spin, free game, round completion
//!
//! ```text
//!   Idle ──start──► BaseSpin ──EnterFree──► FreeSpin ──spins left──┐
//!                      │                      ▲   │                │
//!                      │ None                 └───┼────────────────┘
//!                      ▼                          │ last spin / win cap
//!                RoundComplete ◄──────────────────┘
//! ```
//!
//! The controller owns the single live [`RoundState`]. Each spin is resolved
//! against a copy of the overlay and committed only once the cascade and the
//! scatter evaluation have both succeeded, so a failing reel source leaves
//! the round exactly as it was before the spin.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cascade::{CascadeEngine, CascadeOutcome, CascadeStep};
use crate::config::{GameConfig, GameDefinition};
use crate::error::{TumbleError, TumbleResult};
use crate::grid::{Grid, Position};
use crate::overlay::{Cell, MultiplierOverlay, OverlaySnapshot};
use crate::paytable::Paytable;
use crate::reels::ReelSource;
use crate::scatter::{RoundType, ScatterEvaluation, ScatterTrigger, SpinAwardTable, Verdict};

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    #[default]
    Idle,
    BaseSpin,
    FreeSpin,
    RoundComplete,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::BaseSpin => "BaseSpin",
            Self::FreeSpin => "FreeSpin",
            Self::RoundComplete => "RoundComplete",
        };
        f.write_str(name)
    }
}

/// Live state of one round (a base spin plus any free game it starts)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub round_type: RoundType,
    pub overlay: MultiplierOverlay,
    /// Scatters on the last settled board
    pub scatter_count: usize,
    pub remaining_free_spins: u32,
    /// Initial award plus re-triggers
    pub free_spins_awarded: u32,
    pub free_spins_played: u32,
    pub retriggers: u32,
    pub base_payout: f64,
    pub free_payout: f64,
    pub wincap_hit: bool,
}

impl RoundState {
    /// Fresh base-round state with a reset overlay
    pub fn new(overlay: MultiplierOverlay) -> Self {
        let mut overlay = overlay;
        overlay.reset();
        Self {
            round_type: RoundType::Base,
            overlay,
            scatter_count: 0,
            remaining_free_spins: 0,
            free_spins_awarded: 0,
            free_spins_played: 0,
            retriggers: 0,
            base_payout: 0.0,
            free_payout: 0.0,
            wincap_hit: false,
        }
    }

    pub fn total_payout(&self) -> f64 {
        self.base_payout + self.free_payout
    }
}

/// One resolved spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    /// 0 for the base spin, then 1.. for free spins
    pub index: usize,
    pub round_type: RoundType,
    pub cascade: CascadeOutcome,
    pub scatter: ScatterEvaluation,
    pub total_payout: f64,
    pub final_overlay: OverlaySnapshot,
    /// Free spins left after this spin
    pub remaining_free_spins: u32,
}

impl SpinResult {
    pub fn steps(&self) -> &[CascadeStep] {
        &self.cascade.steps
    }

    pub fn verdict(&self) -> Verdict {
        self.scatter.verdict
    }

    /// Board after the cascade. Only fully settled when the cascade
    /// stabilized; a step-limit stop can leave unpaid clusters on it.
    pub fn final_grid(&self) -> &Grid {
        &self.cascade.final_grid
    }

    /// Final board with each cell's multiplier, reel-major
    pub fn cells(&self) -> Vec<Vec<Cell>> {
        let grid = self.final_grid();
        let spec = grid.spec();
        (0..spec.reels)
            .map(|reel| {
                (0..spec.rows)
                    .filter_map(|row| self.final_overlay.cell(grid, Position::new(reel, row)))
                    .collect()
            })
            .collect()
    }
}

/// Finalized round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub total_payout: f64,
    pub base_payout: f64,
    pub free_payout: f64,
    pub free_spins_played: u32,
    pub free_spins_awarded: u32,
    pub retriggers: u32,
    pub wincap_hit: bool,
    /// Highest cell multiplier seen at the end of any spin
    pub highest_multiplier: u32,
    pub spins: Vec<SpinResult>,
}

impl RoundSummary {
    pub fn triggered_free_game(&self) -> bool {
        self.free_spins_awarded > 0
    }

    pub fn tumbles(&self) -> usize {
        self.spins.iter().map(|s| s.cascade.tumbles()).sum()
    }
}

/// Drives rounds for one play session
pub struct RoundController<S: ReelSource> {
    config: GameConfig,
    engine: CascadeEngine,
    trigger: ScatterTrigger,
    paytable: Arc<dyn Paytable>,
    awards: Arc<dyn SpinAwardTable>,
    source: S,
    phase: RoundPhase,
    state: Option<RoundState>,
    history: Vec<SpinResult>,
    summary: Option<RoundSummary>,
}

impl<S: ReelSource> RoundController<S> {
    /// Build a controller; the configuration is validated up front
    pub fn new(
        config: GameConfig,
        paytable: Arc<dyn Paytable>,
        awards: Arc<dyn SpinAwardTable>,
        source: S,
    ) -> TumbleResult<Self> {
        config.validate()?;
        Ok(Self {
            engine: config.engine(),
            trigger: config.scatter,
            config,
            paytable,
            awards,
            source,
            phase: RoundPhase::Idle,
            state: None,
            history: Vec::new(),
            summary: None,
        })
    }

    /// Controller for a full game definition
    pub fn from_definition(definition: &GameDefinition, source: S) -> TumbleResult<Self> {
        definition.validate()?;
        Self::new(
            definition.config.clone(),
            Arc::new(definition.paytable.clone()),
            Arc::new(definition.awards.clone()),
            source,
        )
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn state(&self) -> Option<&RoundState> {
        self.state.as_ref()
    }

    /// Spins of the current (or last completed) round
    pub fn history(&self) -> &[SpinResult] {
        &self.history
    }

    /// Summary of the last completed round
    pub fn summary(&self) -> Option<&RoundSummary> {
        self.summary.as_ref()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Start a round: reset the overlay and play the base spin
    pub fn start(&mut self) -> TumbleResult<SpinResult> {
        match self.phase {
            RoundPhase::Idle | RoundPhase::RoundComplete => {}
            phase => {
                return Err(TumbleError::InvalidState(format!(
                    "cannot start a round during {phase}"
                )));
            }
        }

        let state =
            RoundState::new(MultiplierOverlay::new(self.config.grid, self.config.overlay));
        let previous = std::mem::replace(&mut self.phase, RoundPhase::BaseSpin);
        let overlay = state.overlay.clone();
        let (resolved, scatter) = match self.resolve_spin(RoundType::Base, overlay, 0.0) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.phase = previous;
                return Err(e);
            }
        };

        self.history.clear();
        self.summary = None;
        self.state = Some(state);
        self.commit(resolved, scatter)
    }

    /// Play the next free spin
    pub fn next_spin(&mut self) -> TumbleResult<SpinResult> {
        if self.phase != RoundPhase::FreeSpin {
            return Err(TumbleError::InvalidState(format!(
                "no free spin to play during {}",
                self.phase
            )));
        }
        let (round_type, overlay, paid) = self
            .state
            .as_ref()
            .map(|s| (s.round_type, s.overlay.clone(), s.total_payout()))
            .ok_or_else(|| TumbleError::InvalidState("free spin without round state".into()))?;

        let (resolved, scatter) = self.resolve_spin(round_type, overlay, paid)?;
        self.commit(resolved, scatter)
    }

    /// Play a whole round from `Idle` or `RoundComplete`
    pub fn play_round(&mut self) -> TumbleResult<RoundSummary> {
        self.start()?;
        while self.phase == RoundPhase::FreeSpin {
            self.next_spin()?;
        }
        self.summary
            .clone()
            .ok_or_else(|| TumbleError::InvalidState("round ended without a summary".into()))
    }

    /// Drop the round between spins and return to `Idle`
    pub fn abandon(&mut self) {
        if self.state.is_some() {
            log::info!("Round abandoned after {} spins", self.history.len());
        }
        self.state = None;
        self.phase = RoundPhase::Idle;
    }

    /// Resolve one spin without touching the round state.
    ///
    /// `overlay` is a copy of the round's overlay and `paid` the round payout
    /// so far. Returns the cascade with the updated overlay and the scatter
    /// evaluation of the settled board.
    fn resolve_spin(
        &mut self,
        round_type: RoundType,
        mut overlay: MultiplierOverlay,
        paid: f64,
    ) -> TumbleResult<((CascadeOutcome, MultiplierOverlay), ScatterEvaluation)> {
        self.source
            .begin_spin(round_type)
            .map_err(TumbleError::SpinStart)?;

        let grid = Grid::populate_initial(self.config.grid, &mut self.source)?;
        let cap_room = self.config.win_cap.map(|cap| cap - paid);
        let cascade = self.engine.resolve(
            grid,
            &mut overlay,
            &*self.paytable,
            &mut self.source,
            cap_room,
        )?;

        let mut scatter = self
            .trigger
            .evaluate(&cascade.final_grid, round_type, &*self.awards)?;
        if cascade.wincap_hit() && !scatter.verdict.is_none() {
            log::info!("Win cap reached, {:?} dropped", scatter.verdict);
            scatter.verdict = Verdict::None;
        }

        Ok(((cascade, overlay), scatter))
    }

    /// Apply a resolved spin to the round state and advance the phase
    fn commit(
        &mut self,
        (cascade, overlay): (CascadeOutcome, MultiplierOverlay),
        scatter: ScatterEvaluation,
    ) -> TumbleResult<SpinResult> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| TumbleError::InvalidState("spin committed without round state".into()))?;

        let round_type = state.round_type;
        state.overlay = overlay;
        state.scatter_count = scatter.count;
        match round_type {
            RoundType::Base => state.base_payout += cascade.total_payout,
            RoundType::Free => state.free_payout += cascade.total_payout,
        }
        state.wincap_hit |= cascade.wincap_hit();

        match (round_type, scatter.verdict) {
            (RoundType::Base, Verdict::EnterFree(spins)) => {
                log::info!("Free game triggered: {} scatters, {spins} spins", scatter.count);
                state.round_type = RoundType::Free;
                state.remaining_free_spins = spins;
                state.free_spins_awarded = spins;
                self.phase = RoundPhase::FreeSpin;
            }
            (RoundType::Base, _) => {
                self.phase = RoundPhase::RoundComplete;
            }
            (RoundType::Free, verdict) => {
                if let Verdict::ReTrigger(extra) = verdict {
                    log::info!("Free game re-triggered: {} scatters, +{extra} spins", scatter.count);
                    state.remaining_free_spins += extra;
                    state.free_spins_awarded += extra;
                    state.retriggers += 1;
                }
                state.remaining_free_spins = state.remaining_free_spins.saturating_sub(1);
                state.free_spins_played += 1;
                self.phase = if state.remaining_free_spins == 0 {
                    RoundPhase::RoundComplete
                } else {
                    RoundPhase::FreeSpin
                };
            }
        }

        if state.wincap_hit {
            if state.remaining_free_spins > 0 {
                log::warn!(
                    "Win cap reached, {} free spins forfeited",
                    state.remaining_free_spins
                );
            }
            state.remaining_free_spins = 0;
            self.phase = RoundPhase::RoundComplete;
        }

        let spin = SpinResult {
            index: self.history.len(),
            round_type,
            total_payout: cascade.total_payout,
            final_overlay: state.overlay.snapshot(),
            remaining_free_spins: state.remaining_free_spins,
            cascade,
            scatter,
        };
        self.history.push(spin.clone());

        if self.phase == RoundPhase::RoundComplete {
            self.finalize();
        }
        Ok(spin)
    }

    /// Build the summary and discard the round state
    fn finalize(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        let highest_multiplier = self
            .history
            .iter()
            .flat_map(|s| s.final_overlay.active())
            .map(|(_, value)| value)
            .max()
            .unwrap_or(1);

        let summary = RoundSummary {
            total_payout: state.total_payout(),
            base_payout: state.base_payout,
            free_payout: state.free_payout,
            free_spins_played: state.free_spins_played,
            free_spins_awarded: state.free_spins_awarded,
            retriggers: state.retriggers,
            wincap_hit: state.wincap_hit,
            highest_multiplier,
            spins: self.history.clone(),
        };
        log::info!(
            "Round complete: payout {:.2}x, {} free spins, {} tumbles",
            summary.total_payout,
            summary.free_spins_played,
            summary.tumbles()
        );
        self.summary = Some(summary);
    }
}
