//! Scatter trigger — free-game entry and re-trigger decisions
//!
//! Only the settled board of a spin is evaluated. Boards seen between
//! cascade steps never reach the trigger.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TumbleError, TumbleResult};
use crate::grid::{Grid, Position};
use crate::symbols::Symbol;

/// Base game or free game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundType {
    #[default]
    Base,
    Free,
}

impl fmt::Display for RoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::Free => write!(f, "free"),
        }
    }
}

/// Scatter decision for one settled board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "spins")]
pub enum Verdict {
    None,
    /// Base game: start a free game with this many spins
    EnterFree(u32),
    /// Free game: add this many spins
    ReTrigger(u32),
}

impl Verdict {
    /// Spins awarded by this verdict
    pub fn spins(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::EnterFree(n) | Self::ReTrigger(n) => *n,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Scatter count → spins awarded
pub trait SpinAwardTable: Send + Sync {
    /// Spins for a triggering count. A count with no entry is a
    /// configuration error, never zero spins.
    fn spins_for(&self, scatter_count: usize, round_type: RoundType) -> TumbleResult<u32>;
}

/// Counts above the largest configured key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardOverflow {
    /// Configuration error
    Reject,
    /// Award the largest key's spins
    #[default]
    UseHighest,
}

/// Separate base and free award maps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSpinAwards {
    pub base: BTreeMap<usize, u32>,
    pub free: BTreeMap<usize, u32>,
    #[serde(default)]
    pub overflow: AwardOverflow,
}

impl FreeSpinAwards {
    pub fn new(base: &[(usize, u32)], free: &[(usize, u32)]) -> Self {
        Self {
            base: base.iter().copied().collect(),
            free: free.iter().copied().collect(),
            overflow: AwardOverflow::default(),
        }
    }

    pub fn with_overflow(mut self, overflow: AwardOverflow) -> Self {
        self.overflow = overflow;
        self
    }

    /// 4-8 scatters in base, 3-8 in free
    pub fn standard() -> Self {
        Self::new(
            &[(4, 10), (5, 12), (6, 15), (7, 18), (8, 20)],
            &[(3, 5), (4, 8), (5, 10), (6, 12), (7, 15), (8, 18)],
        )
    }

    fn table(&self, round_type: RoundType) -> &BTreeMap<usize, u32> {
        match round_type {
            RoundType::Base => &self.base,
            RoundType::Free => &self.free,
        }
    }

    /// Every count from the trigger threshold to the largest key must have
    /// an entry
    pub fn validate(&self, trigger: &ScatterTrigger) -> TumbleResult<()> {
        for round_type in [RoundType::Base, RoundType::Free] {
            let table = self.table(round_type);
            let threshold = trigger.threshold(round_type);
            let Some(&largest) = table.keys().next_back() else {
                return Err(TumbleError::Configuration(format!(
                    "no {round_type} spin awards configured"
                )));
            };
            if let Some(&below) = table.keys().find(|k| **k < threshold) {
                log::warn!(
                    "{round_type} award for {below} scatters is below the threshold of {threshold}"
                );
            }
            if let Some(missing) = (threshold..=largest).find(|n| !table.contains_key(n)) {
                return Err(TumbleError::Configuration(format!(
                    "no {round_type} spin award for {missing} scatters"
                )));
            }
            if let Some((count, _)) = table.iter().find(|(_, spins)| **spins == 0) {
                return Err(TumbleError::Configuration(format!(
                    "{round_type} award for {count} scatters is zero spins"
                )));
            }
        }
        Ok(())
    }
}

impl Default for FreeSpinAwards {
    fn default() -> Self {
        Self::standard()
    }
}

impl SpinAwardTable for FreeSpinAwards {
    fn spins_for(&self, scatter_count: usize, round_type: RoundType) -> TumbleResult<u32> {
        let table = self.table(round_type);
        if let Some(spins) = table.get(&scatter_count) {
            return Ok(*spins);
        }
        match (self.overflow, table.last_key_value()) {
            (AwardOverflow::UseHighest, Some((&largest, &spins))) if scatter_count > largest => {
                Ok(spins)
            }
            _ => Err(TumbleError::Configuration(format!(
                "no {round_type} spin award for {scatter_count} scatters"
            ))),
        }
    }
}

/// Result of evaluating a settled board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScatterEvaluation {
    pub round_type: RoundType,
    pub count: usize,
    pub positions: Vec<Position>,
    pub verdict: Verdict,
    /// One scatter short, and the last reel could still have landed it
    pub near_miss: bool,
}

/// Scatter thresholds per round type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScatterTrigger {
    /// Scatters needed to enter the free game from a base spin
    pub base_threshold: usize,
    /// Scatters needed to re-trigger during the free game
    pub free_threshold: usize,
}

impl ScatterTrigger {
    pub const fn new(base_threshold: usize, free_threshold: usize) -> Self {
        Self {
            base_threshold,
            free_threshold,
        }
    }

    pub fn threshold(&self, round_type: RoundType) -> usize {
        match round_type {
            RoundType::Base => self.base_threshold,
            RoundType::Free => self.free_threshold,
        }
    }

    /// Count scatters on `settled` and decide
    pub fn evaluate(
        &self,
        settled: &Grid,
        round_type: RoundType,
        awards: &dyn SpinAwardTable,
    ) -> TumbleResult<ScatterEvaluation> {
        let positions = settled.positions_of(Symbol::Scatter);
        let count = positions.len();
        let threshold = self.threshold(round_type);

        let verdict = if count >= threshold {
            let spins = awards.spins_for(count, round_type)?;
            if spins == 0 {
                return Err(TumbleError::Configuration(format!(
                    "{round_type} award for {count} scatters is zero spins"
                )));
            }
            match round_type {
                RoundType::Base => Verdict::EnterFree(spins),
                RoundType::Free => Verdict::ReTrigger(spins),
            }
        } else {
            Verdict::None
        };

        let last_reel = settled.spec().reels.saturating_sub(1);
        let near_miss = threshold > 0
            && count == threshold - 1
            && positions.iter().map(|p| p.reel).max().is_some_and(|r| r < last_reel);

        Ok(ScatterEvaluation {
            round_type,
            count,
            positions,
            verdict,
            near_miss,
        })
    }
}

impl Default for ScatterTrigger {
    fn default() -> Self {
        Self::new(4, 3)
    }
}
