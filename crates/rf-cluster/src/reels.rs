//! Reel sources — where new symbols come from
//!
//! The engine never generates symbols itself. Every initial fill and every
//! refill goes through a [`ReelSource`], which may be RNG-backed
//! ([`StripReelSource`]), scripted for tests and replays
//! ([`ScriptedReelSource`]), or an external service.

use std::collections::VecDeque;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::ReelSourceError;
use crate::scatter::RoundType;
use crate::symbols::Symbol;

/// Symbol provider for initial fills and refills.
///
/// Within one reel, symbols are requested bottom-up: `depth` is the row the
/// symbol will land on, highest vacated row first.
pub trait ReelSource: Send {
    /// Called once at the start of every spin
    fn begin_spin(&mut self, round_type: RoundType) -> Result<(), ReelSourceError> {
        let _ = round_type;
        Ok(())
    }

    /// Next symbol for `reel`
    fn next_symbol(&mut self, reel: usize, depth: usize) -> Result<Symbol, ReelSourceError>;
}

impl<T: ReelSource + ?Sized> ReelSource for Box<T> {
    fn begin_spin(&mut self, round_type: RoundType) -> Result<(), ReelSourceError> {
        (**self).begin_spin(round_type)
    }

    fn next_symbol(&mut self, reel: usize, depth: usize) -> Result<Symbol, ReelSourceError> {
        (**self).next_symbol(reel, depth)
    }
}

/// Reel strip definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelStrip {
    /// Reel index
    pub reel_index: usize,
    /// Symbols in strip order
    pub symbols: Vec<Symbol>,
}

impl ReelStrip {
    pub fn new(reel_index: usize, symbols: Vec<Symbol>) -> Self {
        Self { reel_index, symbols }
    }

    /// Symbol at `position` (wraps around)
    pub fn symbol_at(&self, position: usize) -> Option<Symbol> {
        if self.symbols.is_empty() {
            return None;
        }
        Some(self.symbols[position % self.symbols.len()])
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn count(&self, symbol: Symbol) -> usize {
        self.symbols.iter().filter(|s| **s == symbol).count()
    }
}

/// RNG-backed source reading from reel strips.
///
/// Each spin picks a random stop per reel. The visible window and every
/// refill are then read contiguously, walking the strip backwards from the
/// stop and wrapping at the start, so refills scroll in from above the
/// window. Free spins read `free` strips when present, `base` otherwise.
#[derive(Debug, Clone)]
pub struct StripReelSource {
    base: Vec<ReelStrip>,
    free: Vec<ReelStrip>,
    round_type: RoundType,
    cursors: Vec<Option<usize>>,
    rng: ChaCha8Rng,
}

impl StripReelSource {
    pub fn new(base: Vec<ReelStrip>, free: Vec<ReelStrip>, seed: u64) -> Self {
        let reels = base.len().max(free.len());
        Self {
            base,
            free,
            round_type: RoundType::Base,
            cursors: vec![None; reels],
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Same strips for base and free spins
    pub fn single_set(strips: Vec<ReelStrip>, seed: u64) -> Self {
        Self::new(strips, Vec::new(), seed)
    }

    fn strips(&self) -> &[ReelStrip] {
        match self.round_type {
            RoundType::Free if !self.free.is_empty() => &self.free,
            _ => &self.base,
        }
    }
}

impl ReelSource for StripReelSource {
    fn begin_spin(&mut self, round_type: RoundType) -> Result<(), ReelSourceError> {
        self.round_type = round_type;
        let lengths: Vec<usize> = self.strips().iter().map(ReelStrip::len).collect();
        let rng = &mut self.rng;
        self.cursors = lengths
            .into_iter()
            .map(|len| (len > 0).then(|| rng.random_range(0..len)))
            .collect();
        Ok(())
    }

    fn next_symbol(&mut self, reel: usize, _depth: usize) -> Result<Symbol, ReelSourceError> {
        let available = self.strips().len();
        let len = self
            .strips()
            .get(reel)
            .map(ReelStrip::len)
            .ok_or(ReelSourceError::UnknownReel { reel, available })?;
        if len == 0 {
            return Err(ReelSourceError::EmptyStrip { reel });
        }

        if self.cursors.len() < available {
            self.cursors.resize(available, None);
        }
        let cursor = match self.cursors[reel] {
            Some(c) => c,
            None => self.rng.random_range(0..len),
        };
        self.cursors[reel] = Some((cursor + len - 1) % len);

        self.strips()[reel]
            .symbol_at(cursor)
            .ok_or(ReelSourceError::EmptyStrip { reel })
    }
}

/// Scripted source for tests and replays.
///
/// Each spin is a list of reels, every reel listed top to bottom as it would
/// appear on a strip above the window. Draws take from the bottom of the
/// list. [`ReelSource::begin_spin`] moves to the next scripted spin; when the
/// script has no further spins the current queues keep draining.
#[derive(Debug, Clone, Default)]
pub struct ScriptedReelSource {
    spins: VecDeque<Vec<Vec<Symbol>>>,
    current: Vec<Vec<Symbol>>,
    draws: usize,
}

impl ScriptedReelSource {
    /// One queue per spin
    pub fn new(spins: Vec<Vec<Vec<Symbol>>>) -> Self {
        Self {
            spins: spins.into(),
            current: Vec::new(),
            draws: 0,
        }
    }

    /// A single set of queues, usable without `begin_spin`
    pub fn single(reels: Vec<Vec<Symbol>>) -> Self {
        Self {
            spins: VecDeque::new(),
            current: reels,
            draws: 0,
        }
    }

    /// Append another scripted spin
    pub fn push_spin(&mut self, reels: Vec<Vec<Symbol>>) {
        self.spins.push_back(reels);
    }

    /// Symbols left for `reel` in the current spin
    pub fn remaining(&self, reel: usize) -> usize {
        self.current.get(reel).map(Vec::len).unwrap_or(0)
    }

    /// Total symbols handed out
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl ReelSource for ScriptedReelSource {
    fn begin_spin(&mut self, _round_type: RoundType) -> Result<(), ReelSourceError> {
        if let Some(next) = self.spins.pop_front() {
            self.current = next;
        }
        Ok(())
    }

    fn next_symbol(&mut self, reel: usize, _depth: usize) -> Result<Symbol, ReelSourceError> {
        let available = self.current.len();
        let queue = self
            .current
            .get_mut(reel)
            .ok_or(ReelSourceError::UnknownReel { reel, available })?;
        let symbol = queue.pop().ok_or(ReelSourceError::Exhausted { reel })?;
        self.draws += 1;
        Ok(symbol)
    }
}

/// Generate one strip per reel with symbol counts proportional to `weights`.
///
/// Counts are rounded per symbol, the remainder goes to the heaviest symbol,
/// and each strip is shuffled independently.
pub fn generate_weighted_strips(
    weights: &[(Symbol, u32)],
    reel_count: usize,
    strip_length: usize,
    rng: &mut impl Rng,
) -> Vec<ReelStrip> {
    let total: u32 = weights.iter().map(|(_, w)| *w).sum();
    if total == 0 || strip_length == 0 {
        return (0..reel_count).map(|i| ReelStrip::new(i, Vec::new())).collect();
    }

    let mut template = Vec::with_capacity(strip_length);
    for (symbol, weight) in weights {
        let count = (*weight as f64 / total as f64 * strip_length as f64).round() as usize;
        template.extend(std::iter::repeat_n(*symbol, count));
    }
    template.truncate(strip_length);
    if let Some((heaviest, _)) = weights.iter().max_by_key(|(_, w)| *w) {
        while template.len() < strip_length {
            template.push(*heaviest);
        }
    }

    (0..reel_count)
        .map(|reel_index| {
            let mut symbols = template.clone();
            symbols.shuffle(rng);
            ReelStrip::new(reel_index, symbols)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Symbol {
        name.parse().unwrap()
    }

    #[test]
    fn test_reel_strip_wrap() {
        let strip = ReelStrip::new(0, vec![sym("H1"), sym("H2"), sym("H3")]);
        assert_eq!(strip.symbol_at(0), Some(sym("H1")));
        assert_eq!(strip.symbol_at(4), Some(sym("H2")));
        assert_eq!(ReelStrip::new(1, vec![]).symbol_at(0), None);
    }

    #[test]
    fn test_strip_source_reads_contiguously() {
        let strip = ReelStrip::new(0, vec![sym("H1"), sym("H2"), sym("H3"), sym("H4")]);
        let mut source = StripReelSource::single_set(vec![strip.clone()], 7);
        source.begin_spin(RoundType::Base).unwrap();

        let drawn: Vec<Symbol> = (0..6)
            .map(|d| source.next_symbol(0, d).unwrap())
            .collect();
        // Each draw is the strip entry just above the previous one.
        for pair in drawn.windows(2) {
            let a = strip.symbols.iter().position(|s| *s == pair[0]).unwrap();
            let b = strip.symbols.iter().position(|s| *s == pair[1]).unwrap();
            assert_eq!(b, (a + 3) % 4);
        }
    }

    #[test]
    fn test_strip_source_switches_sets() {
        let base = vec![ReelStrip::new(0, vec![sym("L1")])];
        let free = vec![ReelStrip::new(0, vec![sym("H1")])];
        let mut source = StripReelSource::new(base, free, 1);

        source.begin_spin(RoundType::Base).unwrap();
        assert_eq!(source.next_symbol(0, 0).unwrap(), sym("L1"));
        source.begin_spin(RoundType::Free).unwrap();
        assert_eq!(source.next_symbol(0, 0).unwrap(), sym("H1"));
    }

    #[test]
    fn test_strip_source_errors() {
        let mut source = StripReelSource::single_set(vec![ReelStrip::new(0, vec![])], 1);
        source.begin_spin(RoundType::Base).unwrap();
        assert_eq!(
            source.next_symbol(0, 0),
            Err(ReelSourceError::EmptyStrip { reel: 0 })
        );
        assert_eq!(
            source.next_symbol(3, 0),
            Err(ReelSourceError::UnknownReel { reel: 3, available: 1 })
        );
    }

    #[test]
    fn test_scripted_source_spins() {
        let mut source = ScriptedReelSource::new(vec![
            vec![vec![sym("H1"), sym("H2")]],
            vec![vec![sym("L1")]],
        ]);
        source.begin_spin(RoundType::Base).unwrap();
        assert_eq!(source.next_symbol(0, 1).unwrap(), sym("H2"));
        assert_eq!(source.remaining(0), 1);

        source.begin_spin(RoundType::Free).unwrap();
        assert_eq!(source.next_symbol(0, 0).unwrap(), sym("L1"));
        assert_eq!(
            source.next_symbol(0, 0),
            Err(ReelSourceError::Exhausted { reel: 0 })
        );
        assert_eq!(source.draws(), 2);
    }

    #[test]
    fn test_weighted_strips() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let weights = [(sym("L1"), 6), (sym("H1"), 3), (sym("S"), 1)];
        let strips = generate_weighted_strips(&weights, 5, 100, &mut rng);

        assert_eq!(strips.len(), 5);
        for (i, strip) in strips.iter().enumerate() {
            assert_eq!(strip.reel_index, i);
            assert_eq!(strip.len(), 100);
            assert_eq!(strip.count(sym("L1")), 60);
            assert_eq!(strip.count(sym("S")), 10);
        }
        assert_ne!(strips[0].symbols, strips[1].symbols);
    }
}
