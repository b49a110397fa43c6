//! Parallel batch runner
//!
//! Rounds are split into fixed-size chunks. Every chunk derives its reel seed
//! from the master seed and its own ChaCha stream, plays on its own controller,
//! and the per-chunk stats are merged in chunk order.

use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rf_cluster::{GameDefinition, RoundController};

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::report::SimReport;
use crate::stats::SimStats;

/// Batch simulator for one game definition
pub struct Simulator {
    definition: GameDefinition,
    config: SimConfig,
}

impl Simulator {
    pub fn new(definition: GameDefinition, config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        definition.validate()?;
        Ok(Self { definition, config })
    }

    pub fn definition(&self) -> &GameDefinition {
        &self.definition
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Seed for one chunk
    pub fn chunk_seed(master: u64, chunk: u64) -> u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(master);
        rng.set_stream(chunk);
        rng.random()
    }

    /// Play every round and report
    pub fn run(&self) -> SimResult<SimReport> {
        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        let threads = self.config.effective_threads();
        let chunks = self.config.chunks();

        log::info!(
            "Simulating '{}': {} rounds, {} chunks, {} threads, seed {}",
            self.definition.name,
            self.config.rounds,
            chunks,
            threads,
            seed
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| SimError::ThreadPool(e.to_string()))?;

        let started = Instant::now();
        let results: Vec<SimResult<SimStats>> = pool.install(|| {
            (0..chunks)
                .into_par_iter()
                .map(|chunk| self.run_chunk(seed, chunk))
                .collect()
        });

        let mut stats = SimStats::new();
        for chunk in results {
            stats.merge(&chunk?);
        }
        let elapsed = started.elapsed();

        if stats.reel_failures > self.config.max_reel_failures {
            return Err(SimError::ReelFailures {
                failures: stats.reel_failures,
                limit: self.config.max_reel_failures,
            });
        }

        log::info!(
            "Finished {} rounds in {:.2}s, RTP {:.4}",
            stats.rounds,
            elapsed.as_secs_f64(),
            stats.rtp()
        );

        Ok(SimReport::new(
            &self.definition,
            self.config.clone(),
            seed,
            stats,
            elapsed,
        ))
    }

    fn run_chunk(&self, master: u64, chunk: u64) -> SimResult<SimStats> {
        let start = chunk * self.config.chunk_size;
        let rounds = self.config.chunk_size.min(self.config.rounds - start);
        let source = self.definition.strip_source(Self::chunk_seed(master, chunk));
        let mut controller = RoundController::from_definition(&self.definition, source)?;
        let mut stats = SimStats::new();

        for _ in 0..rounds {
            match controller.play_round() {
                Ok(summary) => stats.record(&summary),
                Err(e) if e.is_reel_failure() => {
                    log::warn!("Chunk {chunk}: round abandoned: {e}");
                    controller.abandon();
                    stats.record_reel_failure();
                }
                Err(e) => return Err(e.into()),
            }
        }

        log::debug!("Chunk {chunk} done: {rounds} rounds");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_definition() -> GameDefinition {
        GameDefinition::standard_7x7()
    }

    #[test]
    fn test_chunk_seeds_differ() {
        let a = Simulator::chunk_seed(1, 0);
        let b = Simulator::chunk_seed(1, 1);
        assert_ne!(a, b);
        assert_eq!(a, Simulator::chunk_seed(1, 0));
    }

    #[test]
    fn test_run_plays_every_round() {
        let config = SimConfig::default()
            .with_rounds(250)
            .with_chunk_size(100)
            .with_seed(3)
            .with_threads(2);
        let sim = Simulator::new(small_definition(), config).unwrap();
        let report = sim.run().unwrap();

        assert_eq!(report.stats.rounds, 250);
        assert_eq!(report.seed, 3);
        assert!(report.stats.rtp() >= 0.0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimConfig::default().with_rounds(0);
        assert!(matches!(
            Simulator::new(small_definition(), config),
            Err(SimError::InvalidConfig(_))
        ));
    }
}
