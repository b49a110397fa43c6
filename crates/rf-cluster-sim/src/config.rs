//! Simulation configuration

use std::fs;
use std::path::Path;

use rf_cluster::GameDefinition;
use serde::{Deserialize, Serialize};

use crate::SimError;

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Rounds to play
    pub rounds: u64,

    /// Master seed (None = random)
    pub seed: Option<u64>,

    /// Worker threads (0 = one per core)
    pub threads: usize,

    /// Rounds per work unit. Each chunk gets its own RNG stream, so results
    /// depend on the seed and chunk size but not on the thread count.
    pub chunk_size: u64,

    /// Reel failures tolerated before the run is aborted
    pub max_reel_failures: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rounds: 100_000,
            seed: None,
            threads: 0,
            chunk_size: 10_000,
            max_reel_failures: 0,
        }
    }
}

impl SimConfig {
    /// Quick sanity run
    pub fn quick() -> Self {
        Self {
            rounds: 10_000,
            chunk_size: 1_000,
            ..Default::default()
        }
    }

    /// Ten million rounds for stable RTP figures
    pub fn exhaustive() -> Self {
        Self {
            rounds: 10_000_000,
            chunk_size: 50_000,
            ..Default::default()
        }
    }

    /// Builder: set rounds
    pub fn with_rounds(mut self, rounds: u64) -> Self {
        self.rounds = rounds;
        self
    }

    /// Builder: set seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder: set worker threads
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Builder: set chunk size
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Builder: tolerate reel failures
    pub fn with_max_reel_failures(mut self, failures: u64) -> Self {
        self.max_reel_failures = failures;
        self
    }

    /// Threads actually used
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    /// Number of work units
    pub fn chunks(&self) -> u64 {
        self.rounds.div_ceil(self.chunk_size.max(1))
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.rounds == 0 {
            return Err(SimError::InvalidConfig("rounds must be at least 1".into()));
        }
        if self.chunk_size == 0 {
            return Err(SimError::InvalidConfig(
                "chunk_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Load a game definition, YAML for `.yaml`/`.yml`, JSON otherwise
pub fn load_definition(path: &Path) -> Result<GameDefinition, SimError> {
    let text = fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let definition = if is_yaml {
        GameDefinition::from_yaml(&text)?
    } else {
        GameDefinition::from_json(&text)?
    };
    log::debug!("Loaded game '{}' from {}", definition.name, path.display());
    Ok(definition)
}
