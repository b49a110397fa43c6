//! Game configuration

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::cascade::{CascadeEngine, ClusterMultiplierPolicy, default_max_steps};
use crate::cluster::DEFAULT_MIN_CLUSTER_SIZE;
use crate::error::{TumbleError, TumbleResult};
use crate::grid::GridSpec;
use crate::overlay::OverlayConfig;
use crate::paytable::ClusterPaytable;
use crate::reels::{ReelStrip, StripReelSource, generate_weighted_strips};
use crate::scatter::{FreeSpinAwards, ScatterTrigger};
use crate::symbols::{Symbol, SymbolSet};

fn default_min_cluster_size() -> usize {
    DEFAULT_MIN_CLUSTER_SIZE
}

/// Rules of the tumble engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub grid: GridSpec,
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,
    #[serde(default)]
    pub scatter: ScatterTrigger,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub cluster_multiplier: ClusterMultiplierPolicy,
    /// Cascade steps per spin (default ⌈cells / min_cluster_size⌉)
    #[serde(default)]
    pub max_cascade_steps: Option<usize>,
    /// Round payout cap in bet multiples
    #[serde(default)]
    pub win_cap: Option<f64>,
}

impl GameConfig {
    /// 7×7, clusters of 5, 4/3 scatters, incrementing multipliers
    pub fn standard_7x7() -> Self {
        Self {
            grid: GridSpec::standard_7x7(),
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            scatter: ScatterTrigger::default(),
            overlay: OverlayConfig::default(),
            cluster_multiplier: ClusterMultiplierPolicy::Max,
            max_cascade_steps: None,
            win_cap: None,
        }
    }

    pub fn with_grid(mut self, grid: GridSpec) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_overlay(mut self, overlay: OverlayConfig) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn with_policy(mut self, policy: ClusterMultiplierPolicy) -> Self {
        self.cluster_multiplier = policy;
        self
    }

    pub fn with_win_cap(mut self, cap: f64) -> Self {
        self.win_cap = Some(cap);
        self
    }

    pub fn with_max_cascade_steps(mut self, steps: usize) -> Self {
        self.max_cascade_steps = Some(steps);
        self
    }

    /// Cascade engine for these rules
    pub fn engine(&self) -> CascadeEngine {
        CascadeEngine::new(self.grid, self.min_cluster_size)
            .with_policy(self.cluster_multiplier)
            .with_max_steps(
                self.max_cascade_steps
                    .unwrap_or_else(|| default_max_steps(self.grid, self.min_cluster_size)),
            )
    }

    pub fn validate(&self) -> TumbleResult<()> {
        self.grid.validate()?;
        if self.min_cluster_size < 2 || self.min_cluster_size > self.grid.total_positions() {
            return Err(TumbleError::InvalidGridShape(format!(
                "clusters of {} cannot form on a {} grid",
                self.min_cluster_size, self.grid
            )));
        }
        let cells = self.grid.total_positions();
        for (name, threshold) in [
            ("base", self.scatter.base_threshold),
            ("free", self.scatter.free_threshold),
        ] {
            if threshold == 0 || threshold > cells {
                return Err(TumbleError::Configuration(format!(
                    "{name} scatter threshold {threshold} outside 1..={cells}"
                )));
            }
        }
        if self.max_cascade_steps == Some(0) {
            return Err(TumbleError::Configuration(
                "max_cascade_steps must be at least 1".into(),
            ));
        }
        if self.overlay.max_value == Some(0) {
            return Err(TumbleError::Configuration(
                "overlay max_value must be at least 1".into(),
            ));
        }
        if let Some(cap) = self.win_cap.filter(|c| !c.is_finite() || *c <= 0.0) {
            return Err(TumbleError::Configuration(format!(
                "win cap {cap} must be positive"
            )));
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::standard_7x7()
    }
}

/// Everything needed to play a game: rules, paytable, awards and strips
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDefinition {
    pub name: String,
    pub config: GameConfig,
    #[serde(default)]
    pub symbols: SymbolSet,
    pub paytable: ClusterPaytable,
    pub awards: FreeSpinAwards,
    pub base_strips: Vec<ReelStrip>,
    /// Free-game strips; base strips are used when empty
    #[serde(default)]
    pub free_strips: Vec<ReelStrip>,
}

/// Strip weights for the base game of the 7×7 preset
const STANDARD_BASE_WEIGHTS: [(Symbol, u32); 10] = [
    (Symbol::High(1), 6),
    (Symbol::High(2), 8),
    (Symbol::High(3), 10),
    (Symbol::High(4), 12),
    (Symbol::Low(1), 15),
    (Symbol::Low(2), 16),
    (Symbol::Low(3), 17),
    (Symbol::Low(4), 18),
    (Symbol::Wild, 2),
    (Symbol::Scatter, 3),
];

/// Free-game strips carry more wilds and premiums
const STANDARD_FREE_WEIGHTS: [(Symbol, u32); 10] = [
    (Symbol::High(1), 8),
    (Symbol::High(2), 10),
    (Symbol::High(3), 12),
    (Symbol::High(4), 13),
    (Symbol::Low(1), 14),
    (Symbol::Low(2), 14),
    (Symbol::Low(3), 15),
    (Symbol::Low(4), 15),
    (Symbol::Wild, 4),
    (Symbol::Scatter, 3),
];

const STANDARD_STRIP_LENGTH: usize = 200;
const STANDARD_STRIP_SEED: u64 = 0x7A11_C1A5;

impl GameDefinition {
    /// 7×7 cluster game with generated strips
    pub fn standard_7x7() -> Self {
        let config = GameConfig::standard_7x7();
        let mut rng = ChaCha8Rng::seed_from_u64(STANDARD_STRIP_SEED);
        let base_strips = generate_weighted_strips(
            &STANDARD_BASE_WEIGHTS,
            config.grid.reels,
            STANDARD_STRIP_LENGTH,
            &mut rng,
        );
        let free_strips = generate_weighted_strips(
            &STANDARD_FREE_WEIGHTS,
            config.grid.reels,
            STANDARD_STRIP_LENGTH,
            &mut rng,
        );

        Self {
            name: "Cluster 7x7".into(),
            config,
            symbols: SymbolSet::standard(),
            paytable: ClusterPaytable::standard(),
            awards: FreeSpinAwards::standard(),
            base_strips,
            free_strips,
        }
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// RNG-backed reel source over this game's strips
    pub fn strip_source(&self, seed: u64) -> StripReelSource {
        StripReelSource::new(self.base_strips.clone(), self.free_strips.clone(), seed)
    }

    pub fn validate(&self) -> TumbleResult<()> {
        self.config.validate()?;
        self.paytable
            .validate(self.config.grid, self.config.min_cluster_size, &self.symbols)?;
        self.awards.validate(&self.config.scatter)?;

        let known: BTreeSet<Symbol> = self.symbols.symbols.iter().copied().collect();
        for (set, strips) in [("base", &self.base_strips), ("free", &self.free_strips)] {
            if strips.is_empty() {
                if set == "base" {
                    return Err(TumbleError::Configuration("no base reel strips".into()));
                }
                continue;
            }
            if strips.len() != self.config.grid.reels {
                return Err(TumbleError::InvalidGridShape(format!(
                    "{} {set} strips for {} reels",
                    strips.len(),
                    self.config.grid.reels
                )));
            }
            for strip in strips {
                if strip.len() < self.config.grid.rows {
                    return Err(TumbleError::InvalidGridShape(format!(
                        "{set} strip {} has {} symbols, fewer than {} rows",
                        strip.reel_index,
                        strip.len(),
                        self.config.grid.rows
                    )));
                }
                if let Some(unknown) = strip.symbols.iter().find(|s| !known.contains(s)) {
                    return Err(TumbleError::Configuration(format!(
                        "{set} strip {} uses unknown symbol {unknown}",
                        strip.reel_index
                    )));
                }
            }
        }
        Ok(())
    }

    // ---- JSON / YAML ----

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> TumbleResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON and validate
    pub fn from_json(json: &str) -> TumbleResult<Self> {
        let definition: Self = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn to_yaml(&self) -> TumbleResult<String> {
        Ok(serde_yml::to_string(self)?)
    }

    /// Deserialize from YAML and validate
    pub fn from_yaml(yaml: &str) -> TumbleResult<Self> {
        let definition: Self = serde_yml::from_str(yaml)?;
        definition.validate()?;
        Ok(definition)
    }
}

impl Default for GameDefinition {
    fn default() -> Self {
        Self::standard_7x7()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_definition_is_valid() {
        let definition = GameDefinition::standard_7x7();
        definition.validate().unwrap();
        assert_eq!(definition.base_strips.len(), 7);
        assert_eq!(definition.config.engine().max_steps, 10);
    }

    #[test]
    fn test_json_roundtrip_validates() {
        let definition = GameDefinition::standard_7x7();
        let json = definition.to_json().unwrap();
        assert!(json.contains("\"H1\""));

        let back = GameDefinition::from_json(&json).unwrap();
        assert_eq!(back, definition);
    }

    #[test]
    fn test_yaml_config_defaults() {
        let yaml = "grid: { reels: 6, rows: 5 }\nwin_cap: 5000.0\n";
        let config: GameConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.min_cluster_size, 5);
        assert_eq!(config.scatter, ScatterTrigger::new(4, 3));
        assert_eq!(config.cluster_multiplier, ClusterMultiplierPolicy::Max);
        assert_eq!(config.win_cap, Some(5000.0));
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let tiny = GameConfig::standard_7x7().with_grid(GridSpec::new(2, 2));
        assert!(matches!(
            tiny.validate(),
            Err(TumbleError::InvalidGridShape(_))
        ));

        let no_cap = GameConfig::standard_7x7().with_win_cap(0.0);
        assert!(matches!(
            no_cap.validate(),
            Err(TumbleError::Configuration(_))
        ));
    }

    #[test]
    fn test_strip_shape_checked() {
        let mut definition = GameDefinition::standard_7x7();
        definition.free_strips.pop();
        assert!(matches!(
            definition.validate(),
            Err(TumbleError::InvalidGridShape(_))
        ));

        let mut definition = GameDefinition::standard_7x7();
        definition.base_strips.clear();
        assert!(matches!(
            definition.validate(),
            Err(TumbleError::Configuration(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = GameDefinition::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TumbleError::Parse(_)));
    }
}
