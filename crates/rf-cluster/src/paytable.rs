//! Cluster paytable — pay by symbol and cluster size band

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{TumbleError, TumbleResult};
use crate::grid::GridSpec;
use crate::symbols::{Symbol, SymbolSet};

/// Payout lookup consumed by the cascade engine.
///
/// Pays are bet multiples before any cell multiplier. Implementations are
/// expected to be non-decreasing in `cluster_size` for a fixed symbol.
pub trait Paytable: Send + Sync {
    fn payout(&self, symbol: Symbol, cluster_size: usize) -> f64;
}

/// Inclusive cluster-size band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBand {
    pub min: usize,
    pub max: usize,
}

impl SizeBand {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, size: usize) -> bool {
        (self.min..=self.max).contains(&size)
    }
}

/// Band-based cluster paytable.
///
/// `pays[symbol][i]` is the pay for a cluster whose size falls in
/// `bands[i]`. Sizes above the last band pay as the last band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterPaytable {
    pub bands: Vec<SizeBand>,
    pub pays: BTreeMap<Symbol, Vec<f64>>,
}

impl ClusterPaytable {
    pub fn new(bands: Vec<SizeBand>) -> Self {
        Self {
            bands,
            pays: BTreeMap::new(),
        }
    }

    /// Set the per-band pays of `symbol`
    pub fn with_symbol(mut self, symbol: Symbol, pays: &[f64]) -> Self {
        self.pays.insert(symbol, pays.to_vec());
        self
    }

    /// 7×7 table: bands 5, 6-8, 9-12, 13+
    pub fn standard() -> Self {
        Self::new(vec![
            SizeBand::new(5, 5),
            SizeBand::new(6, 8),
            SizeBand::new(9, 12),
            SizeBand::new(13, 49),
        ])
        .with_symbol(Symbol::High(1), &[2.0, 4.0, 8.0, 20.0])
        .with_symbol(Symbol::High(2), &[1.0, 2.0, 4.0, 12.0])
        .with_symbol(Symbol::High(3), &[0.6, 1.2, 2.5, 8.0])
        .with_symbol(Symbol::High(4), &[0.4, 0.8, 2.0, 6.0])
        .with_symbol(Symbol::Low(1), &[0.25, 0.5, 1.2, 3.0])
        .with_symbol(Symbol::Low(2), &[0.2, 0.4, 1.0, 2.5])
        .with_symbol(Symbol::Low(3), &[0.1, 0.25, 0.6, 1.5])
        .with_symbol(Symbol::Low(4), &[0.05, 0.15, 0.4, 1.0])
    }

    /// Band index for `size`, clamped to the last band above its max
    fn band_index(&self, size: usize) -> Option<usize> {
        let first = self.bands.first()?;
        if size < first.min {
            return None;
        }
        self.bands
            .iter()
            .position(|band| band.contains(size))
            .or_else(|| {
                let last = self.bands.last()?;
                (size > last.max).then_some(self.bands.len() - 1)
            })
    }

    /// Check bands against the grid and cluster threshold, pays against the
    /// symbol alphabet.
    pub fn validate(
        &self,
        spec: GridSpec,
        min_cluster_size: usize,
        symbols: &SymbolSet,
    ) -> TumbleResult<()> {
        let cells = spec.total_positions();
        if min_cluster_size == 0 || min_cluster_size > cells {
            return Err(TumbleError::InvalidGridShape(format!(
                "minimum cluster size {min_cluster_size} impossible on {spec} grid"
            )));
        }

        let first = self.bands.first().ok_or_else(|| {
            TumbleError::InvalidGridShape("paytable has no size bands".into())
        })?;
        if first.min > min_cluster_size {
            return Err(TumbleError::InvalidGridShape(format!(
                "paytable starts at size {}, clusters pay from {min_cluster_size}",
                first.min
            )));
        }
        for band in &self.bands {
            if band.min > band.max {
                return Err(TumbleError::InvalidGridShape(format!(
                    "size band {}..={} is empty",
                    band.min, band.max
                )));
            }
        }
        for pair in self.bands.windows(2) {
            if pair[1].min != pair[0].max + 1 {
                return Err(TumbleError::InvalidGridShape(format!(
                    "size bands {}..={} and {}..={} are not contiguous",
                    pair[0].min, pair[0].max, pair[1].min, pair[1].max
                )));
            }
        }

        for symbol in symbols.paying() {
            let pays = self.pays.get(&symbol).ok_or_else(|| {
                TumbleError::Configuration(format!("no paytable entry for {symbol}"))
            })?;
            if pays.len() != self.bands.len() {
                return Err(TumbleError::Configuration(format!(
                    "{symbol} has {} pays for {} bands",
                    pays.len(),
                    self.bands.len()
                )));
            }
            if pays.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(TumbleError::Configuration(format!(
                    "{symbol} has a negative or non-finite pay"
                )));
            }
            if pays.windows(2).any(|w| w[1] < w[0]) {
                log::warn!("Paytable for {symbol} decreases with cluster size");
            }
        }

        Ok(())
    }
}

impl Default for ClusterPaytable {
    fn default() -> Self {
        Self::standard()
    }
}

impl Paytable for ClusterPaytable {
    fn payout(&self, symbol: Symbol, cluster_size: usize) -> f64 {
        self.band_index(cluster_size)
            .and_then(|idx| self.pays.get(&symbol)?.get(idx).copied())
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sym(name: &str) -> Symbol {
        name.parse().unwrap()
    }

    #[test]
    fn test_standard_bands() {
        let table = ClusterPaytable::standard();
        assert_relative_eq!(table.payout(sym("H1"), 4), 0.0);
        assert_relative_eq!(table.payout(sym("H1"), 5), 2.0);
        assert_relative_eq!(table.payout(sym("H1"), 8), 4.0);
        assert_relative_eq!(table.payout(sym("L4"), 12), 0.4);
        assert_relative_eq!(table.payout(sym("L2"), 49), 2.5);
    }

    #[test]
    fn test_sizes_above_last_band_use_last_band() {
        let table = ClusterPaytable::new(vec![SizeBand::new(5, 6)])
            .with_symbol(sym("H1"), &[3.0]);
        assert_relative_eq!(table.payout(sym("H1"), 30), 3.0);
    }

    #[test]
    fn test_specials_never_pay() {
        let table = ClusterPaytable::standard();
        assert_relative_eq!(table.payout(Symbol::Wild, 10), 0.0);
        assert_relative_eq!(table.payout(Symbol::Scatter, 10), 0.0);
    }

    #[test]
    fn test_validate_standard() {
        let table = ClusterPaytable::standard();
        assert!(
            table
                .validate(GridSpec::standard_7x7(), 5, &SymbolSet::standard())
                .is_ok()
        );
    }

    #[test]
    fn test_validate_shape_errors() {
        let table = ClusterPaytable::standard();
        let symbols = SymbolSet::standard();

        // 2×2 board cannot hold a 5-cluster
        let err = table.validate(GridSpec::new(2, 2), 5, &symbols).unwrap_err();
        assert!(matches!(err, TumbleError::InvalidGridShape(_)));

        // Clusters of 4 would have no pay band
        let err = table.validate(GridSpec::standard_7x7(), 4, &symbols).unwrap_err();
        assert!(matches!(err, TumbleError::InvalidGridShape(_)));

        let gapped = ClusterPaytable::new(vec![SizeBand::new(5, 6), SizeBand::new(8, 10)]);
        let err = gapped.validate(GridSpec::standard_7x7(), 5, &symbols).unwrap_err();
        assert!(matches!(err, TumbleError::InvalidGridShape(_)));
    }

    #[test]
    fn test_validate_missing_symbol() {
        let mut table = ClusterPaytable::standard();
        table.pays.remove(&sym("L3"));
        let err = table
            .validate(GridSpec::standard_7x7(), 5, &SymbolSet::standard())
            .unwrap_err();
        assert!(matches!(err, TumbleError::Configuration(_)));
    }
}
