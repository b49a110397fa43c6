//! Cluster detection — worklist flood fill per paying symbol

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grid::{Grid, Position};
use crate::symbols::Symbol;

/// Smallest cluster that pays
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 5;

/// A winning group of 4-connected cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// The regular symbol the cluster pays as
    pub symbol: Symbol,
    /// Member positions, wilds included
    pub positions: BTreeSet<Position>,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.positions.len()
    }

    /// Number of wild members
    pub fn wild_count(&self, grid: &Grid) -> usize {
        self.positions
            .iter()
            .filter(|p| grid.get(**p).is_some_and(|s| s.is_wild()))
            .count()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.positions.contains(&pos)
    }
}

/// Finds every maximal cluster of at least `min_size` cells.
///
/// Components are grown separately for each regular symbol on the board,
/// from that symbol's own cells through cells holding the symbol or a wild.
/// A wild can therefore belong to clusters of several symbols in the same
/// pass; wild-only regions never form a cluster and scatters are never
/// visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDetector {
    pub min_size: usize,
}

impl ClusterDetector {
    pub const fn new(min_size: usize) -> Self {
        Self { min_size }
    }

    /// All winning clusters, ordered by symbol then by first position
    pub fn find_clusters(&self, grid: &Grid) -> Vec<Cluster> {
        let spec = grid.spec();
        let symbols: BTreeSet<Symbol> = grid
            .cells()
            .map(|(_, s)| s)
            .filter(Symbol::is_paying)
            .collect();

        let mut clusters = Vec::new();
        for symbol in symbols {
            let mut visited = vec![false; spec.total_positions()];
            let index = |p: Position| p.reel * spec.rows + p.row;

            for (seed, cell) in grid.cells() {
                if cell != symbol || visited[index(seed)] {
                    continue;
                }

                let mut component = BTreeSet::new();
                let mut worklist = vec![seed];
                visited[index(seed)] = true;

                while let Some(pos) = worklist.pop() {
                    component.insert(pos);
                    for next in spec.neighbors(pos) {
                        if visited[index(next)] {
                            continue;
                        }
                        if grid.get(next).is_some_and(|s| s == symbol || s.is_wild()) {
                            visited[index(next)] = true;
                            worklist.push(next);
                        }
                    }
                }

                if component.len() >= self.min_size {
                    clusters.push(Cluster {
                        symbol,
                        positions: component,
                    });
                }
            }
        }

        clusters.sort_by(|a, b| {
            (a.symbol, a.positions.first()).cmp(&(b.symbol, b.positions.first()))
        });
        clusters
    }
}

impl Default for ClusterDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CLUSTER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Vec<Cluster> {
        ClusterDetector::default().find_clusters(&Grid::parse(text).unwrap())
    }

    #[test]
    fn test_four_never_wins_five_does() {
        let four = detect(
            "H1 H1 L2 L3
             H1 H1 L4 L1
             L2 L3 L1 L4",
        );
        assert!(four.is_empty());

        let five = detect(
            "H1 H1 L2 L3
             H1 H1 H1 L1
             L2 L3 L1 L4",
        );
        assert_eq!(five.len(), 1);
        assert_eq!(five[0].symbol, Symbol::High(1));
        assert_eq!(five[0].size(), 5);
    }

    #[test]
    fn test_diagonal_does_not_connect() {
        let clusters = detect(
            "H1 L1 H1 L1 H1
             L1 H1 L2 H1 L2
             H1 L2 H1 L3 H1",
        );
        assert!(clusters.iter().all(|c| c.symbol != Symbol::High(1)));
    }

    #[test]
    fn test_wild_bridges_into_cluster() {
        let clusters = detect(
            "H2 H2 W  H2 H2
             L1 L2 L3 L4 L1",
        );
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].size(), 5);
        assert!(clusters[0].contains(Position::new(2, 0)));
    }

    #[test]
    fn test_wild_shared_between_symbols() {
        let grid = Grid::parse(
            "H1 H1 W  L1 L1
             H1 H1 L2 L1 L1",
        )
        .unwrap();
        let clusters = ClusterDetector::default().find_clusters(&grid);

        assert_eq!(clusters.len(), 2);
        let wild = Position::new(2, 0);
        assert!(clusters.iter().all(|c| c.contains(wild)));
        assert!(clusters.iter().all(|c| c.wild_count(&grid) == 1));
    }

    #[test]
    fn test_scatter_and_wild_only_regions_ignored() {
        let clusters = detect(
            "S  S  S  W  W
             S  S  S  W  W
             L1 L2 L3 H1 H1",
        );
        // The H1 pair under the wild block joins it; nothing else pays.
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].symbol, Symbol::High(1));
        assert_eq!(clusters[0].size(), 6);
    }

    #[test]
    fn test_wild_block_alone_never_pays() {
        // Five wilds fenced in by scatters
        let clusters = detect(
            "W  W  W  S  H2
             W  W  S  H3 L4
             S  S  L3 H1 L1",
        );
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_detection_is_order_independent() {
        let grid = Grid::parse(
            "H1 H1 H1 L2 L2
             H1 W  L2 L2 L2
             H1 L3 L3 L3 L4",
        )
        .unwrap();
        let first = ClusterDetector::default().find_clusters(&grid);
        let second = ClusterDetector::default().find_clusters(&grid.clone());
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
