//! Symbol grid — reels × rows, column-local gravity

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TumbleError, TumbleResult};
use crate::reels::ReelSource;
use crate::symbols::Symbol;

/// Largest supported reel or row count
pub const MAX_DIMENSION: usize = 16;

/// A cell position. Row 0 is the top of the reel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub reel: usize,
    pub row: usize,
}

impl Position {
    pub const fn new(reel: usize, row: usize) -> Self {
        Self { reel, row }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.reel, self.row)
    }
}

/// Grid specification (reels × rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of reels (columns)
    pub reels: usize,
    /// Number of rows per reel
    pub rows: usize,
}

impl GridSpec {
    pub const fn new(reels: usize, rows: usize) -> Self {
        Self { reels, rows }
    }

    /// 7×7 cluster board
    pub const fn standard_7x7() -> Self {
        Self::new(7, 7)
    }

    /// Total grid positions
    pub fn total_positions(&self) -> usize {
        self.reels * self.rows
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.reel < self.reels && pos.row < self.rows
    }

    /// All positions, reel by reel, top to bottom
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        let rows = self.rows;
        (0..self.reels).flat_map(move |reel| (0..rows).map(move |row| Position::new(reel, row)))
    }

    /// 4-directional neighbours of `pos` that lie on the grid
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + use<> {
        let spec = *self;
        let Position { reel, row } = pos;
        [
            (reel.checked_sub(1), Some(row)),
            (Some(reel + 1), Some(row)),
            (Some(reel), row.checked_sub(1)),
            (Some(reel), Some(row + 1)),
        ]
        .into_iter()
        .filter_map(|(r, w)| Some(Position::new(r?, w?)))
        .filter(move |p| spec.contains(*p))
    }

    /// Reject empty or oversized grids
    pub fn validate(&self) -> TumbleResult<()> {
        if self.reels == 0 || self.rows == 0 {
            return Err(TumbleError::InvalidGridShape(format!("{self} has no cells")));
        }
        if self.reels > MAX_DIMENSION || self.rows > MAX_DIMENSION {
            return Err(TumbleError::InvalidGridShape(format!(
                "{self} exceeds {MAX_DIMENSION}×{MAX_DIMENSION}"
            )));
        }
        Ok(())
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::standard_7x7()
    }
}

impl fmt::Display for GridSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.reels, self.rows)
    }
}

/// Symbol grid, stored reel-major (`reels[reel][row]`).
///
/// Every cell always holds a symbol. [`Grid::remove_and_refill`] builds the
/// next grid completely before returning it, so a failed refill leaves the
/// caller's grid untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    spec: GridSpec,
    reels: Vec<Vec<Symbol>>,
}

impl Grid {
    /// Build from reels (each reel top to bottom)
    pub fn from_reels(reels: Vec<Vec<Symbol>>) -> TumbleResult<Self> {
        let rows = reels.first().map(Vec::len).unwrap_or(0);
        if let Some((idx, reel)) = reels.iter().enumerate().find(|(_, r)| r.len() != rows) {
            return Err(TumbleError::InvalidGridShape(format!(
                "reel {idx} has {} rows, expected {rows}",
                reel.len()
            )));
        }
        let spec = GridSpec::new(reels.len(), rows);
        spec.validate()?;
        Ok(Self { spec, reels })
    }

    /// Build from rows (each row left to right)
    pub fn from_rows(rows: Vec<Vec<Symbol>>) -> TumbleResult<Self> {
        let reel_count = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != reel_count) {
            return Err(TumbleError::InvalidGridShape(format!(
                "row {idx} has {} symbols, expected {reel_count}",
                row.len()
            )));
        }
        let reels = (0..reel_count)
            .map(|reel| rows.iter().map(|row| row[reel]).collect())
            .collect();
        Self::from_reels(reels)
    }

    /// Parse a whitespace separated board, one row per line
    ///
    /// ```text
    /// H1 L2 S
    /// W  H1 L2
    /// ```
    pub fn parse(text: &str) -> TumbleResult<Self> {
        let rows = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.split_whitespace().map(str::parse).collect())
            .collect::<TumbleResult<Vec<Vec<Symbol>>>>()?;
        Self::from_rows(rows)
    }

    /// Fill a fresh grid from the reel source.
    ///
    /// Each reel is drawn bottom-up (`depth` = target row), the same order
    /// refills use, so a strip-backed source reads its strip contiguously.
    pub fn populate_initial(spec: GridSpec, source: &mut dyn ReelSource) -> TumbleResult<Self> {
        spec.validate()?;
        let mut reels = Vec::with_capacity(spec.reels);
        for reel in 0..spec.reels {
            let mut column = vec![Symbol::Scatter; spec.rows];
            for depth in (0..spec.rows).rev() {
                column[depth] = source
                    .next_symbol(reel, depth)
                    .map_err(|e| TumbleError::reel_source(reel, e))?;
            }
            reels.push(column);
        }
        Ok(Self { spec, reels })
    }

    /// Remove `positions`, let the survivors fall, refill the vacated top cells.
    ///
    /// Within a reel the survivors keep their relative order and settle at the
    /// bottom; new symbols are drawn for the vacated rows from the lowest one
    /// upwards. Reels without removals are copied unchanged.
    pub fn remove_and_refill(
        &self,
        positions: &BTreeSet<Position>,
        source: &mut dyn ReelSource,
    ) -> TumbleResult<Self> {
        if let Some(outside) = positions.iter().find(|p| !self.spec.contains(**p)) {
            return Err(TumbleError::InvalidGridShape(format!(
                "position {outside} outside {}",
                self.spec
            )));
        }

        let mut reels = Vec::with_capacity(self.spec.reels);
        for (reel, column) in self.reels.iter().enumerate() {
            let survivors: Vec<Symbol> = column
                .iter()
                .enumerate()
                .filter(|(row, _)| !positions.contains(&Position::new(reel, *row)))
                .map(|(_, symbol)| *symbol)
                .collect();

            let vacated = self.spec.rows - survivors.len();
            if vacated == 0 {
                reels.push(column.clone());
                continue;
            }

            let mut fresh = vec![Symbol::Scatter; vacated];
            for depth in (0..vacated).rev() {
                fresh[depth] = source
                    .next_symbol(reel, depth)
                    .map_err(|e| TumbleError::reel_source(reel, e))?;
            }
            fresh.extend(survivors);
            reels.push(fresh);
        }

        Ok(Self {
            spec: self.spec,
            reels,
        })
    }

    pub fn spec(&self) -> GridSpec {
        self.spec
    }

    pub fn get(&self, pos: Position) -> Option<Symbol> {
        self.reels.get(pos.reel).and_then(|r| r.get(pos.row)).copied()
    }

    /// Reels, each top to bottom
    pub fn reels(&self) -> &[Vec<Symbol>] {
        &self.reels
    }

    /// Rows, each left to right
    pub fn to_rows(&self) -> Vec<Vec<Symbol>> {
        (0..self.spec.rows)
            .map(|row| self.reels.iter().map(|reel| reel[row]).collect())
            .collect()
    }

    /// All (position, symbol) pairs, reel by reel
    pub fn cells(&self) -> impl Iterator<Item = (Position, Symbol)> + '_ {
        self.reels.iter().enumerate().flat_map(|(reel, column)| {
            column
                .iter()
                .enumerate()
                .map(move |(row, symbol)| (Position::new(reel, row), *symbol))
        })
    }

    /// Positions holding `symbol`
    pub fn positions_of(&self, symbol: Symbol) -> Vec<Position> {
        self.cells()
            .filter(|(_, s)| *s == symbol)
            .map(|(p, _)| p)
            .collect()
    }

    pub fn count(&self, symbol: Symbol) -> usize {
        self.cells().filter(|(_, s)| *s == symbol).count()
    }

    /// Number of occupied cells (always `reels × rows`)
    pub fn occupied(&self) -> usize {
        self.reels.iter().map(Vec::len).sum()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.to_rows() {
            let line: Vec<String> = row.iter().map(|s| format!("{:<2}", s.to_string())).collect();
            writeln!(f, "{}", line.join(" ").trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReelSourceError;
    use crate::reels::ScriptedReelSource;

    fn sym(name: &str) -> Symbol {
        name.parse().unwrap()
    }

    #[test]
    fn test_parse_rows_and_reels() {
        let grid = Grid::parse(
            "H1 L1 S
             W  H2 L1",
        )
        .unwrap();

        assert_eq!(grid.spec(), GridSpec::new(3, 2));
        assert_eq!(grid.get(Position::new(0, 1)), Some(Symbol::Wild));
        assert_eq!(grid.get(Position::new(2, 0)), Some(Symbol::Scatter));
        assert_eq!(grid.reels()[1], vec![sym("L1"), sym("H2")]);
        assert_eq!(grid.count(sym("L1")), 2);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Grid::parse("H1 H2\nH1").unwrap_err();
        assert!(matches!(err, TumbleError::InvalidGridShape(_)));
    }

    #[test]
    fn test_neighbors_stay_on_grid() {
        let spec = GridSpec::new(3, 3);
        let corner: Vec<_> = spec.neighbors(Position::new(0, 0)).collect();
        assert_eq!(corner.len(), 2);

        let center: Vec<_> = spec.neighbors(Position::new(1, 1)).collect();
        assert_eq!(center.len(), 4);
        assert!(!center.contains(&Position::new(0, 0)));
    }

    #[test]
    fn test_populate_draws_bottom_up() {
        // Strip order top→bottom; the bottom of the list lands on the last row.
        let mut source = ScriptedReelSource::single(vec![
            vec![sym("H1"), sym("H2"), sym("H3")],
            vec![sym("L1"), sym("L2"), sym("L3")],
        ]);
        let grid = Grid::populate_initial(GridSpec::new(2, 3), &mut source).unwrap();
        assert_eq!(grid.to_string(), "H1 L1\nH2 L2\nH3 L3\n");
    }

    #[test]
    fn test_remove_and_refill_gravity() {
        let grid = Grid::parse(
            "H1 L1
             H2 L2
             H3 L3
             H4 L4",
        )
        .unwrap();
        // Refill symbols sit above the visible reel in strip order.
        let mut source = ScriptedReelSource::single(vec![vec![sym("W"), sym("S")], vec![]]);

        let removed: BTreeSet<_> = [Position::new(0, 1), Position::new(0, 3)].into();
        let next = grid.remove_and_refill(&removed, &mut source).unwrap();

        assert_eq!(
            next.reels()[0],
            vec![sym("W"), sym("S"), sym("H1"), sym("H3")]
        );
        assert_eq!(next.reels()[1], grid.reels()[1]);
        assert_eq!(next.occupied(), 8);
    }

    #[test]
    fn test_refill_failure_propagates() {
        let grid = Grid::parse("H1\nH2").unwrap();
        let mut source = ScriptedReelSource::single(vec![vec![]]);
        let removed: BTreeSet<_> = [Position::new(0, 0)].into();

        let err = grid.remove_and_refill(&removed, &mut source).unwrap_err();
        assert_eq!(
            err,
            TumbleError::ReelSource {
                reel: 0,
                source: ReelSourceError::Exhausted { reel: 0 },
            }
        );
    }

    #[test]
    fn test_validate_spec() {
        assert!(GridSpec::new(0, 5).validate().is_err());
        assert!(GridSpec::new(5, 40).validate().is_err());
        assert!(GridSpec::new(6, 5).validate().is_ok());
    }
}
