//! Symbol definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TumbleError;

/// Symbol type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolType {
    /// Regular paying symbol
    Regular,
    /// Wild - substitutes for any regular symbol
    Wild,
    /// Scatter - never clusters, counted for free-game triggers
    Scatter,
}

/// A grid symbol.
///
/// Industry-standard naming: `H1`..`Hn` are high payers (H1 highest),
/// `L1`..`Ln` low payers, `W` is wild and `S` is scatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Symbol {
    /// High paying symbol (1 = highest)
    High(u8),
    /// Low paying symbol (1 = highest of low tier)
    Low(u8),
    /// Wild
    Wild,
    /// Scatter
    Scatter,
}

impl Symbol {
    /// Symbol type classification
    pub fn symbol_type(&self) -> SymbolType {
        match self {
            Self::High(_) | Self::Low(_) => SymbolType::Regular,
            Self::Wild => SymbolType::Wild,
            Self::Scatter => SymbolType::Scatter,
        }
    }

    pub fn is_wild(&self) -> bool {
        matches!(self, Self::Wild)
    }

    pub fn is_scatter(&self) -> bool {
        matches!(self, Self::Scatter)
    }

    /// Regular symbols are the only ones that carry a paytable entry
    pub fn is_paying(&self) -> bool {
        self.symbol_type() == SymbolType::Regular
    }

    /// Can `self` and `other` sit in the same cluster?
    ///
    /// Identical regular symbols match, a wild matches anything except a
    /// scatter, and a scatter matches nothing (not even another scatter).
    pub fn matches_for(&self, other: &Symbol) -> bool {
        match (self, other) {
            (Self::Scatter, _) | (_, Self::Scatter) => false,
            (Self::Wild, _) | (_, Self::Wild) => true,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High(n) => write!(f, "H{n}"),
            Self::Low(n) => write!(f, "L{n}"),
            Self::Wild => write!(f, "W"),
            Self::Scatter => write!(f, "S"),
        }
    }
}

impl FromStr for Symbol {
    type Err = TumbleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_uppercase().as_str() {
            "W" | "WILD" => return Ok(Self::Wild),
            "S" | "SCATTER" => return Ok(Self::Scatter),
            _ => {}
        }

        let invalid = || TumbleError::Parse(format!("Unknown symbol '{s}'"));
        let (kind, tier) = s.split_at_checked(1).ok_or_else(invalid)?;
        let tier: u8 = tier.parse().map_err(|_| invalid())?;
        if tier == 0 {
            return Err(invalid());
        }
        match kind {
            "H" | "h" => Ok(Self::High(tier)),
            "L" | "l" => Ok(Self::Low(tier)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Symbol {
    type Error = TumbleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

/// Symbol alphabet of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSet {
    pub symbols: Vec<Symbol>,
}

impl SymbolSet {
    /// Build a set of `highs` high payers, `lows` low payers, wild and scatter
    pub fn new(highs: u8, lows: u8) -> Self {
        let mut symbols: Vec<Symbol> = (1..=highs).map(Symbol::High).collect();
        symbols.extend((1..=lows).map(Symbol::Low));
        symbols.push(Symbol::Wild);
        symbols.push(Symbol::Scatter);
        Self { symbols }
    }

    /// H1-H4, L1-L4, W, S
    pub fn standard() -> Self {
        Self::new(4, 4)
    }

    /// Regular (paying) symbols only
    pub fn paying(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.symbols.iter().copied().filter(Symbol::is_paying)
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.symbols.contains(&symbol)
    }
}

impl Default for SymbolSet {
    fn default() -> Self {
        Self::standard()
    }
}
