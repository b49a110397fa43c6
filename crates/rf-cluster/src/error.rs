//! Error types for the tumble engine

use thiserror::Error;

/// Failure reported by a reel source.
///
/// Produced by external symbol providers. The engine never retries or masks
/// these; they are wrapped in [`TumbleError::ReelSource`] with the original
/// error kept as the source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReelSourceError {
    /// A scripted or finite source ran out of symbols for a reel
    #[error("Reel {reel} exhausted")]
    Exhausted { reel: usize },

    /// A strip-backed source has no symbols on a reel
    #[error("Reel strip {reel} is empty")]
    EmptyStrip { reel: usize },

    /// The source has no strip for the requested reel
    #[error("Unknown reel {reel} (source has {available})")]
    UnknownReel { reel: usize, available: usize },

    /// Backing service could not produce a symbol
    #[error("Reel source unavailable: {0}")]
    Unavailable(String),
}

/// Tumble engine error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TumbleError {
    /// Reel source could not produce a symbol; the spin is aborted
    #[error("Reel source failure on reel {reel}: {source}")]
    ReelSource {
        reel: usize,
        #[source]
        source: ReelSourceError,
    },

    /// Reel source refused to start a spin
    #[error("Reel source failed to start spin: {0}")]
    SpinStart(#[source] ReelSourceError),

    /// Grid dimensions do not fit the paytable or cluster-size rules
    #[error("Invalid grid shape: {0}")]
    InvalidGridShape(String),

    /// Missing or inconsistent configuration entry
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Operation not valid in the current round phase
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Config or grid text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl TumbleError {
    /// Wrap a reel source failure for `reel`
    pub fn reel_source(reel: usize, source: ReelSourceError) -> Self {
        Self::ReelSource { reel, source }
    }

    /// Is this a reel source failure (the caller may retry the spin)?
    pub fn is_reel_failure(&self) -> bool {
        matches!(self, Self::ReelSource { .. } | Self::SpinStart(_))
    }
}

impl From<serde_json::Error> for TumbleError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(format!("JSON: {e}"))
    }
}

impl From<serde_yml::Error> for TumbleError {
    fn from(e: serde_yml::Error) -> Self {
        Self::Parse(format!("YAML: {e}"))
    }
}

/// Result type for tumble engine operations
pub type TumbleResult<T> = Result<T, TumbleError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_reel_failure_keeps_source() {
        let err = TumbleError::reel_source(3, ReelSourceError::Exhausted { reel: 3 });
        assert!(err.is_reel_failure());
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("Reel 3 exhausted".to_string())
        );
    }

    #[test]
    fn test_configuration_is_not_reel_failure() {
        let err = TumbleError::Configuration("no award for 9 scatters".into());
        assert!(!err.is_reel_failure());
        assert!(err.to_string().contains("9 scatters"));
    }
}
