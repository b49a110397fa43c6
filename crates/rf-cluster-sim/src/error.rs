//! Simulator errors

use rf_cluster::TumbleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("Game error: {0}")]
    Game(#[from] TumbleError),

    #[error("Too many reel failures: {failures} (limit {limit})")]
    ReelFailures { failures: u64, limit: u64 },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
