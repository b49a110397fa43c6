//! # rf-cluster-sim — Batch Simulation for Cluster-Pay Games
//!
//! Plays millions of rounds of an `rf-cluster` game definition in parallel
//! and reports return, hit rate, free game frequency and cascade statistics.
//!
//! ```rust,ignore
//! use rf_cluster::GameDefinition;
//! use rf_cluster_sim::{SimConfig, Simulator};
//!
//! let sim = Simulator::new(GameDefinition::standard_7x7(), SimConfig::quick().with_seed(7))?;
//! let report = sim.run()?;
//! println!("{}", report.to_text());
//! ```
//!
//! Runs with a fixed seed are reproducible for any thread count.

pub mod config;
pub mod error;
pub mod report;
pub mod runner;
pub mod stats;

pub use config::{SimConfig, load_definition};
pub use error::{SimError, SimResult};
pub use report::{ReportFormat, SimReport};
pub use runner::Simulator;
pub use stats::SimStats;
