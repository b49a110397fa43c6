//! Simulation report generation

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rf_cluster::GameDefinition;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::error::SimResult;
use crate::stats::SimStats;

/// Result of one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimReport {
    pub game: String,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
    pub config: SimConfig,
    /// Master seed actually used
    pub seed: u64,
    pub stats: SimStats,
    pub duration_ms: u64,
    pub rounds_per_second: f64,
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl SimReport {
    pub fn new(
        definition: &GameDefinition,
        config: SimConfig,
        seed: u64,
        stats: SimStats,
        elapsed: Duration,
    ) -> Self {
        let secs = elapsed.as_secs_f64();
        let rounds_per_second = if secs > 0.0 {
            stats.rounds as f64 / secs
        } else {
            0.0
        };
        Self {
            game: definition.name.clone(),
            timestamp: timestamp_now(),
            config,
            seed,
            stats,
            duration_ms: elapsed.as_millis() as u64,
            rounds_per_second,
        }
    }

    /// Generate JSON report
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Generate text report
    pub fn to_text(&self) -> String {
        let s = &self.stats;
        let title = format!("Simulation: {}", self.game);
        let mut output = String::new();

        output.push_str(&format!("{title}\n{}\n\n", "=".repeat(title.len())));
        output.push_str(&format!("Seed: {}\n", self.seed));
        output.push_str(&format!(
            "Rounds: {} in {} ms ({:.0} rounds/s)\n\n",
            s.rounds, self.duration_ms, self.rounds_per_second
        ));

        output.push_str("Return:\n");
        output.push_str(&format!("  RTP:        {:.4}\n", s.rtp()));
        output.push_str(&format!("  Base RTP:   {:.4}\n", s.base_rtp()));
        output.push_str(&format!("  Free RTP:   {:.4}\n", s.free_rtp()));
        output.push_str(&format!("  Hit rate:   {:.4}\n", s.hit_rate()));
        output.push_str(&format!("  Max win:    {:.2}x\n", s.max_round_win));
        output.push_str(&format!("  Win caps:   {}\n\n", s.wincap_hits));

        output.push_str("Free game:\n");
        output.push_str(&format!(
            "  Triggers:   {} (1 in {:.1})\n",
            s.free_games,
            if s.free_games > 0 {
                s.rounds as f64 / s.free_games as f64
            } else {
                0.0
            }
        ));
        output.push_str(&format!("  Avg spins:  {:.2}\n", s.avg_free_spins()));
        output.push_str(&format!("  Retriggers: {}\n", s.retriggers));
        output.push_str(&format!("  Near misses: {}\n\n", s.near_misses));

        output.push_str("Cascades:\n");
        output.push_str(&format!("  Tumbles:    {} (max {})\n", s.tumbles, s.max_tumbles));
        output.push_str(&format!("  Step limit: {}\n", s.step_limit_hits));
        output.push_str(&format!("  Top multiplier: x{}\n\n", s.highest_multiplier));

        output.push_str("Scatters (base, settled):\n");
        for (count, n) in &s.scatter_histogram {
            output.push_str(&format!("  {count:>2}: {n}\n"));
        }

        output.push_str("\nWins by symbol:\n");
        for (symbol, win) in &s.wins_by_symbol {
            let share = if s.rounds > 0 {
                win / s.rounds as f64
            } else {
                0.0
            };
            output.push_str(&format!("  {:<3} {share:.4}\n", symbol.to_string()));
        }

        if s.reel_failures > 0 {
            output.push_str(&format!("\nReel failures: {}\n", s.reel_failures));
        }
        output
    }

    /// Generate markdown report
    pub fn to_markdown(&self) -> String {
        let s = &self.stats;
        let mut output = String::new();

        output.push_str(&format!("# Simulation: {}\n\n", self.game));
        output.push_str("| Metric | Value |\n");
        output.push_str("|--------|-------|\n");
        output.push_str(&format!("| Rounds | {} |\n", s.rounds));
        output.push_str(&format!("| Seed | {} |\n", self.seed));
        output.push_str(&format!("| RTP | {:.4} |\n", s.rtp()));
        output.push_str(&format!("| Base RTP | {:.4} |\n", s.base_rtp()));
        output.push_str(&format!("| Free RTP | {:.4} |\n", s.free_rtp()));
        output.push_str(&format!("| Hit rate | {:.4} |\n", s.hit_rate()));
        output.push_str(&format!("| Trigger rate | {:.5} |\n", s.trigger_rate()));
        output.push_str(&format!("| Max win | {:.2}x |\n", s.max_round_win));
        output.push_str(&format!("| Duration | {} ms |\n", self.duration_ms));
        output
    }

    /// Save report to file
    pub fn save<P: AsRef<Path>>(&self, path: P, format: ReportFormat) -> SimResult<()> {
        let content = match format {
            ReportFormat::Text => self.to_text(),
            ReportFormat::Json => self.to_json()?,
            ReportFormat::Markdown => self.to_markdown(),
        };
        fs::write(path, content)?;
        Ok(())
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> SimResult<()> {
        self.save(path, ReportFormat::Json)
    }

    /// Format from file extension, JSON when unknown
    pub fn format_for(path: &Path) -> ReportFormat {
        match path.extension().and_then(|e| e.to_str()) {
            Some("txt") => ReportFormat::Text,
            Some("md") => ReportFormat::Markdown,
            _ => ReportFormat::Json,
        }
    }
}

fn timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
