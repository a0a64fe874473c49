//! Host configuration.
//!
//! One TOML file carries the core sections (`[general]`, `[simulation]`,
//! `[feed]`, `[persistence]`, `[llm]`) plus a `[host]` section for things
//! only the real-time front end needs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ekk0_core::config::Ekk0Config;
use ekk0_core::error::{Ekk0Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ekk0.toml";

// ---------------------------------------------------------------------------
// Host Configuration
// ---------------------------------------------------------------------------

/// Settings for the terminal host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSection {
    /// File holding the persisted visitor ID.
    #[serde(default = "default_identity_path")]
    pub identity_path: String,
    /// Fixed RNG seed; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Save to and load from the durable store.
    #[serde(default = "default_true")]
    pub remote_enabled: bool,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            identity_path: default_identity_path(),
            seed: None,
            remote_enabled: true,
        }
    }
}

/// Complete host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// Simulation, feed, persistence and LLM settings.
    #[serde(flatten)]
    pub core: Ekk0Config,
    /// Host-only settings.
    #[serde(default)]
    pub host: HostSection,
}

impl HostConfig {
    /// Parse from a TOML string.
    ///
    /// # Errors
    /// Returns `Ekk0Error::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Ekk0Error::Config(e.to_string()))
    }

    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] when `path` is
    /// `None`. A missing default file yields the built-in defaults; a missing
    /// explicit file is an error.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Interval between driver ticks.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        tick_period(self.core.simulation.tick_rate_hz)
    }
}

/// Interval between ticks at `hz` (at least 1 Hz).
#[must_use]
pub fn tick_period(hz: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(hz.max(1)))
}

fn default_identity_path() -> String {
    "ekk0_visitor_id".to_string()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Frame Budget Tracker
// ---------------------------------------------------------------------------

/// Tracks how long ticks take against the frame period.
#[derive(Debug, Clone, Default)]
pub struct FrameBudget {
    /// Ticks measured.
    pub ticks: u64,
    /// Slowest tick seen (μs).
    pub slowest_us: u64,
    /// Sum of tick times (μs).
    pub total_us: u64,
    /// Ticks that took longer than the frame period.
    pub overruns: u64,
}

impl FrameBudget {
    /// Record one tick of `elapsed` against a frame of `period`.
    pub fn record(&mut self, elapsed: Duration, period: Duration) {
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.ticks += 1;
        self.total_us = self.total_us.saturating_add(us);
        self.slowest_us = self.slowest_us.max(us);
        if elapsed > period {
            self.overruns += 1;
        }
    }

    /// Mean tick time (μs).
    #[must_use]
    pub fn mean_us(&self) -> u64 {
        self.total_us.checked_div(self.ticks).unwrap_or(0)
    }

    /// Whether no tick has overrun its frame.
    #[must_use]
    pub fn within_budget(&self) -> bool {
        self.overruns == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
