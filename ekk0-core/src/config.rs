//! Configuration for the ekk0 simulation.
//!
//! Maps directly to `ekk0.toml`. Every default reproduces the tuning of the
//! live widget, so an empty file yields the canonical creature.

use serde::{Deserialize, Serialize};

/// Top-level ekk0 configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ekk0Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Clock, decay and action tuning.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Memory feed cadence and history.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Persistence / save settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Commentary LLM settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Ekk0Config {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `Ekk0Error::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::Ekk0Error::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Clock/decay engine and action processor tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Target driver cadence.
    #[serde(default = "default_60")]
    pub tick_rate_hz: u32,
    /// Ticks an action stays in progress before another is accepted.
    #[serde(default = "default_120")]
    pub action_lockout_ticks: u32,
    /// Seconds of elapsed time per decay unit.
    #[serde(default = "default_10_0")]
    pub decay_divisor_secs: f64,
    /// Per-gauge decay multipliers.
    #[serde(default)]
    pub decay_factors: DecayFactors,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            action_lockout_ticks: 120,
            decay_divisor_secs: 10.0,
            decay_factors: DecayFactors::default(),
        }
    }
}

/// How fast each gauge drains per decay unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecayFactors {
    /// Fuel drain.
    #[serde(default = "default_1_2")]
    pub hunger: f64,
    /// Happiness drain.
    #[serde(default = "default_0_8")]
    pub happiness: f64,
    /// Energy drain.
    #[serde(default = "default_0_6")]
    pub energy: f64,
    /// Memory drain.
    #[serde(default = "default_0_4")]
    pub memory: f64,
}

impl Default for DecayFactors {
    fn default() -> Self {
        Self {
            hunger: 1.2,
            happiness: 0.8,
            energy: 0.6,
            memory: 0.4,
        }
    }
}

/// Memory event feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Events kept for display, newest first.
    #[serde(default = "default_50")]
    pub max_events: usize,
    /// A pattern is forged every N total actions.
    #[serde(default = "default_3")]
    pub pattern_every: u64,
    /// A directive is issued every N total actions.
    #[serde(default = "default_10")]
    pub directive_every: u64,
    /// Delay between the action and its pattern event.
    #[serde(default = "default_800")]
    pub pattern_delay_ms: i64,
    /// Delay between the action and its directive event.
    #[serde(default = "default_1500")]
    pub directive_delay_ms: i64,
    /// Wall-clock seconds between decay-warning checks.
    #[serde(default = "default_30_0")]
    pub decay_warning_interval_secs: f64,
    /// Memory level below which a decay warning is emitted.
    #[serde(default = "default_30_0")]
    pub decay_warning_threshold: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_events: 50,
            pattern_every: 3,
            directive_every: 10,
            pattern_delay_ms: 800,
            directive_delay_ms: 1500,
            decay_warning_interval_secs: 30.0,
            decay_warning_threshold: 30.0,
        }
    }
}

/// Persistence / save configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite database standing in for the remote store.
    #[serde(default = "default_db_path")]
    pub database_path: String,
    /// Directory holding local snapshot files.
    #[serde(default = "default_local_dir")]
    pub local_dir: String,
    /// Use WAL mode for the SQLite store.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Detect save corruption via checksums.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
    /// Trailing debounce window for remote saves.
    #[serde(default = "default_2000")]
    pub save_debounce_ms: u64,
    /// Local autosave cadence, in driver ticks.
    #[serde(default = "default_600")]
    pub autosave_ticks: u64,
    /// Restart the decay clock at load time when restoring a remote snapshot,
    /// instead of charging the offline gap in one tick.
    #[serde(default = "default_true")]
    pub resume_clock_on_remote_load: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            local_dir: default_local_dir(),
            wal_mode: true,
            checksum_enabled: true,
            save_debounce_ms: 2000,
            autosave_ticks: 600,
            resume_clock_on_remote_load: true,
        }
    }
}

/// Commentary LLM configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: "gemini", "openai", "ollama", "none".
    #[serde(default = "default_gemini")]
    pub provider: String,
    /// Base URL for the LLM API (empty = provider default).
    #[serde(default)]
    pub base_url: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Cloud project (Vertex AI only).
    #[serde(default = "default_project")]
    pub project: String,
    /// Cloud region (Vertex AI only).
    #[serde(default = "default_location")]
    pub location: String,
    /// Hard timeout for a commentary call in milliseconds.
    #[serde(default = "default_5000")]
    pub request_timeout_ms: u64,
    /// Retries before falling back to the local table.
    #[serde(default)]
    pub max_retries: u32,
    /// Minimum spacing between calls for one visitor.
    #[serde(default = "default_3000")]
    pub rate_limit_ms: u64,
    /// Maximum tokens to generate.
    #[serde(default = "default_60_tokens")]
    pub max_output_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_0_95")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_gemini(),
            base_url: String::new(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            project: default_project(),
            location: default_location(),
            request_timeout_ms: 5000,
            max_retries: 0,
            rate_limit_ms: 3000,
            max_output_tokens: 60,
            temperature: 0.95,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_db_path() -> String { "ekk0.db".to_string() }
fn default_local_dir() -> String { ".ekk0".to_string() }
fn default_gemini() -> String { "gemini".to_string() }
fn default_model() -> String { "gemini-2.0-flash".to_string() }
fn default_api_key_env() -> String { "GOOGLE_VERTEX_AI_KEY".to_string() }
fn default_project() -> String { "ekkos-pulse".to_string() }
fn default_location() -> String { "us-central1".to_string() }
fn default_0_4() -> f64 { 0.4 }
fn default_0_6() -> f64 { 0.6 }
fn default_0_8() -> f64 { 0.8 }
fn default_0_95() -> f32 { 0.95 }
fn default_1_2() -> f64 { 1.2 }
fn default_10_0() -> f64 { 10.0 }
fn default_30_0() -> f64 { 30.0 }
fn default_3() -> u64 { 3 }
fn default_10() -> u64 { 10 }
fn default_50() -> usize { 50 }
fn default_60() -> u32 { 60 }
fn default_60_tokens() -> u32 { 60 }
fn default_120() -> u32 { 120 }
fn default_600() -> u64 { 600 }
fn default_800() -> i64 { 800 }
fn default_1500() -> i64 { 1500 }
fn default_2000() -> u64 { 2000 }
fn default_3000() -> u64 { 3000 }
fn default_5000() -> u64 { 5000 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = Ekk0Config::from_toml("").expect("parse");
        assert_eq!(config.simulation.action_lockout_ticks, 120);
        assert_eq!(config.feed.max_events, 50);
        assert_eq!(config.feed.pattern_every, 3);
        assert_eq!(config.feed.directive_every, 10);
        assert!((config.simulation.decay_factors.hunger - 1.2).abs() < f64::EPSILON);
        assert_eq!(config.persistence.save_debounce_ms, 2000);
        assert_eq!(config.llm.rate_limit_ms, 3000);
    }

    #[test]
    fn partial_section_overrides_only_named_fields() {
        let config = Ekk0Config::from_toml(
            r#"
            [feed]
            max_events = 10

            [simulation.decay_factors]
            hunger = 2.0
            "#,
        )
        .expect("parse");
        assert_eq!(config.feed.max_events, 10);
        assert_eq!(config.feed.pattern_delay_ms, 800);
        assert!((config.simulation.decay_factors.hunger - 2.0).abs() < f64::EPSILON);
        assert!((config.simulation.decay_factors.energy - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = Ekk0Config::from_toml("[feed\nmax_events = ").expect_err("must fail");
        assert!(matches!(err, crate::Ekk0Error::Config(_)));
    }
}
