//! TOML Configuration File Support
//!
//! Centralized configuration loading for the rite, from a TOML file at
//! `~/.config/digital-fragments/rite.toml`.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! The file lives at `$XDG_CONFIG_HOME/digital-fragments/rite.toml`
//! (typically `~/.config/digital-fragments/rite.toml`).
//!
//! # Example Configuration
//!
//! ```toml
//! [cycle]
//! countdown_secs = 90
//! default_phrase = "輪廻 再生 無常 光"
//!
//! [residue]
//! max_keywords = 8
//! palette_buckets = 6
//!
//! [shatter]
//! duration_ms = 1800
//! fps = 60
//! particle_step = 4
//! glitch_chance = 0.3
//!
//! [canvas]
//! width = 720
//! height = 720
//!
//! [auto]
//! cycle_secs = 32
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auto::DEFAULT_AUTO_CYCLE;
use crate::countdown::DEFAULT_COUNTDOWN;
use crate::cycle::{CycleSettings, DEFAULT_PHRASE};
use crate::residue::{DEFAULT_MAX_KEYWORDS, DEFAULT_PALETTE_BUCKETS};
use crate::rite::RiteConfig;
use crate::shatter::ShatterConfig;

/// Default canvas edge in pixels
pub const DEFAULT_CANVAS_SIZE: u32 = 720;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Cycle section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleToml {
    /// Display countdown in seconds
    pub countdown_secs: Option<u64>,

    /// Phrase seeding the composition when the prompt is empty
    pub default_phrase: Option<String>,
}

/// Residue section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResidueToml {
    /// Keywords kept per residue
    pub max_keywords: Option<usize>,

    /// Colors kept per residue
    pub palette_buckets: Option<usize>,
}

/// Shatter section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShatterToml {
    /// Effect duration in milliseconds
    pub duration_ms: Option<u64>,

    /// Frames per second
    pub fps: Option<u32>,

    /// Particle sampling stride in pixels
    pub particle_step: Option<u32>,

    /// Chance per frame of a glitch line (0.0-1.0)
    pub glitch_chance: Option<f64>,
}

/// Canvas section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasToml {
    /// Frame width in pixels
    pub width: Option<u32>,

    /// Frame height in pixels
    pub height: Option<u32>,
}

/// Auto section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoToml {
    /// Length of one unattended cycle in seconds
    pub cycle_secs: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiteToml {
    /// Cycle configuration section
    pub cycle: CycleToml,

    /// Residue configuration section
    pub residue: ResidueToml,

    /// Shatter configuration section
    pub shatter: ShatterToml,

    /// Canvas configuration section
    pub canvas: CanvasToml,

    /// Auto configuration section
    pub auto: AutoToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Centralized configuration for the rite
///
/// Consolidates all sources and tracks where the values came from. Use
/// [`load_config`] to load with proper priority handling.
#[derive(Clone, Debug)]
pub struct RiteConfigFile {
    /// How long a composition is displayed before destruction is urged
    pub countdown: Duration,

    /// Phrase seeding the composition when the prompt is empty
    pub default_phrase: String,

    /// Keywords kept per residue
    pub max_keywords: usize,

    /// Colors kept per residue
    pub palette_buckets: usize,

    /// Destruction effect tuning
    pub shatter: ShatterConfig,

    /// Frame width in pixels
    pub canvas_width: u32,

    /// Frame height in pixels
    pub canvas_height: u32,

    /// Length of one unattended cycle
    pub auto_cycle: Duration,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for RiteConfigFile {
    fn default() -> Self {
        Self {
            countdown: DEFAULT_COUNTDOWN,
            default_phrase: DEFAULT_PHRASE.to_string(),
            max_keywords: DEFAULT_MAX_KEYWORDS,
            palette_buckets: DEFAULT_PALETTE_BUCKETS,
            shatter: ShatterConfig::default(),
            canvas_width: DEFAULT_CANVAS_SIZE,
            canvas_height: DEFAULT_CANVAS_SIZE,
            auto_cycle: DEFAULT_AUTO_CYCLE,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl RiteConfigFile {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Reject values the rite cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(ConfigError::ValidationError(format!(
                "canvas size must be non-zero, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        if self.shatter.fps == 0 {
            return Err(ConfigError::ValidationError(
                "shatter fps must be non-zero".to_string(),
            ));
        }
        if self.shatter.particle_step == 0 {
            return Err(ConfigError::ValidationError(
                "shatter particle_step must be non-zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.shatter.glitch_chance) {
            return Err(ConfigError::ValidationError(format!(
                "shatter glitch_chance must be within 0.0..=1.0, got {}",
                self.shatter.glitch_chance
            )));
        }
        if self.palette_buckets == 0 {
            return Err(ConfigError::ValidationError(
                "residue palette_buckets must be non-zero".to_string(),
            ));
        }
        if self.auto_cycle.is_zero() {
            return Err(ConfigError::ValidationError(
                "auto cycle_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Controller settings
    #[must_use]
    pub fn cycle_settings(&self) -> CycleSettings {
        CycleSettings {
            default_phrase: self.default_phrase.clone(),
            max_keywords: self.max_keywords,
            palette_buckets: self.palette_buckets,
        }
    }

    /// Orchestrator configuration
    #[must_use]
    pub fn rite_config(&self) -> RiteConfig {
        RiteConfig {
            countdown: self.countdown,
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            cycle: self.cycle_settings(),
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/digital-fragments/rite.toml` or
/// `~/.config/digital-fragments/rite.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("digital-fragments").join("rite.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the merged values fail [`RiteConfigFile::validate`]. A missing config
/// file is not an error (defaults are used).
pub fn load_config() -> Result<RiteConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the merged values are invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<RiteConfigFile, ConfigError> {
    let mut config = RiteConfigFile::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: RiteToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut RiteConfigFile, toml: &RiteToml) {
    if let Some(secs) = toml.cycle.countdown_secs {
        config.countdown = Duration::from_secs(secs);
    }
    if let Some(ref phrase) = toml.cycle.default_phrase {
        config.default_phrase = phrase.clone();
    }

    if let Some(max) = toml.residue.max_keywords {
        config.max_keywords = max;
    }
    if let Some(buckets) = toml.residue.palette_buckets {
        config.palette_buckets = buckets;
    }

    if let Some(ms) = toml.shatter.duration_ms {
        config.shatter.duration = Duration::from_millis(ms);
    }
    if let Some(fps) = toml.shatter.fps {
        config.shatter.fps = fps;
    }
    if let Some(step) = toml.shatter.particle_step {
        config.shatter.particle_step = step;
    }
    if let Some(chance) = toml.shatter.glitch_chance {
        config.shatter.glitch_chance = chance;
    }

    if let Some(width) = toml.canvas.width {
        config.canvas_width = width;
    }
    if let Some(height) = toml.canvas.height {
        config.canvas_height = height;
    }

    if let Some(secs) = toml.auto.cycle_secs {
        config.auto_cycle = Duration::from_secs(secs);
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut RiteConfigFile) {
    if let Ok(secs) = std::env::var("RITE_COUNTDOWN_SECS") {
        if let Ok(s) = secs.parse::<u64>() {
            config.countdown = Duration::from_secs(s);
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(phrase) = std::env::var("RITE_DEFAULT_PHRASE") {
        config.default_phrase = phrase;
        config.source = ConfigSource::Env;
    }
    if let Ok(max) = std::env::var("RITE_MAX_KEYWORDS") {
        if let Ok(n) = max.parse::<usize>() {
            config.max_keywords = n;
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(buckets) = std::env::var("RITE_PALETTE_BUCKETS") {
        if let Ok(n) = buckets.parse::<usize>() {
            config.palette_buckets = n;
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(duration) = std::env::var("RITE_SHATTER_MS") {
        if let Ok(ms) = duration.parse::<u64>() {
            config.shatter.duration = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(fps) = std::env::var("RITE_SHATTER_FPS") {
        if let Ok(n) = fps.parse::<u32>() {
            config.shatter.fps = n;
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(size) = std::env::var("RITE_CANVAS_SIZE") {
        if let Ok(px) = size.parse::<u32>() {
            config.canvas_width = px;
            config.canvas_height = px;
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(secs) = std::env::var("RITE_AUTO_CYCLE_SECS") {
        if let Ok(s) = secs.parse::<u64>() {
            config.auto_cycle = Duration::from_secs(s);
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides,
/// then call [`RiteConfigFile::validate`] again.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Countdown override (seconds)
    pub countdown_secs: Option<u64>,

    /// Shatter duration override (milliseconds)
    pub shatter_ms: Option<u64>,

    /// Square canvas size override (pixels)
    pub canvas_size: Option<u32>,

    /// Auto cycle override (seconds)
    pub auto_cycle_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set countdown override
    #[must_use]
    pub fn with_countdown_secs(mut self, secs: u64) -> Self {
        self.countdown_secs = Some(secs);
        self
    }

    /// Set shatter duration override
    #[must_use]
    pub fn with_shatter_ms(mut self, ms: u64) -> Self {
        self.shatter_ms = Some(ms);
        self
    }

    /// Set canvas size override
    #[must_use]
    pub fn with_canvas_size(mut self, px: u32) -> Self {
        self.canvas_size = Some(px);
        self
    }

    /// Set auto cycle override
    #[must_use]
    pub fn with_auto_cycle_secs(mut self, secs: u64) -> Self {
        self.auto_cycle_secs = Some(secs);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut RiteConfigFile) {
        if self.countdown_secs.is_some()
            || self.shatter_ms.is_some()
            || self.canvas_size.is_some()
            || self.auto_cycle_secs.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(secs) = self.countdown_secs {
            config.countdown = Duration::from_secs(secs);
        }
        if let Some(ms) = self.shatter_ms {
            config.shatter.duration = Duration::from_millis(ms);
        }
        if let Some(px) = self.canvas_size {
            config.canvas_width = px;
            config.canvas_height = px;
        }
        if let Some(secs) = self.auto_cycle_secs {
            config.auto_cycle = Duration::from_secs(secs);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
