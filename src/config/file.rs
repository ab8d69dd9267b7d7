//! Configuration file management for orbscope.
//!
//! This module handles loading and saving application configuration from TOML files.
//! Configuration is stored in the user's config directory. A missing file means
//! defaults; a present file is validated before use.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::spectrum::transform::is_power_of_two;
use crate::spectrum::{ChartScale, PlannedTransform, TransformEngine};

/// Largest accepted `analysis.window_size`, in samples.
const MAX_WINDOW_SIZE: usize = 1 << 20;

/// Where audio is captured from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    /// A capture device such as a microphone or line input
    #[default]
    Input,
    /// What the system is playing, captured from an output device
    Loopback,
}

impl std::fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Loopback => write!(f, "loopback"),
        }
    }
}

/// Named channel positions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NamedChannel {
    First,
    Last,
}

/// Channel to analyze: `"first"`, `"last"` or a zero-based index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ChannelChoice {
    Index(usize),
    Named(NamedChannel),
}

impl Default for ChannelChoice {
    fn default() -> Self {
        Self::Named(NamedChannel::First)
    }
}

impl ChannelChoice {
    /// Resolves to a concrete index for a device with `channels` channels.
    ///
    /// # Errors
    /// - If the index is outside the device's channels
    pub fn resolve(self, channels: usize) -> anyhow::Result<usize> {
        let index = match self {
            Self::Named(NamedChannel::First) => 0,
            Self::Named(NamedChannel::Last) => channels.saturating_sub(1),
            Self::Index(index) => index,
        };
        if index >= channels {
            return Err(anyhow!(
                "Channel {} is out of range for a {}-channel device",
                index,
                channels
            ));
        }
        Ok(index)
    }
}

/// Transform engine selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Recursive radix-2, allocating per level
    #[default]
    Recursive,
    /// rustfft with cached plans
    Planned,
}

impl EngineKind {
    pub fn build(self) -> TransformEngine {
        match self {
            Self::Recursive => TransformEngine::Recursive,
            Self::Planned => TransformEngine::Planned(PlannedTransform::new()),
        }
    }
}

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for the system default device
    /// - numeric index (0, 1, 2, etc.) from `orbscope list-devices`
    /// - device name from `orbscope list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// "input" captures a recording device, "loopback" captures an output device
    #[serde(default)]
    pub source: CaptureSource,
    /// Channel to analyze: "first", "last" or a zero-based index
    #[serde(default)]
    pub channel: ChannelChoice,
}

fn default_device() -> String {
    "default".to_string()
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            source: CaptureSource::default(),
            channel: ChannelChoice::default(),
        }
    }
}

/// Spectral analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Interleaved samples held in the rolling window (power of two)
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Transform engine: "recursive" or "planned"
    #[serde(default)]
    pub engine: EngineKind,
    /// Magnitude that maps to 0 dB
    #[serde(default = "default_reference_intensity")]
    pub reference_intensity: f32,
    /// Smallest magnitude fed to the logarithm
    #[serde(default = "default_magnitude_floor")]
    pub magnitude_floor: f32,
    /// Decibel span of the full chart height
    #[serde(default = "default_db_range")]
    pub db_range: f32,
    /// Lowest frequency shown, in Hz
    #[serde(default = "default_min_frequency")]
    pub min_frequency: f32,
    /// Highest frequency shown, in Hz (clamped to Nyquist)
    #[serde(default = "default_max_frequency")]
    pub max_frequency: f32,
}

fn default_window_size() -> usize {
    4096
}

fn default_reference_intensity() -> f32 {
    1e-11
}

fn default_magnitude_floor() -> f32 {
    1e-12
}

fn default_db_range() -> f32 {
    150.0
}

fn default_min_frequency() -> f32 {
    20.0
}

fn default_max_frequency() -> f32 {
    20000.0
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            engine: EngineKind::default(),
            reference_intensity: default_reference_intensity(),
            magnitude_floor: default_magnitude_floor(),
            db_range: default_db_range(),
            min_frequency: default_min_frequency(),
            max_frequency: default_max_frequency(),
        }
    }
}

impl AnalysisConfig {
    /// Chart scaling derived from the configured constants.
    pub fn chart_scale(&self) -> ChartScale {
        ChartScale {
            reference_intensity: self.reference_intensity,
            floor: self.magnitude_floor,
            db_range: self.db_range,
            ..ChartScale::default()
        }
    }
}

/// Terminal display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Milliseconds between frames
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Average each frame with the previous one
    #[serde(default = "default_true")]
    pub smoothing: bool,
    /// Scale the chart to a running maximum instead of the fixed dB range
    #[serde(default)]
    pub auto_scale: bool,
}

fn default_frame_interval_ms() -> u64 {
    33
}

fn default_true() -> bool {
    true
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            smoothing: true,
            auto_scale: false,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrbscopeConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl OrbscopeConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// Falls back to defaults when no config file exists.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed or fails validation
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path)?;
        let config = Self::from_toml_str(&config_content)?;
        tracing::debug!("Configuration loaded from {}", config_path.display());
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    /// - If the TOML is malformed
    /// - If a value fails validation
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: OrbscopeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = get_config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }

    /// Checks values that would break the analysis pipeline.
    ///
    /// # Errors
    /// - If the window size is zero or not a power of two
    /// - If the frequency range is empty or non-positive
    /// - If the decibel constants are not positive
    pub fn validate(&self) -> anyhow::Result<()> {
        let analysis = &self.analysis;

        if analysis.window_size == 0
            || !is_power_of_two(analysis.window_size)
            || analysis.window_size > MAX_WINDOW_SIZE
        {
            return Err(anyhow!(
                "analysis.window_size must be a power of two up to {}, got {}",
                MAX_WINDOW_SIZE,
                analysis.window_size
            ));
        }
        if !is_positive_finite(analysis.min_frequency)
            || !is_positive_finite(analysis.max_frequency)
            || analysis.min_frequency >= analysis.max_frequency
        {
            return Err(anyhow!(
                "analysis frequency range {}-{}Hz is invalid",
                analysis.min_frequency,
                analysis.max_frequency
            ));
        }
        if !is_positive_finite(analysis.reference_intensity)
            || !is_positive_finite(analysis.magnitude_floor)
            || !is_positive_finite(analysis.db_range)
        {
            return Err(anyhow!(
                "analysis.reference_intensity, magnitude_floor and db_range must be positive and finite"
            ));
        }
        if self.display.frame_interval_ms == 0 {
            return Err(anyhow!("display.frame_interval_ms must be at least 1"));
        }

        Ok(())
    }
}

/// False for zero, negatives, infinities and NaN.
fn is_positive_finite(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

/// Retrieves the path to the config file, creating its directory.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("orbscope");

    fs::create_dir_all(&config_dir)
        .map_err(|e| anyhow!("Failed to create config directory: {e}"))?;

    Ok(config_dir.join("orbscope.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = OrbscopeConfig::from_toml_str("").unwrap();
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.audio.source, CaptureSource::Input);
        assert_eq!(config.analysis.window_size, 4096);
        assert_eq!(config.analysis.engine, EngineKind::Recursive);
        assert_eq!(config.display.frame_interval_ms, 33);
        assert!(config.display.smoothing);
    }

    #[test]
    fn test_parses_full_config() {
        let config = OrbscopeConfig::from_toml_str(
            r#"
            [audio]
            device = "2"
            source = "loopback"
            channel = "last"

            [analysis]
            window_size = 2048
            engine = "planned"
            db_range = 120.0

            [display]
            auto_scale = true
            "#,
        )
        .unwrap();

        assert_eq!(config.audio.source, CaptureSource::Loopback);
        assert_eq!(config.audio.channel, ChannelChoice::Named(NamedChannel::Last));
        assert_eq!(config.analysis.engine, EngineKind::Planned);
        assert_eq!(config.analysis.chart_scale().db_range, 120.0);
        assert!(config.display.auto_scale);
    }

    #[test]
    fn test_channel_index() {
        let config = OrbscopeConfig::from_toml_str("[audio]\nchannel = 1\n").unwrap();
        assert_eq!(config.audio.channel, ChannelChoice::Index(1));
        assert_eq!(config.audio.channel.resolve(2).unwrap(), 1);
        assert!(config.audio.channel.resolve(1).is_err());
    }

    #[test]
    fn test_named_channels_resolve() {
        assert_eq!(ChannelChoice::Named(NamedChannel::First).resolve(2).unwrap(), 0);
        assert_eq!(ChannelChoice::Named(NamedChannel::Last).resolve(2).unwrap(), 1);
        assert!(ChannelChoice::Named(NamedChannel::Last).resolve(0).is_err());
    }

    #[test]
    fn test_rejects_bad_window_size() {
        let err = OrbscopeConfig::from_toml_str("[analysis]\nwindow_size = 3000\n").unwrap_err();
        assert!(err.to_string().contains("power of two"));
        assert!(OrbscopeConfig::from_toml_str("[analysis]\nwindow_size = 0\n").is_err());
    }

    #[test]
    fn test_rejects_oversized_window() {
        let err = OrbscopeConfig::from_toml_str("[analysis]\nwindow_size = 1099511627776\n")
            .unwrap_err();
        assert!(err.to_string().contains("power of two up to"));
        assert!(OrbscopeConfig::from_toml_str("[analysis]\nwindow_size = 1048576\n").is_ok());
    }

    #[test]
    fn test_rejects_non_finite_values() {
        for field in [
            "min_frequency",
            "max_frequency",
            "reference_intensity",
            "magnitude_floor",
            "db_range",
        ] {
            for value in ["nan", "inf"] {
                let text = format!("[analysis]\n{field} = {value}\n");
                assert!(
                    OrbscopeConfig::from_toml_str(&text).is_err(),
                    "{field} = {value} was accepted"
                );
            }
        }
    }

    #[test]
    fn test_rejects_inverted_frequency_range() {
        let result = OrbscopeConfig::from_toml_str(
            "[analysis]\nmin_frequency = 5000.0\nmax_frequency = 100.0\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let text = toml::to_string_pretty(&OrbscopeConfig::default()).unwrap();
        let parsed = OrbscopeConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.analysis.window_size, 4096);
        assert_eq!(parsed.audio.channel, ChannelChoice::default());
    }
}
