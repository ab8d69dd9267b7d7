//! Configuration management for orbscope.
//!
//! This module handles loading and saving application configuration from a TOML
//! file in the user's config directory. Every field has a default, so a missing
//! or partial file is valid.

pub mod file;

pub use file::{
    get_config_path, AnalysisConfig, CaptureSource, ChannelChoice, EngineKind, OrbscopeConfig,
};
