//! Configuration file editor command.
//!
//! Writes a default configuration file on first use, then opens it in the
//! user's preferred editor and validates the result.

use std::process::Command;

use crate::config::{get_config_path, ChannelChoice, OrbscopeConfig};

/// Opens the orbscope configuration file in the user's preferred editor.
///
/// Tries editors in this order:
/// 1. $EDITOR environment variable
/// 2. nano
/// 3. vi
///
/// # Errors
/// - If the default config cannot be written
/// - If no editor can be found or executed
/// - If the edited file no longer parses
pub fn handle_config() -> anyhow::Result<()> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        OrbscopeConfig::default().save()?;
        tracing::info!("Wrote default config to {}", config_path.display());
    }

    tracing::info!("Opening config file: {}", config_path.display());

    let editor = find_editor()?;
    tracing::debug!("Using editor: {}", editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to open editor '{editor}': {e}. Make sure the editor is installed and accessible."
            )
        })?;

    if !status.success() {
        return Err(anyhow::anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }

    match OrbscopeConfig::load() {
        Ok(config) => {
            tracing::info!("Config file edited successfully");
            for line in summarize(&config) {
                println!("{line}");
            }
        }
        Err(e) => {
            tracing::warn!("Edited config is invalid: {e}");
            eprintln!("Warning: {} is invalid: {e}", config_path.display());
        }
    }
    Ok(())
}

/// Describes the effective session settings, one line per concern.
fn summarize(config: &OrbscopeConfig) -> Vec<String> {
    let audio = &config.audio;
    let analysis = &config.analysis;
    let display = &config.display;

    let channel = match audio.channel {
        ChannelChoice::Index(index) => format!("channel {index}"),
        ChannelChoice::Named(named) => format!("{named:?} channel").to_lowercase(),
    };

    vec![
        format!("Capture:  {} device '{}', {}", audio.source, audio.device, channel),
        format!(
            "Analysis: {}-sample window, {} engine, {}-{}Hz",
            analysis.window_size,
            analysis.engine.build().name(),
            analysis.min_frequency,
            analysis.max_frequency
        ),
        format!(
            "Display:  {}ms frames, smoothing {}, auto-scale {}",
            display.frame_interval_ms,
            on_off(display.smoothing),
            on_off(display.auto_scale)
        ),
    ]
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// Finds the best available editor to use.
fn find_editor() -> anyhow::Result<String> {
    if let Ok(editor) = std::env::var("EDITOR") {
        if !editor.is_empty() {
            return Ok(editor);
        }
    }

    for editor in &["nano", "vi"] {
        if is_editor_available(editor) {
            return Ok(editor.to_string());
        }
    }

    Err(anyhow::anyhow!(
        "No editor found. Please set the $EDITOR environment variable."
    ))
}

/// Checks if an editor is available in the system PATH.
fn is_editor_available(editor: &str) -> bool {
    Command::new("which")
        .arg(editor)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
