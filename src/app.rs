//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

/// Live audio spectrum viewer for the terminal
#[derive(Parser)]
#[command(name = "orbscope")]
#[command(version)]
#[command(about = "Live audio spectrum viewer for the terminal")]
#[command(long_about = "Live audio spectrum viewer for the terminal.\n\nCaptures audio from an input device (or an output device in loopback mode),\nkeeps a rolling window of samples and draws its frequency spectrum.\n\nDEFAULT COMMAND:\n    If no command is specified, 'live' is used.\n\nEXAMPLES:\n    # Watch the default input device\n    $ orbscope\n\n    # Watch the second channel\n    $ orbscope live --channel 1\n\n    # Find the peak frequency of a recording\n    $ orbscope analyze tone.wav --round-trip")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/orbscope/orbscope.toml\n    Logs:               ~/.local/state/orbscope/orbscope.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the live spectrum of the capture device (default)
    ///
    /// Press Space to pause/resume, Escape/q to quit.
    #[command(visible_alias = "l")]
    Live {
        /// Channel to analyze (zero-based), overriding the config file
        #[arg(short, long, value_name = "N")]
        channel: Option<usize>,
    },

    /// Analyze the spectrum of a WAV file
    ///
    /// Streams the file through the rolling window in packets, then reports
    /// the peak frequency and strongest bins of the final window.
    #[command(visible_alias = "a")]
    Analyze {
        /// Path to the WAV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Channel to analyze (zero-based), overriding the config file
        #[arg(short, long, value_name = "N")]
        channel: Option<usize>,

        /// Also run the inverse transform and report the reconstruction error
        #[arg(long)]
        round_trip: bool,

        /// Frames per simulated capture packet
        #[arg(long, value_name = "FRAMES", default_value_t = 480)]
        packet_size: usize,
    },

    /// List audio devices usable as capture sources
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    Logs,

    /// Open configuration file in your preferred editor
    ///
    /// Creates the file with default values if it does not exist.
    #[command(visible_alias = "c")]
    Config,

    /// Generate shell completion script
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that don't need logging
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "orbscope", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => return commands::handle_list_devices(),
        Some(Commands::Logs) => return commands::handle_logs(),
        _ => {}
    }

    logging::init_logging()?;

    match cli.command {
        None => commands::handle_live(None)?,
        Some(Commands::Live { channel }) => commands::handle_live(channel)?,
        Some(Commands::Analyze {
            file,
            channel,
            round_trip,
            packet_size,
        }) => commands::handle_analyze(&file, channel, round_trip, packet_size)?,
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_analyze_arguments() {
        let cli = Cli::try_parse_from(["orbscope", "analyze", "tone.wav", "-c", "1", "--round-trip"])
            .unwrap();
        match cli.command {
            Some(Commands::Analyze {
                file,
                channel,
                round_trip,
                packet_size,
            }) => {
                assert_eq!(file, PathBuf::from("tone.wav"));
                assert_eq!(channel, Some(1));
                assert!(round_trip);
                assert_eq!(packet_size, 480);
            }
            _ => panic!("expected analyze command"),
        }
    }

    #[test]
    fn test_no_command_defaults_to_live() {
        let cli = Cli::try_parse_from(["orbscope"]).unwrap();
        assert!(cli.command.is_none());
    }
}
