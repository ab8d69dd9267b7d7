//! Error types for the spectral core.

use std::fmt;

/// Errors raised by the sample window and analysis pipeline.
///
/// All variants describe caller bugs (bad channel layout, bad window size).
/// Callers validate configuration once up front and treat these as fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpectrumError {
    /// Channel count of zero, or one that does not evenly divide the window
    InvalidChannelCount { channels: usize, capacity: usize },

    /// Channel index outside `0..channels`
    InvalidChannel { channel: usize, channels: usize },

    /// Window or transform length that is not a power of two
    NotPowerOfTwo(usize),
}

impl fmt::Display for SpectrumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpectrumError::InvalidChannelCount { channels, capacity } => write!(
                f,
                "Invalid channel count {} for a window of {} samples",
                channels, capacity
            ),
            SpectrumError::InvalidChannel { channel, channels } => write!(
                f,
                "Channel index {} out of range (0-{})",
                channel,
                channels.saturating_sub(1)
            ),
            SpectrumError::NotPowerOfTwo(len) => {
                write!(f, "Length {} is not a power of two", len)
            }
        }
    }
}

impl std::error::Error for SpectrumError {}
