//! Per-frame spectrum analysis over the rolling sample window.
//!
//! Runs extract → forward transform → magnitude → chart columns once per
//! frame and keeps the display state (smoothed columns, auto-scale, peak)
//! between frames.

use super::chart::{columns, ChartScale, ColumnLayout};
use super::error::SpectrumError;
use super::reducer::{bin_frequency, peak_bin, to_magnitude, AutoScale};
use super::transform::{is_power_of_two, TransformEngine};
use super::window::SampleWindow;

/// Stateful spectrum analyzer owning the transform engine and display state.
pub struct SpectrumAnalyzer {
    engine: TransformEngine,
    scale: ChartScale,
    auto_scale: Option<AutoScale>,
    smoothing: bool,
    min_frequency: f32,
    max_frequency: f32,
    display_data: Vec<u64>,
    num_columns: usize,
    peak_frequency: Option<f32>,
}

/// Which channel of the window to analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSelection {
    pub channel: usize,
    pub channels: usize,
}

impl ChannelSelection {
    /// Checks a channel layout against a window size once, up front.
    ///
    /// The extracted channel must itself be a power-of-two length for the
    /// transform, so `channels` must be a power of two that divides the window.
    ///
    /// # Errors
    /// - If `channels` is zero, not a power of two, or does not divide the window
    /// - If `channel >= channels`
    pub fn for_window(
        window_size: usize,
        channel: usize,
        channels: usize,
    ) -> Result<Self, SpectrumError> {
        if channels == 0 || !is_power_of_two(channels) || window_size % channels != 0 {
            return Err(SpectrumError::InvalidChannelCount {
                channels,
                capacity: window_size,
            });
        }
        if channel >= channels {
            return Err(SpectrumError::InvalidChannel { channel, channels });
        }
        Ok(Self { channel, channels })
    }

    /// Samples per channel in a window of `window_size`.
    pub fn transform_len(&self, window_size: usize) -> usize {
        window_size / self.channels
    }
}

impl SpectrumAnalyzer {
    /// Creates an analyzer producing `num_columns` display columns.
    pub fn new(
        engine: TransformEngine,
        scale: ChartScale,
        frequency_range: (f32, f32),
        num_columns: usize,
    ) -> Self {
        Self {
            engine,
            scale,
            auto_scale: None,
            smoothing: true,
            min_frequency: frequency_range.0,
            max_frequency: frequency_range.1,
            display_data: vec![0u64; num_columns],
            num_columns,
            peak_frequency: None,
        }
    }

    /// Scales the chart to a running maximum instead of the fixed dB range.
    pub fn with_auto_scale(mut self, enabled: bool) -> Self {
        self.auto_scale = enabled.then(AutoScale::new);
        self
    }

    /// Averages each frame with the previous one to reduce jitter.
    pub fn with_smoothing(mut self, enabled: bool) -> Self {
        self.smoothing = enabled;
        self
    }

    /// Analyzes the current window contents for one channel.
    ///
    /// # Errors
    /// - If the channel selection does not fit the window layout
    pub fn update(
        &mut self,
        window: &SampleWindow,
        selection: ChannelSelection,
        sample_rate: u32,
    ) -> Result<(), SpectrumError> {
        let samples = window.extract_channel(selection.channel, selection.channels)?;
        let frequency = self.engine.forward(&samples);

        self.peak_frequency =
            peak_bin(&frequency).map(|k| bin_frequency(k, sample_rate, frequency.len()));

        let magnitudes = to_magnitude(&frequency[..frequency.len() / 2]);
        let top_db = match self.auto_scale.as_mut() {
            Some(auto) => self.scale.db(auto.update(&magnitudes)),
            None => self.scale.floor_db() + self.scale.db_range,
        };

        let layout = ColumnLayout {
            sample_rate,
            transform_len: frequency.len(),
            min_frequency: self.min_frequency,
            max_frequency: self.max_frequency,
        };
        let new_columns = columns(&magnitudes, &layout, self.num_columns, &self.scale, top_db);

        if self.smoothing {
            for (old_val, new_val) in self.display_data.iter_mut().zip(new_columns.iter()) {
                *old_val = (*old_val + *new_val) / 2;
            }
        } else {
            self.display_data = new_columns;
        }

        Ok(())
    }

    /// Resizes the analyzer for a new terminal width. Columns restart at zero
    /// and refill on the next update.
    pub fn resize(&mut self, new_width: usize) {
        self.num_columns = new_width;
        self.display_data = vec![0u64; new_width];
    }

    /// Returns the current display columns, each `0..=100`.
    pub fn data(&self) -> &[u64] {
        &self.display_data
    }

    /// Frequency of the strongest bin in the last analyzed frame.
    pub fn peak_frequency(&self) -> Option<f32> {
        self.peak_frequency
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }
}
