//! Reduces a frequency-domain sequence to chartable real values.
//!
//! [`to_magnitude`] keeps the amplitude of each bin and drops phase; nothing
//! here can reconstruct the signal. Decibel scaling and auto-scaling live
//! alongside it for the chart, with the zero-magnitude clamp applied before
//! any logarithm.

use rustfft::num_complex::Complex32;

/// `10 / ln(10)`: converts a natural log of an intensity ratio to decibels.
const DB_PER_NEPER: f32 = 10.0 / std::f32::consts::LN_10;

/// Initial running maximum for [`AutoScale`].
const INITIAL_SCALE: f32 = 32.0;

/// Euclidean norm of every bin. Zero in, exactly zero out.
pub fn to_magnitude(frequency: &[Complex32]) -> Vec<f32> {
    frequency.iter().map(|bin| bin.norm()).collect()
}

/// Decibel value of each magnitude relative to `reference_intensity`.
///
/// Magnitudes below `floor` are raised to it first, so silent bins produce a
/// finite floor value instead of negative infinity.
pub fn to_decibels(magnitudes: &[f32], reference_intensity: f32, floor: f32) -> Vec<f32> {
    magnitudes
        .iter()
        .map(|&m| DB_PER_NEPER * (m.max(floor) / reference_intensity).ln())
        .collect()
}

/// Index of the strongest bin in the lower half of the spectrum.
///
/// The upper half mirrors the lower for real input, so it is ignored. Returns
/// `None` for an empty sequence. Ties resolve to the lowest bin.
pub fn peak_bin(frequency: &[Complex32]) -> Option<usize> {
    let half = (frequency.len() / 2).max(frequency.len().min(1));

    let mut best: Option<(usize, f32)> = None;
    for (index, bin) in frequency[..half].iter().enumerate() {
        let power = bin.norm_sqr();
        if best.is_none_or(|(_, best_power)| power > best_power) {
            best = Some((index, power));
        }
    }
    best.map(|(index, _)| index)
}

/// Centre frequency in Hz of bin `k` for an `n`-point transform.
pub fn bin_frequency(k: usize, sample_rate: u32, n: usize) -> f32 {
    if n == 0 {
        return 0.0;
    }
    k as f32 * sample_rate as f32 / n as f32
}

/// Running maximum used to auto-scale the chart between frames.
///
/// Each update averages the previous scale with the current frame's maximum
/// (never below 1), so a single loud frame only moves the scale halfway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScale {
    current: f32,
}

impl AutoScale {
    pub fn new() -> Self {
        Self {
            current: INITIAL_SCALE,
        }
    }

    /// Folds one frame of magnitudes into the running maximum and returns it.
    pub fn update(&mut self, magnitudes: &[f32]) -> f32 {
        let frame_max = magnitudes.iter().copied().fold(1.0_f32, f32::max);
        self.current = (self.current + frame_max) / 2.0;
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }
}

impl Default for AutoScale {
    fn default() -> Self {
        Self::new()
    }
}
