//! Chart geometry derived from a magnitude sequence.
//!
//! Two shapes are produced: normalized `(x, y)` points on a log-frequency
//! axis, and fixed-width columns of 0-100 levels for the terminal sparkline.
//! The scaling constants are display tuning, carried in [`ChartScale`].

use super::reducer::to_decibels;

/// Decibel scaling parameters for the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartScale {
    /// Magnitude that maps to 0 dB
    pub reference_intensity: f32,
    /// Smallest magnitude fed to the logarithm
    pub floor: f32,
    /// Decibel span mapped onto the full chart height
    pub db_range: f32,
    /// Decades of bin index mapped onto the full chart width
    pub decades: f32,
}

impl Default for ChartScale {
    fn default() -> Self {
        Self {
            reference_intensity: 1e-11,
            floor: 1e-12,
            db_range: 150.0,
            decades: 3.01,
        }
    }
}

impl ChartScale {
    /// Decibel value of the magnitude floor, the bottom of the chart.
    pub fn floor_db(&self) -> f32 {
        to_decibels(&[self.floor], self.reference_intensity, self.floor)[0]
    }

    /// Decibel value of an arbitrary magnitude under this scale.
    pub fn db(&self, magnitude: f32) -> f32 {
        to_decibels(&[magnitude], self.reference_intensity, self.floor)[0]
    }
}

/// One chart vertex. `x` and `y` are in chart units, roughly `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub x: f32,
    pub y: f32,
}

/// Maps each bin to a point: `x = log10(k) / decades`, `y = dB / db_range`.
///
/// Bin 0 (DC) sits at `x = 0`.
pub fn chart_points(magnitudes: &[f32], scale: &ChartScale) -> Vec<ChartPoint> {
    let db = to_decibels(magnitudes, scale.reference_intensity, scale.floor);
    db.iter()
        .enumerate()
        .map(|(k, &value)| {
            let x = if k == 0 {
                0.0
            } else {
                (k as f32).log10() / scale.decades
            };
            ChartPoint {
                x,
                y: value / scale.db_range,
            }
        })
        .collect()
}

/// Frequency layout for [`columns`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnLayout {
    pub sample_rate: u32,
    /// Length of the transform the magnitudes came from
    pub transform_len: usize,
    pub min_frequency: f32,
    pub max_frequency: f32,
}

/// Distributes the lower-half magnitudes over `width` log-spaced columns.
///
/// Each column averages the bins in its frequency band, converts to dB and
/// normalizes between the chart floor and `top_db` into `0..=100`. Bands above
/// Nyquist, or a layout with no usable range, render as zero.
pub fn columns(
    magnitudes: &[f32],
    layout: &ColumnLayout,
    width: usize,
    scale: &ChartScale,
    top_db: f32,
) -> Vec<u64> {
    let mut result = vec![0u64; width];
    if magnitudes.is_empty() || layout.transform_len == 0 || width == 0 {
        return result;
    }

    let nyquist = layout.sample_rate as f32 / 2.0;
    let min_freq = layout.min_frequency.max(f32::MIN_POSITIVE);
    let max_freq = layout.max_frequency.min(nyquist);
    if min_freq >= max_freq {
        return result;
    }

    let resolution = layout.sample_rate as f32 / layout.transform_len as f32;
    let ratio = max_freq / min_freq;
    let floor_db = scale.floor_db();
    let span = (top_db - floor_db).max(f32::EPSILON);

    for (column, level) in result.iter_mut().enumerate() {
        let low = min_freq * ratio.powf(column as f32 / width as f32);
        let high = min_freq * ratio.powf((column + 1) as f32 / width as f32);

        let start_bin = (low / resolution) as usize;
        if start_bin >= magnitudes.len() {
            break;
        }
        let end_bin = ((high / resolution).ceil() as usize)
            .max(start_bin + 1)
            .min(magnitudes.len());

        let band = &magnitudes[start_bin..end_bin];
        let average = band.iter().sum::<f32>() / band.len() as f32;
        let db = scale.db(average);

        *level = ((db - floor_db) / span * 100.0).clamp(0.0, 100.0) as u64;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_points_use_log_frequency_axis() {
        let scale = ChartScale::default();
        let points = chart_points(&[1.0; 1001], &scale);

        assert_eq!(points[0].x, 0.0);
        assert_eq!(points[1].x, 0.0);
        assert!((points[10].x - 1.0 / 3.01).abs() < 1e-5);
        assert!((points[1000].x - 3.0 / 3.01).abs() < 1e-5);
    }

    #[test]
    fn test_chart_points_scale_decibels() {
        let scale = ChartScale::default();
        let points = chart_points(&[1e-11, 0.0], &scale);

        assert!(points[0].y.abs() < 1e-5);
        // Zero magnitude clamps to the floor: -10 dB / 150
        assert!((points[1].y + 10.0 / 150.0).abs() < 1e-4);
    }

    #[test]
    fn test_columns_of_silence_are_empty() {
        let scale = ChartScale::default();
        let layout = ColumnLayout {
            sample_rate: 48000,
            transform_len: 2048,
            min_frequency: 20.0,
            max_frequency: 20000.0,
        };
        let top = scale.floor_db() + scale.db_range;

        let levels = columns(&[0.0; 1024], &layout, 40, &scale, top);
        assert_eq!(levels, vec![0u64; 40]);
    }

    #[test]
    fn test_columns_place_tone_in_matching_band() {
        let scale = ChartScale::default();
        let layout = ColumnLayout {
            sample_rate: 8000,
            transform_len: 1024,
            min_frequency: 100.0,
            max_frequency: 4000.0,
        };
        let top = scale.floor_db() + scale.db_range;

        // 1000 Hz at 7.8125 Hz per bin
        let mut magnitudes = vec![0.0f32; 512];
        magnitudes[128] = 100.0;

        let levels = columns(&magnitudes, &layout, 16, &scale, top);
        let loudest = *levels.iter().max().unwrap();

        // log-spaced: column = 16 * ln(1000/100) / ln(40)
        assert_eq!(levels[9], loudest);
        assert!(loudest > 50);
        assert_eq!(levels[0], 0);
        assert_eq!(levels[15], 0);
    }

    #[test]
    fn test_columns_with_empty_range() {
        let scale = ChartScale::default();
        let layout = ColumnLayout {
            sample_rate: 8000,
            transform_len: 1024,
            min_frequency: 5000.0,
            max_frequency: 6000.0,
        };
        let levels = columns(&[1.0; 512], &layout, 8, &scale, 140.0);
        assert_eq!(levels, vec![0u64; 8]);
    }
}
