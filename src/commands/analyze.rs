//! Offline analysis of a WAV file.
//!
//! Streams the file through the same rolling window the live view uses, in
//! fixed-size packets, then transforms the final window contents and reports
//! the peak frequency and strongest bins.

use anyhow::anyhow;
use std::path::Path;

use crate::config::{self, AnalysisConfig, ChannelChoice};
use crate::spectrum::chart::{chart_points, ChartPoint};
use crate::spectrum::reducer::{bin_frequency, peak_bin, to_magnitude};
use crate::spectrum::{ChannelSelection, SampleWindow};

/// Number of strongest bins listed in the report.
const TOP_BINS: usize = 5;

/// Interleaved samples decoded from a WAV file.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

/// One of the strongest bins of the analyzed window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinReport {
    pub frequency: f32,
    pub magnitude: f32,
    /// Position on the log-frequency / decibel chart
    pub chart: ChartPoint,
}

/// Result of analyzing one window of audio.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub sample_rate: u32,
    pub channel: usize,
    pub transform_len: usize,
    pub peak_frequency: Option<f32>,
    /// Strongest lower-half bins, loudest first
    pub strongest: Vec<BinReport>,
    /// Largest `|inverse(forward(x)) - x|` when the round trip was requested
    pub round_trip_error: Option<f32>,
}

/// Analyzes an audio file and prints the report.
///
/// # Errors
/// - If configuration is invalid
/// - If the file cannot be decoded
/// - If the channel layout does not fit the configured window
pub fn handle_analyze(
    file: &Path,
    channel: Option<usize>,
    round_trip: bool,
    packet_frames: usize,
) -> Result<(), anyhow::Error> {
    let config_data = config::OrbscopeConfig::load()?;
    let audio = read_wav(file)?;

    tracing::info!(
        "Analyzing {}: {} samples, {} channels at {}Hz",
        file.display(),
        audio.samples.len(),
        audio.channels,
        audio.sample_rate
    );

    let choice = channel
        .map(ChannelChoice::Index)
        .unwrap_or(config_data.audio.channel);
    let channel_index = choice.resolve(audio.channels)?;

    let report = analyze_samples(
        &audio,
        &config_data.analysis,
        channel_index,
        packet_frames,
        round_trip,
    )?;

    println!();
    println!("File:        {}", file.display());
    println!("Sample rate: {}Hz", report.sample_rate);
    println!(
        "Window:      {} samples of channel {} ({}-point transform)",
        config_data.analysis.window_size,
        report.channel + 1,
        report.transform_len
    );
    match report.peak_frequency {
        Some(hz) => println!("Frequency peaked at {hz:.1} Hz"),
        None => println!("Frequency peak: none (empty window)"),
    }
    println!();
    println!("Strongest bins:         magnitude   chart x   chart y");
    for bin in &report.strongest {
        println!(
            "  {:>10.1} Hz  {:>12.4}  {:>8.3}  {:>8.3}",
            bin.frequency, bin.magnitude, bin.chart.x, bin.chart.y
        );
    }
    if let Some(error) = report.round_trip_error {
        println!();
        println!("Round trip max error: {error:.3e}");
    }

    Ok(())
}

/// Decodes a WAV file into interleaved f32 samples in `-1.0..=1.0`.
///
/// # Errors
/// - If the file cannot be opened or decoded
pub fn read_wav(path: &Path) -> anyhow::Result<DecodedAudio> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| anyhow!("Failed to open {}: {e}", path.display()))?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(DecodedAudio {
        samples,
        channels: spec.channels as usize,
        sample_rate: spec.sample_rate,
    })
}

/// Streams `audio` through a fresh window in packets of `packet_frames`
/// frames, then analyzes the final window contents.
///
/// # Errors
/// - If the window size or channel layout is invalid
pub fn analyze_samples(
    audio: &DecodedAudio,
    analysis: &AnalysisConfig,
    channel: usize,
    packet_frames: usize,
    round_trip: bool,
) -> anyhow::Result<AnalysisReport> {
    let selection = ChannelSelection::for_window(analysis.window_size, channel, audio.channels)?;
    let mut window = SampleWindow::new(analysis.window_size)?;

    let packet_len = packet_frames.max(1).saturating_mul(audio.channels);
    for packet in audio.samples.chunks(packet_len) {
        window.append(packet, audio.channels);
    }
    tracing::debug!(
        "Fed {} samples through a {}-sample window",
        window.samples_appended(),
        window.capacity()
    );

    let samples = window.extract_channel(selection.channel, selection.channels)?;
    let mut engine = analysis.engine.build();
    let frequency = engine.forward(&samples);
    let n = frequency.len();

    let peak_frequency = peak_bin(&frequency).map(|k| bin_frequency(k, audio.sample_rate, n));

    let magnitudes = to_magnitude(&frequency[..n / 2]);
    let points = chart_points(&magnitudes, &analysis.chart_scale());
    let mut ranked: Vec<(usize, f32)> = magnitudes.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let strongest = ranked
        .into_iter()
        .take(TOP_BINS)
        .map(|(k, magnitude)| BinReport {
            frequency: bin_frequency(k, audio.sample_rate, n),
            magnitude,
            chart: points[k],
        })
        .collect();

    let round_trip_error = round_trip.then(|| {
        let restored = engine.inverse(&frequency);
        restored
            .iter()
            .zip(samples.iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0f32, f32::max)
    });

    Ok(AnalysisReport {
        sample_rate: audio.sample_rate,
        channel: selection.channel,
        transform_len: n,
        peak_frequency,
        strongest,
        round_trip_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineKind;
    use std::f32::consts::TAU;

    fn tone(frequency: f32, sample_rate: u32, frames: usize, channels: usize) -> Vec<f32> {
        (0..frames)
            .flat_map(|i| {
                let value = (TAU * frequency * i as f32 / sample_rate as f32).sin() * 0.5;
                std::iter::once(value).chain(std::iter::repeat_n(0.0, channels - 1))
            })
            .collect()
    }

    fn analysis(window_size: usize, engine: EngineKind) -> AnalysisConfig {
        AnalysisConfig {
            window_size,
            engine,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_reports_tone_peak() {
        let audio = DecodedAudio {
            samples: tone(1500.0, 16000, 5000, 1),
            channels: 1,
            sample_rate: 16000,
        };

        let report =
            analyze_samples(&audio, &analysis(1024, EngineKind::Recursive), 0, 441, true).unwrap();

        // 1500 Hz is bin 96 of a 1024-point transform at 16kHz
        assert_eq!(report.transform_len, 1024);
        assert_eq!(report.peak_frequency, Some(1500.0));
        assert_eq!(report.strongest.len(), TOP_BINS);
        assert_eq!(report.strongest[0].frequency, 1500.0);
        assert!(report.strongest[0].chart.x > 0.6);
        assert!(report.round_trip_error.unwrap() < 1e-4);
    }

    #[test]
    fn test_analyzes_selected_channel() {
        let audio = DecodedAudio {
            samples: tone(1000.0, 8000, 3000, 2),
            channels: 2,
            sample_rate: 8000,
        };
        let config = analysis(2048, EngineKind::Planned);

        let left = analyze_samples(&audio, &config, 0, 100, false).unwrap();
        assert_eq!(left.peak_frequency, Some(1000.0));
        assert!(left.round_trip_error.is_none());

        // The right channel is silent: every bin ties at zero
        let right = analyze_samples(&audio, &config, 1, 100, false).unwrap();
        assert_eq!(right.peak_frequency, Some(0.0));
        assert!(right.strongest.iter().all(|bin| bin.magnitude == 0.0));
    }

    #[test]
    fn test_short_file_leaves_leading_zeros() {
        let audio = DecodedAudio {
            samples: vec![1.0; 10],
            channels: 1,
            sample_rate: 8000,
        };
        let report = analyze_samples(&audio, &analysis(64, EngineKind::Recursive), 0, 3, false)
            .unwrap();
        // DC bin holds the sum of the ten ones
        assert_eq!(report.strongest[0].frequency, 0.0);
        assert_eq!(report.strongest[0].magnitude, 10.0);
        assert_eq!(report.strongest[0].chart.x, 0.0);
    }

    #[test]
    fn test_huge_packet_size_feeds_whole_file() {
        let audio = DecodedAudio {
            samples: tone(1000.0, 8000, 1024, 2),
            channels: 2,
            sample_rate: 8000,
        };
        let config = analysis(64, EngineKind::Recursive);

        let whole = analyze_samples(&audio, &config, 0, usize::MAX, false).unwrap();
        let packetized = analyze_samples(&audio, &config, 0, 7, false).unwrap();
        assert_eq!(whole.peak_frequency, packetized.peak_frequency);
        assert_eq!(whole.strongest, packetized.strongest);
    }

    #[test]
    fn test_rejects_unsplittable_layout() {
        let audio = DecodedAudio {
            samples: vec![0.0; 60],
            channels: 6,
            sample_rate: 48000,
        };
        assert!(analyze_samples(&audio, &analysis(4096, EngineKind::Recursive), 0, 10, false)
            .is_err());
    }

    #[test]
    fn test_read_wav_normalizes_int_samples() {
        let path = std::env::temp_dir().join(format!("orbscope_test_{}.wav", std::process::id()));
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for sample in [16384i16, -16384, 0, 32767] {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        let audio = read_wav(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(audio.channels, 2);
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.samples.len(), 4);
        assert_eq!(audio.samples[0], 0.5);
        assert_eq!(audio.samples[1], -0.5);
        assert!((audio.samples[3] - 1.0).abs() < 1e-4);
    }
}
