//! Live spectrum view.
//!
//! Opens the capture device, then once per frame drains captured packets into
//! the rolling window, analyzes the selected channel and redraws the chart.
//! The window, transform and reducer all run on this thread.

use std::time::Duration;

use crate::capture::AudioCapture;
use crate::config::{self, ChannelChoice};
use crate::spectrum::{ChannelSelection, SampleWindow, SpectrumAnalyzer};
use crate::ui::{ErrorScreen, SessionInfo, SpectrumTui, ViewCommand};

/// Frames between periodic debug log lines.
const LOG_EVERY_FRAMES: u64 = 300;

/// Runs the live spectrum view until the user quits.
///
/// `channel` overrides the configured channel.
///
/// # Errors
/// - If configuration is invalid
/// - If the capture device cannot be opened or its layout does not fit the window
/// - If terminal rendering fails
pub fn handle_live(channel: Option<usize>) -> Result<(), anyhow::Error> {
    tracing::info!("=== orbscope live view started ===");

    let config_data = match config::OrbscopeConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            show_error(
                "Configuration Error",
                &format!("{err}\n\nPlease check your ~/.config/orbscope/orbscope.toml file."),
            )?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, source={}, window={}, engine={:?}",
        config_data.audio.device,
        config_data.audio.source,
        config_data.analysis.window_size,
        config_data.analysis.engine
    );

    let mut capture = AudioCapture::new(config_data.audio.device.clone(), config_data.audio.source);
    if let Err(e) = capture.start() {
        tracing::error!("Failed to start capture: {}", e);
        show_error(
            "Capture Error",
            &format!("{e}\n\nPlease check your audio configuration and try again."),
        )?;
        return Err(e);
    }

    let channel_choice = channel
        .map(ChannelChoice::Index)
        .unwrap_or(config_data.audio.channel);
    let window_size = config_data.analysis.window_size;

    let selection = match resolve_selection(channel_choice, window_size, capture.channels()) {
        Ok(selection) => selection,
        Err(e) => {
            capture.stop();
            tracing::error!("Unusable channel layout: {}", e);
            show_error("Channel Layout Error", &e.to_string())?;
            return Err(e);
        }
    };

    let sample_rate = capture.sample_rate();
    let mut window = SampleWindow::new(window_size)?;

    let mut tui = SpectrumTui::new(SessionInfo {
        sample_rate,
        channel: selection.channel,
        channels: selection.channels,
        window_size,
    })?;

    let analysis = &config_data.analysis;
    let mut analyzer = SpectrumAnalyzer::new(
        analysis.engine.build(),
        analysis.chart_scale(),
        (analysis.min_frequency, analysis.max_frequency),
        tui.width(),
    )
    .with_auto_scale(config_data.display.auto_scale)
    .with_smoothing(config_data.display.smoothing);

    let frame_interval = Duration::from_millis(config_data.display.frame_interval_ms);

    tracing::debug!(
        "Entering render loop: {}-point transforms of channel {} at {}Hz",
        selection.transform_len(window_size),
        selection.channel,
        sample_rate
    );

    let mut session = LiveSession {
        capture: &capture,
        tui: &mut tui,
        analyzer: &mut analyzer,
        window: &mut window,
        selection,
        sample_rate,
        frame_interval,
    };
    let result = session.run();

    capture.stop();
    tui.cleanup()?;

    let frame_count = finish_session(result, show_error)?;
    tracing::info!("=== orbscope live view exited after {} frames ===", frame_count);
    Ok(())
}

/// Everything the render loop touches, borrowed for the length of the session.
struct LiveSession<'a> {
    capture: &'a AudioCapture,
    tui: &'a mut SpectrumTui,
    analyzer: &'a mut SpectrumAnalyzer,
    window: &'a mut SampleWindow,
    selection: ChannelSelection,
    sample_rate: u32,
    frame_interval: Duration,
}

impl LiveSession<'_> {
    /// Runs frames until the user quits. Returns the number of frames drawn.
    ///
    /// # Errors
    /// - If terminal input or rendering fails
    /// - If the analyzer rejects the window layout
    fn run(&mut self) -> anyhow::Result<u64> {
        let mut frame_count = 0u64;
        let mut drained_samples = 0usize;

        loop {
            match self.tui.handle_input(self.frame_interval)? {
                ViewCommand::Continue => {}
                ViewCommand::Quit => break,
                ViewCommand::TogglePause => {
                    self.capture.toggle_pause();
                    self.tui.is_paused = self.capture.is_paused();
                }
            }

            let stats = self.capture.drain_into(self.window);
            drained_samples += stats.samples;

            if let Some(width) = self.tui.poll_resize()? {
                self.analyzer.resize(width);
            }

            self.analyzer
                .update(self.window, self.selection, self.sample_rate)?;
            self.tui.render(self.analyzer)?;

            frame_count += 1;
            if frame_count % LOG_EVERY_FRAMES == 0 {
                tracing::debug!(
                    "Frame {}: {} samples drained since last report, {} total through window",
                    frame_count,
                    drained_samples,
                    self.window.samples_appended()
                );
                drained_samples = 0;
            }
        }

        Ok(frame_count)
    }
}

/// Reports a failed session on the error screen once the view is torn down.
///
/// # Errors
/// - The session's own error, after it has been shown
/// - If the error screen itself fails
fn finish_session<F>(result: anyhow::Result<u64>, report: F) -> anyhow::Result<u64>
where
    F: FnOnce(&str, &str) -> anyhow::Result<()>,
{
    match result {
        Ok(frame_count) => Ok(frame_count),
        Err(e) => {
            tracing::error!("Live view failed: {e:#}");
            report(
                "Live View Error",
                &format!("{e:#}\n\nThe live view stopped. See 'orbscope logs' for details."),
            )?;
            Err(e)
        }
    }
}

/// Resolves the configured channel against the device layout.
///
/// # Errors
/// - If the channel does not exist on the device
/// - If the device channel count cannot split the window into power-of-two channels
fn resolve_selection(
    choice: ChannelChoice,
    window_size: usize,
    channels: usize,
) -> anyhow::Result<ChannelSelection> {
    let channel = choice.resolve(channels)?;
    ChannelSelection::for_window(window_size, channel, channels).map_err(|e| {
        anyhow::anyhow!(
            "{e}. The device delivers {channels} channels; the window size must split into equal power-of-two channels."
        )
    })
}

fn show_error(title: &str, message: &str) -> anyhow::Result<()> {
    let mut error_screen = ErrorScreen::new()?;
    error_screen.show_error(title, message)?;
    error_screen.cleanup()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::file::NamedChannel;

    #[test]
    fn test_resolve_selection_for_stereo() {
        let selection =
            resolve_selection(ChannelChoice::Named(NamedChannel::Last), 4096, 2).unwrap();
        assert_eq!(selection, ChannelSelection { channel: 1, channels: 2 });
    }

    #[test]
    fn test_resolve_selection_rejects_six_channels() {
        let err = resolve_selection(ChannelChoice::default(), 4096, 6).unwrap_err();
        assert!(err.to_string().contains("6 channels"));
    }

    #[test]
    fn test_resolve_selection_rejects_missing_channel() {
        assert!(resolve_selection(ChannelChoice::Index(2), 4096, 2).is_err());
    }

    #[test]
    fn test_failed_session_is_shown_before_returning() {
        let mut shown = Vec::new();
        let result = finish_session(Err(anyhow::anyhow!("render failed")), |title, message| {
            shown.push((title.to_string(), message.to_string()));
            Ok(())
        });

        assert_eq!(result.unwrap_err().to_string(), "render failed");
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, "Live View Error");
        assert!(shown[0].1.starts_with("render failed"));
    }

    #[test]
    fn test_clean_session_shows_nothing() {
        let mut called = false;
        let frames = finish_session(Ok(42), |_, _| {
            called = true;
            Ok(())
        })
        .unwrap();

        assert_eq!(frames, 42);
        assert!(!called);
    }
}
