//! Terminal spectrum view.
//!
//! Renders the analyzer's columns as a sparkline on a log-frequency axis with
//! a one-line status footer, and maps key presses to view commands.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    style::{Color, Style},
    text::Span,
    widgets::{Paragraph, Sparkline},
};
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

use crate::spectrum::SpectrumAnalyzer;

/// User input during the live view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    /// Keep running (no key pressed)
    Continue,
    /// Leave the view (Escape, 'q' or Ctrl+C)
    Quit,
    /// Pause/resume capture (Space)
    TogglePause,
}

/// Static facts about the session shown in the footer.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub sample_rate: u32,
    pub channel: usize,
    pub channels: usize,
    pub window_size: usize,
}

/// Terminal UI for the live spectrum.
pub struct SpectrumTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    terminal_width: usize,
    session: SessionInfo,
    started: Instant,
    /// Whether capture is currently paused
    pub is_paused: bool,
    active: bool,
}

impl SpectrumTui {
    /// Creates the view and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode or the alternate screen cannot be entered
    pub fn new(session: SessionInfo) -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        let terminal_width = terminal.size()?.width as usize;

        Ok(SpectrumTui {
            terminal,
            terminal_width,
            session,
            started: Instant::now(),
            is_paused: false,
            active: true,
        })
    }

    /// Current terminal width in columns.
    pub fn width(&self) -> usize {
        self.terminal_width
    }

    /// Returns the new width if the terminal was resized since the last call.
    ///
    /// # Errors
    /// - If the terminal size cannot be queried
    pub fn poll_resize(&mut self) -> anyhow::Result<Option<usize>> {
        let current_width = self.terminal.size()?.width as usize;
        if current_width != self.terminal_width {
            tracing::debug!("Terminal resized to {} columns", current_width);
            self.terminal_width = current_width;
            return Ok(Some(current_width));
        }
        Ok(None)
    }

    /// Draws one frame.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, analyzer: &SpectrumAnalyzer) -> anyhow::Result<()> {
        let footer = footer_line(
            &self.session,
            analyzer.peak_frequency(),
            analyzer.engine_name(),
            self.is_paused,
            self.started.elapsed(),
        );
        let data = analyzer.data();

        self.terminal.draw(|frame| {
            let area = frame.area();
            let footer_height = 1;

            let chart_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(footer_height),
            };

            let sparkline = Sparkline::default().data(data).max(100).style(
                Style::default()
                    .bg(Color::Rgb(10, 0, 20))
                    .fg(Color::Rgb(190, 120, 255)),
            );
            frame.render_widget(sparkline, chart_area);

            let footer_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(footer_height),
                width: area.width,
                height: footer_height,
            };
            let footer = Paragraph::new(footer).style(
                Style::default()
                    .fg(Color::Rgb(200, 190, 220))
                    .bg(Color::Rgb(0, 0, 0)),
            );
            frame.render_widget(footer, footer_area);
        })?;

        Ok(())
    }

    /// Polls for a key press for up to `timeout`.
    ///
    /// The pause indicator is not touched here; the session sets `is_paused`
    /// from the capture state.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> anyhow::Result<ViewCommand> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                return Ok(command_for_key(key));
            }
        }
        Ok(ViewCommand::Continue)
    }

    /// Restores the terminal. Safe to call more than once.
    ///
    /// # Errors
    /// - If terminal mode cannot be restored
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for SpectrumTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Maps a key press to a view command.
fn command_for_key(key: KeyEvent) -> ViewCommand {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            tracing::debug!("Escape or 'q' pressed: leaving view");
            ViewCommand::Quit
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            tracing::debug!("Ctrl+C pressed: leaving view");
            ViewCommand::Quit
        }
        KeyCode::Char(' ') => ViewCommand::TogglePause,
        _ => ViewCommand::Continue,
    }
}

/// Builds the footer: state indicator, elapsed time, peak and session facts.
fn footer_line(
    session: &SessionInfo,
    peak_frequency: Option<f32>,
    engine: &str,
    is_paused: bool,
    elapsed: Duration,
) -> Line<'static> {
    let indicator = if is_paused {
        Span::styled("⏸ ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("● ", Style::default().fg(Color::Rgb(190, 120, 255)))
    };

    let secs = elapsed.as_secs();
    let peak = match peak_frequency {
        Some(hz) if !is_paused => format!("{hz:.0}Hz"),
        _ => "-".to_string(),
    };

    Line::from(vec![
        indicator,
        Span::raw(format!("{}:{:02}", secs / 60, secs % 60)),
        Span::raw(" / peak "),
        Span::raw(peak),
        Span::raw(format!(
            " / {}Hz ch {}/{} / {} samples / {}",
            session.sample_rate,
            session.channel + 1,
            session.channels,
            session.window_size,
            engine
        )),
    ])
}
