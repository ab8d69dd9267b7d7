//! Full-screen error display.
//!
//! Shown when the live view cannot start or fails mid-session, so the message
//! is not lost when the alternate screen is torn down.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io::{self, Stdout};

/// Error screen with a titled, centered message.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl ErrorScreen {
    /// Creates a new error screen and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(ErrorScreen {
            terminal,
            active: true,
        })
    }

    /// Displays `title` and a (possibly multi-line) message until a key is pressed.
    ///
    /// # Errors
    /// - If terminal rendering or event polling fails
    pub fn show_error(&mut self, title: &str, message: &str) -> anyhow::Result<()> {
        let body = format!("{message}\n\nPress any key to exit.");

        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                let style = Style::default()
                    .fg(Color::Rgb(255, 255, 255))
                    .bg(Color::Rgb(120, 20, 40));

                let block = Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {title} "))
                    .style(style);

                let paragraph = Paragraph::new(Text::from(body.as_str()))
                    .block(block)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true });

                let width = (area.width * 80) / 100;
                let height = (area.height / 2).max(5).min(area.height);
                let popup = Rect {
                    x: area.x + (area.width - width) / 2,
                    y: area.y + (area.height - height) / 2,
                    width,
                    height,
                };

                frame.render_widget(paragraph, popup);
            })?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Leaves alternate screen mode. Safe to call more than once.
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

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
