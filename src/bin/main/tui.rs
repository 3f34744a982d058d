//! The terminal user interface: setting the terminal up, drawing into it and restoring it afterwards.

use crate::event::EventHandler;
use color_eyre::Result;
use crossterm::cursor;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::io::{self, Stderr};
use std::panic;

pub type CrosstermTerminal = Terminal<CrosstermBackend<Stderr>>;

/// Anything that knows how to draw itself into a frame.
pub trait Render {
    fn render(&mut self, frame: &mut Frame);
}

pub struct Tui {
    terminal: CrosstermTerminal,
    pub events: EventHandler,
}

impl Tui {
    pub fn new(terminal: CrosstermTerminal, events: EventHandler) -> Self {
        Tui { terminal, events }
    }

    /// Switches the terminal to the raw mode and the alternate screen.
    ///
    /// A panic restores the terminal before the previous panic hook reports it.
    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(io::stderr(), EnterAlternateScreen, cursor::Hide)?;

        let panic_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            // nothing better to do if even that fails
            let _ = Self::reset();
            panic_hook(info);
        }));

        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        Ok(())
    }

    fn reset() -> Result<()> {
        terminal::disable_raw_mode()?;
        crossterm::execute!(io::stderr(), LeaveAlternateScreen, cursor::Show)?;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        Self::reset()?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    pub fn draw(&mut self, app: &mut impl Render) -> Result<()> {
        self.terminal.draw(|frame| app.render(frame))?;
        Ok(())
    }
}
