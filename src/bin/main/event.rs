//! The terminal events reader.

use color_eyre::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// The terminal events.
#[derive(Clone, Copy, Debug)]
pub enum Event {
    /// Emitted once per tick rate, whether anything has happened or not.
    Tick,
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
}

/// Polls the terminal for events in a separate thread and queues them up.
#[derive(Debug)]
pub struct EventHandler {
    receiver: mpsc::Receiver<Event>,
}

impl EventHandler {
    /// Starts polling. `tick_rate` (in milliseconds) is how often [`Event::Tick`] is emitted.
    pub fn new(tick_rate: u64) -> Self {
        let tick_rate = Duration::from_millis(tick_rate);
        let (sender, receiver) = mpsc::channel();

        thread::spawn(move || {
            if let Err(error) = poll(tick_rate, sender) {
                tracing::error!(%error, "terminal events polling failed");
            }
        });

        EventHandler { receiver }
    }

    /// Blocks until the next event arrives. Fails once the polling thread is gone.
    pub fn next(&self) -> Result<Event> {
        Ok(self.receiver.recv()?)
    }
}

/// Returns once nobody listens to the events anymore.
fn poll(tick_rate: Duration, sender: mpsc::Sender<Event>) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());

        if event::poll(timeout)? {
            let event = match event::read()? {
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
                CrosstermEvent::Mouse(mouse) => Some(Event::Mouse(mouse)),
                CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
                _ => None,
            };

            if let Some(event) = event {
                if sender.send(event).is_err() {
                    return Ok(());
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            if sender.send(Event::Tick).is_err() {
                return Ok(());
            }
            last_tick = Instant::now();
        }
    }
}
