pub mod app;
pub mod event;
pub mod game_ui;
pub mod menu_ui;
pub mod tui;
pub mod update;

use app::App;
use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use event::{Event, EventHandler};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tic_tac_explode::{GameSession, Settings};
use tracing::Level;
use tui::Tui;
use update::update;

/// How often the screen gets redrawn and the game clock gets checked, in milliseconds.
const UI_TICK_RATE: u64 = 100;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The side length of the square board.
    #[arg(short, long)]
    size: Option<u8>,
    /// The amount of mines. Defaults to the board's side length.
    #[arg(short, long)]
    mines: Option<u16>,
    /// A TOML settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Where to write the logs. Nothing is logged without it, since the terminal is taken by the game.
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: Level,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Some(log_file) = &args.log_file {
        init_logging(log_file, args.log_level)?;
    }

    let settings =
        Settings::load_or_default(args.config.as_ref())?.with_overrides(args.size, args.mines);
    let session = GameSession::with_ticker(settings.game_config()?, settings.tick_interval());

    // with the whole board given on the command line, there's nothing to choose in the menu
    let skip_menu = args.size.is_some() && args.mines.is_some();
    let mut app = App::new(session, skip_menu)?;

    let backend = CrosstermBackend::new(std::io::stderr());
    let terminal = Terminal::new(backend)?;
    let events = EventHandler::new(UI_TICK_RATE);
    let mut tui = Tui::new(terminal, events);
    tui.enter()?;

    let result = run(&mut tui, &mut app);

    // restore the terminal even if the loop has failed
    tui.exit()?;
    result
}

fn run(tui: &mut Tui, app: &mut App) -> Result<()> {
    while !app.should_quit {
        tui.draw(app)?;

        match tui.events.next()? {
            Event::Tick => app.tick(),
            Event::Key(key_event) => update(app, key_event)?,
            Event::Mouse(_) => {}
            Event::Resize(_, _) => {}
        };
    }

    Ok(())
}

fn init_logging(path: &Path, level: Level) -> Result<()> {
    let file = File::create(path)?;

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|error| eyre!(error))?;

    tracing::debug!(path = %path.display(), "logging started");
    Ok(())
}
