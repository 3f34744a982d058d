use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tic_tac_explode::{GameSession, Grid, Position, SessionEvent, SessionState, Settings};
use tracing::Level;

const HELP: &str = "Commands:
  size N [M]    choose an NxN board with M mines (N by default)
  start         start the game
  o ROW,COLUMN  uncover a cell (e.g. `o 3,5` for the 6th cell on the 4th line)
  reset         go back to choosing the board
  show          print the board again
  quit          leave";

/// Plays the game in the terminal, one command per line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    size: Option<u8>,
    #[arg(short, long)]
    mines: Option<u16>,
    /// A TOML settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: Level,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Event(SessionEvent),
    Show,
    Quit,
}

fn parse_command(input: &str) -> Option<Command> {
    let mut words = input.split_whitespace();

    let command = match words.next()? {
        "size" => {
            let size = words.next()?.parse().ok()?;
            let mines = match words.next() {
                Some(mines) => Some(mines.parse().ok()?),
                None => None,
            };
            Command::Event(SessionEvent::ChooseSize { size, mines })
        }
        "start" => Command::Event(SessionEvent::StartGame),
        // the coordinates may be spaced out, like `o 3, 5`
        "o" => Command::Event(SessionEvent::ClickCell(parse_position(
            &words.by_ref().collect::<String>(),
        )?)),
        "reset" => Command::Event(SessionEvent::Reset),
        "show" => Command::Show,
        "quit" | "q" => Command::Quit,
        _ => return None,
    };

    words.next().is_none().then_some(command)
}

fn parse_position(input: &str) -> Option<Position> {
    let (row, column) = input.split_once(',')?;

    Some(Position::new(
        row.trim().parse().ok()?,
        column.trim().parse().ok()?,
    ))
}

fn print_state(state: &SessionState) {
    match state {
        SessionState::PreGame { config } => println!(
            "A {0}x{0} board with {1} mines. Type `start` to begin.",
            config.size, config.mines
        ),
        SessionState::OpeningGame { config, duration } => {
            println!("{}Time: {duration}", Grid::opening(config.size))
        }
        SessionState::ActiveGame { grid, duration, .. } => println!("{grid}Time: {duration}"),
        SessionState::EndGame {
            grid,
            duration,
            outcome,
            ..
        } => println!("{grid}{outcome:?} in {duration}! Type `reset` to play again."),
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| eyre!(error))?;

    let settings =
        Settings::load_or_default(args.config.as_ref())?.with_overrides(args.size, args.mines);
    let mut session = GameSession::with_ticker(settings.game_config()?, settings.tick_interval());

    println!("{HELP}\n");
    print_state(session.state());

    for line in io::stdin().lock().lines() {
        let line = line?;
        // account for the time spent typing
        session.pump_timer();

        let Some(command) = parse_command(&line) else {
            println!("Incorrect input! Please, try again.");
            continue;
        };

        match command {
            Command::Quit => break,
            Command::Show => print_state(session.state()),
            Command::Event(event) => match session.handle(event) {
                Ok(state) => print_state(state),
                Err(error) => println!("Can't do that: {error}"),
            },
        }

        io::stdout().flush()?;
    }

    Ok(())
}
