pub mod config;
pub mod grid;
pub mod timer;

pub use config::{ConfigurationError, GameConfig, Settings, SettingsError};
pub use grid::{
    cell::{Cell, CellStatus, CellValue},
    position::Position,
    Grid, GridError,
};

use serde::Serialize;
use std::borrow::Cow;
use std::mem;
use std::time::Duration;
use thiserror::Error;
use timer::TickTimer;

/// The enum represents the variants of everything that can possibly go wrong during a session.
///
/// None of these is fatal: the session is left exactly as it was before the rejected event.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The board size and/or the mines amount are unacceptable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),
    /// The clicked position lies beyond the current board.
    #[error("position {0} is outside the board")]
    InvalidPosition(Position),
    /// The event makes no sense in the current state, e.g. a click before the game has started.
    #[error("`{event}` can't be handled in the `{state}` state")]
    IllegalTransition {
        state: &'static str,
        event: &'static str,
    },
}

impl From<GridError> for SessionError {
    fn from(grid_error: GridError) -> Self {
        match grid_error {
            GridError::InvalidConfiguration(error) => SessionError::InvalidConfiguration(error),
            GridError::InvalidPosition(position) => SessionError::InvalidPosition(position),
        }
    }
}

/// How a finished game ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Win,
    Lose,
}

/// The state of a session.
///
/// Every variant carries the configuration the current game was (or is going to be) started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The board is being sized, nothing has started yet.
    PreGame { config: GameConfig },
    /// The game has started and the clock is running, but the bombs are only placed on the opening click.
    OpeningGame { config: GameConfig, duration: u64 },
    /// An ongoing game.
    ActiveGame {
        config: GameConfig,
        grid: Grid,
        duration: u64,
    },
    /// A finished game with the whole board uncovered. Stays so until a reset.
    EndGame {
        config: GameConfig,
        grid: Grid,
        duration: u64,
        outcome: Outcome,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::PreGame { .. } => "PreGame",
            SessionState::OpeningGame { .. } => "OpeningGame",
            SessionState::ActiveGame { .. } => "ActiveGame",
            SessionState::EndGame { .. } => "EndGame",
        }
    }

    pub fn config(&self) -> GameConfig {
        match self {
            SessionState::PreGame { config }
            | SessionState::OpeningGame { config, .. }
            | SessionState::ActiveGame { config, .. }
            | SessionState::EndGame { config, .. } => *config,
        }
    }

    /// The amount of ticks the game has been running for.
    pub fn duration(&self) -> u64 {
        match self {
            SessionState::PreGame { .. } => 0,
            SessionState::OpeningGame { duration, .. }
            | SessionState::ActiveGame { duration, .. }
            | SessionState::EndGame { duration, .. } => *duration,
        }
    }

    /// The grid, once it exists (i.e. after the opening click).
    pub fn grid(&self) -> Option<&Grid> {
        match self {
            SessionState::ActiveGame { grid, .. } | SessionState::EndGame { grid, .. } => {
                Some(grid)
            }
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if let SessionState::EndGame { outcome, .. } = self {
            Some(*outcome)
        } else {
            None
        }
    }

    /// Whether the state belongs to the in-game superstate, the one where the clock runs.
    pub fn is_in_game(&self) -> bool {
        matches!(
            self,
            SessionState::OpeningGame { .. } | SessionState::ActiveGame { .. }
        )
    }
}

/// Describes all the events a session reacts to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Sets the board size for the next game. Without an explicit mines amount, the board gets as many mines as its
    /// side length.
    ChooseSize { size: u8, mines: Option<u16> },
    /// Starts the game with the chosen configuration.
    StartGame,
    /// Uncovers a cell. The first one also places the bombs.
    ClickCell(Position),
    /// A second (or whatever the timer's interval is) has passed.
    Tick,
    /// Abandons the current game (if any) and goes back to sizing, keeping the configuration.
    Reset,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::ChooseSize { .. } => "ChooseSize",
            SessionEvent::StartGame => "StartGame",
            SessionEvent::ClickCell(_) => "ClickCell",
            SessionEvent::Tick => "Tick",
            SessionEvent::Reset => "Reset",
        }
    }
}

/// What a view layer needs to render the session.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub state: &'static str,
    pub size: u8,
    pub mines: u16,
    pub duration: u64,
    /// Before the opening click, this is the all-covered placeholder grid.
    pub grid: Cow<'a, Grid>,
    pub outcome: Option<Outcome>,
}

/// A single play-through, from sizing the board to the end of the game, and any number of those after a reset.
///
/// The session owns the grid and the tick timer. The timer runs exactly while the session is in the in-game
/// superstate: it's started on entering [`SessionState::OpeningGame`] and dropped on every way out of it.
#[derive(Debug)]
pub struct GameSession {
    state: SessionState,
    /// `None` for sessions that only get ticks from the caller.
    tick_interval: Option<Duration>,
    timer: Option<TickTimer>,
}

impl GameSession {
    /// Creates a session without a timer of its own: the caller is expected to send [`SessionEvent::Tick`]s itself.
    pub fn new(config: GameConfig) -> Self {
        GameSession {
            state: SessionState::PreGame { config },
            tick_interval: None,
            timer: None,
        }
    }

    /// Creates a session that ticks once per `interval` while a game is on. The ticks are queued until
    /// [`GameSession::pump_timer`] is called.
    pub fn with_ticker(config: GameConfig, interval: Duration) -> Self {
        GameSession {
            tick_interval: Some(interval),
            ..GameSession::new(config)
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> GameConfig {
        self.state.config()
    }

    /// Whether the session's timer is currently running.
    pub fn is_ticking(&self) -> bool {
        self.timer.is_some()
    }

    /// The method handles the event, updates the state of the session and returns it.
    ///
    /// Might fail with a [`SessionError`], in which case nothing changes at all.
    pub fn handle(&mut self, event: SessionEvent) -> Result<&SessionState, SessionError> {
        let config = self.state.config();
        let current = mem::replace(&mut self.state, SessionState::PreGame { config });
        let from = current.name();
        let was_in_game = current.is_in_game();

        match transition(current, event) {
            Ok(next) => {
                if event == SessionEvent::Tick {
                    tracing::trace!(duration = next.duration(), "tick");
                } else {
                    tracing::debug!(from, to = next.name(), event = event.name(), "transition");
                }

                self.enter(next, was_in_game);

                Ok(&self.state)
            }
            Err((unchanged, error)) => {
                tracing::debug!(state = from, event = event.name(), %error, "event rejected");
                self.state = unchanged;

                Err(error)
            }
        }
    }

    /// Settles into the next state, starting or stopping the timer when crossing the in-game superstate's border.
    fn enter(&mut self, next: SessionState, was_in_game: bool) {
        if let SessionState::EndGame {
            outcome, duration, ..
        } = &next
        {
            if was_in_game {
                tracing::info!(?outcome, duration, "game over");
            }
        }

        let is_in_game = next.is_in_game();
        self.state = next;

        match (was_in_game, is_in_game) {
            (false, true) => self.timer = self.tick_interval.map(TickTimer::start),
            // dropping the timer stops it
            (true, false) => self.timer = None,
            _ => {}
        }
    }

    /// Handles a [`SessionEvent::Tick`] for every tick the timer has delivered since the last call and returns their
    /// amount.
    pub fn pump_timer(&mut self) -> u32 {
        let pending = self.timer.as_ref().map_or(0, TickTimer::take_pending);

        for _ in 0..pending {
            if self.handle(SessionEvent::Tick).is_err() {
                break;
            }
        }

        pending
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let config = self.state.config();

        Snapshot {
            state: self.state.name(),
            size: config.size,
            mines: config.mines,
            duration: self.state.duration(),
            grid: match self.state.grid() {
                Some(grid) => Cow::Borrowed(grid),
                None => Cow::Owned(Grid::opening(config.size)),
            },
            outcome: self.state.outcome(),
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        GameSession::new(GameConfig::default())
    }
}

/// Computes the state following `state` on `event`. A rejected event hands the untouched state back along with the
/// reason.
fn transition(
    state: SessionState,
    event: SessionEvent,
) -> Result<SessionState, (SessionState, SessionError)> {
    use SessionEvent::*;
    use SessionState::*;

    match (state, event) {
        (PreGame { .. }, ChooseSize { size, mines }) => {
            let config = match mines {
                Some(mines) => GameConfig::new(size, mines),
                None => GameConfig::for_size(size),
            };

            Ok(PreGame { config })
        }
        (PreGame { config }, StartGame) => match config.validate() {
            Ok(()) => Ok(OpeningGame {
                config,
                duration: 0,
            }),
            Err(error) => Err((PreGame { config }, error.into())),
        },
        (OpeningGame { config, duration }, ClickCell(position)) => {
            let mut grid = match Grid::new(config.size, position, config.mines) {
                Ok(grid) => grid,
                Err(error) => return Err((OpeningGame { config, duration }, error.into())),
            };

            match reveal(&mut grid, position) {
                Ok(Some(outcome)) => Ok(EndGame {
                    config,
                    grid,
                    duration,
                    outcome,
                }),
                Ok(None) => Ok(ActiveGame {
                    config,
                    grid,
                    duration,
                }),
                Err(error) => Err((OpeningGame { config, duration }, error.into())),
            }
        }
        (
            ActiveGame {
                config,
                mut grid,
                duration,
            },
            ClickCell(position),
        ) => match reveal(&mut grid, position) {
            Ok(Some(outcome)) => Ok(EndGame {
                config,
                grid,
                duration,
                outcome,
            }),
            Ok(None) => Ok(ActiveGame {
                config,
                grid,
                duration,
            }),
            Err(error) => Err((
                ActiveGame {
                    config,
                    grid,
                    duration,
                },
                error.into(),
            )),
        },
        (OpeningGame { config, duration }, Tick) => Ok(OpeningGame {
            config,
            duration: duration.saturating_add(1),
        }),
        (
            ActiveGame {
                config,
                grid,
                duration,
            },
            Tick,
        ) => Ok(ActiveGame {
            config,
            grid,
            duration: duration.saturating_add(1),
        }),
        (state, Reset) => Ok(PreGame {
            config: state.config(),
        }),
        (state, event) => {
            let error = SessionError::IllegalTransition {
                state: state.name(),
                event: event.name(),
            };

            Err((state, error))
        }
    }
}

/// Uncovers the clicked cell and decides whether that has ended the game. The win is checked before the bomb.
///
/// A finished game gets its whole board uncovered.
fn reveal(grid: &mut Grid, position: Position) -> Result<Option<Outcome>, GridError> {
    grid.update(position)?;

    let outcome = if grid.is_win() {
        Some(Outcome::Win)
    } else if grid.is_bomb(position) {
        Some(Outcome::Lose)
    } else {
        None
    };

    if outcome.is_some() {
        grid.uncover_all();
    }

    Ok(outcome)
}

#[cfg(test)]
mod test {
    use super::{
        ConfigurationError, GameConfig, GameSession, Grid, Outcome, Position, SessionError,
        SessionEvent, SessionState,
    };
    use std::thread;
    use std::time::{Duration, Instant};

    fn click(row: u8, column: u8) -> SessionEvent {
        SessionEvent::ClickCell(Position::new(row, column))
    }

    // "bomb", "bomb", "none"
    // "none", "none", "bomb"
    // "none", "none", "none"
    fn stub_grid() -> Grid {
        let bombs = [(0, 0), (0, 1), (1, 2)].map(Position::from);
        Grid::from_bombs(3, &bombs).unwrap()
    }

    /// A session in the middle of a game on the stub grid.
    fn active_session() -> GameSession {
        let mut session = GameSession::new(GameConfig::new(3, 3));
        session.state = SessionState::ActiveGame {
            config: GameConfig::new(3, 3),
            grid: stub_grid(),
            duration: 7,
        };
        session
    }

    fn wait_for_ticks(session: &mut GameSession, ticks: u64) {
        let deadline = Instant::now() + Duration::from_secs(5);

        while session.state().duration() < ticks && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
            session.pump_timer();
        }
    }

    #[test]
    fn a_new_session_waits_for_sizing() {
        let session = GameSession::default();

        assert_eq!(
            session.state(),
            &SessionState::PreGame {
                config: GameConfig::new(3, 3)
            }
        );
        assert!(!session.is_ticking());
    }

    #[test]
    fn choose_size_applies_the_default_mine_policy() {
        let mut session = GameSession::default();

        session
            .handle(SessionEvent::ChooseSize {
                size: 10,
                mines: None,
            })
            .unwrap();
        assert_eq!(session.config(), GameConfig::new(10, 10));

        session
            .handle(SessionEvent::ChooseSize {
                size: 5,
                mines: Some(4),
            })
            .unwrap();
        assert_eq!(session.config(), GameConfig::new(5, 4));
    }

    #[test]
    fn start_game_resets_the_duration() {
        let mut session = GameSession::default();
        let state = session.handle(SessionEvent::StartGame).unwrap();

        assert_eq!(
            state,
            &SessionState::OpeningGame {
                config: GameConfig::new(3, 3),
                duration: 0
            }
        );
    }

    #[test]
    fn start_game_rejects_invalid_configurations() {
        let mut session = GameSession::new(GameConfig::new(3, 8));
        let result = session.handle(SessionEvent::StartGame).cloned();

        assert_eq!(
            result,
            Err(SessionError::InvalidConfiguration(
                ConfigurationError::InvalidMinesAmount { mines: 8, max: 7 }
            ))
        );
        assert_eq!(session.state().name(), "PreGame");
        assert_eq!(session.config(), GameConfig::new(3, 8));
    }

    #[test]
    fn clicking_before_the_start_is_illegal() {
        let mut session = GameSession::default();
        let before = session.state().clone();

        let result = session.handle(click(0, 0)).cloned();

        assert_eq!(
            result,
            Err(SessionError::IllegalTransition {
                state: "PreGame",
                event: "ClickCell"
            })
        );
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn ticks_and_sizing_are_only_accepted_where_they_belong() {
        let mut session = GameSession::default();
        assert!(session.handle(SessionEvent::Tick).is_err());

        session.handle(SessionEvent::StartGame).unwrap();
        assert_eq!(
            session.handle(SessionEvent::ChooseSize {
                size: 5,
                mines: None
            }),
            Err(SessionError::IllegalTransition {
                state: "OpeningGame",
                event: "ChooseSize"
            })
        );
        assert_eq!(
            session.handle(SessionEvent::StartGame),
            Err(SessionError::IllegalTransition {
                state: "OpeningGame",
                event: "StartGame"
            })
        );
    }

    #[test]
    fn ticks_count_the_duration_in_game() {
        let mut session = GameSession::default();
        session.handle(SessionEvent::StartGame).unwrap();

        session.handle(SessionEvent::Tick).unwrap();
        session.handle(SessionEvent::Tick).unwrap();
        assert_eq!(session.state().duration(), 2);

        let mut session = active_session();
        session.handle(SessionEvent::Tick).unwrap();
        assert_eq!(session.state().duration(), 8);
    }

    #[test]
    fn the_opening_click_is_always_safe() {
        for _ in 0..100 {
            // 23 mines on a 5x5 board leave two safe cells, so the opening click can't finish the game
            let mut session = GameSession::new(GameConfig::new(5, 23));
            session.handle(SessionEvent::StartGame).unwrap();

            let state = session.handle(click(2, 2)).unwrap();

            let SessionState::ActiveGame { grid, duration, .. } = state else {
                panic!("expected an active game, got {state:?}");
            };
            assert_eq!(*duration, 0);
            assert!(!grid.is_bomb(Position::new(2, 2)));
            assert!(grid[Position::new(2, 2)].is_uncovered());
            assert_eq!(grid.uncovered_amount(), 1);
        }
    }

    #[test]
    fn an_opening_click_that_uncovers_everything_wins() {
        let mut session = GameSession::new(GameConfig::new(3, 0));
        session.handle(SessionEvent::StartGame).unwrap();
        session.handle(SessionEvent::Tick).unwrap();

        let state = session.handle(click(1, 1)).unwrap();

        assert_eq!(state.outcome(), Some(Outcome::Win));
        assert_eq!(state.duration(), 1);
        assert_eq!(state.grid().map(Grid::uncovered_amount), Some(9));
    }

    #[test]
    fn an_opening_click_beyond_the_board_is_rejected() {
        let mut session = GameSession::default();
        session.handle(SessionEvent::StartGame).unwrap();

        assert_eq!(
            session.handle(click(5, 5)),
            Err(SessionError::InvalidPosition(Position::new(5, 5)))
        );
        assert_eq!(session.state().name(), "OpeningGame");
    }

    #[test]
    fn clicking_a_safe_cell_keeps_the_game_going() {
        let mut session = active_session();
        let state = session.handle(click(0, 2)).unwrap();

        assert_eq!(state.name(), "ActiveGame");
        assert_eq!(state.grid().map(Grid::uncovered_amount), Some(1));
    }

    #[test]
    fn clicking_a_bomb_loses_and_reveals_the_board() {
        let mut session = active_session();
        let state = session.handle(click(1, 2)).unwrap();

        assert_eq!(state.outcome(), Some(Outcome::Lose));
        assert_eq!(state.duration(), 7);
        assert!(state
            .grid()
            .is_some_and(|grid| grid.rows().flatten().all(|cell| cell.is_uncovered())));
    }

    #[test]
    fn uncovering_the_last_safe_cell_wins() {
        let mut session = active_session();

        // (1, 0) floods through the only zero, which leaves (0, 2) and (2, 2)
        session.handle(click(1, 0)).unwrap();
        session.handle(click(0, 2)).unwrap();
        assert_eq!(session.state().name(), "ActiveGame");

        let state = session.handle(click(2, 2)).unwrap();

        assert_eq!(state.outcome(), Some(Outcome::Win));
        assert_eq!(state.grid().map(Grid::uncovered_amount), Some(9));
    }

    #[test]
    fn clicking_beyond_the_board_leaves_the_grid_untouched() {
        let mut session = active_session();
        let before = session.state().clone();

        assert_eq!(
            session.handle(click(5, 5)),
            Err(SessionError::InvalidPosition(Position::new(5, 5)))
        );
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn a_finished_game_only_accepts_a_reset() {
        let mut session = active_session();
        session.handle(click(0, 0)).unwrap();
        let finished = session.state().clone();

        for event in [click(2, 0), SessionEvent::Tick, SessionEvent::StartGame] {
            assert!(matches!(
                session.handle(event),
                Err(SessionError::IllegalTransition {
                    state: "EndGame",
                    ..
                })
            ));
            assert_eq!(session.state(), &finished);
        }

        let state = session.handle(SessionEvent::Reset).unwrap();

        assert_eq!(
            state,
            &SessionState::PreGame {
                config: GameConfig::new(3, 3)
            }
        );
    }

    #[test]
    fn the_timer_runs_only_in_game() {
        let mut session = GameSession::with_ticker(GameConfig::default(), Duration::from_millis(5));
        assert!(!session.is_ticking());

        session.handle(SessionEvent::StartGame).unwrap();
        assert!(session.is_ticking());

        wait_for_ticks(&mut session, 2);
        assert!(session.state().duration() >= 2);

        session.handle(SessionEvent::Reset).unwrap();
        assert!(!session.is_ticking());

        thread::sleep(Duration::from_millis(20));
        assert_eq!(session.pump_timer(), 0);
        assert_eq!(session.state().duration(), 0);
    }

    #[test]
    fn the_timer_stops_when_the_game_ends() {
        let mut session = GameSession::with_ticker(GameConfig::new(3, 0), Duration::from_millis(5));
        session.handle(SessionEvent::StartGame).unwrap();

        wait_for_ticks(&mut session, 1);
        session.handle(click(1, 1)).unwrap();

        assert_eq!(session.state().outcome(), Some(Outcome::Win));
        assert!(!session.is_ticking());

        let duration = session.state().duration();
        thread::sleep(Duration::from_millis(20));
        session.pump_timer();

        assert_eq!(session.state().duration(), duration);
    }

    #[test]
    fn a_new_game_does_not_inherit_ticks_from_the_previous_one() {
        let mut session = GameSession::with_ticker(GameConfig::default(), Duration::from_millis(5));
        session.handle(SessionEvent::StartGame).unwrap();

        // let the first timer queue a few ticks without pumping them
        thread::sleep(Duration::from_millis(30));

        session.handle(SessionEvent::Reset).unwrap();
        session.handle(SessionEvent::StartGame).unwrap();
        session.pump_timer();

        // the second timer can't have delivered that many ticks yet
        assert!(session.state().duration() <= 1);
    }

    #[test]
    fn snapshot_shows_a_placeholder_grid_before_the_opening_click() {
        let mut session = GameSession::new(GameConfig::new(4, 2));
        session.handle(SessionEvent::StartGame).unwrap();
        session.handle(SessionEvent::Tick).unwrap();

        let snapshot = session.snapshot();

        assert_eq!(snapshot.state, "OpeningGame");
        assert_eq!((snapshot.size, snapshot.mines), (4, 2));
        assert_eq!(snapshot.duration, 1);
        assert_eq!(*snapshot.grid, Grid::opening(4));
        assert_eq!(snapshot.outcome, None);
    }

    #[test]
    fn snapshot_serializes_for_a_view_layer() {
        let mut session = active_session();
        session.handle(click(1, 2)).unwrap();

        let json = serde_json::to_value(session.snapshot()).unwrap();

        assert_eq!(json["state"], "EndGame");
        assert_eq!(json["size"], 3);
        assert_eq!(json["duration"], 7);
        assert_eq!(json["outcome"], "Lose");
        assert_eq!(json["grid"][1][2]["value"], "Bomb");
        assert_eq!(json["grid"][1][2]["status"], "Uncovered");
    }
}
