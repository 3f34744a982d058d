//! The terminal application

use crate::app::MenuItem::{MinesAmount, Size};
use crate::game_ui::render_game;
use crate::menu_ui::render_menu;
use crate::tui::Render;
use crate::update::MoveCursorDirection::{Down, Left, Right, Up};
use crate::update::{ControlsSupport, MoveCursorDirection};
use ratatui::Frame;
use std::cmp;
use tic_tac_explode::config::DEFAULT_SIZE;
use tic_tac_explode::{GameSession, Position, SessionError, SessionEvent};

/// The terminal application
#[derive(Debug)]
pub struct App {
    /// The game session. Its state decides what the game screen shows; the app only keeps the view around it.
    pub session: GameSession,
    /// The app can be represented by one variant at a time.
    pub variant: AppVariant,
    /// Indicates that the main application loop should be broken on the next tick and thus the app should quit.
    pub should_quit: bool,
}

impl App {
    /// Creates the app. With `skip_menu`, the game starts right away with the session's configuration.
    pub fn new(session: GameSession, skip_menu: bool) -> Result<App, SessionError> {
        let mut app = App {
            session,
            variant: AppVariant::InMenu(AppMenu::new()),
            should_quit: false,
        };

        if skip_menu {
            app.start_game()?;
        }

        Ok(app)
    }

    pub fn tick(&mut self) {
        self.session.pump_timer();

        match &self.variant {
            AppVariant::InMenu(menu) if menu.should_quit => self.quit(),
            AppVariant::InGame(game) => {
                if game.should_leave {
                    self.back_to_menu()
                } else if game.should_emergency_leave {
                    self.quit()
                }
            }
            _ => (),
        };
    }

    fn start_game(&mut self) -> Result<(), SessionError> {
        self.session.handle(SessionEvent::StartGame)?;
        self.variant = AppVariant::InGame(AppGame::new());
        Ok(())
    }

    /// Starts another game of the same configuration once the previous one has ended.
    fn restart_game(&mut self) -> Result<(), SessionError> {
        self.session.handle(SessionEvent::Reset)?;
        self.start_game()
    }

    pub fn back_to_menu(&mut self) {
        if let Err(error) = self.session.handle(SessionEvent::Reset) {
            tracing::warn!(%error, "couldn't reset the session");
        }
        self.variant = AppVariant::InMenu(AppMenu::new());
    }

    /// Quit the application altogether.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    fn is_game_finished(&self) -> bool {
        self.session.state().outcome().is_some()
    }
}

impl ControlsSupport for App {
    fn move_cursor(&mut self, direction: MoveCursorDirection) {
        let finished = self.is_game_finished();
        let size = self.session.config().size;

        match &mut self.variant {
            AppVariant::InMenu(menu) => menu.move_cursor(&mut self.session, direction),
            // the cursor stays where the game has ended
            AppVariant::InGame(_) if finished => {}
            AppVariant::InGame(game) => game.move_cursor(size, direction),
        }
    }

    fn perform_main_action(&mut self) -> Result<(), SessionError> {
        let finished = self.is_game_finished();

        match &mut self.variant {
            AppVariant::InMenu(_) => {
                if let Err(error) = self.start_game() {
                    if let AppVariant::InMenu(menu) = &mut self.variant {
                        menu.error = Some(error);
                    }
                }
            }
            AppVariant::InGame(game) if game.awaiting_leave_confirmation => game.leave(),
            AppVariant::InGame(_) if finished => self.restart_game()?,
            AppVariant::InGame(game) => {
                self.session
                    .handle(SessionEvent::ClickCell(game.cursor_position))?;
            }
        }

        Ok(())
    }

    fn perform_secondary_action(&mut self) {
        // there are no flags, so the in-game secondary action does nothing
        if let AppVariant::InMenu(menu) = &mut self.variant {
            menu.restore_default(&mut self.session);
        }
    }

    fn leave(&mut self, force: bool) {
        let finished = self.is_game_finished();

        match &mut self.variant {
            AppVariant::InMenu(menu) => menu.quit(),
            AppVariant::InGame(game) => {
                if force {
                    game.emergency_leave();
                } else if finished {
                    // if the game has ended, just leave without asking for confirmation
                    game.leave();
                } else {
                    game.awaiting_leave_confirmation = !game.awaiting_leave_confirmation;
                }
            }
        }
    }
}

impl Render for App {
    fn render(&mut self, frame: &mut Frame) {
        match &mut self.variant {
            AppVariant::InMenu(menu) => render_menu(menu, self.session.config(), frame),
            AppVariant::InGame(game) => render_game(game, &self.session.snapshot(), frame),
        }
    }
}

/// The current application variant.
#[derive(Debug)]
pub enum AppVariant {
    /// When the menu's being displayed
    InMenu(AppMenu),
    /// When the game's being displayed
    InGame(AppGame),
}

/// The Menu app variant. The values being edited live in the session itself.
#[derive(Debug)]
pub struct AppMenu {
    pub selected_item: MenuItem,
    /// Why the last attempt to start the game has failed.
    pub error: Option<SessionError>,
    should_quit: bool,
}

#[derive(Debug, PartialEq, Copy, Clone, Eq)]
pub enum MenuItem {
    Size,
    MinesAmount,
}

impl AppMenu {
    fn new() -> Self {
        AppMenu {
            selected_item: Size,
            error: None,
            should_quit: false,
        }
    }

    fn move_cursor(&mut self, session: &mut GameSession, direction: MoveCursorDirection) {
        let config = session.config();

        let event = match (direction, self.selected_item) {
            (Up, _) => {
                self.selected_item = Size;
                None
            }
            (Down, _) => {
                self.selected_item = MinesAmount;
                None
            }
            // resizing the board brings the mines amount back to the default for the new size
            (Left, Size) => Some((config.size.saturating_sub(1), None)),
            (Right, Size) => Some((config.size.saturating_add(1), None)),
            (Left, MinesAmount) => Some((config.size, Some(config.mines.saturating_sub(1)))),
            (Right, MinesAmount) => Some((config.size, Some(config.mines.saturating_add(1)))),
        };

        if let Some((size, mines)) = event {
            self.choose_size(session, size, mines);
        }
    }

    fn restore_default(&mut self, session: &mut GameSession) {
        let size = match self.selected_item {
            Size => DEFAULT_SIZE,
            MinesAmount => session.config().size,
        };

        self.choose_size(session, size, None);
    }

    fn choose_size(&mut self, session: &mut GameSession, size: u8, mines: Option<u16>) {
        self.error = session
            .handle(SessionEvent::ChooseSize { size, mines })
            .err();
    }

    fn quit(&mut self) {
        self.should_quit = true
    }
}

/// The Game app variant
#[derive(Debug)]
pub struct AppGame {
    /// The amount of rows that should be rendered in the grid. Must always be less or equal to the board's size.
    pub visible_rows_amount: u8,
    /// The amount of columns that should be rendered in the grid. Must always be less or equal to the board's size.
    pub visible_columns_amount: u8,
    /// The window is a sliding frame-view into the grid. This is used when the board is too big to be displayed in the
    /// given container.
    ///
    /// The values represent the starting row/column from which the visible amount of rows/columns is displayed.
    ///
    /// So, for example, for the 5x5 board where there would only be 3 visible rows and 3 visible columns, in order to
    /// only display the portion of the board shown below, the `window_offset` must be set to `(2, 2)`.
    ///
    /// ```text
    /// * * * * *
    /// * * * * *
    ///    _______
    /// * *|* * *|
    /// * *|* * *|
    /// * *|* * *|
    ///    _______
    /// ```
    pub window_offset: (u8, u8),
    /// The position of the currently selected cell relative to the whole board.
    pub cursor_position: Position,
    /// Whether the cancel key was pressed and now the game's waiting for a confirmation from the user to leave back to
    /// the menu.
    pub awaiting_leave_confirmation: bool,
    /// Whether the leave was confirmed and now it's allowed to go back to the menu.
    pub should_leave: bool,
    /// Whether the app should urgently leave without asking for a confirmation
    pub should_emergency_leave: bool,
}

impl AppGame {
    fn new() -> Self {
        AppGame {
            visible_rows_amount: 0,
            visible_columns_amount: 0,
            window_offset: (0, 0),
            cursor_position: Position::new(0, 0),
            awaiting_leave_confirmation: false,
            should_leave: false,
            should_emergency_leave: false,
        }
    }

    fn move_cursor(&mut self, size: u8, direction: MoveCursorDirection) {
        let Position { row, column } = self.cursor_position;
        let last = size.saturating_sub(1);

        self.cursor_position = match direction {
            Up => Position::new(row.saturating_sub(1), column),
            Left => Position::new(row, column.saturating_sub(1)),
            Down => Position::new(cmp::min(row.saturating_add(1), last), column),
            Right => Position::new(row, cmp::min(column.saturating_add(1), last)),
        };

        self.adjust_window(size);
    }

    /// Slides the window so that the cursor stays visible. Needs to be called whenever the cursor or the visible
    /// amounts change.
    pub fn adjust_window(&mut self, size: u8) {
        self.window_offset = (
            slide_window(
                self.window_offset.0,
                self.cursor_position.row,
                self.visible_rows_amount,
                size,
            ),
            slide_window(
                self.window_offset.1,
                self.cursor_position.column,
                self.visible_columns_amount,
                size,
            ),
        );
    }

    fn leave(&mut self) {
        self.should_leave = true;
    }

    fn emergency_leave(&mut self) {
        self.should_emergency_leave = true;
    }
}

/// Moves a window of `visible` out of `total` lines as little as possible for it to contain the cursor. When the window
/// is large enough, a line of margin is kept between the cursor and the window's edge, so that the player sees there's
/// more to the board.
fn slide_window(offset: u8, cursor: u8, visible: u8, total: u8) -> u8 {
    if visible == 0 || visible >= total {
        return 0;
    }

    let (offset, cursor, visible, total) = (
        offset as u16,
        cursor as u16,
        visible as u16,
        total as u16,
    );
    let margin = if visible > 2 { 1 } else { 0 };

    let lowest = (cursor + margin + 1).saturating_sub(visible);
    let highest = cursor.saturating_sub(margin);

    offset.clamp(lowest, highest).min(total - visible) as u8
}
