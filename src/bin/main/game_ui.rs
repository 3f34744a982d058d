//! The game renderer functions.

use crate::app::AppGame;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    prelude::Frame,
    style::{Color, Style, Stylize},
    text::Line,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Row, Table, Widget},
};
use std::cmp;
use tic_tac_explode::{Cell, CellValue, Outcome, Position, Snapshot};

/// The symbols used as the arrows indicating that there are more cells to the top/left/bottom/right (respectively).
/// This is used when the board is too big to be fully displayed in the terminal.
///
/// The aforementioned order is preserved everywhere in the code.
const ARROW_SYMBOLS: [&str; 4] = ["↑", "←", "↓", "→"];
const ARROW_SYMBOL_SIZE: u16 = 1;
/// The number of terminal rows that a single cell occupies (including the borders).
const CELL_HEIGHT: u16 = 3;
/// The number of terminal columns that a single cell occupies (including the borders).
const CELL_WIDTH: u16 = 5;

const COVERED_CELL_SYMBOL: &str = "███";
const MINE_SYMBOL: &str = " 💣 ";
const SAFE_CELLS_SYMBOL: &str = " ⬛ ";
const CLOCK_SYMBOL: &str = " 🕓 ";
const CELL_COLOR: Color = Color::Yellow;
const CELL_PALE_COLOR: Color = Color::LightYellow;
const EXPLODED_CELL_COLOR: Color = Color::Red;
const APP_BG_COLOR: Color = Color::White;
const BOARD_BORDER_COLOR: Color = Color::Yellow;
const BOARD_BORDER_PALE_COLOR: Color = Color::LightYellow;
const OUTCOME_POPUP_VICTORY_BORDER_COLOR: Color = Color::Green;
const OUTCOME_POPUP_LOSS_BORDER_COLOR: Color = Color::Red;
const LEAVE_CONFIRMATION_POPUP_BORDER_COLOR: Color = Color::Red;
const INFO_WIDGET_BLOCK_COLOR: Color = Color::LightYellow;
const REGULAR_TEXT_COLOR: Color = Color::Black;
const LEGEND_TEXT_COLOR: Color = Color::DarkGray;

const LEGEND_TEXT: [&str; 3] = [
    "[↑][←][↓][→] / [w][a][s][d] / [i][j][k][l]: move the cursor",
    "[SPACE] / [ENTER]: uncover the selected cell",
    "[q] / [ESC]: leave",
];
const VICTORY_LINE_TEXT: &str = "You won! Congratulations!";
const LOSS_LINE_TEXT: &str = "Boom! Wanna try again?";
const OUTCOME_POPUP_TEXT: [&str; 4] = [
    "",
    "Use:",
    "[SPACE] / [ENTER] to start a new game",
    "[q] / [ESC] to leave back to the menu",
];
const LEAVE_CONFIRMATION_POPUP_TEXT: [&str; 6] = [
    "Are you sure you want to quit?",
    "The progress shall not be saved!",
    "",
    "Use:",
    "[SPACE] / [ENTER] - CONFIRM",
    "[q] / [ESC] - CANCEL",
];

pub fn render_game(app: &mut AppGame, snapshot: &Snapshot, frame: &mut Frame) {
    let root_container = frame.size();

    // the layout consists of the board, stats and legend containers
    let (board_container, (mines_info_container, safe_cells_info_container, time_info_container), legend_container) =
        create_app_layout(&root_container);

    let size = snapshot.size;

    // the amounts of rows and columns that we can actually show (respecting the container's size)
    app.visible_rows_amount = calculate_visible_amount(board_container.height, CELL_HEIGHT, size);
    app.visible_columns_amount = calculate_visible_amount(board_container.width, CELL_WIDTH, size);
    // the terminal might have been resized since the last frame
    app.adjust_window(size);

    let (grid_container, arrow_containers) = create_board_layout(
        &board_container,
        app.visible_rows_amount as u16,
        app.visible_columns_amount as u16,
    );

    let arrow_symbols = adjust_arrow_symbols(&board_container, arrow_containers);
    let arrow_alignments = [
        Alignment::Center,
        Alignment::Left,
        Alignment::Center,
        Alignment::Right,
    ];

    let grid_layout = build_grid_layout(
        &grid_container,
        app.visible_rows_amount,
        app.visible_columns_amount,
    );

    // 1. Render the terminal background
    frame.render_widget(Block::default().bg(APP_BG_COLOR), root_container);

    // 2. Render the border around the board
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Thick)
            .border_style(Style::default().fg(BOARD_BORDER_COLOR)),
        board_container,
    );

    // 3. Render the arrows above the board's border wherever the window hides some cells
    [
        app.window_offset.0 != 0,
        app.window_offset.1 != 0,
        app.window_offset.0 < size - app.visible_rows_amount,
        app.window_offset.1 < size - app.visible_columns_amount,
    ]
    .iter()
    .enumerate()
    .for_each(|(i, rendering_condition)| {
        if *rendering_condition {
            frame.render_widget(
                Paragraph::new(arrow_symbols[i].clone())
                    .alignment(arrow_alignments[i])
                    .fg(BOARD_BORDER_PALE_COLOR),
                arrow_containers[i],
            );
        }
    });

    // 4. Render the visible cells
    let lost = snapshot.outcome == Some(Outcome::Lose);

    grid_layout.iter().enumerate().for_each(|(row_index, row)| {
        row.iter()
            .enumerate()
            .for_each(|(column_index, cell_container)| {
                // the real position is the one including the window offset
                let position = Position::new(
                    row_index as u8 + app.window_offset.0,
                    column_index as u8 + app.window_offset.1,
                );

                if let Some(cell) = snapshot.grid.get_cell(position) {
                    let is_selected = app.cursor_position == position;
                    frame.render_widget(build_cell_widget(cell, is_selected, lost), *cell_container);
                }
            });
    });

    // 5. Render the stats
    let safe_cells_left = (snapshot.grid.positions().count() as u64)
        .saturating_sub(snapshot.mines as u64)
        .saturating_sub(snapshot.grid.uncovered_amount() as u64);

    frame.render_widget(
        build_info_widget(snapshot.mines.to_string(), MINE_SYMBOL),
        mines_info_container,
    );
    frame.render_widget(
        build_info_widget(safe_cells_left.to_string(), SAFE_CELLS_SYMBOL),
        safe_cells_info_container,
    );
    frame.render_widget(
        build_info_widget(format_duration(snapshot.duration), CLOCK_SYMBOL),
        time_info_container,
    );

    // 6. Render the legend
    frame.render_widget(build_legend_widget(), legend_container);

    // 7. Render the outcome popup in case the game has ended
    if let Some(outcome) = snapshot.outcome {
        let (first_line, border_color) = match outcome {
            Outcome::Win => (VICTORY_LINE_TEXT, OUTCOME_POPUP_VICTORY_BORDER_COLOR),
            Outcome::Lose => (LOSS_LINE_TEXT, OUTCOME_POPUP_LOSS_BORDER_COLOR),
        };

        let lines = [first_line]
            .into_iter()
            .chain(OUTCOME_POPUP_TEXT)
            .map(|s| s.to_string());

        render_popup(frame, lines, border_color);
    }

    // 8. Render the leave confirmation popup in case the leave has been requested
    if app.awaiting_leave_confirmation {
        render_popup(
            frame,
            LEAVE_CONFIRMATION_POPUP_TEXT.map(|line| line.to_string()),
            LEAVE_CONFIRMATION_POPUP_BORDER_COLOR,
        );
    }
}

/// Splits the screen into the board, the stats for the ongoing game and the controls-legend.
fn create_app_layout(container: &Rect) -> (Rect, (Rect, Rect, Rect), Rect) {
    // 2 rows for the borders and one for the contents
    let stats_container_height = 3;
    let legend_container_height = LEGEND_TEXT.len() as u16;
    let board_container_height = container
        .height
        .saturating_sub(stats_container_height + legend_container_height);

    let app_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(Constraint::from_lengths([
            board_container_height,
            stats_container_height,
            legend_container_height,
        ]))
        .split(*container);

    let board_container = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(Constraint::from_percentages([10, 80, 10]))
        .split(app_layout[0])[1];

    let stats_container = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(Constraint::from_percentages([25, 50, 25]))
        .split(app_layout[1])[1];

    let stats_containers = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(Constraint::from_percentages([33, 34, 33]))
        .split(stats_container);

    let legend_container = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(Constraint::from_percentages([5, 90, 5]))
        .split(app_layout[2])[1];

    (
        board_container,
        (stats_containers[0], stats_containers[1], stats_containers[2]),
        legend_container,
    )
}

/// Ideally, we'd like to show every row (column) of the board. When that doesn't fit, the space left after the arrows is
/// divided by a single cell's height (width) to find out how many full rows (columns) would.
fn calculate_visible_amount(container_length: u16, cell_length: u16, total: u8) -> u8 {
    let length_needed = cell_length * total as u16 + ARROW_SYMBOL_SIZE * 2;

    if length_needed <= container_length {
        total
    } else {
        let fitting = container_length.saturating_sub(ARROW_SYMBOL_SIZE * 2) / cell_length;
        cmp::min(fitting, total as u16) as u8
    }
}

/// Produces a 3*3 layout where the central rectangle holds the cells and the ones on the sides hold the arrows.
///
/// The central rectangle is exactly as large as the visible cells need, so that no cell gets cut or stretched. The rest
/// of the space is spread equally between the side rectangles (these also serve as margins between the board's border
/// and the cells).
fn create_board_layout(
    board_container: &Rect,
    visible_rows_amount: u16,
    visible_columns_amount: u16,
) -> (Rect, [Rect; 4]) {
    let (height_for_rows, width_for_columns) = (
        visible_rows_amount * CELL_HEIGHT,
        visible_columns_amount * CELL_WIDTH,
    );
    let vertical_margin = cmp::max(
        ARROW_SYMBOL_SIZE,
        board_container.height.saturating_sub(height_for_rows) / 2,
    );
    let horizontal_margin = cmp::max(
        ARROW_SYMBOL_SIZE,
        board_container.width.saturating_sub(width_for_columns) / 2,
    );

    let vertical_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(Constraint::from_lengths([
            vertical_margin,
            height_for_rows,
            vertical_margin,
        ]))
        .split(*board_container);

    let board_layout = vertical_layout
        .iter()
        .map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints(Constraint::from_lengths([
                    horizontal_margin,
                    width_for_columns,
                    horizontal_margin,
                ]))
                .split(*row)
        })
        .collect::<Vec<_>>();

    // the corner rectangles aren't used
    (
        board_layout[1][1],
        [
            board_layout[0][1],
            board_layout[1][0],
            board_layout[2][1],
            board_layout[1][2],
        ],
    )
}

/// Places the arrows on top of the board's border.
///
/// ratatui only aligns text horizontally, so the left and right arrows are pushed down to the middle of the board with
/// new lines. The down and right arrows are additionally pushed to the far edge of their containers, as the default
/// alignment is top-left.
fn adjust_arrow_symbols(board_container: &Rect, arrow_containers: [Rect; 4]) -> [String; 4] {
    let to_middle = "\n".repeat((board_container.height / 2).saturating_sub(1) as usize);
    let [up, left, down, right] = ARROW_SYMBOLS;

    [
        up.to_string(),
        format!("{to_middle}{left}"),
        format!(
            "{}{down}",
            "\n".repeat(arrow_containers[2].height.saturating_sub(ARROW_SYMBOL_SIZE) as usize)
        ),
        format!(
            "{to_middle}{}{right}",
            " ".repeat(arrow_containers[3].width.saturating_sub(ARROW_SYMBOL_SIZE) as usize)
        ),
    ]
}

/// The container is first divided into equal rows, and then each row is divided into equal cells.
fn build_grid_layout(container: &Rect, rows_amount: u8, columns_amount: u8) -> Vec<Vec<Rect>> {
    let vertical_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints((0..rows_amount).map(|_| Constraint::Length(CELL_HEIGHT)))
        .split(*container);

    vertical_layout
        .iter()
        .map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints((0..columns_amount).map(|_| Constraint::Length(CELL_WIDTH)))
                .split(*row)
                .to_vec()
        })
        .collect::<Vec<_>>()
}

/// Renders a popup with the given lines in the center of the screen.
///
/// The popup is as wide as the longest line and as high as the amount of lines (plus the borders).
fn render_popup(frame: &mut Frame, lines: impl IntoIterator<Item = String>, border_color: Color) {
    let lines: Vec<String> = lines.into_iter().collect();

    let block = Block::default()
        .bg(APP_BG_COLOR)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color));

    let root = frame.size();
    let popup_height = lines.len() as u16 + 2;
    let popup_width = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0) as u16
        + 2;

    let text = Paragraph::new(lines.join("\n"))
        .fg(REGULAR_TEXT_COLOR)
        .alignment(Alignment::Center)
        .block(block);

    let remainder_height = root.height.saturating_sub(popup_height);
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(Constraint::from_lengths([
            remainder_height / 2,
            popup_height,
            remainder_height / 2,
        ]))
        .split(root);

    let remainder_width = root.width.saturating_sub(popup_width);
    let container = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(Constraint::from_lengths([
            remainder_width / 2,
            popup_width,
            remainder_width / 2,
        ]))
        .split(popup_layout[1])[1];

    // clear the region so that it doesn't contain any old graphics
    frame.render_widget(Clear, container);
    frame.render_widget(text, container);
}

/// The text a cell is rendered with.
fn cell_symbol(cell: &Cell) -> String {
    if cell.is_covered() {
        return COVERED_CELL_SYMBOL.to_string();
    }

    match cell.value() {
        CellValue::Count(0) => "   ".to_string(),
        CellValue::Count(bombs_around) => format!(" {bombs_around} "),
        CellValue::Bomb => MINE_SYMBOL.to_string(),
    }
}

/// Builds a paragraph that represents a single cell. The selected cell is brighter, and the bombs of a lost game are
/// red.
fn build_cell_widget(cell: &Cell, selected: bool, game_lost: bool) -> impl Widget {
    let color = if game_lost && cell.is_bomb() {
        EXPLODED_CELL_COLOR
    } else if selected {
        CELL_COLOR
    } else {
        CELL_PALE_COLOR
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Thick)
        .border_style(Style::default().fg(color));

    Paragraph::new(cell_symbol(cell)).fg(color).block(block)
}

/// An info-block with a symbol as its title.
fn build_info_widget(value: String, symbol: &str) -> impl Widget + '_ {
    Paragraph::new(value)
        .fg(REGULAR_TEXT_COLOR)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title(symbol.trim())
                .borders(Borders::ALL)
                .border_type(BorderType::Thick)
                .border_style(Style::default().fg(INFO_WIDGET_BLOCK_COLOR)),
        )
}

/// Formats the duration of the game in ticks (seconds by default) as `MM:SS`.
fn format_duration(seconds: u64) -> String {
    let minutes = seconds / 60;
    let seconds = seconds % 60;
    format!("{:0>2}:{:0>2}", minutes, seconds)
}

/// The legend: the in-game controls, one per row, the keys to the left of the colon.
fn build_legend_widget() -> impl Widget {
    let rows = LEGEND_TEXT.map(|legend_row| {
        let (keys, description) = legend_row.split_at(legend_row.find(':').unwrap_or(0));

        Row::new([
            Line::from(keys).alignment(Alignment::Right),
            Line::from(description).alignment(Alignment::Left),
        ])
    });

    Table::new(rows, Constraint::from_percentages([50, 50])).fg(LEGEND_TEXT_COLOR)
}
