//! The functionality related to the menu renderer.

use crate::app::AppMenu;
use crate::app::MenuItem::{MinesAmount, Size};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    prelude::Frame,
    style::{Color, Style, Stylize},
    text::Line,
    widgets::{Block, BorderType, Borders, Paragraph, Row, Table, Widget},
};
use tic_tac_explode::GameConfig;

const LEGEND_TEXT: [&str; 5] = [
    "[↑][↓] / [w][s] / [i][k]: select the options",
    "[←][→] / [a][d] / [j][l]: decrement / increment the selected option's value",
    "[SPACE] / [ENTER]: start the game",
    "[f]: restore the selected option's default value",
    "[q] / [ESC]: leave",
];
const LEGEND_TEXT_COLOR: Color = Color::DarkGray;
const MENU_ITEM_HEIGHT: u16 = 3;
const MENU_WIDTH: u16 = 40;

pub fn render_menu(menu: &mut AppMenu, config: GameConfig, frame: &mut Frame) {
    let root_container = frame.size();

    // the menu container's height is whatever is left after the error and the legend
    let (menu_container, error_container, legend_container) = create_app_layout(&root_container);

    let items = [
        (Size, format!("\nSize: < {0}x{0} >", config.size)),
        (
            MinesAmount,
            format!("\nMines: < {} > (max {})", config.mines, config.max_mines()),
        ),
    ];

    let (menu_container, menu_items_containers) =
        create_menu_layout(&menu_container, items.len() as u16);

    // 1. Render the terminal background.
    frame.render_widget(Block::default().bg(Color::White), root_container);

    // 2. Render the menu items, the selected one inverted.
    items
        .into_iter()
        .zip(menu_items_containers.iter())
        .for_each(|((item, text), container)| {
            let style = if menu.selected_item == item {
                Style::default().bg(Color::Yellow).fg(Color::White)
            } else {
                Style::default().bg(Color::White).fg(Color::Yellow)
            };

            frame.render_widget(
                Paragraph::new(text)
                    .alignment(Alignment::Center)
                    .style(style),
                *container,
            )
        });

    // 3. Render the border around the menu.
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Yellow)),
        menu_container,
    );

    // 4. Render the error (if any).
    if let Some(error) = &menu.error {
        frame.render_widget(
            Paragraph::new(error.to_string())
                .alignment(Alignment::Center)
                .red(),
            error_container,
        )
    }

    // 5. Render the legend.
    frame.render_widget(build_legend_widget(), legend_container);
}

/// The layout of the menu is represented with 3 rectangles: one for the menu itself (to hold the menu items), one for
/// a potential error message and one for the legend (the in-menu controls description).
fn create_app_layout(container: &Rect) -> (Rect, Rect, Rect) {
    // 1 (top padding) + 1 (text) + 1 (bottom padding)
    let error_container_height = 3;
    let legend_container_height = LEGEND_TEXT.len() as u16;
    let menu_container_height = container
        .height
        .saturating_sub(error_container_height + legend_container_height);

    let vertical_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(Constraint::from_lengths([
            menu_container_height,
            error_container_height,
            legend_container_height,
        ]))
        .split(*container);

    let error_container = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(Constraint::from_percentages([0, 100, 0]))
        .margin(1)
        .split(vertical_layout[1])[1];

    let legend_container = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(Constraint::from_percentages([5, 90, 5]))
        .split(vertical_layout[2])[1];

    (vertical_layout[0], error_container, legend_container)
}

/// Centers a fixed-width box for the menu items and splits it into one sub-container per item.
fn create_menu_layout(container: &Rect, menu_items_amount: u16) -> (Rect, Vec<Rect>) {
    // 1 char padding top and bottom
    let menu_items_container_height = MENU_ITEM_HEIGHT * menu_items_amount + 2;
    let vertical_remainder = container.height.saturating_sub(menu_items_container_height);
    let horizontal_remainder = container.width.saturating_sub(MENU_WIDTH);

    let vertical_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(Constraint::from_lengths([
            vertical_remainder / 2,
            menu_items_container_height,
            vertical_remainder / 2,
        ]))
        .split(*container);

    let menu_items_container = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(Constraint::from_lengths([
            horizontal_remainder / 2,
            MENU_WIDTH,
            horizontal_remainder / 2,
        ]))
        .split(vertical_layout[1])[1];

    (
        menu_items_container,
        Layout::default()
            .direction(Direction::Vertical)
            .constraints((0..menu_items_amount).map(|_| Constraint::Length(MENU_ITEM_HEIGHT)))
            .margin(1)
            .split(menu_items_container)
            .to_vec(),
    )
}

/// The function builds the ready-to-use legend block (some text that provides information about the in-menu controls).
fn build_legend_widget() -> impl Widget {
    let rows = LEGEND_TEXT.map(|legend_line| {
        let (keys, description) = legend_line.split_at(legend_line.find(':').unwrap_or(0));

        Row::new([
            Line::from(keys).alignment(Alignment::Right),
            Line::from(description).alignment(Alignment::Left),
        ])
    });

    Table::new(rows, Constraint::from_percentages([50, 50])).fg(LEGEND_TEXT_COLOR)
}
