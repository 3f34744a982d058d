pub mod cell;
pub mod position;

use crate::config::{ConfigurationError, GameConfig};
use cell::Cell;
use position::Position;
use rand::{seq::SliceRandom, thread_rng, Rng};
use serde::Serialize;
use std::fmt::{Debug, Display, Formatter};
use std::ops::{Index, IndexMut};
use thiserror::Error;

/// Everything that can go wrong when working with grids.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The board size and/or the mines amount are unacceptable.
    #[error(transparent)]
    InvalidConfiguration(#[from] ConfigurationError),
    /// The position lies beyond the board's bounds.
    #[error("position {0} is outside the board")]
    InvalidPosition(Position),
}

/// The board representation.
///
/// The grid is a square 2D vector of cells, where the top level represents rows, and the nested vector of each row
/// represents cells. Its size never changes once created.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Grid {
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    /// Creates a `size` by `size` grid of covered cells with no bombs anywhere.
    ///
    /// This is what gets rendered before the opening click, when the bombs are yet to be placed.
    pub fn opening(size: u8) -> Self {
        let cells = (0..size)
            .map(|_| (0..size).map(|_| Cell::new()).collect())
            .collect();

        Grid { cells }
    }

    /// Creates a grid with `mines` bombs randomly distributed among all the cells except the `first_click` one, so
    /// that the opening click is always safe.
    ///
    /// Fails with [`GridError::InvalidConfiguration`] unless `mines < size * size - 1`, or with
    /// [`GridError::InvalidPosition`] if the `first_click` is beyond the board.
    pub fn new(size: u8, first_click: Position, mines: u16) -> Result<Self, GridError> {
        Self::with_rng(size, first_click, mines, &mut thread_rng())
    }

    /// Same as [`Grid::new`], but draws the bomb positions from the given random number generator.
    pub fn with_rng<R: Rng + ?Sized>(
        size: u8,
        first_click: Position,
        mines: u16,
        rng: &mut R,
    ) -> Result<Self, GridError> {
        GameConfig::new(size, mines).validate()?;

        if !first_click.is_within(size) {
            return Err(GridError::InvalidPosition(first_click));
        }

        let mut grid = Grid::opening(size);

        // The pool holds the linear indices of all the cells, except for the first clicked one.
        let excepted_index = first_click.to_linear_index(size);
        let mut pool = (0..size as usize * size as usize)
            .filter(|&index| index != excepted_index)
            .collect::<Vec<usize>>();

        pool.shuffle(rng);

        pool.into_iter()
            .take(mines as usize)
            .for_each(|index| grid[Position::from_linear_index(index, size)].plant_bomb());

        grid.update_bombs_around_values();

        tracing::debug!(size, mines, %first_click, "grid created");

        Ok(grid)
    }

    /// Creates a grid with bombs at exactly the given positions.
    pub fn from_bombs(size: u8, bombs: &[Position]) -> Result<Self, GridError> {
        if size == 0 {
            return Err(ConfigurationError::NotEnoughCells(size).into());
        }

        let mut grid = Grid::opening(size);

        for &position in bombs {
            grid.validate_position(position)?;
            grid[position].plant_bomb();
        }

        grid.update_bombs_around_values();

        Ok(grid)
    }

    /// Increments the counters of the cells adjacent to every bomb, so that each of the safe cells ends up knowing
    /// the amount of bombs around it.
    fn update_bombs_around_values(&mut self) {
        let size = self.size();

        let adjacent_positions = self
            .positions()
            .filter(|&position| self.is_bomb(position))
            .flat_map(|position| position.adjacent_positions(size))
            .collect::<Vec<Position>>();

        for position in adjacent_positions {
            self[position].increment_bombs_around();
        }
    }

    /// The board's side length.
    pub fn size(&self) -> u8 {
        self.cells.len() as u8
    }

    /// Iterates over all the positions of the board, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let size = self.size();
        (0..size).flat_map(move |row| (0..size).map(move |column| Position::new(row, column)))
    }

    /// The positions of the cells adjacent to the given one, clipped at the board's edges.
    pub fn neighbors(&self, position: Position) -> impl Iterator<Item = Position> {
        position.adjacent_positions(self.size())
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.iter().map(Vec::as_slice)
    }

    /// Returns a cell by its position or [`None`] if there's no cell at the given position.
    pub fn get_cell(&self, position: Position) -> Option<&Cell> {
        self.cells
            .get(position.row as usize)
            .and_then(|row| row.get(position.column as usize))
    }

    pub fn validate_position(&self, position: Position) -> Result<Position, GridError> {
        if position.is_within(self.size()) {
            Ok(position)
        } else {
            Err(GridError::InvalidPosition(position))
        }
    }

    /// Checks whether the cell at the given position holds a bomb, whatever its status. There are no bombs beyond
    /// the board.
    pub fn is_bomb(&self, position: Position) -> bool {
        self.get_cell(position).is_some_and(Cell::is_bomb)
    }

    pub fn bombs_amount(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_bomb()).count()
    }

    pub fn uncovered_amount(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.is_uncovered())
            .count()
    }

    /// Checks that every bomb is still covered and every other cell is uncovered.
    ///
    /// This is effectively the win-condition for the game.
    pub fn is_win(&self) -> bool {
        self.cells.iter().flatten().all(|cell| {
            if cell.is_bomb() {
                cell.is_covered()
            } else {
                cell.is_uncovered()
            }
        })
    }

    /// Uncovers the cell at the given (most recently clicked) position.
    ///
    /// Unless the cell holds a bomb, every covered zero cell adjacent to it starts a flood: the whole connected region
    /// of zeroes gets uncovered along with the numbered cells bordering it. Only zeroes spread the flood further. Note
    /// that the flood starts from the neighbours of the clicked cell, not from the clicked cell itself.
    ///
    /// Fails with [`GridError::InvalidPosition`] (leaving the grid untouched) when the position is beyond the board.
    pub fn update(&mut self, position: Position) -> Result<&mut Self, GridError> {
        let position = self.validate_position(position)?;

        self[position].uncover();

        if self[position].is_bomb() {
            return Ok(self);
        }

        let covered_zeroes = self.covered_zero_neighbors(position).collect::<Vec<Position>>();
        self.propagate_zeroes(covered_zeroes);

        Ok(self)
    }

    fn covered_zero_neighbors(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        self.neighbors(position).filter(|&adjacent| {
            let cell = &self[adjacent];
            cell.is_covered() && cell.is_zero()
        })
    }

    /// Uncovers the given zero cells and everything reachable from them through other zeroes.
    fn propagate_zeroes(&mut self, mut to_visit: Vec<Position>) {
        let size = self.size();

        while let Some(position) = to_visit.pop() {
            // the same zero may have been queued by several of its neighbours
            if !self[position].uncover() {
                continue;
            }

            for adjacent in position.adjacent_positions(size) {
                let cell = &mut self[adjacent];

                if cell.is_covered() {
                    if cell.is_zero() {
                        to_visit.push(adjacent);
                    } else {
                        cell.uncover();
                    }
                }
            }
        }
    }

    /// Uncovers every cell of the grid, bombs included.
    ///
    /// Used when the game ends to reveal the whole board.
    pub fn uncover_all(&mut self) -> &mut Self {
        self.cells.iter_mut().flatten().for_each(|cell| {
            cell.uncover();
        });

        self
    }
}

impl Index<Position> for Grid {
    type Output = Cell;

    fn index(&self, position: Position) -> &Self::Output {
        &self.cells[position.row as usize][position.column as usize]
    }
}

impl IndexMut<Position> for Grid {
    fn index_mut(&mut self, position: Position) -> &mut Self::Output {
        &mut self.cells[position.row as usize][position.column as usize]
    }
}

impl Debug for Grid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.iter() {
            for cell in row {
                write!(f, "{:?} ", cell)?;
            }

            writeln!(f)?;
        }

        Ok(())
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "   ")?;
        for column_index in 0..self.size() {
            write!(f, "{:^3}", column_index)?;
        }

        writeln!(f)?;

        for (row_index, row) in self.cells.iter().enumerate() {
            write!(f, "{:^3}", row_index)?;

            for cell in row {
                write!(f, "{} ", cell)?;
            }

            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{Cell, ConfigurationError, Grid, GridError, Position};
    use crate::grid::cell::CellValue;
    use rand::{rngs::StdRng, SeedableRng};

    fn positions(list: &[(u8, u8)]) -> Vec<Position> {
        list.iter().copied().map(Position::from).collect()
    }

    // "bomb", "bomb", "none"
    // "none", "none", "bomb"
    // "none", "none", "none"
    fn create_stub_grid() -> Grid {
        Grid::from_bombs(3, &positions(&[(0, 0), (0, 1), (1, 2)])).unwrap()
    }

    // Bombs every other cell along the border of a 5x5 board, so that the center is a zero surrounded by numbers.
    fn create_ring_grid() -> Grid {
        Grid::from_bombs(
            5,
            &positions(&[
                (0, 0),
                (0, 2),
                (0, 4),
                (2, 0),
                (2, 4),
                (4, 0),
                (4, 2),
                (4, 4),
            ]),
        )
        .unwrap()
    }

    fn brute_force_count(grid: &Grid, position: Position) -> u8 {
        let size = grid.size() as i16;
        let mut count = 0;

        for row in position.row as i16 - 1..=position.row as i16 + 1 {
            for column in position.column as i16 - 1..=position.column as i16 + 1 {
                let is_self = row == position.row as i16 && column == position.column as i16;
                let in_bounds = row >= 0 && column >= 0 && row < size && column < size;

                if !is_self && in_bounds && grid.is_bomb(Position::new(row as u8, column as u8)) {
                    count += 1;
                }
            }
        }

        count
    }

    fn uncovered_positions(grid: &Grid) -> Vec<Position> {
        grid.positions()
            .filter(|&position| grid[position].is_uncovered())
            .collect()
    }

    #[test]
    fn opening_grid_is_covered_and_empty() {
        let grid = Grid::opening(4);

        assert_eq!(grid.size(), 4);
        assert!(grid
            .rows()
            .flatten()
            .all(|cell| *cell == Cell::new()));
    }

    #[test]
    fn new_places_exactly_the_requested_amount_of_bombs() {
        let grid = Grid::new(5, Position::new(2, 2), 7).unwrap();

        assert_eq!(grid.bombs_amount(), 7);
        assert_eq!(grid.uncovered_amount(), 0);
    }

    #[test]
    fn new_never_puts_a_bomb_under_the_first_click() {
        for _ in 0..100 {
            let grid = Grid::new(3, Position::new(0, 0), 7).unwrap();

            // 7 bombs on a 3x3 board leave exactly two safe cells, one of them must be the clicked one
            assert!(!grid.is_bomb(Position::new(0, 0)));
        }

        for size in 2..8u8 {
            let first_click = Position::new(size - 1, size / 2);
            let max_mines = (size as u16 * size as u16) - 2;
            let grid = Grid::new(size, first_click, max_mines).unwrap();

            assert!(!grid.is_bomb(first_click));
        }
    }

    #[test]
    fn every_count_matches_its_bomb_neighbours() {
        for _ in 0..100 {
            let grid = Grid::new(6, Position::new(3, 1), 10).unwrap();

            for position in grid.positions() {
                if let Some(count) = grid[position].bombs_around() {
                    assert_eq!(count, brute_force_count(&grid, position));
                }
            }
        }
    }

    #[test]
    fn bombs_around_values_are_computed_after_all_the_bombs_are_placed() {
        let grid = create_stub_grid();

        let result = grid
            .rows()
            .flatten()
            .map(|cell| cell.bombs_around())
            .collect::<Vec<Option<u8>>>();

        assert_eq!(
            result,
            [
                None,
                None,
                Some(2),
                Some(2),
                Some(3),
                None,
                Some(0),
                Some(1),
                Some(1)
            ]
        );
    }

    #[test]
    fn seeded_generators_reproduce_the_layout() {
        let first = Grid::with_rng(8, Position::new(4, 4), 10, &mut StdRng::seed_from_u64(42)).unwrap();
        let second = Grid::with_rng(8, Position::new(4, 4), 10, &mut StdRng::seed_from_u64(42)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn new_rejects_too_many_mines() {
        assert_eq!(
            Grid::new(3, Position::new(0, 0), 8),
            Err(GridError::InvalidConfiguration(
                ConfigurationError::InvalidMinesAmount { mines: 8, max: 7 }
            ))
        );
        assert_eq!(
            Grid::new(3, Position::new(0, 0), 9),
            Err(GridError::InvalidConfiguration(
                ConfigurationError::InvalidMinesAmount { mines: 9, max: 7 }
            ))
        );
    }

    #[test]
    fn new_rejects_boards_that_are_too_small() {
        assert_eq!(
            Grid::new(0, Position::new(0, 0), 0),
            Err(GridError::InvalidConfiguration(
                ConfigurationError::NotEnoughCells(0)
            ))
        );
        assert_eq!(
            Grid::new(1, Position::new(0, 0), 0),
            Err(GridError::InvalidConfiguration(
                ConfigurationError::NotEnoughCells(1)
            ))
        );
    }

    #[test]
    fn new_rejects_a_first_click_beyond_the_board() {
        assert_eq!(
            Grid::new(3, Position::new(5, 5), 3),
            Err(GridError::InvalidPosition(Position::new(5, 5)))
        );
    }

    #[test]
    fn from_bombs_rejects_positions_beyond_the_board() {
        assert_eq!(
            Grid::from_bombs(3, &positions(&[(0, 3)])),
            Err(GridError::InvalidPosition(Position::new(0, 3)))
        );
    }

    #[test]
    fn get_cell_returns_none_for_non_existing_cells() {
        let grid = create_stub_grid();

        assert!(grid.get_cell(Position::new(0, 0)).is_some());
        assert!(grid.get_cell(Position::new(10, 10)).is_none());
        assert!(!grid.is_bomb(Position::new(10, 10)));
    }

    #[test]
    fn empty_board_is_uncovered_in_one_click() {
        let mut grid = Grid::new(3, Position::new(1, 1), 0).unwrap();

        assert!(grid
            .rows()
            .flatten()
            .all(|cell| cell.value() == CellValue::Count(0)));

        grid.update(Position::new(1, 1)).unwrap();

        assert_eq!(grid.uncovered_amount(), 9);
        assert!(grid.is_win());
    }

    #[test]
    fn clicking_a_bomb_uncovers_only_the_bomb() {
        let mut grid = Grid::from_bombs(5, &positions(&[(0, 0)])).unwrap();
        let bomb = Position::new(0, 0);

        assert!(grid.is_bomb(bomb));

        grid.update(bomb).unwrap();

        assert!(grid[bomb].is_uncovered());
        assert_eq!(grid[bomb].value(), CellValue::Bomb);
        assert_eq!(grid.uncovered_amount(), 1);
        assert!(!grid.is_win());

        grid.uncover_all();

        assert_eq!(grid.uncovered_amount(), 25);
    }

    #[test]
    fn clicking_a_numbered_cell_next_to_a_bordered_number_reveals_nothing_else() {
        let mut grid = create_stub_grid();
        grid.update(Position::new(0, 2)).unwrap();

        // (0, 2) has two bombs around it and no zeroes next to it: no flood
        assert_eq!(uncovered_positions(&grid), positions(&[(0, 2)]));
    }

    #[test]
    fn flood_starts_from_the_neighbours_of_a_numbered_click() {
        let mut grid = Grid::from_bombs(5, &positions(&[(0, 0)])).unwrap();

        // (1, 1) is a "1" itself, but its zero neighbours spread across the whole board
        grid.update(Position::new(1, 1)).unwrap();

        assert_eq!(grid.uncovered_amount(), 24);
        assert!(grid[Position::new(0, 0)].is_covered());
        assert!(grid.is_win());
    }

    #[test]
    fn flood_reveals_the_numbered_border_but_does_not_cross_it() {
        // the bombs split the board: the right-hand column is unreachable through zeroes from the left
        let mut grid = Grid::from_bombs(5, &positions(&[(0, 3), (2, 3), (4, 3)])).unwrap();
        grid.update(Position::new(2, 0)).unwrap();

        let expected = positions(&[
            (0, 0),
            (0, 1),
            (0, 2),
            (1, 0),
            (1, 1),
            (1, 2),
            (2, 0),
            (2, 1),
            (2, 2),
            (3, 0),
            (3, 1),
            (3, 2),
            (4, 0),
            (4, 1),
            (4, 2),
        ]);

        assert_eq!(uncovered_positions(&grid), expected);
        assert!(!grid.is_win());
    }

    #[test]
    fn a_zero_surrounded_by_numbers_only_uncovers_itself() {
        let mut grid = create_ring_grid();
        let center = Position::new(2, 2);

        assert_eq!(grid[center].bombs_around(), Some(0));

        grid.update(center).unwrap();

        assert_eq!(uncovered_positions(&grid), vec![center]);
    }

    #[test]
    fn update_rejects_positions_beyond_the_board_without_changes() {
        let mut grid = create_stub_grid();
        let before = grid.clone();

        let result = grid.update(Position::new(5, 5)).map(|_| ());

        assert_eq!(result, Err(GridError::InvalidPosition(Position::new(5, 5))));
        assert_eq!(grid, before);
    }

    #[test]
    fn update_is_idempotent() {
        for _ in 0..100 {
            let mut grid = Grid::new(6, Position::new(0, 0), 6).unwrap();
            let position = Position::new(0, 0);

            grid.update(position).unwrap();
            let once = grid.clone();
            grid.update(position).unwrap();

            assert_eq!(grid, once);
        }
    }

    #[test]
    fn uncovered_cells_only_ever_grow() {
        for _ in 0..50 {
            let mut grid = Grid::new(7, Position::new(3, 3), 8).unwrap();
            let mut previously_uncovered = Vec::new();

            for position in grid.positions().collect::<Vec<_>>() {
                if grid.is_bomb(position) {
                    continue;
                }

                grid.update(position).unwrap();
                let uncovered = uncovered_positions(&grid);

                assert!(previously_uncovered
                    .iter()
                    .all(|position| uncovered.contains(position)));
                assert!(uncovered.len() <= 49);

                previously_uncovered = uncovered;
            }

            // every safe cell has been clicked by now (possibly after being flooded already)
            assert!(grid.is_win());
        }
    }

    #[test]
    fn the_win_condition_is_checked_correctly() {
        let mut grid = create_stub_grid();

        assert!(!grid.is_win());

        // (1, 0) floods through (2, 0), but (2, 2) isn't adjacent to any zero
        for position in positions(&[(0, 2), (1, 0), (1, 1), (2, 1), (2, 0)]) {
            grid.update(position).unwrap();
            assert!(!grid.is_win());
        }

        grid.update(Position::new(2, 2)).unwrap();
        assert!(grid.is_win());

        // an uncovered bomb spoils the win
        grid.update(Position::new(0, 0)).unwrap();
        assert!(!grid.is_win());
    }

    #[test]
    fn uncover_all_reveals_every_cell() {
        let mut grid = create_stub_grid();
        grid.uncover_all();

        assert!(grid.rows().flatten().all(|cell| cell.is_uncovered()));
    }

    #[test]
    fn display_shows_row_and_column_indices() {
        let grid = Grid::opening(2);

        assert_eq!(grid.to_string(), "    0  1 \n 0 ⬛ ⬛ \n 1 ⬛ ⬛ \n");
    }

    #[test]
    fn serializes_as_nested_rows() {
        let grid = Grid::from_bombs(2, &positions(&[(0, 0)])).unwrap();
        let json = serde_json::to_value(&grid).unwrap();

        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert_eq!(json[0][0]["value"], "Bomb");
        assert_eq!(json[1][1]["value"]["Count"], 1);
        assert_eq!(json[1][1]["status"], "Covered");
    }
}
