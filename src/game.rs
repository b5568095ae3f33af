use std::fmt;

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};

use crate::tensor::Tensor;

pub const SIZE: usize = 4;
pub const CHANNELS: usize = 16; // one per cell exponent 0..=15
pub const ILLEGAL_MOVE_PENALTY: i32 = -8;
const FOUR_PROBABILITY: f64 = 0.1;

/// Cell exponents, row-major. 0 is empty, `v > 0` is a tile worth `2^v`.
pub type Grid = [[u8; SIZE]; SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Left,
    Up,
    Right,
    Down,
}

impl Action {
    /// Fixed enumeration order, also the number of counter-clockwise
    /// rotations that turn each direction into `Left`.
    pub const ALL: [Action; 4] = [Action::Left, Action::Up, Action::Right, Action::Down];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Left => "left",
            Action::Up => "up",
            Action::Right => "right",
            Action::Down => "down",
        }
    }

    /// Uniform over all four directions, legal or not.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Action {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

#[derive(Debug, Clone)]
pub struct Game {
    grid: Grid,
    score: u32,
    rng: StdRng,
}

impl Game {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Empty board seeded with two random tiles.
    pub fn with_rng(rng: StdRng) -> Self {
        let mut instance = Self {
            grid: [[0; SIZE]; SIZE],
            score: 0,
            rng,
        };
        instance.add_random_tile();
        instance.add_random_tile();

        instance
    }

    pub fn from_state(grid: Grid, score: u32) -> Self {
        Self::from_state_with_rng(grid, score, StdRng::from_os_rng())
    }

    pub fn from_state_with_rng(grid: Grid, score: u32, rng: StdRng) -> Self {
        Self { grid, score, rng }
    }

    pub fn state(&self) -> Grid {self.grid}
    pub fn score(&self) -> u32 {self.score}

    pub fn is_action_available(&self, action: Action) -> bool {
        is_action_available(&self.grid, action)
    }

    pub fn available_actions(&self) -> Vec<Action> {
        available_actions(&self.grid)
    }

    pub fn game_over(&self) -> bool {
        is_terminal(&self.grid)
    }

    // returns (next_state, reward, done)
    // an unavailable action costs ILLEGAL_MOVE_PENALTY and leaves the board untouched
    pub fn do_action(&mut self, action: Action) -> (Grid, i32, bool) {
        if !self.is_action_available(action) {
            return (self.grid, ILLEGAL_MOVE_PENALTY, self.game_over());
        }

        let (grid, reward) = slide(&self.grid, action);
        self.grid = grid;
        self.score += reward;
        self.add_random_tile();

        (self.grid, reward as i32, self.game_over())
    }

    /// Places a 2 (90%) or a 4 (10%) on a uniformly chosen empty cell.
    ///
    /// Panics on a full board: callers check `game_over` first.
    pub fn add_random_tile(&mut self) {
        let empty = empty_cells(&self.grid);
        assert!(!empty.is_empty(), "add_random_tile called on a full grid");

        let (row, col) = empty[self.rng.random_range(0..empty.len())];
        self.grid[row][col] = if self.rng.random_bool(FOUR_PROBABILITY) { 2 } else { 1 };
    }

    pub fn to_tensor(&self) -> Tensor {
        grid_to_tensor(&self.grid)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = "-".repeat(25);
        writeln!(f, "{}", separator)?;
        for row in &self.grid {
            let cells: Vec<String> = row.iter().map(|&v| tile_string(v)).collect();
            writeln!(f, "|{}|", cells.join("|"))?;
            writeln!(f, "{}", separator)?;
        }
        Ok(())
    }
}

fn tile_string(exponent: u8) -> String {
    if exponent > 0 {
        format!("{:>5}", tile_value(exponent))
    } else {
        " ".repeat(5)
    }
}

/// Displayed magnitude of a cell, 0 for empty.
pub fn tile_value(exponent: u8) -> u32 {
    if exponent == 0 { 0 } else { 1 << exponent }
}

pub fn empty_cells(grid: &Grid) -> Vec<(usize, usize)> {
    let mut cells = Vec::new();
    for (row, values) in grid.iter().enumerate() {
        for (col, &v) in values.iter().enumerate() {
            if v == 0 {
                cells.push((row, col));
            }
        }
    }
    cells
}

/// Rotates the grid 90 degrees counter-clockwise `times` times.
pub fn rotate(grid: &Grid, times: usize) -> Grid {
    let mut out = *grid;
    for _ in 0..times % 4 {
        let prev = out;
        for row in 0..SIZE {
            for col in 0..SIZE {
                out[row][col] = prev[col][SIZE - 1 - row];
            }
        }
    }
    out
}

pub fn is_action_available(grid: &Grid, action: Action) -> bool {
    can_compact_left(&rotate(grid, action.index()))
}

pub fn available_actions(grid: &Grid) -> Vec<Action> {
    Action::ALL.into_iter().filter(|&a| is_action_available(grid, a)).collect()
}

pub fn is_terminal(grid: &Grid) -> bool {
    !Action::ALL.iter().any(|&a| is_action_available(grid, a))
}

// a tile with a gap somewhere to its left, or two equal neighbours
fn can_compact_left(grid: &Grid) -> bool {
    grid.iter().any(|row| {
        let mut has_empty = false;
        for col in 0..SIZE {
            has_empty |= row[col] == 0;
            if row[col] != 0 && (has_empty || (col > 0 && row[col] == row[col - 1])) {
                return true;
            }
        }
        false
    })
}

/// Compacts one row towards index 0, merging equal pairs at most once per
/// tile. Returns the summed magnitude of the merged tiles.
pub fn compact_row(row: &mut [u8; SIZE]) -> u32 {
    let mut reward = 0;
    let mut candidate: Option<usize> = None;
    let mut merged = [false; SIZE];

    for col in 0..SIZE {
        if row[col] == 0 {
            continue;
        }

        match candidate {
            Some(c) if !merged[c] && row[c] == row[col] => {
                row[col] = 0;
                row[c] += 1;
                merged[c] = true;
                reward += tile_value(row[c]);
            }
            _ => {
                let target = candidate.map_or(0, |c| c + 1);
                if target != col {
                    row[target] = row[col];
                    row[col] = 0;
                }
                candidate = Some(target);
            }
        }
    }

    reward
}

/// Board after moving in `action` (no spawn) and the merge reward.
pub fn slide(grid: &Grid, action: Action) -> (Grid, u32) {
    let mut rotated = rotate(grid, action.index());
    let reward = rotated.iter_mut().map(compact_row).sum();
    (rotate(&rotated, 4 - action.index()), reward)
}

// shape (1, 16, 4, 4), channel = exponent
pub fn grid_to_tensor(grid: &Grid) -> Tensor {
    let mut tensor = Tensor::zeros(vec![1, CHANNELS, SIZE, SIZE]);
    for (row, values) in grid.iter().enumerate() {
        for (col, &v) in values.iter().enumerate() {
            if (v as usize) < CHANNELS {
                tensor.set(&[0, v as usize, row, col], 1.0);
            }
        }
    }
    tensor
}
