use std::collections::HashMap;

use serde::{Serialize, Deserialize};

use crate::game::{Action, Grid, SIZE};

/// The 16 cell exponents of a board in row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey([u8; SIZE * SIZE]);

impl StateKey {
    pub fn from_grid(grid: &Grid) -> Self {
        let mut cells = [0; SIZE * SIZE];
        for (cell, &v) in cells.iter_mut().zip(grid.iter().flatten()) {
            *cell = v;
        }
        StateKey(cells)
    }

    pub fn cells(&self) -> &[u8; SIZE * SIZE] {
        &self.0
    }
}

impl From<&Grid> for StateKey {
    fn from(grid: &Grid) -> Self {
        StateKey::from_grid(grid)
    }
}

/// Estimated value of taking an action on a board. Unseen pairs are worth 0.0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueTable {
    values: HashMap<(StateKey, Action), f32>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, grid: &Grid, action: Action) -> f32 {
        self.values.get(&(StateKey::from_grid(grid), action)).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, grid: &Grid, action: Action, value: f32) {
        self.values.insert((StateKey::from_grid(grid), action), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(StateKey, Action), &f32)> {
        self.values.iter()
    }

    /// Rounds every stored value to `decimals` places.
    pub fn quantize(&mut self, decimals: u32) {
        let scale = 10f32.powi(decimals as i32);
        for value in self.values.values_mut() {
            *value = (*value * scale).round() / scale;
        }
    }
}
