//! Grid and cell types.
//!
//! A grid is a row-major matrix of cells. Only the structural part of a cell
//! (activity, supercharge, tech, module, bonus flag) travels in a token; the
//! display fields are filled in from a catalog on decode.

use serde::{Deserialize, Serialize};

use crate::limits::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Grid dimensions agreed on out of band by encoder and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

impl Dimensions {
    /// Creates dimensions of `width` columns by `height` rows.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of cells covered by these dimensions.
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

/// One grid slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Cell {
    /// Whether the slot participates at all.
    pub active: bool,
    /// Bonus modifier; only meaningful on active cells.
    pub supercharged: bool,
    /// Technology category occupying the cell.
    pub tech: Option<String>,
    /// Module instance occupying the cell.
    pub module: Option<String>,
    /// Previously computed adjacency bonus. Only `> 0` survives a round trip.
    pub adjacency_bonus: f64,

    // Display and scoring fields, rebuilt from the catalog.
    pub label: String,
    pub image: Option<String>,
    pub bonus: f64,
    pub value: f64,
    pub adjacency: bool,
    pub sc_eligible: bool,
}

impl Cell {
    /// Creates an active, empty cell.
    pub fn active() -> Self {
        Self {
            active: true,
            ..Self::default()
        }
    }

    /// Returns true when the cell carries a positive adjacency bonus.
    #[inline]
    pub fn has_adjacency_bonus(&self) -> bool {
        self.adjacency_bonus > 0.0
    }

    /// Returns true if the structural state (the part carried by a token)
    /// of both cells is the same.
    pub fn same_structure(&self, other: &Cell) -> bool {
        self.active == other.active
            && (self.supercharged && self.active) == (other.supercharged && other.active)
            && self.tech == other.tech
            && self.module == other.module
            && self.has_adjacency_bonus() == other.has_adjacency_bonus()
    }
}

/// A rectangular, row-major matrix of cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Grid {
    /// Rows of cells, top to bottom.
    pub cells: Vec<Vec<Cell>>,
}

impl Grid {
    /// Creates a grid of default (inactive, empty) cells.
    pub fn new(dims: Dimensions) -> Self {
        Self {
            cells: vec![vec![Cell::default(); dims.width]; dims.height],
        }
    }

    /// Creates a grid from rows of cells.
    pub fn from_rows(cells: Vec<Vec<Cell>>) -> Self {
        Self { cells }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.cells.len()
    }

    /// Number of columns (taken from the first row).
    pub fn width(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    /// Dimensions of this grid.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    /// Returns the cell at column `x`, row `y`.
    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.cells.get(y).and_then(|row| row.get(x))
    }

    /// Returns the cell at column `x`, row `y` mutably.
    pub fn cell_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        self.cells.get_mut(y).and_then(|row| row.get_mut(x))
    }

    /// Iterates cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().flatten()
    }

    /// Iterates cells mutably in row-major order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(Dimensions::default());
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 6);
        assert_eq!(grid.dimensions(), Dimensions::default());
        assert_eq!(grid.iter().count(), 60);
        assert!(grid.iter().all(|c| !c.active && c.tech.is_none()));
    }

    #[test]
    fn test_row_major_order() {
        let mut grid = Grid::new(Dimensions::new(3, 2));
        if let Some(cell) = grid.cell_mut(0, 1) {
            cell.tech = Some("pulse".to_string());
        }
        let index = grid.iter().position(|c| c.tech.is_some());
        assert_eq!(index, Some(3));
        assert!(grid.cell(3, 0).is_none());
    }

    #[test]
    fn test_same_structure_ignores_display_fields() {
        let mut a = Cell::active();
        a.adjacency_bonus = 2.5;
        let mut b = Cell::active();
        b.adjacency_bonus = 1.0;
        b.label = "Pulse Engine".to_string();
        assert!(a.same_structure(&b));

        // Supercharge on an inactive cell is not structural.
        let c = Cell { supercharged: true, ..Cell::default() };
        assert!(c.same_structure(&Cell::default()));
    }

    #[test]
    fn test_cell_json_defaults() {
        let cell: Cell = serde_json::from_str(r#"{"active":true,"tech":"pulse"}"#).unwrap();
        assert!(cell.active);
        assert_eq!(cell.tech.as_deref(), Some("pulse"));
        assert_eq!(cell.module, None);
        assert_eq!(cell.adjacency_bonus, 0.0);
    }
}
