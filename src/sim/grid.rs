//! Coarse collision grid with one object per cell

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::geometry::GridPoint;

/// What sits in a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occupant {
    /// Index into `GameState::obstacles`
    Obstacle(usize),
    Goal,
}

/// `width x height` cells, each empty or holding exactly one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionGrid {
    width: u32,
    height: u32,
    cells: Vec<Option<Occupant>>,
}

impl CollisionGrid {
    /// Empty grid
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether the cell is inside the grid
    pub fn contains(&self, cell: GridPoint) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as u32) < self.width && (cell.y as u32) < self.height
    }

    fn index(&self, cell: GridPoint) -> Option<usize> {
        self.contains(cell)
            .then(|| cell.y as usize * self.width as usize + cell.x as usize)
    }

    /// Occupant of a cell; `None` for empty or out-of-grid cells
    pub fn get(&self, cell: GridPoint) -> Option<Occupant> {
        self.index(cell).and_then(|i| self.cells[i])
    }

    /// In the grid and empty
    pub fn is_free(&self, cell: GridPoint) -> bool {
        self.index(cell).is_some_and(|i| self.cells[i].is_none())
    }

    /// Put an object in a cell, returning whatever was there before.
    ///
    /// # Panics
    ///
    /// Panics if the cell is outside the grid.
    pub fn insert(&mut self, cell: GridPoint, occupant: Occupant) -> Option<Occupant> {
        let Some(i) = self.index(cell) else {
            panic!("cell {cell:?} outside {}x{} grid", self.width, self.height);
        };
        self.cells[i].replace(occupant)
    }

    /// Empty a cell, returning its previous occupant
    pub fn remove(&mut self, cell: GridPoint) -> Option<Occupant> {
        self.index(cell).and_then(|i| self.cells[i].take())
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// All cells with their occupants, row by row
    pub fn iter(&self) -> impl Iterator<Item = (GridPoint, Option<Occupant>)> + '_ {
        let width = self.width as usize;
        self.cells.iter().enumerate().map(move |(i, occupant)| {
            (GridPoint::new((i % width) as i32, (i / width) as i32), *occupant)
        })
    }

    /// In-grid 4-connected neighbors of a cell
    pub fn neighbors(&self, cell: GridPoint) -> impl Iterator<Item = GridPoint> + '_ {
        cell.neighbors().into_iter().filter(move |n| self.contains(*n))
    }

    /// Breadth-first path lengths over free cells, starting from `seed`.
    ///
    /// The seed itself is always expanded. Occupied cells are never entered,
    /// so a distance here is the length of a real path around obstacles.
    /// Unreached cells are `None`. Indexed like `iter()`.
    pub fn path_lengths(&self, seed: GridPoint) -> Vec<Option<u32>> {
        let mut lengths = vec![None; self.cells.len()];
        let Some(start) = self.index(seed) else {
            return lengths;
        };

        let mut queue = VecDeque::new();
        lengths[start] = Some(0);
        queue.push_back((seed, 0u32));

        while let Some((current, length)) = queue.pop_front() {
            for n in self.neighbors(current) {
                let Some(i) = self.index(n) else { continue };
                if lengths[i].is_none() && self.cells[i].is_none() {
                    lengths[i] = Some(length + 1);
                    queue.push_back((n, length + 1));
                }
            }
        }
        lengths
    }

    /// Free cells reachable from `seed` by a path of at least `min_length`
    /// steps, with their path lengths
    pub fn reachable_at_least(&self, seed: GridPoint, min_length: u32) -> Vec<(GridPoint, u32)> {
        let lengths = self.path_lengths(seed);
        self.iter()
            .zip(lengths)
            .filter_map(|((cell, _), length)| length.map(|l| (cell, l)))
            .filter(|&(_, length)| length >= min_length)
            .collect()
    }
}
