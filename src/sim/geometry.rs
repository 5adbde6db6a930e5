//! Map space vs. collision-grid space
//!
//! Continuous map coordinates and discrete grid cells are separate types.
//! `Arena::map_to_collision` and `Arena::collision_to_map` are the only ways
//! across.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::is_in_bound;

/// A point on the continuous map (map units)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f32,
    pub y: f32,
}

impl MapPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<Vec2> for MapPoint {
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

/// A collision-grid cell. May lie outside the grid when mapped from an
/// off-map point; check with `CollisionGrid::contains`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell and its 8 neighbors, unclipped
    pub fn surrounding(self) -> impl Iterator<Item = GridPoint> {
        (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| GridPoint::new(self.x + dx, self.y + dy)))
    }

    /// 4-connected neighbors, unclipped
    pub fn neighbors(self) -> [GridPoint; 4] {
        [
            GridPoint::new(self.x - 1, self.y),
            GridPoint::new(self.x + 1, self.y),
            GridPoint::new(self.x, self.y - 1),
            GridPoint::new(self.x, self.y + 1),
        ]
    }
}

/// Map and grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub map_width: f32,
    pub map_height: f32,
    pub grid_width: u32,
    pub grid_height: u32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            map_width: MAP_WIDTH,
            map_height: MAP_HEIGHT,
            grid_width: GRID_WIDTH,
            grid_height: GRID_HEIGHT,
        }
    }
}

impl Arena {
    /// Map units per cell along each axis
    pub fn cell_size(&self) -> Vec2 {
        Vec2::new(
            self.map_width / self.grid_width as f32,
            self.map_height / self.grid_height as f32,
        )
    }

    /// Cell containing a map point
    pub fn map_to_collision(&self, p: MapPoint) -> GridPoint {
        GridPoint::new(
            (p.x * self.grid_width as f32 / self.map_width).floor() as i32,
            (p.y * self.grid_height as f32 / self.map_height).floor() as i32,
        )
    }

    /// Map position of a cell's low corner (where objects are anchored)
    pub fn collision_to_map(&self, cell: GridPoint) -> MapPoint {
        MapPoint::new(
            cell.x as f32 * self.map_width / self.grid_width as f32,
            cell.y as f32 * self.map_height / self.grid_height as f32,
        )
    }

    /// Map position of a cell's center
    pub fn cell_center(&self, cell: GridPoint) -> MapPoint {
        let corner = self.collision_to_map(cell).as_vec2();
        (corner + self.cell_size() * 0.5).into()
    }

    /// Inside the map, allowing `margin` units of overhang
    pub fn contains(&self, p: MapPoint, margin: f32) -> bool {
        is_in_bound(p.x, p.y, self.map_width, self.map_height, margin)
    }

    /// Nearest in-grid cell
    pub fn clamp_cell(&self, cell: GridPoint) -> GridPoint {
        GridPoint::new(
            cell.x.clamp(0, self.grid_width as i32 - 1),
            cell.y.clamp(0, self.grid_height as i32 - 1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_to_collision_floors() {
        let arena = Arena::default();
        assert_eq!(arena.map_to_collision(MapPoint::new(50.0, 50.0)), GridPoint::new(1, 1));
        assert_eq!(arena.map_to_collision(MapPoint::new(49.9, 0.0)), GridPoint::new(0, 0));
        assert_eq!(arena.map_to_collision(MapPoint::new(999.9, 999.9)), GridPoint::new(19, 19));
        assert_eq!(arena.map_to_collision(MapPoint::new(-0.5, 1000.0)), GridPoint::new(-1, 20));
    }

    #[test]
    fn test_round_trip_cell_corner() {
        let arena = Arena::default();
        let cell = GridPoint::new(7, 13);
        assert_eq!(arena.collision_to_map(cell), MapPoint::new(350.0, 650.0));
        assert_eq!(arena.map_to_collision(arena.collision_to_map(cell)), cell);
        assert_eq!(arena.cell_center(cell), MapPoint::new(375.0, 675.0));
    }

    #[test]
    fn test_surrounding_has_nine_cells() {
        let cells: Vec<_> = GridPoint::new(0, 0).surrounding().collect();
        assert_eq!(cells.len(), 9);
        assert!(cells.contains(&GridPoint::new(-1, -1)));
        assert!(cells.contains(&GridPoint::new(1, 1)));
    }

    #[test]
    fn test_clamp_cell() {
        let arena = Arena::default();
        assert_eq!(arena.clamp_cell(GridPoint::new(-1, 25)), GridPoint::new(0, 19));
    }
}
