use crate::cost::Step;
use crate::error::{GridError, Result};
use crate::find::{MapStorage, MapTrait, NodeReference};
use log::warn;
use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// What occupies a single cell of the field. Only walls block movement.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Open,
    Land,
    Wall,
}

impl Terrain {
    /// Decode a map file marker: 0 = open, 1 = land, 9 = wall
    pub fn from_marker(marker: u32) -> Result<Self> {
        match marker {
            0 => Ok(Terrain::Open),
            1 => Ok(Terrain::Land),
            9 => Ok(Terrain::Wall),
            m => Err(GridError::UnknownTerrain(m)),
        }
    }

    pub fn marker(&self) -> u32 {
        match self {
            Terrain::Open => 0,
            Terrain::Land => 1,
            Terrain::Wall => 9,
        }
    }

    pub fn is_wall(&self) -> bool {
        *self == Terrain::Wall
    }
}

impl Display for Terrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Terrain::Open => " ",
                Terrain::Land => ".",
                Terrain::Wall => "X",
            }
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl NodeReference for Point {}

impl Point {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The point shifted by the given amount, or `None` if that would leave the first quadrant
    pub fn offset(&self, d_row: isize, d_col: isize) -> Option<Point> {
        Some(Point {
            row: self.row.checked_add_signed(d_row)?,
            col: self.col.checked_add_signed(d_col)?,
        })
    }

    /// Absolute row and column distance to another point
    pub fn distance(&self, other: Point) -> (usize, usize) {
        (self.row.abs_diff(other.row), self.col.abs_diff(other.col))
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl FromStr for Point {
    type Err = GridError;

    /// Accepts `row,col`, optionally wrapped in parentheses
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || GridError::InvalidPoint(s.to_owned());

        let inner = s.trim().trim_start_matches('(').trim_end_matches(')');
        let (row, col) = inner.split_once(',').ok_or_else(invalid)?;

        Ok(Point {
            row: row.trim().parse().map_err(|_| invalid())?,
            col: col.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// The eight moves out of a cell, listed clockwise from north
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Row and column offset of the move (rows grow southwards)
    pub fn delta(&self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::NorthEast => (-1, 1),
            Direction::East => (0, 1),
            Direction::SouthEast => (1, 1),
            Direction::South => (1, 0),
            Direction::SouthWest => (1, -1),
            Direction::West => (0, -1),
            Direction::NorthWest => (-1, -1),
        }
    }

    pub fn step(&self) -> Step {
        match self.flanks() {
            Some(_) => Step::Diagonal,
            None => Step::Orthogonal,
        }
    }

    /// The two orthogonal moves that border a diagonal move; both must be free to take it
    pub fn flanks(&self) -> Option<[Direction; 2]> {
        match self {
            Direction::NorthEast => Some([Direction::North, Direction::East]),
            Direction::SouthEast => Some([Direction::South, Direction::East]),
            Direction::SouthWest => Some([Direction::South, Direction::West]),
            Direction::NorthWest => Some([Direction::North, Direction::West]),
            _ => None,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Direction::North => "N",
                Direction::NorthEast => "NE",
                Direction::East => "E",
                Direction::SouthEast => "SE",
                Direction::South => "S",
                Direction::SouthWest => "SW",
                Direction::West => "W",
                Direction::NorthWest => "NW",
            }
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub point: Point,
    pub terrain: Terrain,
}

/// An in-bounds cell adjacent to some other cell
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Neighbor {
    pub point: Point,
    pub direction: Direction,
    pub terrain: Terrain,
    /// false for walls and for diagonal moves that would cut a wall corner
    pub passable: bool,
}

/// A rectangular field of terrain cells stored row by row
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Field {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
}

impl Field {
    /// Build a field from terrain values given in row-major order
    pub fn new(rows: usize, columns: usize, terrain: Vec<Terrain>) -> Result<Self> {
        if rows.checked_mul(columns) != Some(terrain.len()) {
            return Err(GridError::InvalidDimensions {
                rows,
                columns,
                cells: terrain.len(),
            });
        }

        let cells = terrain
            .into_iter()
            .enumerate()
            .map(|(i, terrain)| Cell {
                point: Point::new(i / columns, i % columns),
                terrain,
            })
            .collect();

        Ok(Self {
            rows,
            columns,
            cells,
        })
    }

    /// A field where every cell has the same terrain
    pub fn filled(rows: usize, columns: usize, terrain: Terrain) -> Result<Self> {
        let count = rows
            .checked_mul(columns)
            .ok_or(GridError::InvalidDimensions {
                rows,
                columns,
                cells: 0,
            })?;
        Self::new(rows, columns, vec![terrain; count])
    }

    /// Replace the terrain of the given points
    pub fn with_terrain(
        mut self,
        terrain: Terrain,
        points: impl IntoIterator<Item = Point>,
    ) -> Result<Self> {
        for point in points {
            let index = self.index_of(point)?;
            self.cells[index].terrain = terrain;
        }
        Ok(self)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn contains(&self, point: Point) -> bool {
        point.row < self.rows && point.col < self.columns
    }

    pub fn index_of(&self, point: Point) -> Result<usize> {
        if !self.contains(point) {
            return Err(GridError::OutOfBounds {
                point,
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(point.row * self.columns + point.col)
    }

    pub fn at(&self, point: Point) -> Result<&Cell> {
        let index = self.index_of(point)?;
        Ok(&self.cells[index])
    }

    pub fn terrain(&self, point: Point) -> Result<Terrain> {
        self.at(point).map(|cell| cell.terrain)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// All in-bounds neighbors of `point` in clockwise order starting north.
    /// Neighbors beyond the edge of the field are left out.
    pub fn neighbors(&self, point: Point) -> Result<Vec<Neighbor>> {
        self.index_of(point)?;

        let is_free = |direction: Direction| {
            let (d_row, d_col) = direction.delta();
            point
                .offset(d_row, d_col)
                .and_then(|p| self.at(p).ok())
                .is_some_and(|cell| !cell.terrain.is_wall())
        };

        let mut neighbors = Vec::with_capacity(8);
        for direction in Direction::ALL {
            let (d_row, d_col) = direction.delta();
            let Some(cell) = point.offset(d_row, d_col).and_then(|p| self.at(p).ok()) else {
                continue;
            };

            let passable = !cell.terrain.is_wall()
                && direction
                    .flanks()
                    .map_or(true, |flanks| flanks.into_iter().all(is_free));

            neighbors.push(Neighbor {
                point: cell.point,
                direction,
                terrain: cell.terrain,
                passable,
            });
        }

        Ok(neighbors)
    }

    /// Scales the field by the given factor, i.e. to make it twice as large, pass 2.
    /// Every cell is repeated as a `factor` x `factor` block.
    pub fn scale_up(&mut self, factor: usize) -> Result<()> {
        let (rows, columns) = match (
            self.rows.checked_mul(factor),
            self.columns.checked_mul(factor),
        ) {
            (Some(rows), Some(columns)) if rows.checked_mul(columns).is_some() => (rows, columns),
            _ => {
                return Err(GridError::InvalidDimensions {
                    rows: self.rows,
                    columns: self.columns,
                    cells: self.cells.len(),
                })
            }
        };

        let mut cells = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for col in 0..columns {
                let source = &self.cells[(row / factor) * self.columns + col / factor];
                cells.push(Cell {
                    point: Point::new(row, col),
                    terrain: source.terrain,
                });
            }
        }

        self.rows = rows;
        self.columns = columns;
        self.cells = cells;
        Ok(())
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(self.columns.max(1)) {
            for cell in row {
                write!(f, "{}", cell.terrain)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// A MapStorage with one slot per field cell, laid out like the field itself
#[derive(Debug)]
pub struct CellStorage<T> {
    columns: usize,
    slots: Vec<T>,
}

impl<T: Copy + 'static> MapStorage<T> for CellStorage<T> {
    type Reference = Point;

    fn is_valid(&self, node: Self::Reference) -> bool {
        node.col < self.columns && node.row * self.columns + node.col < self.slots.len()
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn get(&self, node: Self::Reference) -> T {
        self.slots[node.row * self.columns + node.col]
    }

    fn get_mut(&mut self, node: Self::Reference) -> &mut T {
        &mut self.slots[node.row * self.columns + node.col]
    }
}

impl<T: Display> Display for CellStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.slots.chunks(self.columns.max(1)) {
            for slot in row {
                write!(f, "{}", slot)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl MapTrait for Field {
    type Reference = Point;
    type Storage<T: Default + Copy + Clone + 'static> = CellStorage<T>;

    fn validate(&self, node: Self::Reference) -> Result<()> {
        self.index_of(node).map(|_| ())
    }

    /// Passable neighbors only. `PathFinder::new` validates both endpoints, so an out-of-bounds
    /// node never reaches here during a search; if one does it has no neighbors.
    fn neighbors_of(&self, node: Self::Reference) -> impl Iterator<Item = (Self::Reference, Step)> {
        self.neighbors(node)
            .unwrap_or_else(|e| {
                warn!("no neighbors for {}: {}", node, e);
                Vec::new()
            })
            .into_iter()
            .filter(|n| n.passable)
            .map(|n| (n.point, n.direction.step()))
    }

    fn distance(&self, from: Self::Reference, to: Self::Reference) -> (usize, usize) {
        from.distance(to)
    }

    fn create_storage<T: Default + Copy + Clone + 'static>(&self) -> Self::Storage<T> {
        CellStorage {
            columns: self.columns,
            slots: vec![Default::default(); self.rows * self.columns],
        }
    }
}

/// Build a field from ASCII rows: `#` wall, `.` land, anything else open
#[cfg(test)]
pub(crate) fn field_from_ascii(rows: &[&str]) -> Field {
    let columns = rows.first().map_or(0, |r| r.len());
    let terrain = rows
        .iter()
        .flat_map(|r| r.chars())
        .map(|c| match c {
            '#' => Terrain::Wall,
            '.' => Terrain::Land,
            _ => Terrain::Open,
        })
        .collect();
    Field::new(rows.len(), columns, terrain).unwrap()
}
