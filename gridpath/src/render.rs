use std::{collections::HashSet, fmt::Display};

use crate::grid::{Field, Point};

/// Draws a field two characters per cell: `[]` for walls, `::` for cells on the path and
/// blanks for everything else.
pub struct PathOverlay<'a> {
    pub field: &'a Field,
    pub path: &'a [Point],
}

impl Display for PathOverlay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let on_path: HashSet<Point> = self.path.iter().copied().collect();

        for row in 0..self.field.rows() {
            for col in 0..self.field.columns() {
                let point = Point::new(row, col);
                let is_wall = self
                    .field
                    .terrain(point)
                    .map_err(|_| std::fmt::Error)?
                    .is_wall();

                if is_wall {
                    write!(f, "[]")?;
                } else if on_path.contains(&point) {
                    write!(f, "::")?;
                } else {
                    write!(f, "  ")?;
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
