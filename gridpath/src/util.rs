use std::path::Path;

use anyhow::Context;
use image::{DynamicImage, GenericImageView};
use log::{debug, warn};

use crate::error::GridError;
use crate::grid::{Field, Terrain};

/// Read a field from marker text: the row count, the column count, then one marker per cell in
/// row-major order (0 = open, 1 = land, 9 = wall). Any run of non-digits separates numbers.
pub fn parse_markers(text: &str) -> Result<Field, anyhow::Error> {
    let mut numbers = text
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .with_context(|| format!("invalid number {:?} in marker map", s))
        });

    let rows = numbers.next().context("marker map is empty")?? as usize;
    let columns = numbers.next().context("marker map has no column count")?? as usize;
    let cells = rows
        .checked_mul(columns)
        .ok_or(GridError::InvalidDimensions {
            rows,
            columns,
            cells: 0,
        })?;

    // the header may claim more cells than the text holds
    let mut terrain = Vec::with_capacity(cells.min(text.len()));
    for number in numbers.by_ref().take(cells) {
        terrain.push(Terrain::from_marker(number?)?);
    }

    let extra = numbers.count();
    if extra > 0 {
        warn!(
            "ignoring {} markers past the end of a {}x{} map",
            extra, rows, columns
        );
    }

    debug!("parsed {}x{} marker map", rows, columns);
    Ok(Field::new(rows, columns, terrain)?)
}

/// Dark pixels become walls, everything else land
pub fn parse_img(img: &DynamicImage) -> Result<Field, anyhow::Error> {
    let width = img.width() as usize;
    let height = img.height() as usize;

    let mut terrain = Vec::with_capacity(width * height);

    for row in 0..height {
        for col in 0..width {
            let p = img.get_pixel(col as u32, row as u32);

            terrain.push(if p.0[0] < 128 {
                Terrain::Wall
            } else {
                Terrain::Land
            });
        }
    }

    Ok(Field::new(height, width, terrain)?)
}

/// Load a field from an image (by extension) or a marker text file
pub fn load_field(path: &Path) -> Result<Field, anyhow::Error> {
    let is_image = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            matches!(
                e.to_ascii_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "bmp" | "gif"
            )
        });

    if is_image {
        let img =
            image::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        return parse_img(&img).with_context(|| format!("failed to read {}", path.display()));
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_markers(&text).with_context(|| format!("failed to parse {}", path.display()))
}
