//! Error types for the grid search library

use thiserror::Error;

use crate::grid::Point;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("point {point} is outside the {rows}x{columns} field")]
    OutOfBounds {
        point: Point,
        rows: usize,
        columns: usize,
    },

    #[error("{cells} terrain cells do not fill a {rows}x{columns} field")]
    InvalidDimensions {
        rows: usize,
        columns: usize,
        cells: usize,
    },

    /// The parent chain of a found path does not lead back to the start.
    #[error("parent chain is broken at {at}")]
    BrokenPath { at: String },

    #[error("cannot read a point from {0:?}, expected \"row,col\"")]
    InvalidPoint(String),

    #[error("unknown terrain marker: {0}")]
    UnknownTerrain(u32),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for GridError {
    fn from(e: toml::de::Error) -> Self {
        GridError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GridError>;
