use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// The kind of move between two adjacent cells
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Step {
    Orthogonal,
    Diagonal,
}

/// Fixed movement costs, added to the accumulated cost of the cell a move starts from
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    pub orthogonal: usize,
    /// roughly `orthogonal * sqrt(2)`
    pub diagonal: usize,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            orthogonal: 10,
            diagonal: 14,
        }
    }
}

impl CostModel {
    pub fn step_cost(&self, step: Step) -> usize {
        match step {
            Step::Orthogonal => self.orthogonal,
            Step::Diagonal => self.diagonal,
        }
    }

    /// Accumulated cost after taking `step` from a cell whose cost is `g`
    pub fn advance(&self, g: usize, step: Step) -> usize {
        g.saturating_add(self.step_cost(step))
    }
}

/// Estimate of the remaining cost towards the goal
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Heuristic {
    /// Manhattan distance in the same units as the step costs
    #[default]
    Manhattan,
    /// Plain Manhattan distance, not scaled to the step costs
    ManhattanUnscaled,
    /// Exact cost over an unobstructed 8-connected grid, never overestimates
    Octile,
}

impl Heuristic {
    /// Estimate for a cell that is `d_row` rows and `d_col` columns away from the goal
    pub fn estimate(&self, d_row: usize, d_col: usize, costs: &CostModel) -> usize {
        match self {
            Heuristic::Manhattan => (d_row + d_col).saturating_mul(costs.orthogonal),
            Heuristic::ManhattanUnscaled => d_row + d_col,
            Heuristic::Octile => {
                let (long, short) = (d_row.max(d_col), d_row.min(d_col));
                let diagonal_extra = costs.diagonal.saturating_sub(costs.orthogonal);
                long.saturating_mul(costs.orthogonal)
                    .saturating_add(short.saturating_mul(diagonal_extra))
            }
        }
    }
}

impl Display for Heuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Heuristic::Manhattan => "manhattan",
                Heuristic::ManhattanUnscaled => "manhattan-unscaled",
                Heuristic::Octile => "octile",
            }
        )
    }
}

impl FromStr for Heuristic {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manhattan" => Ok(Heuristic::Manhattan),
            "manhattan-unscaled" => Ok(Heuristic::ManhattanUnscaled),
            "octile" => Ok(Heuristic::Octile),
            _ => Err(GridError::Config(format!("Invalid heuristic: {}", s))),
        }
    }
}
