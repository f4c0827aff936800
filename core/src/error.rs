use std::fmt;
use thiserror::Error;

use crate::{CellCount, MAX_AXIS_SIZE, MAX_MINE_PERCENT, MIN_AXIS_SIZE, MIN_MINE_PERCENT};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Too many mines, requested {mines} but only {capacity} cells are outside the safe zone")]
    TooManyMines { mines: CellCount, capacity: CellCount },
    #[error("Mine layout does not match the board configuration")]
    InvalidLayout,
    #[error("Game has not started, reveal a cell first")]
    NotStarted,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
}

pub type Result<T> = std::result::Result<T, GameError>;

/// One failed bound check of a requested board configuration.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Violation {
    #[error("Rows need to be at least {}", MIN_AXIS_SIZE)]
    RowsBelowMin,
    #[error("Rows need to be at most {}", MAX_AXIS_SIZE)]
    RowsAboveMax,
    #[error("Columns need to be at least {}", MIN_AXIS_SIZE)]
    ColumnsBelowMin,
    #[error("Columns need to be at most {}", MAX_AXIS_SIZE)]
    ColumnsAboveMax,
    #[error("Mines need to be at least {}% of the area", MIN_MINE_PERCENT)]
    MinesBelowMin,
    #[error("Mines need to be at most {}% of the area", MAX_MINE_PERCENT)]
    MinesAboveMax,
}

/// Names the text field a configuration value was parsed from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigField {
    Mines,
    Rows,
    Columns,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mines => "mines",
            Self::Rows => "rows",
            Self::Columns => "columns",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid board configuration: {}", join_violations(.0))]
    Violations(Vec<Violation>),
    #[error("Invalid number for {field}: {value:?}")]
    InvalidNumber { field: ConfigField, value: String },
    #[error("Malformed board configuration {0:?}, expected mines:rows:columns")]
    Malformed(String),
}

impl ConfigError {
    /// The violation codes carried by this error, empty for parse failures.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Violations(violations) => violations,
            _ => &[],
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for (i, violation) in violations.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        let _ = write!(out, "{violation}");
    }
    out
}
