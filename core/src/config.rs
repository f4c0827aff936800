use std::fmt;
use std::str::FromStr;

use rand::prelude::*;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::*;

pub const MIN_AXIS_SIZE: Coord = 6;
pub const MAX_AXIS_SIZE: Coord = 100;

/// Lower mine bound, in percent of the board area.
pub const MIN_MINE_PERCENT: u8 = 10;
/// Upper mine bound, in percent of the board area.
pub const MAX_MINE_PERCENT: u8 = 60;

/// Validated `(mines, rows, columns)` triple. Only obtainable through [`BoardConfig::validate`], its
/// text variants, the presets, or [`BoardConfig::random`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBoardConfig")]
pub struct BoardConfig {
    mines: CellCount,
    rows: Coord,
    columns: Coord,
}

/// Wire form of [`BoardConfig`], validated on the way in.
#[derive(Deserialize)]
struct RawBoardConfig {
    mines: i64,
    rows: i64,
    columns: i64,
}

impl TryFrom<RawBoardConfig> for BoardConfig {
    type Error = ConfigError;

    fn try_from(raw: RawBoardConfig) -> std::result::Result<Self, Self::Error> {
        Self::validate(raw.mines, raw.rows, raw.columns)
    }
}

impl BoardConfig {
    pub const EASY: Self = Self::new_unchecked(10, 8, 8);
    pub const MEDIUM: Self = Self::new_unchecked(40, 16, 16);
    pub const HARD: Self = Self::new_unchecked(99, 16, 30);

    pub(crate) const fn new_unchecked(mines: CellCount, rows: Coord, columns: Coord) -> Self {
        Self {
            mines,
            rows,
            columns,
        }
    }

    /// Checks every bound independently and reports the complete violation set.
    pub fn validate(mines: i64, rows: i64, columns: i64) -> std::result::Result<Self, ConfigError> {
        let violations = violations(mines, rows, columns);
        if !violations.is_empty() {
            log::debug!(
                "Rejected board configuration {}:{}:{}, violations: {:?}",
                mines,
                rows,
                columns,
                violations
            );
            return Err(ConfigError::Violations(violations));
        }

        // the bounds above guarantee these fit
        Ok(Self::new_unchecked(
            mines as CellCount,
            rows as Coord,
            columns as Coord,
        ))
    }

    /// Parses the three text fields of a parameter dialog, then validates them.
    pub fn parse(mines: &str, rows: &str, columns: &str) -> std::result::Result<Self, ConfigError> {
        let mines = parse_field(ConfigField::Mines, mines)?;
        let rows = parse_field(ConfigField::Rows, rows)?;
        let columns = parse_field(ConfigField::Columns, columns)?;
        Self::validate(mines, rows, columns)
    }

    /// Draws axis sizes uniformly in `[MIN_AXIS_SIZE, MAX_AXIS_SIZE]` and a mine count uniformly inside the
    /// percentage band of the resulting area.
    pub fn random(rng: &mut SmallRng) -> Self {
        let rows: Coord = rng.random_range(MIN_AXIS_SIZE..=MAX_AXIS_SIZE);
        let columns: Coord = rng.random_range(MIN_AXIS_SIZE..=MAX_AXIS_SIZE);
        let (min_mines, max_mines) = mine_bounds(mult(rows, columns));
        let mines = rng.random_range(min_mines..=max_mines);
        log::debug!("Random board configuration {}:{}:{}", mines, rows, columns);
        Self::new_unchecked(mines, rows, columns)
    }

    pub const fn mines(&self) -> CellCount {
        self.mines
    }

    pub const fn rows(&self) -> Coord {
        self.rows
    }

    pub const fn columns(&self) -> Coord {
        self.columns
    }

    /// Board size as `(columns, rows)`, matching the coordinate order.
    pub const fn size(&self) -> Coord2 {
        (self.columns, self.rows)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.columns, self.rows)
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        coords.0 < self.columns && coords.1 < self.rows
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.contains(coords) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }
}

impl fmt::Display for BoardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.mines, self.rows, self.columns)
    }
}

/// Parses the `mines:rows:columns` form produced by `Display`.
impl FromStr for BoardConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(mines), Some(rows), Some(columns), None) => Self::parse(mines, rows, columns),
            _ => Err(ConfigError::Malformed(s.into())),
        }
    }
}

fn parse_field(field: ConfigField, value: &str) -> std::result::Result<i64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            field,
            value: value.into(),
        })
}

fn violations(mines: i64, rows: i64, columns: i64) -> Vec<Violation> {
    use Violation::*;

    let min_axis = i64::from(MIN_AXIS_SIZE);
    let max_axis = i64::from(MAX_AXIS_SIZE);
    let area = rows.max(0).saturating_mul(columns.max(0));
    let scaled_mines = mines.saturating_mul(100);

    let mut violations = Vec::new();
    if rows < min_axis {
        violations.push(RowsBelowMin);
    }
    if rows > max_axis {
        violations.push(RowsAboveMax);
    }
    if columns < min_axis {
        violations.push(ColumnsBelowMin);
    }
    if columns > max_axis {
        violations.push(ColumnsAboveMax);
    }
    if scaled_mines < area.saturating_mul(MIN_MINE_PERCENT.into()) {
        violations.push(MinesBelowMin);
    }
    if scaled_mines > area.saturating_mul(MAX_MINE_PERCENT.into()) {
        violations.push(MinesAboveMax);
    }
    violations
}

/// Inclusive mine count band for `area` cells.
fn mine_bounds(area: CellCount) -> (CellCount, CellCount) {
    let area = u32::from(area);
    let min = (area * u32::from(MIN_MINE_PERCENT)).div_ceil(100);
    let max = area * u32::from(MAX_MINE_PERCENT) / 100;
    // area is at most MAX_AXIS_SIZE squared, which fits
    (min as CellCount, max as CellCount)
}

/// Difficulty presets offered by the new-game dialog.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    Easy,
    Medium,
    Hard,
    Random,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Easy, Preset::Medium, Preset::Hard, Preset::Random];

    /// The fixed configuration of this preset, `None` for [`Preset::Random`].
    pub const fn fixed(self) -> Option<BoardConfig> {
        match self {
            Self::Easy => Some(BoardConfig::EASY),
            Self::Medium => Some(BoardConfig::MEDIUM),
            Self::Hard => Some(BoardConfig::HARD),
            Self::Random => None,
        }
    }

    pub fn config(self, rng: &mut SmallRng) -> BoardConfig {
        self.fixed().unwrap_or_else(|| BoardConfig::random(rng))
    }
}
