use std::fmt;
use std::ops::Index;

use hashbrown::HashSet;
use ndarray::Array2;
use rand::prelude::*;
use rand::rngs::SmallRng;
use serde::Serialize;
use smallvec::SmallVec;

use crate::*;

/// The grid of one game: cells in row-major order plus the mine coordinates they were armed from.
///
/// Serialize only: a board is always rebuilt through [`Board::generate`] or [`Board::from_mine_coords`] so its
/// shape and proximity counts match its configuration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Board {
    config: BoardConfig,
    cells: Array2<Cell>,
    mine_locations: Vec<Coord2>,
}

impl Board {
    /// Allocates `rows x columns` blank cells, no mines placed yet.
    pub fn new(config: BoardConfig) -> Self {
        Self {
            config,
            cells: Array2::default((usize::from(config.rows()), usize::from(config.columns()))),
            mine_locations: Vec::new(),
        }
    }

    /// Creates a ready to play board whose mines all lie outside the 3x3 safe zone around `seed`.
    pub fn generate(config: BoardConfig, seed: Coord2, rng: &mut SmallRng) -> Result<Self> {
        let seed = config.validate_coords(seed)?;
        let mut board = Self::new(config);
        board.place_mines(seed, rng)?;
        board.generate_proximity_values();
        log::trace!("Generated board {} from seed {:?}:\n{}", config, seed, board);
        Ok(board)
    }

    /// Builds a board with mines at exactly `mine_coords`, which must be distinct, in bounds, and as many as
    /// the configuration asks for.
    pub fn from_mine_coords(config: BoardConfig, mine_coords: &[Coord2]) -> Result<Self> {
        let mut board = Self::new(config);
        let mut seen = HashSet::with_capacity(mine_coords.len());

        for &coords in mine_coords {
            let coords = config.validate_coords(coords)?;
            if !seen.insert(coords) {
                return Err(GameError::InvalidLayout);
            }
        }
        if seen.len() != usize::from(config.mines()) {
            return Err(GameError::InvalidLayout);
        }

        board.mine_locations = mine_coords.to_vec();
        board.arm_mines();
        board.generate_proximity_values();
        Ok(board)
    }

    /// Rejection-samples distinct mine coordinates outside the safe zone, then arms them.
    pub(crate) fn place_mines(&mut self, seed: Coord2, rng: &mut SmallRng) -> Result<()> {
        let mines = self.config.mines();
        let safe_zone = self.safe_zone(seed);
        // the zone never exceeds 9 cells
        let capacity = self.total_cells() - safe_zone.len() as CellCount;
        if mines > capacity {
            log::warn!(
                "Cannot keep the safe zone around {:?} clear, requested {} mines but only {} cells remain",
                seed,
                mines,
                capacity
            );
            return Err(GameError::TooManyMines { mines, capacity });
        }

        let (columns, rows) = self.size();
        let mut chosen = HashSet::with_capacity(mines.into());
        let mut mine_locations = Vec::with_capacity(mines.into());
        while mine_locations.len() < usize::from(mines) {
            let coords = (rng.random_range(0..columns), rng.random_range(0..rows));
            if safe_zone.contains(&coords) || !chosen.insert(coords) {
                continue;
            }
            mine_locations.push(coords);
        }

        self.mine_locations = mine_locations;
        self.arm_mines();
        Ok(())
    }

    fn arm_mines(&mut self) {
        for &coords in &self.mine_locations {
            self.cells[coords.to_nd_index()].arm();
        }
    }

    /// Increments the proximity count of every neighbor of every mine.
    pub(crate) fn generate_proximity_values(&mut self) {
        for &mine in &self.mine_locations {
            for pos in self.cells.iter_neighbors(mine) {
                self.cells[pos.to_nd_index()].increment_proximity_count();
            }
        }
    }

    /// The seed plus its in-bounds neighbors.
    pub fn safe_zone(&self, seed: Coord2) -> SmallVec<[Coord2; 9]> {
        let mut zone = SmallVec::new();
        zone.push(seed);
        zone.extend(self.iter_neighbors(seed));
        zone
    }

    /// The up to 8 in-bounds neighbors of `coords`.
    pub fn adjacent(&self, coords: Coord2) -> SmallVec<[Coord2; 8]> {
        self.iter_neighbors(coords).collect()
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    /// Board size as `(columns, rows)`.
    pub fn size(&self) -> Coord2 {
        self.config.size()
    }

    pub fn total_cells(&self) -> CellCount {
        self.config.total_cells()
    }

    pub fn mine_count(&self) -> CellCount {
        self.config.mines()
    }

    /// Mine coordinates in the order they were generated.
    pub fn mine_locations(&self) -> &[Coord2] {
        &self.mine_locations
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        self.config.contains(coords)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        self.config.validate_coords(coords)
    }

    pub fn cell_at(&self, coords: Coord2) -> Option<&Cell> {
        if self.contains(coords) {
            Some(&self[coords])
        } else {
            None
        }
    }

    pub(crate) fn cell_mut(&mut self, coords: Coord2) -> &mut Cell {
        &mut self.cells[coords.to_nd_index()]
    }

    /// Whether no cell is left both unrevealed and unmarked.
    pub fn all_activated(&self) -> bool {
        self.cells.iter().all(Cell::is_activated)
    }

    pub fn count_marked_neighbors(&self, coords: Coord2) -> u8 {
        self.iter_neighbors(coords)
            .filter(|&pos| self[pos].marking().is_marked())
            .count() as u8
    }

    /// Iterates `(coords, cell)` pairs row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Coord2, &Cell)> {
        self.cells
            .indexed_iter()
            .map(|((row, column), cell)| ((column as Coord, row as Coord), cell))
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

/// Debug dump of the solution: `*` for mines, the proximity count otherwise, blank for zero.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.rows() {
            for cell in row {
                match (cell.is_armed(), cell.proximity_count()) {
                    (true, _) => f.write_str(" *")?,
                    (false, 0) => f.write_str("  ")?,
                    (false, count) => write!(f, " {count}")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
