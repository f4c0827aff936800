use serde::{Deserialize, Serialize};

use crate::*;

/// A state change the presentation layer has to apply, in the order it happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// The first reveal materialized the board.
    BoardCreated { rows: Coord, columns: Coord },
    CellRevealed { coords: Coord2, proximity_count: u8 },
    MarkingChanged { coords: Coord2, marking: Marking },
    MarkingRatioChanged { marked: CellCount, total: CellCount },
    Won { elapsed_ms: u64, new_record: bool },
    /// `mines` lists every mine in generation order, `losing` the one that was stepped on.
    Lost { mines: Vec<Coord2>, losing: Coord2 },
}

impl GameEvent {
    pub const fn is_game_over(&self) -> bool {
        matches!(self, Self::Won { .. } | Self::Lost { .. })
    }
}

/// Result of a marking-cycle request: the cell's marking afterwards and the changes it caused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkingUpdate {
    pub marking: Marking,
    pub events: Vec<GameEvent>,
}

impl MarkingUpdate {
    pub(crate) fn unchanged(marking: Marking) -> Self {
        Self {
            marking,
            events: Vec::new(),
        }
    }

    /// Whether this update could have caused a change to the game
    pub fn has_update(&self) -> bool {
        !self.events.is_empty()
    }
}
