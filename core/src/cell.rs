use serde::{Deserialize, Serialize};

/// Player marking of an unrevealed cell, advanced by [`Marking::next`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marking {
    #[default]
    NotMarked,
    Marked,
    Questioned,
}

impl Marking {
    /// One step of the `NotMarked -> Marked -> Questioned -> NotMarked` cycle.
    pub const fn next(self) -> Self {
        match self {
            Self::NotMarked => Self::Marked,
            Self::Marked => Self::Questioned,
            Self::Questioned => Self::NotMarked,
        }
    }

    pub const fn is_marked(self) -> bool {
        matches!(self, Self::Marked)
    }
}

/// One grid square, owned by its [`Board`](crate::Board) slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    armed: bool,
    proximity_count: u8,
    marking: Marking,
    revealed: bool,
}

impl Cell {
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Number of armed neighbors. Armed cells carry a count too, it is just never shown.
    pub const fn proximity_count(&self) -> u8 {
        self.proximity_count
    }

    pub const fn marking(&self) -> Marking {
        self.marking
    }

    pub const fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Revealed or flagged, i.e. nothing left for the player to decide on this cell.
    pub const fn is_activated(&self) -> bool {
        self.revealed || self.marking.is_marked()
    }

    pub(crate) fn arm(&mut self) {
        self.armed = true;
    }

    pub(crate) fn increment_proximity_count(&mut self) {
        self.proximity_count += 1;
    }

    pub(crate) fn reveal(&mut self) {
        self.revealed = true;
    }

    pub(crate) fn cycle_marking(&mut self) -> Marking {
        self.marking = self.marking.next();
        self.marking
    }
}
