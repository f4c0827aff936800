use serde::{Deserialize, Serialize};

use crate::*;

/// Name an entry carries until the player finalizes it.
pub const DEFAULT_USER: &str = "user";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    user: String,
    time: u64,
    config: BoardConfig,
    finalized: bool,
}

impl LeaderboardEntry {
    /// A finalized entry, e.g. one restored by a persistence layer.
    pub fn new(user: impl Into<String>, time: u64, config: BoardConfig) -> Self {
        Self {
            user: user.into(),
            time,
            config,
            finalized: true,
        }
    }

    fn pending(time: u64, config: BoardConfig) -> Self {
        Self {
            user: DEFAULT_USER.into(),
            time,
            config,
            finalized: false,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Winning time in milliseconds.
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn finalize(&mut self, user: impl Into<String>) {
        if !self.finalized {
            self.user = user.into();
            self.finalized = true;
        }
    }
}

/// Best times, fastest first, at most [`Leaderboard::MAX_ENTRIES`] long.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub const MAX_ENTRIES: usize = 10;

    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a table from stored entries, re-sorting and trimming them.
    pub fn from_entries(entries: impl IntoIterator<Item = LeaderboardEntry>) -> Self {
        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.sort_by_key(LeaderboardEntry::time);
        entries.truncate(Self::MAX_ENTRIES);
        Self { entries }
    }

    /// Entries ranked fastest first.
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= Self::MAX_ENTRIES
    }

    /// The slowest ranked entry.
    pub fn lowest_rank(&self) -> Option<&LeaderboardEntry> {
        self.entries.last()
    }

    /// The entry still waiting for a player name, if any.
    pub fn pending_entry(&self) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|entry| !entry.finalized)
    }

    /// Whether `time` would make it onto the table.
    pub fn new_best_time(&self, time: u64) -> bool {
        match self.lowest_rank() {
            Some(worst) if self.is_full() => time <= worst.time,
            _ => true,
        }
    }

    /// Records `time` as a pending entry when it qualifies, trimming the table back to size.
    pub fn new_best_time_add(&mut self, time: u64, config: BoardConfig) -> bool {
        if !self.new_best_time(time) {
            return false;
        }

        // only one entry may wait for a name at a time
        if let Some(stale) = self.entries.iter_mut().find(|entry| !entry.finalized) {
            log::debug!("Finalizing unnamed entry with time {} ms", stale.time);
            stale.finalize(DEFAULT_USER);
        }

        // ahead of equal times, so a tie with the slowest entry is kept
        let rank = self.entries.partition_point(|entry| entry.time < time);
        self.entries
            .insert(rank, LeaderboardEntry::pending(time, config));
        self.entries.truncate(Self::MAX_ENTRIES);
        log::debug!("New best time {} ms on {} at rank {}", time, config, rank + 1);
        true
    }

    /// Names and locks the pending entry. Does nothing when no entry is pending.
    pub fn finalize_entry(&mut self, user: impl Into<String>) {
        match self.entries.iter_mut().find(|entry| !entry.finalized) {
            Some(entry) => entry.finalize(user),
            None => log::debug!("No pending leaderboard entry to finalize"),
        }
    }
}
