use rand::prelude::*;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - Ready -> Active (first reveal)
/// - Ready -> Lost (never happens with a safe zone, kept for layouts handed in directly)
/// - Active -> Won
/// - Active -> Lost
/// - any -> Ready (new game)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Ready,
    Active,
    Won,
    Lost,
}

impl SessionState {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// One playthrough at a time: creates the board lazily on the first reveal, dispatches reveal, marking and
/// chord requests, and decides win or loss.
///
/// Every move returns the list of [`GameEvent`]s the presentation layer has to apply.
#[derive(Clone, Debug)]
pub struct GameSession {
    config: BoardConfig,
    board: Option<Board>,
    marked_count: CellCount,
    state: SessionState,
    clock: GameClock,
    rng: SmallRng,
    leaderboard: Leaderboard,
}

impl GameSession {
    /// A session waiting for its first reveal. `seed` drives every board this session generates.
    pub fn new(config: BoardConfig, seed: u64) -> Self {
        Self {
            config,
            board: None,
            marked_count: 0,
            state: SessionState::Ready,
            clock: GameClock::default(),
            rng: SmallRng::seed_from_u64(seed),
            leaderboard: Leaderboard::new(),
        }
    }

    /// A session already in play on a prepared board, skipping first-move generation.
    ///
    /// Marks already on the board count towards the marking budget.
    pub fn with_board(board: Board, seed: u64) -> Self {
        let mut session = Self::new(board.config(), seed);
        session.marked_count = board
            .iter()
            .filter(|(_, cell)| cell.marking().is_marked())
            .count() as CellCount;
        session.board = Some(board);
        session.state = SessionState::Active;
        session.clock.start();
        session
    }

    /// Replaces the (empty) leaderboard, e.g. with one loaded from storage.
    pub fn with_leaderboard(mut self, leaderboard: Leaderboard) -> Self {
        self.leaderboard = leaderboard;
        self
    }

    /// Discards the current game and waits for a first reveal on `config`.
    pub fn new_game(&mut self, config: BoardConfig) {
        self.config = config;
        self.clear();
    }

    /// Discards the current game, keeping the configuration.
    pub fn restart(&mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        log::debug!("New game on {}", self.config);
        self.board = None;
        self.marked_count = 0;
        self.state = SessionState::Ready;
        self.clock = GameClock::default();
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_first_move(&self) -> bool {
        self.board.is_none()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Number of cells currently flagged as [`Marking::Marked`].
    pub fn marked_count(&self) -> CellCount {
        self.marked_count
    }

    pub fn mines_left(&self) -> isize {
        (self.config.mines() as isize) - (self.marked_count as isize)
    }

    /// Mine coordinates of the current board, empty before the first reveal.
    pub fn mine_locations(&self) -> &[Coord2] {
        self.board.as_ref().map(Board::mine_locations).unwrap_or_default()
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Names the leaderboard entry left pending by the last winning game.
    pub fn finalize_entry(&mut self, user: impl Into<String>) {
        self.leaderboard.finalize_entry(user);
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.clock.elapsed_ms()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn pause(&mut self) {
        if matches!(self.state, SessionState::Active) {
            self.clock.pause();
        }
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    /// Reveals a cell, generating the board around it on the first move of the game.
    pub fn reveal(&mut self, coords: Coord2) -> Result<Vec<GameEvent>> {
        let coords = self.config.validate_coords(coords)?;
        self.check_not_finished()?;

        let mut events = Vec::new();
        if self.board.is_none() {
            let board = Board::generate(self.config, coords, &mut self.rng)?;
            log::debug!("Created {} board on first reveal at {:?}", self.config, coords);
            events.push(GameEvent::BoardCreated {
                rows: self.config.rows(),
                columns: self.config.columns(),
            });
            self.board = Some(board);
            self.state = SessionState::Active;
            self.clock.start();
        }

        let board = self.board_mut()?;
        let cell = board[coords];
        if cell.is_revealed() {
            return Ok(events);
        }
        // marked cells are never stepped on and keep accepting marking changes
        if cell.marking() != Marking::NotMarked {
            log::debug!("Ignoring reveal of {:?} marked {:?}", coords, cell.marking());
            return Ok(events);
        }

        board.cell_mut(coords).reveal();

        if cell.is_armed() {
            self.lose(coords, &mut events);
            return Ok(events);
        }

        events.push(GameEvent::CellRevealed {
            coords,
            proximity_count: cell.proximity_count(),
        });
        log::debug!("Revealed {:?}, proximity count: {}", coords, cell.proximity_count());

        let hit = if cell.proximity_count() == 0 {
            reveal_nearby(board, coords, &mut events)
        } else {
            None
        };
        match hit {
            Some(mine) => self.lose(mine, &mut events),
            None => self.evaluate_win(&mut events),
        }
        Ok(events)
    }

    /// Reveals every unmarked neighbor of a revealed cell once its marked neighbors match its proximity count.
    pub fn chord(&mut self, coords: Coord2) -> Result<Vec<GameEvent>> {
        let coords = self.config.validate_coords(coords)?;
        self.check_not_finished()?;

        let board = self.board_mut()?;
        let cell = board[coords];
        let mut events = Vec::new();

        if !cell.is_revealed()
            || cell.marking() != Marking::NotMarked
            || board.count_marked_neighbors(coords) != cell.proximity_count()
        {
            return Ok(events);
        }

        match reveal_nearby(board, coords, &mut events) {
            Some(mine) => self.lose(mine, &mut events),
            None => self.evaluate_win(&mut events),
        }
        Ok(events)
    }

    /// Advances the marking of an unrevealed cell by one step of its cycle.
    ///
    /// The marked count follows the cells currently [`Marking::Marked`]: entering `Marked` adds one, leaving
    /// it for `Questioned` removes one. Once as many cells are marked as there are mines, unmarked cells
    /// refuse to advance.
    pub fn cycle_marking(&mut self, coords: Coord2) -> Result<MarkingUpdate> {
        let coords = self.config.validate_coords(coords)?;
        self.check_not_finished()?;

        let mines = self.config.mines();
        let marked_count = self.marked_count;
        let board = self.board_mut()?;
        let cell = board[coords];

        if cell.is_revealed() {
            return Ok(MarkingUpdate::unchanged(cell.marking()));
        }
        if marked_count >= mines && cell.marking() == Marking::NotMarked {
            log::debug!("All {} marks placed, refusing to mark {:?}", mines, coords);
            return Ok(MarkingUpdate::unchanged(Marking::NotMarked));
        }

        let marking = board.cell_mut(coords).cycle_marking();
        match marking {
            Marking::Marked => self.marked_count += 1,
            Marking::Questioned => self.marked_count -= 1,
            Marking::NotMarked => {}
        }

        let mut events = vec![
            GameEvent::MarkingChanged { coords, marking },
            GameEvent::MarkingRatioChanged {
                marked: self.marked_count,
                total: mines,
            },
        ];
        self.evaluate_win(&mut events);
        Ok(MarkingUpdate { marking, events })
    }

    /// Won when exactly `mines` cells are marked and no cell is left both unrevealed and unmarked.
    pub fn check_win_conditions(&self) -> bool {
        if self.marked_count != self.config.mines() {
            return false;
        }
        self.board.as_ref().is_some_and(Board::all_activated)
    }

    fn evaluate_win(&mut self, events: &mut Vec<GameEvent>) {
        if !self.check_win_conditions() {
            return;
        }

        self.state = SessionState::Won;
        self.clock.stop();
        let elapsed_ms = self.clock.elapsed_ms();
        let new_record = self.leaderboard.new_best_time_add(elapsed_ms, self.config);
        log::debug!(
            "Won {} in {} ms, new record: {}",
            self.config,
            elapsed_ms,
            new_record
        );
        events.push(GameEvent::Won {
            elapsed_ms,
            new_record,
        });
    }

    fn lose(&mut self, losing: Coord2, events: &mut Vec<GameEvent>) {
        self.state = SessionState::Lost;
        self.clock.stop();
        log::debug!("Lost on mine at {:?}", losing);
        events.push(GameEvent::Lost {
            mines: self.mine_locations().to_vec(),
            losing,
        });
    }

    fn board_mut(&mut self) -> Result<&mut Board> {
        self.board.as_mut().ok_or(GameError::NotStarted)
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.state.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}

/// Reveals every unrevealed, unmarked neighbor of `origin` and keeps going from each revealed zero.
///
/// Returns the first armed cell it uncovered, stopping there.
fn reveal_nearby(board: &mut Board, origin: Coord2, events: &mut Vec<GameEvent>) -> Option<Coord2> {
    let mut to_visit = vec![origin];
    log::trace!("Starting flood-fill from {:?}", origin);

    while let Some(center) = to_visit.pop() {
        for pos in board.iter_neighbors(center) {
            let cell = board[pos];
            // revealed cells are never queued twice, marked ones act as walls
            if cell.is_revealed() || cell.marking().is_marked() {
                continue;
            }

            board.cell_mut(pos).reveal();
            if cell.is_armed() {
                return Some(pos);
            }

            events.push(GameEvent::CellRevealed {
                coords: pos,
                proximity_count: cell.proximity_count(),
            });
            log::trace!(
                "Flood revealed {:?}, proximity count: {}",
                pos,
                cell.proximity_count()
            );

            if cell.proximity_count() == 0 {
                to_visit.push(pos);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORNERS: [Coord2; 4] = [(0, 0), (5, 0), (0, 5), (5, 5)];

    fn layout(mines: &[Coord2]) -> Board {
        let config = BoardConfig::validate(mines.len() as i64, 6, 6).unwrap();
        Board::from_mine_coords(config, mines).unwrap()
    }

    fn corners() -> GameSession {
        GameSession::with_board(layout(&CORNERS), 0)
    }

    fn revealed(session: &GameSession) -> usize {
        session
            .board()
            .unwrap()
            .iter()
            .filter(|(_, cell)| cell.is_revealed())
            .count()
    }

    fn mark(session: &mut GameSession, coords: Coord2) -> MarkingUpdate {
        session.cycle_marking(coords).unwrap()
    }

    #[test]
    fn first_reveal_creates_board_and_cascades_through_safe_zone() {
        let mut session = GameSession::new(BoardConfig::EASY, 11);
        assert!(session.is_first_move());

        let events = session.reveal((4, 4)).unwrap();

        assert_eq!(events[0], GameEvent::BoardCreated { rows: 8, columns: 8 });
        assert_eq!(
            events[1],
            GameEvent::CellRevealed {
                coords: (4, 4),
                proximity_count: 0
            }
        );
        assert_eq!(session.state(), SessionState::Active);

        let board = session.board().unwrap();
        for x in 3..=5 {
            for y in 3..=5 {
                assert!(!board[(x, y)].is_armed());
                assert!(board[(x, y)].is_revealed(), "safe zone cell {:?} hidden", (x, y));
            }
        }
    }

    #[test]
    fn zero_reveal_opens_whole_connected_region() {
        let mut session = corners();

        let events = session.reveal((2, 2)).unwrap();

        assert_eq!(events.len(), 32);
        assert_eq!(revealed(&session), 32);
        assert_eq!(session.state(), SessionState::Active);
        for mine in CORNERS {
            assert!(!session.board().unwrap()[mine].is_revealed());
        }
    }

    #[test]
    fn numbered_reveal_opens_only_that_cell() {
        let mut session = corners();

        let events = session.reveal((1, 1)).unwrap();

        assert_eq!(
            events,
            vec![GameEvent::CellRevealed {
                coords: (1, 1),
                proximity_count: 1
            }]
        );
        assert_eq!(revealed(&session), 1);
    }

    #[test]
    fn repeated_reveal_is_a_no_op() {
        let mut session = corners();
        session.reveal((1, 1)).unwrap();

        assert_eq!(session.reveal((1, 1)).unwrap(), vec![]);
    }

    #[test]
    fn win_needs_every_cell_activated() {
        let mut session = corners();
        session.reveal((1, 1)).unwrap();

        for mine in CORNERS {
            let update = mark(&mut session, mine);
            assert!(!update.events.iter().any(GameEvent::is_game_over));
        }
        assert_eq!(session.marked_count(), 4);
        assert!(!session.check_win_conditions());

        let events = session.reveal((2, 2)).unwrap();

        assert!(matches!(
            events.last(),
            Some(GameEvent::Won {
                new_record: true,
                ..
            })
        ));
        assert_eq!(session.state(), SessionState::Won);
        assert!(session.leaderboard().pending_entry().is_some());
    }

    #[test]
    fn last_mark_can_win() {
        let mut session = corners();
        session.reveal((2, 2)).unwrap();
        for &mine in &CORNERS[..3] {
            mark(&mut session, mine);
        }

        let update = mark(&mut session, (5, 5));

        assert_eq!(update.marking, Marking::Marked);
        assert_eq!(
            &update.events[..2],
            &[
                GameEvent::MarkingChanged {
                    coords: (5, 5),
                    marking: Marking::Marked
                },
                GameEvent::MarkingRatioChanged { marked: 4, total: 4 },
            ]
        );
        assert!(matches!(update.events[2], GameEvent::Won { .. }));
    }

    #[test]
    fn marking_cycle_is_closed_and_count_nets_zero() {
        let mut session = corners();
        session.reveal((1, 1)).unwrap();

        let steps: Vec<_> = (0..3)
            .map(|_| {
                let update = mark(&mut session, (3, 3));
                (update.marking, session.marked_count())
            })
            .collect();

        assert_eq!(
            steps,
            vec![
                (Marking::Marked, 1),
                (Marking::Questioned, 0),
                (Marking::NotMarked, 0),
            ]
        );
    }

    #[test]
    fn marking_budget_refuses_extra_marks() {
        let mut session = corners();
        session.reveal((1, 1)).unwrap();
        for coords in [(2, 2), (3, 3), (4, 4), (2, 4)] {
            mark(&mut session, coords);
        }

        let refused = mark(&mut session, (3, 2));
        assert_eq!(refused, MarkingUpdate::unchanged(Marking::NotMarked));
        assert!(!refused.has_update());
        assert_eq!(session.marked_count(), 4);
        assert_eq!(session.board().unwrap()[(3, 2)].marking(), Marking::NotMarked);

        // marked cells can still move on, freeing a mark
        assert_eq!(mark(&mut session, (2, 2)).marking, Marking::Questioned);
        assert_eq!(session.marked_count(), 3);
        assert_eq!(mark(&mut session, (3, 2)).marking, Marking::Marked);
    }

    #[test]
    fn revealed_cells_refuse_marking() {
        let mut session = corners();
        session.reveal((1, 1)).unwrap();

        let update = mark(&mut session, (1, 1));

        assert_eq!(update, MarkingUpdate::unchanged(Marking::NotMarked));
        assert_eq!(session.marked_count(), 0);
    }

    #[test]
    fn stepping_on_mine_loses_with_all_mines() {
        let mut session = corners();

        let events = session.reveal((5, 0)).unwrap();

        assert_eq!(
            events,
            vec![GameEvent::Lost {
                mines: CORNERS.to_vec(),
                losing: (5, 0)
            }]
        );
        assert_eq!(session.state(), SessionState::Lost);
        assert_eq!(session.reveal((2, 2)), Err(GameError::AlreadyEnded));
        assert_eq!(session.cycle_marking((2, 2)), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn marked_mine_is_reveal_inert() {
        let mut session = corners();
        mark(&mut session, (0, 0));

        let events = session.reveal((0, 0)).unwrap();

        assert_eq!(events, vec![]);
        assert_eq!(session.state(), SessionState::Active);
        let cell = session.board().unwrap()[(0, 0)];
        assert_eq!(cell.marking(), Marking::Marked);
        assert!(!cell.is_revealed());
    }

    #[test]
    fn prepared_board_keeps_its_marks_in_the_budget() {
        let mut session = corners();
        session.reveal((2, 2)).unwrap();
        mark(&mut session, (0, 0));
        mark(&mut session, (5, 0));

        let mut resumed = GameSession::with_board(session.board().unwrap().clone(), 1);

        assert_eq!(resumed.marked_count(), 2);
        assert_eq!(mark(&mut resumed, (5, 0)).marking, Marking::Questioned);
        assert_eq!(resumed.marked_count(), 1);
    }

    #[test]
    fn questioned_mine_can_still_be_marked_after_reveal_attempt() {
        let mut session = corners();
        session.reveal((2, 2)).unwrap();
        mark(&mut session, (0, 0));
        assert_eq!(mark(&mut session, (0, 0)).marking, Marking::Questioned);

        assert_eq!(session.reveal((0, 0)).unwrap(), vec![]);
        assert!(!session.board().unwrap()[(0, 0)].is_revealed());

        for mine in [(5, 0), (0, 5), (5, 5)] {
            mark(&mut session, mine);
        }
        assert_eq!(mark(&mut session, (0, 0)).marking, Marking::NotMarked);
        let update = mark(&mut session, (0, 0));

        assert_eq!(update.marking, Marking::Marked);
        assert!(matches!(update.events.last(), Some(GameEvent::Won { .. })));
        assert_eq!(session.state(), SessionState::Won);
    }

    #[test]
    fn questioned_mine_is_reveal_inert() {
        let mut session = corners();
        mark(&mut session, (0, 0));
        mark(&mut session, (0, 0));

        assert_eq!(session.reveal((0, 0)).unwrap(), vec![]);
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn marked_cells_wall_off_the_cascade() {
        let right_column: Vec<Coord2> = (0..6).map(|y| (5, y)).collect();
        let mut session = GameSession::with_board(layout(&right_column), 0);
        for y in 0..6 {
            mark(&mut session, (2, y));
        }

        let events = session.reveal((0, 0)).unwrap();

        assert_eq!(events.len(), 12);
        let board = session.board().unwrap();
        for ((x, _), cell) in board.iter() {
            assert_eq!(cell.is_revealed(), x < 2, "column {x}");
        }
    }

    #[test]
    fn chord_reveals_once_marks_match() {
        let mut session = corners();
        session.reveal((1, 1)).unwrap();
        assert_eq!(session.chord((1, 1)).unwrap(), vec![]);

        mark(&mut session, (0, 0));
        let events = session.chord((1, 1)).unwrap();

        assert_eq!(events.len(), 31);
        assert_eq!(revealed(&session), 32);
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.chord((1, 1)).unwrap(), vec![]);
    }

    #[test]
    fn chord_with_wrong_mark_loses() {
        let mut session = corners();
        session.reveal((1, 1)).unwrap();
        mark(&mut session, (1, 0));

        let events = session.chord((1, 1)).unwrap();

        assert!(matches!(
            events.last(),
            Some(GameEvent::Lost { losing: (0, 0), .. })
        ));
        assert_eq!(session.state(), SessionState::Lost);
    }

    #[test]
    fn chord_ignores_hidden_cells() {
        let mut session = corners();

        assert_eq!(session.chord((3, 3)).unwrap(), vec![]);
    }

    #[test]
    fn moves_before_first_reveal_need_a_board() {
        let mut session = GameSession::new(BoardConfig::EASY, 0);

        assert_eq!(session.cycle_marking((0, 0)), Err(GameError::NotStarted));
        assert_eq!(session.chord((0, 0)), Err(GameError::NotStarted));
        assert!(session.mine_locations().is_empty());
    }

    #[test]
    fn out_of_bounds_moves_are_rejected() {
        let mut session = GameSession::new(BoardConfig::EASY, 0);

        assert_eq!(session.reveal((8, 0)), Err(GameError::InvalidCoords));
        assert_eq!(session.reveal((0, 8)), Err(GameError::InvalidCoords));
        assert!(session.is_first_move());
    }

    #[test]
    fn new_game_clears_the_session() {
        let mut session = corners();
        session.reveal((1, 1)).unwrap();
        mark(&mut session, (0, 0));

        session.new_game(BoardConfig::MEDIUM);

        assert!(session.is_first_move());
        assert_eq!(session.marked_count(), 0);
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(SessionState::default(), SessionState::Ready);
        assert_eq!(session.elapsed_ms(), 0);
        let events = session.reveal((8, 8)).unwrap();
        assert_eq!(events[0], GameEvent::BoardCreated { rows: 16, columns: 16 });
    }

    #[test]
    fn restart_after_loss_accepts_moves_again() {
        let mut session = corners();
        session.reveal((0, 0)).unwrap();

        session.restart();

        assert_eq!(session.config(), layout(&CORNERS).config());
        assert!(session.reveal((3, 3)).is_ok());
    }

    #[test]
    fn win_records_and_finalizes_leaderboard_entry() {
        let mut session = corners();
        session.reveal((2, 2)).unwrap();
        for mine in CORNERS {
            mark(&mut session, mine);
        }

        session.finalize_entry("ada");

        let entry = &session.leaderboard().entries()[0];
        assert_eq!(entry.user(), "ada");
        assert!(entry.is_finalized());
        assert_eq!(entry.config(), session.config());
    }

    #[test]
    fn pause_only_applies_to_running_games() {
        let mut session = GameSession::new(BoardConfig::EASY, 0);
        session.pause();
        assert!(!session.is_paused());

        session.reveal((0, 0)).unwrap();
        session.pause();
        assert!(session.is_paused());
        session.resume();
        assert!(!session.is_paused());
    }
}
