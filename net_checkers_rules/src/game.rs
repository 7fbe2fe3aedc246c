// The checkers state machine.
//
// `CheckersGame` tracks whose turn it is, which piece is selected, which
// destination is proposed, and whether the local player is in the middle of
// a jump chain. The phase is derived from those fields rather than stored,
// so it can never disagree with them:
//
//   OpponentTurn --start / end_remote_turn--> AwaitingSelection
//   AwaitingSelection --confirm_selection--> AwaitingDestination
//   AwaitingDestination --deselect (no chain)--> AwaitingSelection
//   AwaitingDestination --commit_move, further jump--> AwaitingDestination
//   AwaitingDestination --commit_move, done / deselect in chain--> OpponentTurn
//   any --no legal moves / quit / finish--> GameOver
//
// Local moves leave the engine through `TurnSignals`. Remote moves come in
// already decoded, still in the sender's orientation, and are mirrored here.

use std::fmt;
use std::sync::Arc;

use net_checkers_protocol::{Move, ROWS, Square};
use tracing::{debug, info};

use crate::board::{Board, Piece};
use crate::error::RulesError;
use crate::signals::TurnSignals;

/// Where selection scans start when a local turn begins.
const SCAN_ORIGIN: Square = Square::new(0, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    OpponentTurn,
    AwaitingSelection,
    AwaitingDestination,
    GameOver,
}

/// Result of a selection scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Piece(Square),
    /// No local piece can move anywhere: the local player has lost. The
    /// engine is already in `GameOver` when this is returned.
    NoMovesAvailable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The same piece must keep jumping; `destination` is the proposed
    /// landing square.
    JumpAgain { destination: Square },
    TurnEnded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Selected { destination: Square },
    Committed(CommitOutcome),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeselectOutcome {
    /// Back to choosing which piece to move.
    Reselecting,
    /// Deselecting mid-chain gives up the remaining jumps.
    TurnEnded,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameOverReason {
    NoMovesAvailable,
    LocalQuit,
    OpponentLeft,
    ConnectionLost(String),
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMovesAvailable => write!(f, "no legal moves left"),
            Self::LocalQuit => write!(f, "you left the game"),
            Self::OpponentLeft => write!(f, "the other player left the game"),
            Self::ConnectionLost(msg) => write!(f, "connection lost: {msg}"),
        }
    }
}

pub struct CheckersGame {
    board: Board,
    selected: Option<Square>,
    destination: Option<Square>,
    /// Destinations for `selected`, in corner order.
    possible_moves: Vec<Square>,
    my_turn: bool,
    jumping: bool,
    game_over: Option<GameOverReason>,
    signals: Arc<dyn TurnSignals>,
}

impl CheckersGame {
    pub fn new(signals: Arc<dyn TurnSignals>) -> Self {
        Self::with_board(Board::new(), signals)
    }

    /// Start from an arbitrary position. The game waits for `start` or
    /// `end_remote_turn` like a fresh one.
    pub fn with_board(board: Board, signals: Arc<dyn TurnSignals>) -> Self {
        Self {
            board,
            selected: None,
            destination: None,
            possible_moves: Vec::new(),
            my_turn: false,
            jumping: false,
            game_over: None,
            signals,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        if self.game_over.is_some() {
            Phase::GameOver
        } else if !(self.my_turn || self.jumping) {
            Phase::OpponentTurn
        } else if self.destination.is_some() {
            Phase::AwaitingDestination
        } else {
            Phase::AwaitingSelection
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// `None` for coordinates off the board.
    pub fn piece_at(&self, col: u8, row: u8) -> Option<Piece> {
        let sq = Square::try_new(col as i8, row as i8)?;
        Some(self.board.get(sq))
    }

    /// True for the selected piece's square and the proposed destination.
    pub fn is_selected(&self, col: u8, row: u8) -> bool {
        Square::try_new(col as i8, row as i8)
            .is_some_and(|sq| self.selected == Some(sq) || self.destination == Some(sq))
    }

    /// Whether local input should currently be acted on.
    pub fn is_local_turn(&self) -> bool {
        self.game_over.is_none() && (self.my_turn || self.jumping)
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }

    pub fn game_over_reason(&self) -> Option<&GameOverReason> {
        self.game_over.as_ref()
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    pub fn destination(&self) -> Option<Square> {
        self.destination
    }

    pub fn possible_moves(&self) -> &[Square] {
        &self.possible_moves
    }

    // -----------------------------------------------------------------------
    // Turn boundaries
    // -----------------------------------------------------------------------

    /// Begin the game with the local player moving first.
    pub fn start(&mut self) -> Result<Selection, RulesError> {
        self.require_phase("start", Phase::OpponentTurn)?;
        Ok(self.begin_local_turn())
    }

    /// The opponent's turn is over (END_TURN received). Reseeds the local
    /// selection exactly as `start` does; this is where a local loss by
    /// having no legal moves is detected.
    pub fn end_remote_turn(&mut self) -> Result<Selection, RulesError> {
        self.require_phase("end_remote_turn", Phase::OpponentTurn)?;
        Ok(self.begin_local_turn())
    }

    fn begin_local_turn(&mut self) -> Selection {
        self.my_turn = true;
        self.jumping = false;
        self.selected = Some(SCAN_ORIGIN);
        self.destination = None;
        self.scan(Scan::Forward)
    }

    /// Local player leaves. Idempotent; only the first call signals.
    pub fn quit(&mut self) {
        if self.game_over.is_none() {
            self.game_over = Some(GameOverReason::LocalQuit);
            self.signals.on_quit();
        }
    }

    /// Record that the session ended for `reason`. The first recorded reason
    /// is kept. Does not signal: the caller is the one ending the session.
    pub fn finish(&mut self, reason: GameOverReason) {
        if self.game_over.is_none() {
            info!(%reason, "game over");
            self.game_over = Some(reason);
        }
    }

    // -----------------------------------------------------------------------
    // Local input
    // -----------------------------------------------------------------------

    /// Move the selection to the next square (raster order, wrapping) holding
    /// a local piece with at least one move.
    pub fn select_next(&mut self) -> Result<Selection, RulesError> {
        self.require_phase("select_next", Phase::AwaitingSelection)?;
        Ok(self.scan(Scan::Forward))
    }

    /// As `select_next`, scanning backwards.
    pub fn select_previous(&mut self) -> Result<Selection, RulesError> {
        self.require_phase("select_previous", Phase::AwaitingSelection)?;
        Ok(self.scan(Scan::Backward))
    }

    /// Fix the selected piece and propose its first destination.
    pub fn confirm_selection(&mut self) -> Result<Square, RulesError> {
        self.require_phase("confirm_selection", Phase::AwaitingSelection)?;
        let first = *self
            .possible_moves
            .first()
            .ok_or(RulesError::NoMovesForSelection)?;
        self.destination = Some(first);
        Ok(first)
    }

    /// Propose the next destination, wrapping around. Both the "left" and the
    /// "right" input land here; cycling only goes one way.
    pub fn cycle_destination(&mut self) -> Result<Square, RulesError> {
        self.require_phase("cycle_destination", Phase::AwaitingDestination)?;
        let len = self.possible_moves.len();
        let current = self
            .possible_moves
            .iter()
            .position(|sq| Some(*sq) == self.destination)
            .ok_or(RulesError::NoMovesForSelection)?;
        let next = self.possible_moves[(current + 1) % len];
        self.destination = Some(next);
        Ok(next)
    }

    /// Confirm the selection, or commit the move if a destination is already
    /// proposed.
    pub fn confirm_or_move(&mut self) -> Result<ConfirmOutcome, RulesError> {
        match self.phase() {
            Phase::AwaitingDestination => Ok(ConfirmOutcome::Committed(self.commit_move()?)),
            _ => Ok(ConfirmOutcome::Selected {
                destination: self.confirm_selection()?,
            }),
        }
    }

    /// Apply the proposed move and report it to the relay.
    pub fn commit_move(&mut self) -> Result<CommitOutcome, RulesError> {
        self.require_phase("commit_move", Phase::AwaitingDestination)?;
        let (Some(from), Some(to)) = (self.selected, self.destination) else {
            return Err(RulesError::NoMovesForSelection);
        };
        let mv = Move::new(from, to);

        let mut piece = self.board.get(from);
        if to.row() == 0 {
            piece = Piece::LocalKing;
        }
        self.board.set(to, piece);
        self.board.set(from, Piece::Empty);
        debug!(%mv, "local move");
        self.signals.on_move_committed(mv);

        if let Some(jumped) = Board::jumped_square(mv) {
            self.board.set(jumped, Piece::Empty);
            self.possible_moves = self.board.moves_from(to, true);
            if let Some(&landing) = self.possible_moves.first() {
                self.selected = Some(to);
                self.destination = Some(landing);
                self.jumping = true;
                return Ok(CommitOutcome::JumpAgain {
                    destination: landing,
                });
            }
        }

        self.end_local_turn();
        Ok(CommitOutcome::TurnEnded)
    }

    /// Undo the destination pick, or stop a jump chain early.
    pub fn deselect(&mut self) -> Result<DeselectOutcome, RulesError> {
        self.require_phase("deselect", Phase::AwaitingDestination)?;
        if self.jumping {
            self.end_local_turn();
            Ok(DeselectOutcome::TurnEnded)
        } else {
            self.destination = None;
            Ok(DeselectOutcome::Reselecting)
        }
    }

    fn end_local_turn(&mut self) {
        self.selected = None;
        self.destination = None;
        self.possible_moves.clear();
        self.jumping = false;
        self.my_turn = false;
        self.signals.on_turn_ended();
    }

    // -----------------------------------------------------------------------
    // Remote input
    // -----------------------------------------------------------------------

    /// Apply one opponent move, given in the opponent's orientation. Called
    /// once per move frame, so a remote jump chain arrives as several calls
    /// before `end_remote_turn`.
    pub fn apply_remote_move(&mut self, wire_move: Move) -> Result<Move, RulesError> {
        self.require_phase("apply_remote_move", Phase::OpponentTurn)?;
        let mv = wire_move.mirror();
        let illegal = |reason: &'static str| RulesError::IllegalRemoteMove { mv, reason };

        let mut piece = self.board.get(mv.from);
        if !piece.is_remote() {
            return Err(illegal("no opponent piece on the source square"));
        }
        if !self.board.get(mv.to).is_empty() {
            return Err(illegal("destination is occupied"));
        }
        let Some((_, is_jump)) = Board::direction(mv) else {
            return Err(illegal("not a diagonal step or jump"));
        };

        if is_jump {
            if let Some(jumped) = Board::jumped_square(mv) {
                self.board.set(jumped, Piece::Empty);
            }
        }
        if mv.to.row() == ROWS - 1 {
            piece = Piece::RemoteKing;
        }
        self.board.set(mv.to, piece);
        self.board.set(mv.from, Piece::Empty);
        debug!(%mv, "remote move");
        Ok(mv)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn require_phase(&self, operation: &'static str, expected: Phase) -> Result<(), RulesError> {
        match self.phase() {
            Phase::GameOver => Err(RulesError::GameOver),
            phase if phase == expected => Ok(()),
            phase => Err(RulesError::WrongPhase { operation, phase }),
        }
    }

    /// Walk the board from the current selection until a square with a
    /// movable local piece turns up. Coming all the way back round to the
    /// starting square without finding one means the local player has lost.
    fn scan(&mut self, direction: Scan) -> Selection {
        const SQUARES: usize = 32;
        let origin = self.selected.unwrap_or(SCAN_ORIGIN);
        for step in 1..=SQUARES {
            let index = match direction {
                Scan::Forward => origin.index() + step,
                Scan::Backward => origin.index() + SQUARES - step,
            };
            let sq = Square::from_index(index);
            self.possible_moves = self.board.moves_from(sq, false);
            if !self.possible_moves.is_empty() {
                self.selected = Some(sq);
                return Selection::Piece(sq);
            }
        }
        self.selected = Some(origin);
        self.finish(GameOverReason::NoMovesAvailable);
        self.signals.on_quit();
        Selection::NoMovesAvailable
    }
}

#[derive(Clone, Copy)]
enum Scan {
    Forward,
    Backward,
}
