// net_checkers_rules: the checkers rules engine.
//
// Pure game logic, no I/O. The engine owns the board, the selection cursor,
// the list of candidate destinations for the selected piece, and the
// turn/jump-chain state. It is driven from two sides:
// - the input thread (selection, confirmation, cycling, committing moves);
// - the client's session relay thread (`apply_remote_move`,
//   `end_remote_turn`), which feeds in the opponent's moves.
// Completed local moves and turn ends flow out through `TurnSignals`.
//
// Module overview:
// - `board.rs`:    `Piece`, `Board`, diagonal corner geometry on the 4x8
//                  dark-square grid, legal-move enumeration, text diagrams.
// - `game.rs`:     `CheckersGame` state machine and its outcome enums.
// - `signals.rs`:  `TurnSignals`, the engine-to-relay interface.
// - `error.rs`:    `RulesError`.
//
// The board is always stored from the local player's point of view: local
// pieces start on rows 5-7 and move toward row 0.

pub mod board;
pub mod error;
pub mod game;
pub mod signals;

pub use board::{Board, Corner, Piece};
pub use error::RulesError;
pub use game::{
    CheckersGame, CommitOutcome, ConfirmOutcome, DeselectOutcome, GameOverReason, Phase,
    Selection,
};
pub use signals::{NoSignals, Signal, SignalLog, TurnSignals};
