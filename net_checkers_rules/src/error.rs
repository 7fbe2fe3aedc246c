use net_checkers_protocol::Move;
use thiserror::Error;

use crate::game::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("the game is over")]
    GameOver,
    #[error("{operation} is not allowed in phase {phase:?}")]
    WrongPhase {
        operation: &'static str,
        phase: Phase,
    },
    #[error("the selected piece has no moves")]
    NoMovesForSelection,
    /// The opponent sent a move that cannot be applied to our board. This is
    /// a protocol violation, not a rules disagreement to be resolved.
    #[error("illegal remote move {mv}: {reason}")]
    IllegalRemoteMove { mv: Move, reason: &'static str },
    #[error("bad board diagram: {0}")]
    BadDiagram(String),
}
