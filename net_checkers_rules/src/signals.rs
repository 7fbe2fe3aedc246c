// Engine-to-relay interface.
//
// The engine calls these while its caller holds the game lock, so
// implementations must only record the signal and wake whoever consumes it.
// They must never call back into the engine.

use std::sync::{Mutex, PoisonError};

use net_checkers_protocol::Move;

pub trait TurnSignals: Send + Sync {
    /// A local move was applied to the board and must be sent to the peer.
    fn on_move_committed(&self, mv: Move);

    /// The local turn is over; the peer may move.
    fn on_turn_ended(&self);

    /// The local side is leaving the game (explicit quit, or no legal moves).
    fn on_quit(&self);
}

/// Discards every signal.
pub struct NoSignals;

impl TurnSignals for NoSignals {
    fn on_move_committed(&self, _mv: Move) {}
    fn on_turn_ended(&self) {}
    fn on_quit(&self) {}
}

/// One recorded call on `TurnSignals`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Move(Move),
    TurnEnded,
    Quit,
}

/// Records signals in call order. Used to wire engines together without
/// sockets.
#[derive(Default)]
pub struct SignalLog {
    signals: Mutex<Vec<Signal>>,
}

impl SignalLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Signal> {
        std::mem::take(&mut *self.signals.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn push(&self, signal: Signal) {
        self.signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(signal);
    }
}

impl TurnSignals for SignalLog {
    fn on_move_committed(&self, mv: Move) {
        self.push(Signal::Move(mv));
    }

    fn on_turn_ended(&self) {
        self.push(Signal::TurnEnded);
    }

    fn on_quit(&self) {
        self.push(Signal::Quit);
    }
}
