// Test-only player for end-to-end checkers tests.
//
// Wraps a real `ClientSession` (from `net_checkers_relay::client`) and
// exposes synchronous, test-friendly helpers on top of it: wait until it is
// our turn, play a turn, wait for the game to end. Everything between the
// engines (session relay threads, sockets, the match relay server) is the
// same code the terminal client runs.
//
// See also: `tests/full_pipeline.rs` for the scenarios.

use std::net::SocketAddr;
use std::thread;
use std::time::{Duration, Instant};

use net_checkers_protocol::Move;
use net_checkers_relay::client::{ClientSession, SessionEnd, lock_game};
use net_checkers_relay::config::ClientConfig;
use net_checkers_rules::{Board, CheckersGame, CommitOutcome, GameOverReason};

/// Default timeout for blocking waits.
const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Sleep duration between polls.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One player connected to a match relay server.
pub struct TestPlayer {
    session: ClientSession,
    pub name: &'static str,
}

impl TestPlayer {
    pub fn connect(addr: SocketAddr, name: &'static str) -> Self {
        let session = ClientSession::connect(ClientConfig::new(addr.to_string()))
            .expect("TestPlayer::connect failed");
        Self { session, name }
    }

    /// Run `f` with the engine locked.
    pub fn with_game<R>(&self, f: impl FnOnce(&mut CheckersGame) -> R) -> R {
        f(&mut lock_game(self.session.game()))
    }

    pub fn board(&self) -> Board {
        self.with_game(|game| game.board().clone())
    }

    pub fn is_local_turn(&self) -> bool {
        self.with_game(|game| game.is_local_turn())
    }

    /// Poll until `pred` holds, panicking after `POLL_TIMEOUT`.
    pub fn wait_until(&self, what: &str, pred: impl Fn(&CheckersGame) -> bool) {
        let start = Instant::now();
        loop {
            if self.with_game(|game| pred(&*game)) {
                return;
            }
            assert!(
                start.elapsed() < POLL_TIMEOUT,
                "{}: timed out waiting for {what}",
                self.name
            );
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Wait until it is our turn or the game is over. Returns true if it is
    /// our turn.
    pub fn wait_for_turn(&self) -> bool {
        self.wait_until("our turn", |game| {
            game.is_local_turn() || game.is_game_over()
        });
        self.is_local_turn()
    }

    pub fn wait_for_game_over(&self) -> GameOverReason {
        self.wait_until("game over", CheckersGame::is_game_over);
        self.with_game(|game| game.game_over_reason().cloned())
            .expect("game over without a reason")
    }

    /// Play a whole turn taking the first proposal at every step: the
    /// selected piece, its first destination, and the first landing square
    /// of every further jump. Returns the moves made, in local coordinates.
    pub fn play_first_proposal(&self) -> Vec<Move> {
        self.with_game(|game| {
            let to = game.confirm_selection().expect("confirm_selection failed");
            let from = game.selected().expect("nothing selected");
            let mut moves = vec![Move::new(from, to)];
            let mut outcome = game.commit_move().expect("commit_move failed");
            while let CommitOutcome::JumpAgain { destination } = outcome {
                let last = moves[moves.len() - 1].to;
                moves.push(Move::new(last, destination));
                outcome = game.commit_move().expect("commit_move failed");
            }
            moves
        })
    }

    pub fn quit(&self) {
        self.session.quit();
    }

    /// Wait for the session relay thread to exit.
    pub fn join(self) -> SessionEnd {
        self.session.join()
    }
}
