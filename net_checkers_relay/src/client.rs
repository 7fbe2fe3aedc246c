// Client session: connects to the match relay server and drives one game.
//
// A `ClientSession` owns a background session relay thread and shares a
// `CheckersGame` with the UI behind a mutex. Data flows both ways:
//
// - Local turn: the UI calls into the engine, which reports committed moves
//   and the end of the turn through `TurnSignals`. The `Outbox` records
//   those signals and wakes the relay thread, which writes one frame per
//   move followed by END_TURN.
// - Remote turn: the relay thread reads frames, applies each move to the
//   engine as it arrives, and on END_TURN hands the turn back to the engine.
//
// Locking: the UI locks the game, and the engine signals into the outbox
// while that lock is held, so the order is always game then outbox. The
// relay thread never holds the outbox lock while taking the game lock.
//
// Quitting: `on_quit` marks the outbox stopped and shuts down the read half
// of the socket, which wakes the relay thread whether it is blocked on the
// outbox or on a socket read. The relay thread then sends a best-effort
// END_GAME, closes the socket, and records why the game ended.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use net_checkers_protocol::{
    Frame, Move, ProtocolError, ReadError, read_frame, write_frame,
};
use net_checkers_rules::{CheckersGame, GameOverReason, RulesError, TurnSignals};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;

/// The engine as shared between the UI and the session relay thread.
pub type SharedGame = Arc<Mutex<CheckersGame>>;

/// Lock the shared game, ignoring poisoning. A panicked UI thread leaves the
/// engine in a consistent state between operations.
pub fn lock_game(game: &SharedGame) -> MutexGuard<'_, CheckersGame> {
    game.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not connect to {addr}: {source}")]
    TransportSetup {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("server closed the connection")]
    PeerDisconnected,
    #[error("{0}")]
    Rules(#[from] RulesError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<ReadError> for SessionError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::PeerDisconnected { .. } => SessionError::PeerDisconnected,
            ReadError::Io(err) => SessionError::Io(err),
            ReadError::Protocol(err) => SessionError::Protocol(err),
        }
    }
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    LocalQuit,
    /// The local side had no legal moves at the start of its turn.
    NoMovesAvailable,
    /// The opponent sent END_GAME, or the server ended the match for them.
    OpponentLeft,
    Failed(SessionError),
}

impl SessionEnd {
    pub fn reason(&self) -> GameOverReason {
        match self {
            SessionEnd::LocalQuit => GameOverReason::LocalQuit,
            SessionEnd::NoMovesAvailable => GameOverReason::NoMovesAvailable,
            SessionEnd::OpponentLeft => GameOverReason::OpponentLeft,
            SessionEnd::Failed(err) => GameOverReason::ConnectionLost(err.to_string()),
        }
    }
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason())
    }
}

// ---------------------------------------------------------------------------
// Outbox
// ---------------------------------------------------------------------------

#[derive(Default)]
struct OutboxState {
    moves: VecDeque<Move>,
    turn_ended: bool,
    stopped: bool,
}

/// What the relay thread should send next.
enum Outgoing {
    Move(Move),
    EndTurn,
    Quit,
}

/// Mailbox between the engine (producer) and the relay thread (consumer).
#[derive(Default)]
struct Outbox {
    state: Mutex<OutboxState>,
    wake: Condvar,
    /// Clone of the session socket, kept so a quit can interrupt a read.
    socket: Mutex<Option<TcpStream>>,
}

impl Outbox {
    fn state(&self) -> MutexGuard<'_, OutboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn socket(&self) -> MutexGuard<'_, Option<TcpStream>> {
        self.socket.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until there is something to send. A stop wins over queued
    /// moves; once the local side quits nothing else goes out.
    fn next(&self) -> Outgoing {
        let mut state = self.state();
        loop {
            if state.stopped {
                return Outgoing::Quit;
            }
            if let Some(mv) = state.moves.pop_front() {
                return Outgoing::Move(mv);
            }
            if state.turn_ended {
                state.turn_ended = false;
                return Outgoing::EndTurn;
            }
            state = self
                .wake
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn is_stopped(&self) -> bool {
        self.state().stopped
    }

    /// Register the socket clone. Returns false if a stop already happened,
    /// in which case the caller should not start reading.
    fn attach_socket(&self, stream: TcpStream) -> bool {
        *self.socket() = Some(stream);
        !self.is_stopped()
    }

    fn detach_socket(&self) {
        self.socket().take();
    }

    fn stop(&self) {
        self.state().stopped = true;
        self.wake.notify_all();
        if let Some(stream) = self.socket().as_ref() {
            stream.shutdown(Shutdown::Read).ok();
        }
    }
}

impl TurnSignals for Outbox {
    fn on_move_committed(&self, mv: Move) {
        self.state().moves.push_back(mv);
        self.wake.notify_all();
    }

    fn on_turn_ended(&self) {
        self.state().turn_ended = true;
        self.wake.notify_all();
    }

    fn on_quit(&self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// ClientSession
// ---------------------------------------------------------------------------

/// A game in progress against a remote opponent.
pub struct ClientSession {
    game: SharedGame,
    thread: Option<thread::JoinHandle<SessionEnd>>,
}

impl ClientSession {
    /// Create the engine and start the session relay thread, which connects
    /// to `config.server_addr`. Connection failures are reported through the
    /// engine (`ConnectionLost`) and `join`, not here; this only fails if the
    /// thread cannot be spawned.
    pub fn connect(config: ClientConfig) -> io::Result<Self> {
        let outbox = Arc::new(Outbox::default());
        let game = Arc::new(Mutex::new(CheckersGame::new(outbox.clone())));
        let relay = SessionRelay {
            config,
            game: game.clone(),
            outbox,
        };
        let thread = thread::Builder::new()
            .name("checkers-session".into())
            .spawn(move || relay.run())?;
        Ok(Self {
            game,
            thread: Some(thread),
        })
    }

    pub fn game(&self) -> &SharedGame {
        &self.game
    }

    /// Leave the game. Safe to call at any time, including after the game
    /// is already over.
    pub fn quit(&self) {
        lock_game(&self.game).quit();
    }

    /// True once the relay thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Wait for the relay thread to exit.
    pub fn join(mut self) -> SessionEnd {
        match self.thread.take().map(|t| t.join()) {
            Some(Ok(end)) => end,
            Some(Err(_)) => SessionEnd::Failed(SessionError::Io(io::Error::other(
                "session relay thread panicked",
            ))),
            None => SessionEnd::LocalQuit,
        }
    }
}

/// Outcome of reading the opponent's turn.
#[derive(Debug, PartialEq, Eq)]
enum RemoteTurn {
    Ended,
    GameEnded,
}

struct SessionRelay {
    config: ClientConfig,
    game: SharedGame,
    outbox: Arc<Outbox>,
}

impl SessionRelay {
    fn run(self) -> SessionEnd {
        let mut socket = None;
        let end = match self.play(&mut socket) {
            Ok(end) => end,
            // Errors after a stop come from our own shutdown of the socket.
            Err(_) if self.outbox.is_stopped() => self.quit_end(),
            Err(err) => {
                warn!(error = %err, "session failed");
                SessionEnd::Failed(err)
            }
        };

        if let Some(mut stream) = socket {
            if let Err(err) = write_frame(&mut stream, Frame::EndGame) {
                debug!(error = %err, "could not send END_GAME");
            }
            stream.shutdown(Shutdown::Both).ok();
        }
        self.outbox.detach_socket();
        lock_game(&self.game).finish(end.reason());
        info!(%end, "session over");
        end
    }

    /// A stop came from the engine: either the player quit or the engine
    /// found no legal moves. The engine already knows which.
    fn quit_end(&self) -> SessionEnd {
        match lock_game(&self.game).game_over_reason() {
            Some(GameOverReason::NoMovesAvailable) => SessionEnd::NoMovesAvailable,
            _ => SessionEnd::LocalQuit,
        }
    }

    fn connect(&self) -> Result<TcpStream, SessionError> {
        let addr = &self.config.server_addr;
        let setup = |source| SessionError::TransportSetup {
            addr: addr.clone(),
            source,
        };
        let stream = match self.config.connect_timeout() {
            None => TcpStream::connect(addr.as_str()).map_err(setup)?,
            Some(timeout) => {
                let mut last_err = io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "address resolved to nothing",
                );
                let mut connected = None;
                for candidate in addr.to_socket_addrs().map_err(setup)? {
                    match TcpStream::connect_timeout(&candidate, timeout) {
                        Ok(stream) => {
                            connected = Some(stream);
                            break;
                        }
                        Err(err) => last_err = err,
                    }
                }
                connected.ok_or_else(|| setup(last_err))?
            }
        };
        stream.set_nodelay(true).ok();
        Ok(stream)
    }

    fn play(&self, socket: &mut Option<TcpStream>) -> Result<SessionEnd, SessionError> {
        let stream = socket.insert(self.connect()?);
        info!(server = %self.config.server_addr, "connected");
        if !self.outbox.attach_socket(stream.try_clone()?) {
            return Ok(self.quit_end());
        }

        // First START_GAME: we are connected and waiting for an opponent.
        match read_frame(stream)? {
            Frame::StartGame => {}
            got => {
                return Err(ProtocolError::UnexpectedFrame {
                    expected: "START_GAME",
                    got,
                }
                .into());
            }
        }
        debug!("waiting for an opponent");

        // A second START_GAME means we move first; anything else is the
        // opponent's opening turn.
        match read_frame(stream)? {
            Frame::StartGame => {
                info!("moving first");
                lock_game(&self.game).start()?;
            }
            first => {
                info!("opponent moves first");
                if self.receive_turn(stream, first)? == RemoteTurn::GameEnded {
                    return Ok(SessionEnd::OpponentLeft);
                }
                lock_game(&self.game).end_remote_turn()?;
            }
        }

        loop {
            if !self.send_turn(stream)? {
                return Ok(self.quit_end());
            }
            let first = read_frame(stream)?;
            if self.receive_turn(stream, first)? == RemoteTurn::GameEnded {
                return Ok(SessionEnd::OpponentLeft);
            }
            lock_game(&self.game).end_remote_turn()?;
        }
    }

    /// Write the local turn as it is played. Returns false if the local side
    /// quit instead of finishing the turn.
    fn send_turn(&self, stream: &mut TcpStream) -> Result<bool, SessionError> {
        loop {
            match self.outbox.next() {
                Outgoing::Move(mv) => {
                    debug!(%mv, "sending move");
                    write_frame(stream, Frame::Move(mv))?;
                }
                Outgoing::EndTurn => {
                    write_frame(stream, Frame::EndTurn)?;
                    return Ok(true);
                }
                Outgoing::Quit => return Ok(false),
            }
        }
    }

    /// Apply the opponent's frames, starting with `frame`, until their turn
    /// or the game ends.
    fn receive_turn(
        &self,
        stream: &mut TcpStream,
        mut frame: Frame,
    ) -> Result<RemoteTurn, SessionError> {
        loop {
            match frame {
                Frame::EndTurn => return Ok(RemoteTurn::Ended),
                Frame::EndGame => return Ok(RemoteTurn::GameEnded),
                Frame::Move(mv) => {
                    let applied = lock_game(&self.game).apply_remote_move(mv)?;
                    debug!(%applied, "opponent moved");
                }
                Frame::StartGame => {
                    return Err(ProtocolError::UnexpectedFrame {
                        expected: "a move or END_TURN",
                        got: frame,
                    }
                    .into());
                }
            }
            frame = read_frame(stream)?;
        }
    }
}
