// Match relay: pairs of player connections and the loop that forwards
// frames between them.
//
// A `PendingMatch` holds the first player to arrive. It has already been
// sent one START_GAME probe so the client knows it is connected. When a
// second player arrives, `attach` probes that player too and produces a
// `Match`. Running the match sends a second START_GAME to the first player,
// which tells it that it moves first, then relays turns:
//
//   leg 1: frames up to and including END_TURN  -> forwarded to leg 2
//   leg 2: frames up to and including END_TURN  -> forwarded to leg 1
//   ...
//
// Frames are forwarded verbatim and immediately, so an opponent sees each
// step of a jump chain as it happens. The relay never interprets moves.
// The loop stops when either side sends END_GAME or when any read or write
// fails. Teardown then sends END_GAME to every leg that has not already
// seen one and shuts each leg down on its own, so a failure on one socket
// never prevents the other from being closed.

use std::fmt;
use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use net_checkers_protocol::{
    Frame, FrameKind, RawFrame, ReadError, read_raw_frame, write_raw_frame,
};
use tracing::{debug, info, warn};

/// Which of the two connections in a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LegId {
    /// The player who connected first and moves first.
    First,
    Second,
}

impl LegId {
    fn other(self) -> LegId {
        match self {
            LegId::First => LegId::Second,
            LegId::Second => LegId::First,
        }
    }

    fn index(self) -> usize {
        match self {
            LegId::First => 0,
            LegId::Second => 1,
        }
    }
}

impl fmt::Display for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegId::First => f.write_str("leg 1"),
            LegId::Second => f.write_str("leg 2"),
        }
    }
}

/// How a match stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchEnd {
    /// A player sent END_GAME.
    Ended { by: LegId },
    /// Reading from or writing to `leg` failed.
    Disconnected { leg: LegId, reason: String },
}

/// Result of running a match to completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchSummary {
    pub end: MatchEnd,
    /// Frames forwarded from each leg to the other, indexed by the sending
    /// leg (`[from leg 1, from leg 2]`).
    pub frames_forwarded: [u64; 2],
    pub turns: u64,
}

impl MatchSummary {
    pub fn forwarded_from(&self, leg: LegId) -> u64 {
        self.frames_forwarded[leg.index()]
    }
}

/// One player's connection.
struct Leg {
    id: LegId,
    stream: TcpStream,
    peer: Option<SocketAddr>,
    /// Set once an END_GAME has been written to this leg.
    ended: bool,
}

impl Leg {
    fn new(id: LegId, stream: TcpStream) -> Self {
        stream.set_nodelay(true).ok();
        let peer = stream.peer_addr().ok();
        Self {
            id,
            stream,
            peer,
            ended: false,
        }
    }

    fn send(&mut self, raw: &RawFrame) -> io::Result<()> {
        write_raw_frame(&mut self.stream, raw)?;
        if FrameKind::of(raw) == FrameKind::EndGame {
            self.ended = true;
        }
        Ok(())
    }

    fn recv(&mut self) -> Result<RawFrame, ReadError> {
        read_raw_frame(&mut self.stream)
    }

    /// Best-effort END_GAME, then shut the socket down.
    fn close(&mut self) {
        if !self.ended {
            if let Err(err) = self.send(&Frame::EndGame.encode()) {
                debug!(leg = %self.id, error = %err, "could not send END_GAME");
            }
        }
        if let Err(err) = self.stream.shutdown(Shutdown::Both) {
            debug!(leg = %self.id, error = %err, "shutdown failed");
        }
    }
}

/// A player waiting for an opponent.
pub struct PendingMatch {
    first: Leg,
    since: Instant,
}

impl PendingMatch {
    /// Take the first player's connection and send it the START_GAME probe.
    /// Fails if the probe cannot be written, in which case the connection
    /// is dropped.
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let mut first = Leg::new(LegId::First, stream);
        first.send(&Frame::StartGame.encode())?;
        debug!(peer = ?first.peer, "first player waiting for an opponent");
        Ok(Self {
            first,
            since: Instant::now(),
        })
    }

    /// How long this player has been waiting.
    pub fn waiting_for(&self) -> Duration {
        self.since.elapsed()
    }

    /// Pair with a second player. A failed probe to the second player is
    /// only logged; the relay loop notices the dead socket on first use.
    pub fn attach(self, stream: TcpStream) -> Match {
        let mut second = Leg::new(LegId::Second, stream);
        if let Err(err) = second.send(&Frame::StartGame.encode()) {
            warn!(peer = ?second.peer, error = %err, "could not probe second player");
        }
        info!(first = ?self.first.peer, second = ?second.peer, "players paired");
        Match {
            legs: [self.first, second],
        }
    }

    /// Give up on this player: END_GAME and close.
    pub fn abandon(mut self) {
        info!(peer = ?self.first.peer, "abandoning unmatched player");
        self.first.close();
    }
}

/// Two paired players.
pub struct Match {
    legs: [Leg; 2],
}

impl Match {
    /// Run the relay on its own thread.
    pub fn spawn(self) -> io::Result<thread::JoinHandle<MatchSummary>> {
        thread::Builder::new()
            .name("match-relay".into())
            .spawn(move || self.run())
    }

    /// Relay until the match ends, then tear both legs down.
    pub fn run(mut self) -> MatchSummary {
        let mut summary = MatchSummary {
            end: MatchEnd::Ended { by: LegId::First },
            frames_forwarded: [0, 0],
            turns: 0,
        };
        summary.end = self.relay(&mut summary);
        for leg in &mut self.legs {
            leg.close();
        }
        info!(
            end = ?summary.end,
            turns = summary.turns,
            from_first = summary.frames_forwarded[0],
            from_second = summary.frames_forwarded[1],
            "match over"
        );
        summary
    }

    fn relay(&mut self, summary: &mut MatchSummary) -> MatchEnd {
        // Second START_GAME: leg 1 moves first.
        if let Err(err) = self.leg(LegId::First).send(&Frame::StartGame.encode()) {
            return MatchEnd::Disconnected {
                leg: LegId::First,
                reason: err.to_string(),
            };
        }

        let mut mover = LegId::First;
        loop {
            match self.relay_turn(mover, summary) {
                Ok(FrameKind::EndGame) => return MatchEnd::Ended { by: mover },
                Ok(_) => {
                    summary.turns += 1;
                    mover = mover.other();
                }
                Err(end) => return end,
            }
        }
    }

    /// Forward frames from `from` until one ends the turn. Returns the kind
    /// of that frame (END_TURN or END_GAME).
    fn relay_turn(
        &mut self,
        from: LegId,
        summary: &mut MatchSummary,
    ) -> Result<FrameKind, MatchEnd> {
        loop {
            let raw = self
                .leg(from)
                .recv()
                .map_err(|err| MatchEnd::Disconnected {
                    leg: from,
                    reason: err.to_string(),
                })?;
            let kind = FrameKind::of(&raw);
            debug!(from = %from, frame = ?raw, "relaying");

            self.leg(from.other())
                .send(&raw)
                .map_err(|err| MatchEnd::Disconnected {
                    leg: from.other(),
                    reason: err.to_string(),
                })?;
            summary.frames_forwarded[from.index()] += 1;

            if kind.ends_turn() {
                return Ok(kind);
            }
        }
    }

    fn leg(&mut self, id: LegId) -> &mut Leg {
        &mut self.legs[id.index()]
    }
}
