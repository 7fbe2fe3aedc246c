// net_checkers_relay: networking for two-player checkers.
//
// Server side: a listener pairs incoming connections two at a time, in
// arrival order, and hands each pair to a match relay thread that forwards
// frames between them verbatim, one turn at a time. Client side: a session
// relay thread owns the socket and shuttles frames between it and the local
// rules engine.
//
// Module overview:
// - `server.rs`:   TCP accept loop, the single pending-match slot, optional
//                  eviction of a pending player nobody joins.
// - `matchup.rs`:  `PendingMatch` (one leg, probed with START_GAME) and
//                  `Match` (two legs, relay loop, teardown of both legs).
// - `client.rs`:   `ClientSession`: the session relay thread plus the
//                  `Outbox` mailbox the rules engine signals into.
// - `config.rs`:   `ServerConfig`, `ClientConfig`, JSON config loading.
// - `logging.rs`:  `tracing-subscriber` setup shared by the binaries.
//
// Everything is blocking `std::net` I/O on plain threads. A thread owns the
// sockets it reads; other threads only ever shut a socket down to wake it.

pub mod client;
pub mod config;
pub mod logging;
pub mod matchup;
pub mod server;

pub use client::{ClientSession, SessionEnd, SessionError};
pub use config::{ClientConfig, ServerConfig};
pub use server::{ServerHandle, start_server};
