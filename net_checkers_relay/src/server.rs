// TCP listener for the match relay server.
//
// One thread accepts connections and pairs them in arrival order. At most
// one player waits at a time: the first connection becomes a
// `PendingMatch`, the next one completes it, and the resulting `Match` runs
// on its own thread. The listener keeps no reference to running matches;
// it forgets a match as soon as it has been handed off.
//
// The listener socket is non-blocking so the loop can check `keep_running`
// and the age of the pending player between accepts. Accepted streams are
// switched back to blocking mode; all relay I/O is blocking.
//
// Shutdown: `ServerHandle::stop` clears `keep_running` and joins the
// listener thread. A still-pending player is sent END_GAME. Matches already
// running are left to finish on their own.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::matchup::PendingMatch;

/// Handle returned by `start_server` to control the running listener.
pub struct ServerHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Signal the listener to stop and wait for it to shut down.
    pub fn stop(self) {
        self.keep_running.store(false, Ordering::SeqCst);
        self.wait();
    }

    /// Block until the listener thread exits. Without `stop` that only
    /// happens after a fatal accept error.
    pub fn wait(mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Bind and start the listener on a background thread. Returns a handle for
/// stopping it and the actual bound address (useful when port 0 is used to
/// let the OS pick a free port).
pub fn start_server(config: ServerConfig) -> io::Result<(ServerHandle, SocketAddr)> {
    let listener = TcpListener::bind((config.bind_addr, config.port))?;
    let addr = listener.local_addr()?;
    listener.set_nonblocking(true)?;
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();

    let thread = thread::Builder::new()
        .name("match-listener".into())
        .spawn(move || run_listener(listener, config, keep_running_clone))?;

    info!(%addr, "match relay server listening");
    Ok((
        ServerHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Accept loop. Runs until `keep_running` is set to false.
fn run_listener(listener: TcpListener, config: ServerConfig, keep_running: Arc<AtomicBool>) {
    let mut pending: Option<PendingMatch> = None;
    let poll_interval = config.poll_interval();
    let pending_timeout = config.pending_timeout();

    while keep_running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "accepted connection");
                stream.set_nonblocking(false).ok();
                pending = pair(pending.take(), stream);
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                if let Some(timeout) = pending_timeout {
                    if pending.as_ref().is_some_and(|p| p.waiting_for() >= timeout) {
                        if let Some(stale) = pending.take() {
                            stale.abandon();
                        }
                    }
                }
                thread::sleep(poll_interval);
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                error!(error = %e, "accept failed; listener shutting down");
                break;
            }
        }
    }

    if let Some(waiting) = pending.take() {
        waiting.abandon();
    }
    info!("match relay server stopped");
}

/// Feed a new connection into the pairing slot. Returns what the slot holds
/// afterwards.
fn pair(pending: Option<PendingMatch>, stream: TcpStream) -> Option<PendingMatch> {
    match pending {
        None => match PendingMatch::new(stream) {
            Ok(waiting) => Some(waiting),
            Err(e) => {
                warn!(error = %e, "new player dropped before pairing");
                None
            }
        },
        Some(waiting) => {
            if let Err(e) = waiting.attach(stream).spawn() {
                error!(error = %e, "could not start match relay thread");
            }
            None
        }
    }
}
