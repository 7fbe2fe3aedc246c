// CLI entry point for the checkers match relay server.
//
// Pairs players two at a time in connection order and relays their turns.
// The server never looks inside a move. See `server.rs` for the accept loop
// and `matchup.rs` for the relay itself.
//
// Usage:
//   relay [OPTIONS]
//     --config <FILE>              JSON config file (flags override it)
//     --bind <ADDR>                Listen address (default: 0.0.0.0)
//     --port <PORT>                Listen port (default: 8007)
//     --pending-timeout-ms <MS>    Drop a player nobody joins after this long
//
// Logging goes to stderr and is filtered by RUST_LOG (default: info).

use std::net::IpAddr;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info};

use net_checkers_relay::config::{ServerConfig, load_json};
use net_checkers_relay::logging::init_logging;
use net_checkers_relay::server::start_server;

#[derive(Debug, Parser)]
#[command(author, version, about = "Match relay server for networked checkers")]
struct Args {
    /// JSON config file. Flags given on the command line override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Port to listen on. 0 picks a free port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Evict a waiting player after this many milliseconds without an
    /// opponent.
    #[arg(long)]
    pending_timeout_ms: Option<u64>,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let mut config = match &self.config {
            Some(path) => load_json(path).unwrap_or_else(|e| {
                error!(error = %e, "bad config file");
                process::exit(1);
            }),
            None => ServerConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.pending_timeout_ms.is_some() {
            config.pending_timeout_ms = self.pending_timeout_ms;
        }
        config
    }
}

fn main() {
    let args = Args::parse();
    init_logging();
    let config = args.into_config();

    let (handle, addr) = match start_server(config) {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "failed to start match relay server");
            process::exit(1);
        }
    };

    info!(%addr, "press Ctrl+C to stop");
    // Runs until the process is killed or the listener fails.
    handle.wait();
}
