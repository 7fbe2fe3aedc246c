// Terminal checkers client.
//
// Connects to a match relay server and plays one game. Input is one command
// per line on stdin:
//
//   n  next piece (or next destination once a piece is chosen)
//   p  previous piece (or next destination once a piece is chosen)
//   u  choose the selected piece, or make the proposed move
//   d  deselect; during a jump chain this gives up the remaining jumps
//   q  quit
//   b  redraw the board (also: empty line)
//
// The board is drawn from the local player's side: `o`/`O` are ours and
// move up the screen, `x`/`X` are the opponent's. Brackets mark the
// selected piece, angle brackets the proposed destination.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::error;

use net_checkers_protocol::{COLUMNS, ROWS, Square};
use net_checkers_relay::client::{ClientSession, lock_game};
use net_checkers_relay::config::{ClientConfig, load_json};
use net_checkers_relay::logging::init_logging;
use net_checkers_rules::{CheckersGame, Phase, RulesError};

#[derive(Debug, Parser)]
#[command(author, version, about = "Play checkers against another player over TCP")]
struct Args {
    /// JSON config file. Flags given on the command line override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server address as host:port.
    #[arg(short, long)]
    server: Option<String>,

    /// Give up connecting after this many milliseconds.
    #[arg(long)]
    connect_timeout_ms: Option<u64>,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        let mut config = match &self.config {
            Some(path) => load_json(path).unwrap_or_else(|e| {
                error!(error = %e, "bad config file");
                process::exit(1);
            }),
            None => ClientConfig::default(),
        };
        if let Some(server) = self.server {
            config.server_addr = server;
        }
        if self.connect_timeout_ms.is_some() {
            config.connect_timeout_ms = self.connect_timeout_ms;
        }
        config
    }
}

fn main() {
    let args = Args::parse();
    init_logging();
    let config = args.into_config();

    println!("connecting to {}", config.server_addr);
    let session = match ClientSession::connect(config) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "could not start session");
            process::exit(1);
        }
    };
    println!("commands: n/p move the selection, u confirm or move, d deselect, q quit, b redraw");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let mut game = lock_game(session.game());
        if let Err(e) = apply_command(&mut game, line.trim()) {
            println!("{e}");
        }
        draw(&game);
        if game.is_game_over() {
            break;
        }
    }

    // End of input counts as quitting.
    session.quit();
    let end = session.join();
    println!("game over: {end}");
}

fn apply_command(game: &mut CheckersGame, command: &str) -> Result<(), RulesError> {
    match command {
        "" | "b" => {}
        "q" => game.quit(),
        _ if !game.is_local_turn() && !game.is_game_over() => {
            println!("waiting for the other player");
        }
        "n" | "p" if game.phase() == Phase::AwaitingDestination => {
            game.cycle_destination()?;
        }
        "n" => {
            game.select_next()?;
        }
        "p" => {
            game.select_previous()?;
        }
        "u" => {
            game.confirm_or_move()?;
        }
        "d" => {
            game.deselect()?;
        }
        other => println!("unknown command {other:?}"),
    }
    Ok(())
}

/// Draw the dark squares in board layout. Even rows sit one square to the
/// right of odd rows.
fn draw(game: &CheckersGame) {
    let mut out = String::new();
    for row in 0..ROWS {
        if row % 2 == 0 {
            out.push_str("   ");
        }
        for col in 0..COLUMNS {
            let square = Square::new(col, row);
            let symbol = game.board().get(square).symbol();
            let (open, close) = if game.selected() == Some(square) {
                ('[', ']')
            } else if game.destination() == Some(square) {
                ('<', '>')
            } else {
                (' ', ' ')
            };
            out.push(open);
            out.push(symbol);
            out.push(close);
            out.push_str("   ");
        }
        out.push('\n');
    }
    out.push_str(&status(game));
    out.push('\n');

    let mut stdout = io::stdout().lock();
    stdout.write_all(out.as_bytes()).ok();
    stdout.flush().ok();
}

fn status(game: &CheckersGame) -> String {
    match game.phase() {
        Phase::GameOver => match game.game_over_reason() {
            Some(reason) => format!("game over: {reason}"),
            None => "game over".to_string(),
        },
        Phase::OpponentTurn => "opponent's turn".to_string(),
        Phase::AwaitingSelection => "your turn: choose a piece".to_string(),
        Phase::AwaitingDestination if game.is_jumping() => {
            "jump again: choose where to land".to_string()
        }
        Phase::AwaitingDestination => "your turn: choose where to move".to_string(),
    }
}
