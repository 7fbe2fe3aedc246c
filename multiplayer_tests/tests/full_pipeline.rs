// End-to-end tests: a real match relay server and two real client sessions.
//
// Each test starts a server on a random port and connects two `TestPlayer`s,
// first one and then the other, so the first always moves first. Moves go
// engine -> session relay -> server -> session relay -> engine, and the
// tests check that both engines agree on the position after every turn.

use std::thread;
use std::time::Duration;

use multiplayer_tests::TestPlayer;
use net_checkers_protocol::Square;
use net_checkers_relay::client::SessionEnd;
use net_checkers_relay::config::ServerConfig;
use net_checkers_relay::server::{ServerHandle, start_server};
use net_checkers_rules::{GameOverReason, Piece};

/// Start a server and connect two players in a known order.
fn start_test_match() -> (ServerHandle, TestPlayer, TestPlayer) {
    let config = ServerConfig {
        bind_addr: [127, 0, 0, 1].into(),
        port: 0,
        poll_interval_ms: 10,
        ..ServerConfig::default()
    };
    let (handle, addr) = start_server(config).unwrap();

    let first = TestPlayer::connect(addr, "first");
    // The server pairs in accept order; give the first connection a head
    // start.
    thread::sleep(Duration::from_millis(100));
    let second = TestPlayer::connect(addr, "second");

    (handle, first, second)
}

fn assert_boards_agree(a: &TestPlayer, b: &TestPlayer) {
    assert_eq!(
        b.board(),
        a.board().opponent_view(),
        "{} and {} disagree on the position",
        a.name,
        b.name
    );
}

// ---------------------------------------------------------------------------
// Test scenarios
// ---------------------------------------------------------------------------

#[test]
fn first_player_to_connect_moves_first() {
    let (handle, first, second) = start_test_match();

    assert!(first.wait_for_turn());
    assert!(!second.is_local_turn());
    first.with_game(|game| {
        assert_eq!(game.selected(), Some(Square::new(0, 5)));
        assert_eq!(
            game.possible_moves(),
            &[Square::new(0, 4), Square::new(1, 4)]
        );
    });

    // (0,5) -> (1,4): confirm, cycle to the second proposal, commit.
    first.with_game(|game| {
        game.confirm_or_move().unwrap();
        assert_eq!(game.cycle_destination().unwrap(), Square::new(1, 4));
        game.confirm_or_move().unwrap();
        assert!(!game.is_local_turn());
    });

    assert!(second.wait_for_turn());
    second.with_game(|game| {
        assert_eq!(game.piece_at(3, 2), Some(Piece::Empty));
        assert_eq!(game.piece_at(2, 3), Some(Piece::Remote));
    });
    assert_boards_agree(&first, &second);

    second.play_first_proposal();
    assert!(first.wait_for_turn());
    assert_boards_agree(&first, &second);

    first.quit();
    second.quit();
    first.join();
    second.join();
    handle.stop();
}

#[test]
fn scripted_game_stays_in_sync() {
    let (handle, first, second) = start_test_match();
    assert!(first.wait_for_turn());

    let mut players = [&first, &second];
    let mut finished = false;
    for _ in 0..30 {
        let [mover, waiter] = players;
        let moves = mover.play_first_proposal();
        assert!(!moves.is_empty());
        if !waiter.wait_for_turn() {
            finished = true;
            break;
        }
        assert!(!mover.is_local_turn());
        assert_boards_agree(mover, waiter);
        players = [waiter, mover];
    }

    let [mover, waiter] = players;
    if finished {
        // The side that ran out of moves quit; the other sees it leave.
        assert_eq!(waiter.wait_for_game_over(), GameOverReason::NoMovesAvailable);
        assert_eq!(mover.wait_for_game_over(), GameOverReason::OpponentLeft);
    } else {
        // `mover` is on turn, so the server is reading from it.
        mover.quit();
        assert_eq!(waiter.wait_for_game_over(), GameOverReason::OpponentLeft);
    }
    first.join();
    second.join();
    handle.stop();
}

#[test]
fn quitting_on_your_turn_ends_the_game_for_both() {
    let (handle, first, second) = start_test_match();
    assert!(first.wait_for_turn());

    first.quit();
    assert_eq!(second.wait_for_game_over(), GameOverReason::OpponentLeft);
    assert!(matches!(first.join(), SessionEnd::LocalQuit));
    assert!(matches!(second.join(), SessionEnd::OpponentLeft));
    handle.stop();
}

#[test]
fn quitting_while_waiting_is_seen_when_the_opponent_ends_their_turn() {
    let (handle, first, second) = start_test_match();
    assert!(first.wait_for_turn());

    // The waiting player leaves at once, even though the server is busy
    // with the other player's turn.
    second.quit();
    assert!(matches!(second.join(), SessionEnd::LocalQuit));

    // The server only reads from the second player after this turn.
    first.play_first_proposal();
    assert_eq!(first.wait_for_game_over(), GameOverReason::OpponentLeft);
    first.join();
    handle.stop();
}
