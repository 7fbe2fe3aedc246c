// Integration smoke test for the match relay server.
//
// Starts a server on localhost and drives it with raw TCP sockets speaking
// 4-byte frames. No rules engine is involved: the server relays whatever
// the clients send, so the moves here need not be legal.

use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

use net_checkers_protocol::{
    END_GAME, END_TURN, Frame, Move, RawFrame, ReadError, START_GAME, Square, read_raw_frame,
    write_frame,
};
use net_checkers_relay::config::ServerConfig;
use net_checkers_relay::server::start_server;

fn local_config() -> ServerConfig {
    ServerConfig {
        bind_addr: [127, 0, 0, 1].into(),
        port: 0,
        poll_interval_ms: 10,
        ..ServerConfig::default()
    }
}

fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream
}

fn recv(stream: &mut TcpStream) -> RawFrame {
    read_raw_frame(stream).unwrap()
}

fn recv_sentinel(stream: &mut TcpStream) -> i8 {
    recv(stream)[0] as i8
}

fn send(stream: &mut TcpStream, frame: Frame) {
    write_frame(stream, frame).unwrap();
}

fn mv(fc: u8, fr: u8, tc: u8, tr: u8) -> Frame {
    Frame::Move(Move::new(Square::new(fc, fr), Square::new(tc, tr)))
}

fn assert_closed(stream: &mut TcpStream) {
    match read_raw_frame(stream) {
        Err(ReadError::PeerDisconnected { received: 0 }) => {}
        other => panic!("expected the server to close, got {other:?}"),
    }
}

/// Connect two players in order and consume the START_GAME frames, leaving
/// the first player on turn.
fn connect_pair(addr: SocketAddr) -> (TcpStream, TcpStream) {
    let mut first = connect(addr);
    assert_eq!(recv_sentinel(&mut first), START_GAME);
    let mut second = connect(addr);
    assert_eq!(recv_sentinel(&mut second), START_GAME);
    assert_eq!(recv_sentinel(&mut first), START_GAME);
    (first, second)
}

#[test]
fn full_match_lifecycle() {
    let (handle, addr) = start_server(local_config()).unwrap();
    let (mut first, mut second) = connect_pair(addr);

    // First player's turn: one move.
    send(&mut first, mv(0, 5, 1, 4));
    send(&mut first, Frame::EndTurn);
    assert_eq!(recv(&mut second), [0, 5, 1, 4]);
    assert_eq!(recv_sentinel(&mut second), END_TURN);

    // Second player's turn.
    send(&mut second, mv(3, 5, 3, 4));
    send(&mut second, Frame::EndTurn);
    assert_eq!(recv(&mut first), [3, 5, 3, 4]);
    assert_eq!(recv_sentinel(&mut first), END_TURN);

    // Another turn for the first player, then the second player leaves.
    send(&mut first, mv(1, 4, 2, 3));
    send(&mut first, Frame::EndTurn);
    assert_eq!(recv(&mut second), [1, 4, 2, 3]);
    assert_eq!(recv_sentinel(&mut second), END_TURN);
    send(&mut second, Frame::EndGame);

    assert_eq!(recv_sentinel(&mut first), END_GAME);
    assert_closed(&mut first);
    assert_eq!(recv_sentinel(&mut second), END_GAME);
    assert_closed(&mut second);

    handle.stop();
}

#[test]
fn third_player_waits_for_a_fourth() {
    let (handle, addr) = start_server(local_config()).unwrap();
    let (_first, _second) = connect_pair(addr);

    // The first match is out of the listener's hands; a new pair forms.
    let (mut third, mut fourth) = connect_pair(addr);
    send(&mut third, mv(2, 5, 2, 4));
    send(&mut third, Frame::EndTurn);
    assert_eq!(recv(&mut fourth), [2, 5, 2, 4]);
    assert_eq!(recv_sentinel(&mut fourth), END_TURN);

    handle.stop();
}

#[test]
fn disconnect_mid_turn_ends_the_match_for_the_opponent() {
    let (handle, addr) = start_server(local_config()).unwrap();
    let (mut first, mut second) = connect_pair(addr);

    send(&mut first, mv(0, 5, 1, 4));
    send(&mut first, mv(1, 4, 2, 3));
    drop(first);

    assert_eq!(recv(&mut second), [0, 5, 1, 4]);
    assert_eq!(recv(&mut second), [1, 4, 2, 3]);
    assert_eq!(recv_sentinel(&mut second), END_GAME);
    assert_closed(&mut second);

    handle.stop();
}

#[test]
fn unmatched_player_is_evicted_after_timeout() {
    let config = ServerConfig {
        pending_timeout_ms: Some(300),
        ..local_config()
    };
    let (handle, addr) = start_server(config).unwrap();

    let mut lonely = connect(addr);
    assert_eq!(recv_sentinel(&mut lonely), START_GAME);
    assert_eq!(recv_sentinel(&mut lonely), END_GAME);
    assert_closed(&mut lonely);

    // The slot is free again: the next two connections are paired.
    let (mut first, mut second) = connect_pair(addr);
    send(&mut first, Frame::EndTurn);
    assert_eq!(recv_sentinel(&mut second), END_TURN);

    handle.stop();
}

#[test]
fn stopping_the_server_releases_a_waiting_player() {
    let (handle, addr) = start_server(local_config()).unwrap();
    let mut waiting = connect(addr);
    assert_eq!(recv_sentinel(&mut waiting), START_GAME);

    // Let the listener finish handling the connection before stopping.
    thread::sleep(Duration::from_millis(50));
    handle.stop();

    assert_eq!(recv_sentinel(&mut waiting), END_GAME);
    assert_closed(&mut waiting);
}
