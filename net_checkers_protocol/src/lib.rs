// net_checkers_protocol: wire protocol shared by checkers clients and the
// match relay server.
//
// Every unit on the wire is a fixed 4-byte frame. A frame is either a move
// (`[from_col, from_row, to_col, to_row]`, coordinates in the sender's own
// bottom-is-mine orientation) or a control frame whose first byte is one of
// three negative sentinels (START_GAME, END_GAME, END_TURN). There is no
// length prefix, no version byte and no handshake beyond the sentinels.
//
// Module overview:
// - `types.rs`:    Board dimensions, `Square`, `Move`, and the mirroring
//                  transform applied to a peer's coordinates.
// - `frame.rs`:    `Frame` codec (encode/decode of the 4 bytes), sentinel
//                  constants, and `FrameKind` for relays that forward frames
//                  without decoding them.
// - `framing.rs`:  Read-fully / write helpers over any `Read`/`Write`.
// - `error.rs`:    `ProtocolError` and `ReadError`.
//
// Coordinates and sentinels share a signed byte: sentinels are negative,
// coordinates are in 0..8, so the two ranges never collide.

pub mod error;
pub mod frame;
pub mod framing;
pub mod types;

pub use error::{ProtocolError, ReadError};
pub use frame::{END_GAME, END_TURN, FRAME_LEN, Frame, FrameKind, RawFrame, START_GAME};
pub use framing::{read_frame, read_raw_frame, write_frame, write_raw_frame};
pub use types::{COLUMNS, Move, ROWS, Square};
