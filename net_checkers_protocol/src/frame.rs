// The fixed 4-byte frame and its three control sentinels.
//
// `Frame` is the decoded form used by clients. The match relay never decodes
// moves; it only needs `FrameKind` to know where a turn ends, and forwards the
// raw bytes verbatim.

use crate::error::ProtocolError;
use crate::types::{Move, Square};

/// Size of every frame on the wire.
pub const FRAME_LEN: usize = 4;

/// Sent by the server: first as a connectivity probe, then to tell the first
/// player to move.
pub const START_GAME: i8 = -4;

/// Either side is leaving; the match is over.
pub const END_GAME: i8 = -3;

/// Terminates a sequence of move frames from one side.
pub const END_TURN: i8 = -2;

pub type RawFrame = [u8; FRAME_LEN];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame {
    StartGame,
    EndGame,
    EndTurn,
    Move(Move),
}

impl Frame {
    pub fn encode(self) -> RawFrame {
        match self {
            Self::StartGame => sentinel(START_GAME),
            Self::EndGame => sentinel(END_GAME),
            Self::EndTurn => sentinel(END_TURN),
            Self::Move(mv) => [mv.from.col(), mv.from.row(), mv.to.col(), mv.to.row()],
        }
    }

    /// Decode a frame, validating move coordinates. Bytes 1-3 of a control
    /// frame are ignored.
    pub fn decode(raw: RawFrame) -> Result<Self, ProtocolError> {
        let bytes = raw.map(|b| b as i8);
        match bytes[0] {
            START_GAME => Ok(Self::StartGame),
            END_GAME => Ok(Self::EndGame),
            END_TURN => Ok(Self::EndTurn),
            tag if tag < 0 => Err(ProtocolError::UnknownSentinel(tag)),
            _ => {
                let from = Square::from_wire(bytes[0], bytes[1], 0)?;
                let to = Square::from_wire(bytes[2], bytes[3], 2)?;
                Ok(Self::Move(Move::new(from, to)))
            }
        }
    }

    pub fn kind(self) -> FrameKind {
        match self {
            Self::StartGame => FrameKind::StartGame,
            Self::EndGame => FrameKind::EndGame,
            Self::EndTurn => FrameKind::EndTurn,
            Self::Move(_) => FrameKind::Data,
        }
    }
}

fn sentinel(tag: i8) -> RawFrame {
    [tag as u8, 0, 0, 0]
}

/// Classification of a raw frame by its first byte only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    StartGame,
    EndGame,
    EndTurn,
    /// Anything else: forwarded untouched.
    Data,
}

impl FrameKind {
    pub fn of(raw: &RawFrame) -> Self {
        match raw[0] as i8 {
            START_GAME => Self::StartGame,
            END_GAME => Self::EndGame,
            END_TURN => Self::EndTurn,
            _ => Self::Data,
        }
    }

    /// END_TURN or END_GAME: the sending side has stopped talking.
    pub fn ends_turn(self) -> bool {
        matches!(self, Self::EndTurn | Self::EndGame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{COLUMNS, ROWS};

    #[test]
    fn sentinels_are_disjoint_from_coordinates() {
        for tag in [START_GAME, END_GAME, END_TURN] {
            assert!(tag < 0);
        }
        assert_ne!(START_GAME, END_GAME);
        assert_ne!(END_GAME, END_TURN);
    }

    #[test]
    fn control_frames_encode_first_byte_only() {
        assert_eq!(Frame::StartGame.encode(), [0xFC, 0, 0, 0]);
        assert_eq!(Frame::EndGame.encode(), [0xFD, 0, 0, 0]);
        assert_eq!(Frame::EndTurn.encode(), [0xFE, 0, 0, 0]);
    }

    #[test]
    fn control_frames_ignore_trailing_bytes() {
        assert_eq!(Frame::decode([0xFE, 7, 7, 7]).unwrap(), Frame::EndTurn);
        assert_eq!(Frame::decode([0xFD, 1, 2, 3]).unwrap(), Frame::EndGame);
    }

    #[test]
    fn every_in_range_move_survives_the_wire() {
        for from in 0..COLUMNS as usize * ROWS as usize {
            for to in 0..COLUMNS as usize * ROWS as usize {
                let mv = Move::new(Square::from_index(from), Square::from_index(to));
                let raw = Frame::Move(mv).encode();
                assert_eq!(Frame::decode(raw).unwrap(), Frame::Move(mv));
                assert_eq!(FrameKind::of(&raw), FrameKind::Data);
            }
        }
    }

    #[test]
    fn move_frame_layout() {
        let mv = Move::new(Square::new(0, 5), Square::new(1, 4));
        assert_eq!(Frame::Move(mv).encode(), [0, 5, 1, 4]);
    }

    #[test]
    fn decode_rejects_unknown_sentinel() {
        assert_eq!(
            Frame::decode([0xFF, 0, 0, 0]),
            Err(ProtocolError::UnknownSentinel(-1))
        );
        // Classification alone does not reject it.
        assert_eq!(FrameKind::of(&[0xFF, 0, 0, 0]), FrameKind::Data);
    }

    #[test]
    fn decode_rejects_out_of_range_coordinates() {
        assert_eq!(
            Frame::decode([4, 0, 0, 0]),
            Err(ProtocolError::CoordinateOutOfRange {
                position: 0,
                value: 4
            })
        );
        assert_eq!(
            Frame::decode([0, 0, 1, 8]),
            Err(ProtocolError::CoordinateOutOfRange {
                position: 3,
                value: 8
            })
        );
        // A negative coordinate past the first byte is out of range, not a
        // sentinel.
        assert_eq!(
            Frame::decode([0, 0xFE, 1, 1]),
            Err(ProtocolError::CoordinateOutOfRange {
                position: 1,
                value: -2
            })
        );
    }

    #[test]
    fn ends_turn_classification() {
        assert!(FrameKind::EndTurn.ends_turn());
        assert!(FrameKind::EndGame.ends_turn());
        assert!(!FrameKind::StartGame.ends_turn());
        assert!(!FrameKind::Data.ends_turn());
    }
}
