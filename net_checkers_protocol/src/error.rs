// Error types for decoding and reading frames.

use std::io;

use thiserror::Error;

use crate::frame::Frame;

/// Received bytes violate the protocol. Always fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unknown control byte {0}")]
    UnknownSentinel(i8),
    #[error("coordinate byte {position} out of range: {value}")]
    CoordinateOutOfRange { position: usize, value: i8 },
    #[error("expected {expected}, got {got:?}")]
    UnexpectedFrame { expected: &'static str, got: Frame },
}

/// Failure reading one frame off a stream.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The peer closed the stream before a whole frame arrived.
    #[error("peer disconnected ({received} of 4 bytes received)")]
    PeerDisconnected { received: usize },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ReadError {
    /// True when the peer is gone, either by clean EOF or a transport error.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::PeerDisconnected { .. } | Self::Io(_))
    }
}
