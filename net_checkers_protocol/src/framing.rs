// Reading and writing whole frames over a byte stream.
//
// TCP may hand back fewer than four bytes per `read`, so `read_raw_frame`
// accumulates until the frame is complete. A zero-length read is a
// disconnect, never a retry condition. Writers flush after every frame: the
// protocol is strictly request/response per turn and a buffered frame would
// stall the peer.

use std::io::{self, ErrorKind, Read, Write};

use crate::error::ReadError;
use crate::frame::{FRAME_LEN, Frame, RawFrame};

/// Read exactly one frame's worth of bytes.
pub fn read_raw_frame<R: Read>(reader: &mut R) -> Result<RawFrame, ReadError> {
    let mut buf = [0u8; FRAME_LEN];
    let mut received = 0;
    while received < FRAME_LEN {
        match reader.read(&mut buf[received..]) {
            Ok(0) => return Err(ReadError::PeerDisconnected { received }),
            Ok(n) => received += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(buf)
}

/// Read and decode one frame.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Frame, ReadError> {
    let raw = read_raw_frame(reader)?;
    Ok(Frame::decode(raw)?)
}

pub fn write_raw_frame<W: Write>(writer: &mut W, raw: &RawFrame) -> io::Result<()> {
    writer.write_all(raw)?;
    writer.flush()
}

pub fn write_frame<W: Write>(writer: &mut W, frame: Frame) -> io::Result<()> {
    write_raw_frame(writer, &frame.encode())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::error::ProtocolError;

    /// Hands out at most `chunk` bytes per read.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
        interrupt_next: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interrupt_next {
                self.interrupt_next = false;
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            self.interrupt_next = true;
            Ok(n)
        }
    }

    #[test]
    fn partial_reads_are_accumulated() {
        let mut reader = Trickle {
            data: vec![0, 5, 1, 4, 0xFE, 0, 0, 0],
            pos: 0,
            chunk: 1,
            interrupt_next: false,
        };
        assert_eq!(read_raw_frame(&mut reader).unwrap(), [0, 5, 1, 4]);
        assert_eq!(read_frame(&mut reader).unwrap(), Frame::EndTurn);
    }

    #[test]
    fn eof_mid_frame_is_a_disconnect() {
        let mut cursor = Cursor::new(vec![0u8, 5]);
        let err = read_raw_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, ReadError::PeerDisconnected { received: 2 }));
        assert!(err.is_disconnect());
    }

    #[test]
    fn decode_errors_surface_as_protocol_errors() {
        let mut cursor = Cursor::new(vec![0x80, 0, 0, 0]);
        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(
            err,
            ReadError::Protocol(ProtocolError::UnknownSentinel(-128))
        ));
        assert!(!err.is_disconnect());
    }

    #[test]
    fn frames_are_written_back_to_back() {
        let mut wire = Vec::new();
        write_frame(&mut wire, Frame::StartGame).unwrap();
        write_raw_frame(&mut wire, &[3, 2, 2, 3]).unwrap();
        assert_eq!(wire, vec![0xFC, 0, 0, 0, 3, 2, 2, 3]);
    }
}
