// Board coordinates shared by the codec and the rules engine.
//
// Only the dark squares of the checkerboard are addressable, so the board is
// a dense 4-column by 8-row grid. A `Square` is always on the board: the
// constructors either assert (for literals in code) or return an error (for
// bytes that came off the wire).
//
// Each client stores the board from its own point of view, with its pieces
// starting at the bottom (rows 5-7). A move received from the peer is in the
// peer's orientation and must be mirrored before it is applied.

use std::fmt;

use crate::error::ProtocolError;

/// Number of addressable squares per row.
pub const COLUMNS: u8 = 4;

/// Number of rows.
pub const ROWS: u8 = 8;

/// A dark square on the board, addressed by column (0-3) and row (0-7).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    col: u8,
    row: u8,
}

impl Square {
    /// Panics if the coordinates are off the board. Use `from_wire` for
    /// untrusted input.
    pub const fn new(col: u8, row: u8) -> Self {
        assert!(col < COLUMNS && row < ROWS, "square is off the board");
        Self { col, row }
    }

    /// Checked constructor for signed coordinates (wire bytes, or the result
    /// of stepping off an edge).
    pub fn try_new(col: i8, row: i8) -> Option<Self> {
        if (0..COLUMNS as i8).contains(&col) && (0..ROWS as i8).contains(&row) {
            Some(Self {
                col: col as u8,
                row: row as u8,
            })
        } else {
            None
        }
    }

    /// Validate a coordinate pair read from the wire. `position` is the byte
    /// offset of `col` within the frame, for error reporting.
    pub fn from_wire(col: i8, row: i8, position: usize) -> Result<Self, ProtocolError> {
        if !(0..COLUMNS as i8).contains(&col) {
            return Err(ProtocolError::CoordinateOutOfRange {
                position,
                value: col,
            });
        }
        Self::try_new(col, row).ok_or(ProtocolError::CoordinateOutOfRange {
            position: position + 1,
            value: row,
        })
    }

    pub const fn col(self) -> u8 {
        self.col
    }

    pub const fn row(self) -> u8 {
        self.row
    }

    /// The same square as seen from the other side of the board.
    pub const fn mirror(self) -> Self {
        Self {
            col: COLUMNS - 1 - self.col,
            row: ROWS - 1 - self.row,
        }
    }

    /// Raster index (row-major), used for wrapping scans over the board.
    pub const fn index(self) -> usize {
        self.row as usize * COLUMNS as usize + self.col as usize
    }

    /// Inverse of `index`, wrapping modulo the board size.
    pub const fn from_index(index: usize) -> Self {
        let index = index % (COLUMNS as usize * ROWS as usize);
        Self {
            col: (index % COLUMNS as usize) as u8,
            row: (index / COLUMNS as usize) as u8,
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// A single step or jump of one piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    pub const fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }

    /// The move as the peer sees it.
    pub const fn mirror(self) -> Self {
        Self {
            from: self.from.mirror(),
            to: self.to.mirror(),
        }
    }

    /// Number of rows travelled (1 for a step, 2 for a jump).
    pub fn row_distance(self) -> u8 {
        self.from.row.abs_diff(self.to.row)
    }

    pub fn is_jump(self) -> bool {
        self.row_distance() > 1
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_squares() -> impl Iterator<Item = Square> {
        (0..ROWS).flat_map(|row| (0..COLUMNS).map(move |col| Square::new(col, row)))
    }

    #[test]
    fn mirror_twice_is_identity() {
        for sq in all_squares() {
            assert_eq!(sq.mirror().mirror(), sq);
        }
    }

    #[test]
    fn mirror_swaps_corners() {
        assert_eq!(Square::new(0, 0).mirror(), Square::new(3, 7));
        assert_eq!(Square::new(0, 5).mirror(), Square::new(3, 2));
        assert_eq!(Square::new(1, 4).mirror(), Square::new(2, 3));
    }

    #[test]
    fn index_roundtrip_and_wrap() {
        for sq in all_squares() {
            assert_eq!(Square::from_index(sq.index()), sq);
        }
        assert_eq!(Square::from_index(32), Square::new(0, 0));
        assert_eq!(Square::from_index(3), Square::new(3, 0));
        assert_eq!(Square::from_index(4), Square::new(0, 1));
    }

    #[test]
    fn try_new_rejects_off_board() {
        assert!(Square::try_new(-1, 0).is_none());
        assert!(Square::try_new(4, 0).is_none());
        assert!(Square::try_new(0, 8).is_none());
        assert_eq!(Square::try_new(3, 7), Some(Square::new(3, 7)));
    }

    #[test]
    fn from_wire_reports_offending_byte() {
        assert_eq!(
            Square::from_wire(5, 0, 2),
            Err(ProtocolError::CoordinateOutOfRange {
                position: 2,
                value: 5
            })
        );
        assert_eq!(
            Square::from_wire(1, 9, 0),
            Err(ProtocolError::CoordinateOutOfRange {
                position: 1,
                value: 9
            })
        );
    }

    #[test]
    #[should_panic(expected = "off the board")]
    fn new_asserts_on_board() {
        let _ = Square::new(4, 0);
    }

    #[test]
    fn jump_detection() {
        let step = Move::new(Square::new(0, 5), Square::new(1, 4));
        let jump = Move::new(Square::new(0, 5), Square::new(1, 3));
        assert!(!step.is_jump());
        assert!(jump.is_jump());
        assert_eq!(jump.row_distance(), 2);
    }
}
