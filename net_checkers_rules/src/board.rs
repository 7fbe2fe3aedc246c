// The 4x8 dark-square board and its move geometry.
//
// Only dark squares exist, so diagonal neighbours are not at a fixed column
// offset: stepping into an odd row from an even one shifts left by one
// column, stepping into an even row from an odd one shifts right by one.
// `Board::corner` is the single place that encodes this.
//
// Corners are always examined in the fixed order top-left, top-right,
// bottom-left, bottom-right. Move lists are built in that order, which is the
// order the player cycles through destinations.

use std::fmt;
use std::str::FromStr;

use net_checkers_protocol::{COLUMNS, Move, ROWS, Square};

use crate::error::RulesError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Piece {
    #[default]
    Empty,
    Local,
    LocalKing,
    Remote,
    RemoteKing,
}

impl Piece {
    /// Signed cell value: 0 empty, +1/+2 local piece/king, -1/-2 remote.
    pub fn value(self) -> i8 {
        match self {
            Self::Empty => 0,
            Self::Local => 1,
            Self::LocalKing => 2,
            Self::Remote => -1,
            Self::RemoteKing => -2,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }

    pub fn is_local(self) -> bool {
        matches!(self, Self::Local | Self::LocalKing)
    }

    pub fn is_remote(self) -> bool {
        matches!(self, Self::Remote | Self::RemoteKing)
    }

    pub fn is_king(self) -> bool {
        matches!(self, Self::LocalKing | Self::RemoteKing)
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Empty => '.',
            Self::Local => 'o',
            Self::LocalKing => 'O',
            Self::Remote => 'x',
            Self::RemoteKing => 'X',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        Some(match c {
            '.' => Self::Empty,
            'o' => Self::Local,
            'O' => Self::LocalKing,
            'x' => Self::Remote,
            'X' => Self::RemoteKing,
            _ => return None,
        })
    }
}

/// A diagonal direction. "Top" is toward row 0, the local player's forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Examination order for move enumeration.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn is_forward(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight)
    }

    fn is_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: [[Piece; ROWS as usize]; COLUMNS as usize],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Starting position: remote pieces on rows 0-2, local pieces on rows 5-7.
    pub fn new() -> Self {
        let mut board = Self::empty();
        for col in 0..COLUMNS {
            for row in 0..ROWS {
                let piece = match row {
                    0..=2 => Piece::Remote,
                    5.. => Piece::Local,
                    _ => Piece::Empty,
                };
                board.set(Square::new(col, row), piece);
            }
        }
        board
    }

    pub fn empty() -> Self {
        Self {
            cells: [[Piece::Empty; ROWS as usize]; COLUMNS as usize],
        }
    }

    /// Parse an 8-line diagram, row 0 first, one symbol per square
    /// (see `Piece::symbol`). Blank lines and surrounding whitespace are
    /// ignored.
    pub fn from_diagram(diagram: &str) -> Result<Self, RulesError> {
        let rows: Vec<&str> = diagram
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if rows.len() != ROWS as usize {
            return Err(RulesError::BadDiagram(format!(
                "expected {ROWS} rows, found {}",
                rows.len()
            )));
        }
        let mut board = Self::empty();
        for (row, line) in rows.iter().enumerate() {
            let symbols: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if symbols.len() != COLUMNS as usize {
                return Err(RulesError::BadDiagram(format!(
                    "row {row}: expected {COLUMNS} squares, found {}",
                    symbols.len()
                )));
            }
            for (col, symbol) in symbols.into_iter().enumerate() {
                let piece = Piece::from_symbol(symbol).ok_or_else(|| {
                    RulesError::BadDiagram(format!("row {row}: unknown symbol {symbol:?}"))
                })?;
                board.set(Square::new(col as u8, row as u8), piece);
            }
        }
        Ok(board)
    }

    pub fn get(&self, sq: Square) -> Piece {
        self.cells[sq.col() as usize][sq.row() as usize]
    }

    pub fn set(&mut self, sq: Square, piece: Piece) {
        self.cells[sq.col() as usize][sq.row() as usize] = piece;
    }

    /// This position as the other player stores it: every square mirrored
    /// and every piece changing sides.
    pub fn opponent_view(&self) -> Board {
        let mut view = Board::empty();
        for index in 0..(COLUMNS * ROWS) as usize {
            let sq = Square::from_index(index);
            let piece = match self.get(sq.mirror()) {
                Piece::Local => Piece::Remote,
                Piece::LocalKing => Piece::RemoteKing,
                Piece::Remote => Piece::Local,
                Piece::RemoteKing => Piece::LocalKing,
                Piece::Empty => Piece::Empty,
            };
            view.set(sq, piece);
        }
        view
    }

    /// Number of squares holding a piece matching `pred`.
    pub fn count(&self, pred: impl Fn(Piece) -> bool) -> usize {
        self.cells.iter().flatten().filter(|p| pred(**p)).count()
    }

    /// The diagonal neighbour of `sq` in direction `corner`, or `None` if it
    /// would be off the board.
    pub fn corner(sq: Square, corner: Corner) -> Option<Square> {
        let row = if corner.is_forward() {
            sq.row() as i8 - 1
        } else {
            sq.row() as i8 + 1
        };
        let mut col = sq.col() as i8;
        let odd_row = row.rem_euclid(2) == 1;
        if corner.is_left() && odd_row {
            col -= 1;
        } else if !corner.is_left() && !odd_row {
            col += 1;
        }
        Square::try_new(col, row)
    }

    /// Direction of `mv` and whether it is a jump, if `mv` is one diagonal
    /// step or one diagonal jump on the board. Ignores what is on the board.
    pub fn direction(mv: Move) -> Option<(Corner, bool)> {
        Corner::ALL.into_iter().find_map(|corner| {
            let step = Self::corner(mv.from, corner)?;
            if step == mv.to {
                return Some((corner, false));
            }
            (Self::corner(step, corner)? == mv.to).then_some((corner, true))
        })
    }

    /// The square a jump passes over. `None` if `mv` is not a diagonal jump.
    pub fn jumped_square(mv: Move) -> Option<Square> {
        match Self::direction(mv)? {
            (corner, true) => Self::corner(mv.from, corner),
            (_, false) => None,
        }
    }

    /// Destinations available to the local piece on `sq`, in corner order.
    /// Empty if `sq` does not hold a local piece. Men move toward row 0 only;
    /// kings use all four corners.
    pub fn moves_from(&self, sq: Square, jumps_only: bool) -> Vec<Square> {
        let piece = self.get(sq);
        let mut moves = Vec::new();
        if !piece.is_local() {
            return moves;
        }
        for corner in Corner::ALL {
            if !(piece.is_king() || corner.is_forward()) {
                continue;
            }
            let Some(neighbour) = Self::corner(sq, corner) else {
                continue;
            };
            let occupant = self.get(neighbour);
            if occupant.is_empty() {
                if !jumps_only {
                    moves.push(neighbour);
                }
            } else if occupant.is_remote() {
                if let Some(landing) = Self::corner(neighbour, corner) {
                    if self.get(landing).is_empty() {
                        moves.push(landing);
                    }
                }
            }
        }
        moves
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..ROWS {
            for col in 0..COLUMNS {
                write!(f, "{}", self.get(Square::new(col, row)).symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_diagram(s)
    }
}
