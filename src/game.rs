use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of squares on a side of the board.
pub const SIZE: usize = 9;

/// The throne (castle) at the center of the board.
pub const THRONE: Square = Square::new(4, 4);

/// Orthogonal steps as (column, row) deltas: north, south, east, west.
pub const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

const INITIAL_ATTACKERS: [(usize, usize); 16] = [
    // West
    (0, 3),
    (0, 4),
    (0, 5),
    (1, 4),
    // East
    (8, 3),
    (8, 4),
    (8, 5),
    (7, 4),
    // South
    (3, 0),
    (4, 0),
    (5, 0),
    (4, 1),
    // North
    (3, 8),
    (4, 8),
    (5, 8),
    (4, 7),
];

const INITIAL_DEFENDERS: [(usize, usize); 8] = [
    (4, 5),
    (5, 4),
    (4, 3),
    (3, 4),
    (4, 6),
    (4, 2),
    (2, 4),
    (6, 4),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Attacking,
    Defending,
}

impl Side {
    pub fn opponent(&self) -> Side {
        match self {
            Side::Attacking => Side::Defending,
            Side::Defending => Side::Attacking,
        }
    }

    /// Turn marker used in the encoded board.
    pub fn letter(&self) -> char {
        match self {
            Side::Attacking => 'A',
            Side::Defending => 'D',
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Attacking => write!(f, "Attackers"),
            Side::Defending => write!(f, "Defenders"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Piece {
    Empty,
    Attacker,
    Defender,
    King,
}

impl Piece {
    /// The side owning this piece, `None` for an empty square.
    pub fn side(&self) -> Option<Side> {
        match self {
            Piece::Empty => None,
            Piece::Attacker => Some(Side::Attacking),
            Piece::Defender | Piece::King => Some(Side::Defending),
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Piece::Empty => '-',
            Piece::Attacker => 'A',
            Piece::Defender => 'D',
            Piece::King => 'K',
        }
    }
}

/// A board location. Columns print as `a`..`i`, rows as `1`..`9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Square {
    col: usize,
    row: usize,
}

impl Square {
    pub const fn new(col: usize, row: usize) -> Self {
        assert!(col < SIZE && row < SIZE, "square out of range");
        Square { col, row }
    }

    pub fn from_index(index: usize) -> Option<Square> {
        (index < SIZE * SIZE).then(|| Square::new(index % SIZE, index / SIZE))
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn row(&self) -> usize {
        self.row
    }

    /// Position in canonical order, `row * 9 + col`.
    pub fn index(&self) -> usize {
        self.row * SIZE + self.col
    }

    /// The square `dc` columns and `dr` rows away, if it is on the board.
    pub fn offset(&self, dc: i32, dr: i32) -> Option<Square> {
        let col = self.col as i32 + dc;
        let row = self.row as i32 + dr;
        let range = 0..SIZE as i32;
        (range.contains(&col) && range.contains(&row)).then(|| Square::new(col as usize, row as usize))
    }

    pub fn is_edge(&self) -> bool {
        self.col == 0 || self.row == 0 || self.col == SIZE - 1 || self.row == SIZE - 1
    }

    pub fn is_throne(&self) -> bool {
        *self == THRONE
    }

    pub fn is_throne_adjacent(&self) -> bool {
        self.col.abs_diff(THRONE.col) + self.row.abs_diff(THRONE.row) == 1
    }

    /// On-board orthogonal neighbors.
    pub fn neighbors(self) -> impl Iterator<Item = Square> {
        DIRECTIONS
            .iter()
            .filter_map(move |&(dc, dr)| self.offset(dc, dr))
    }

    /// Every square in canonical index order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..SIZE * SIZE).map(|i| Square::new(i % SIZE, i / SIZE))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col as u8) as char, self.row + 1)
    }
}

impl FromStr for Square {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseMoveError::BadSquare(s.to_string());
        let mut chars = s.chars();
        let (Some(col), Some(row), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(bad());
        };
        if !('a'..='i').contains(&col) || !('1'..='9').contains(&row) {
            return Err(bad());
        }
        Ok(Square::new(
            col as usize - 'a' as usize,
            row as usize - '1' as usize,
        ))
    }
}

/// A straight-line relocation. Diagonal and zero-length pairs cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Move {
    from: Square,
    to: Square,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Option<Move> {
        (from != to && (from.col == to.col || from.row == to.row)).then_some(Move { from, to })
    }

    pub fn from(&self) -> Square {
        self.from
    }

    pub fn to(&self) -> Square {
        self.to
    }

    pub fn distance(&self) -> usize {
        self.from.col.abs_diff(self.to.col) + self.from.row.abs_diff(self.to.row)
    }

    /// Squares strictly between `from` and `to`, nearest to `from` first.
    pub fn between(self) -> impl Iterator<Item = Square> {
        let dc = (self.to.col as i32 - self.from.col as i32).signum();
        let dr = (self.to.row as i32 - self.from.row as i32).signum();
        (1..self.distance() as i32).filter_map(move |k| self.from.offset(dc * k, dr * k))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .split_once('-')
            .ok_or_else(|| ParseMoveError::BadFormat(s.to_string()))?;
        Move::new(from.parse()?, to.parse()?).ok_or_else(|| ParseMoveError::NotStraight(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMoveError {
    #[error("invalid square {0:?}: expected a..i followed by 1..9")]
    BadSquare(String),
    #[error("invalid move {0:?}: expected <col><row>-<col><row>")]
    BadFormat(String),
    #[error("invalid move {0:?}: not a straight line")]
    NotStraight(String),
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(Move),
    #[error("Game already over")]
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinReason {
    KingEscaped,
    KingCaptured,
    NoMoves,
    MoveLimit,
    Repetition,
}

impl fmt::Display for WinReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            WinReason::KingEscaped => "king escaped",
            WinReason::KingCaptured => "king captured",
            WinReason::NoMoves => "opponent has no moves",
            WinReason::MoveLimit => "move limit exceeded",
            WinReason::Repetition => "repeated position",
        };
        f.write_str(text)
    }
}

/// Square contents indexed `[row][col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Grid([[Piece; SIZE]; SIZE]);

impl Grid {
    const EMPTY: Grid = Grid([[Piece::Empty; SIZE]; SIZE]);

    fn get(&self, sq: Square) -> Piece {
        self.0[sq.row][sq.col]
    }

    fn set(&mut self, sq: Square, piece: Piece) {
        self.0[sq.row][sq.col] = piece;
    }

    fn relocate(&mut self, mv: Move) {
        let piece = self.get(mv.from);
        self.set(mv.to, piece);
        self.set(mv.from, Piece::Empty);
    }

    fn moves_from(&self, from: Square) -> Vec<Move> {
        let piece = self.get(from);
        let mut moves = Vec::new();

        for (dc, dr) in DIRECTIONS {
            let mut cur = from;
            while let Some(next) = cur.offset(dc, dr) {
                if self.get(next) != Piece::Empty {
                    break;
                }
                cur = next;
                // The empty throne can be crossed but only the king stops there
                if next.is_throne() && piece != Piece::King {
                    continue;
                }
                moves.extend(Move::new(from, next));
            }
        }

        moves
    }

    /// True if `sq` acts as a flank against enemies of `side`: a piece of
    /// `side` or the empty throne. Off-board never counts.
    fn is_hostile(&self, sq: Option<Square>, side: Side) -> bool {
        sq.is_some_and(|sq| match self.get(sq) {
            Piece::Empty => sq.is_throne(),
            piece => piece.side() == Some(side),
        })
    }

    /// Squares captured by the piece standing on `to`.
    fn captures_at(&self, to: Square) -> Vec<Square> {
        let Some(side) = self.get(to).side() else {
            return Vec::new();
        };

        let mut captured = Vec::new();
        for (dc, dr) in DIRECTIONS {
            let Some(target) = to.offset(dc, dr) else {
                continue;
            };
            let taken = match (side, self.get(target)) {
                (Side::Attacking, Piece::King) => self.king_captured(target, (dc, dr)),
                (Side::Attacking, Piece::Defender) | (Side::Defending, Piece::Attacker) => {
                    self.is_hostile(target.offset(dc, dr), side)
                }
                _ => false,
            };
            if taken {
                captured.push(target);
            }
        }

        captured
    }

    /// King capture, given an attacker arriving from the `(dc, dr)` side.
    fn king_captured(&self, king: Square, (dc, dr): (i32, i32)) -> bool {
        if king.is_throne() {
            king.neighbors().all(|sq| self.get(sq) == Piece::Attacker)
        } else if king.is_throne_adjacent() {
            king.neighbors().all(|sq| {
                if sq.is_throne() {
                    self.is_hostile(Some(sq), Side::Attacking)
                } else {
                    self.get(sq) == Piece::Attacker
                }
            })
        } else {
            self.is_hostile(king.offset(dc, dr), Side::Attacking)
        }
    }
}

/// A recorded position. Repetition looks at `grid` alone; `turn` is kept for `undo`.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    grid: Grid,
    turn: Side,
}

/// The state of a Tablut game.
#[derive(Debug, Clone)]
pub struct Board {
    grid: Grid,
    turn: Side,
    /// Side that made the first move; move-limit accounting depends on it.
    opening: Side,
    move_count: usize,
    move_limit: Option<usize>,
    winner: Option<Side>,
    win_reason: Option<WinReason>,
    repeated: bool,
    history: Vec<Snapshot>,
}

impl Board {
    /// A board in the initial position, attackers to move.
    pub fn new() -> Self {
        let mut board = Board::empty(Side::Attacking);
        board.grid.set(THRONE, Piece::King);
        for &(col, row) in &INITIAL_DEFENDERS {
            board.grid.set(Square::new(col, row), Piece::Defender);
        }
        for &(col, row) in &INITIAL_ATTACKERS {
            board.grid.set(Square::new(col, row), Piece::Attacker);
        }
        board
    }

    /// A board with no pieces, for composing positions with [`Board::put`].
    pub fn empty(turn: Side) -> Self {
        Board {
            grid: Grid::EMPTY,
            turn,
            opening: turn,
            move_count: 0,
            move_limit: None,
            winner: None,
            win_reason: None,
            repeated: false,
            history: Vec::new(),
        }
    }

    pub fn turn(&self) -> Side {
        self.turn
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    pub fn move_limit(&self) -> Option<usize> {
        self.move_limit
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    pub fn win_reason(&self) -> Option<WinReason> {
        self.win_reason
    }

    pub fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }

    /// True iff the game ended because a position recurred.
    pub fn repeated_position(&self) -> bool {
        self.repeated
    }

    /// Cap each side at `limit` moves. Ignored if `2 * limit <= move_count()`.
    pub fn set_move_limit(&mut self, limit: usize) {
        if 2 * limit > self.move_count {
            self.move_limit = Some(limit);
        }
    }

    pub fn get(&self, sq: Square) -> Piece {
        self.grid.get(sq)
    }

    /// Overwrite a square. Does not touch history, turn or winner.
    pub fn put(&mut self, piece: Piece, sq: Square) {
        self.grid.set(sq, piece);
    }

    pub fn king_position(&self) -> Option<Square> {
        Square::all().find(|&sq| self.get(sq) == Piece::King)
    }

    /// Squares holding `piece`, in canonical order.
    pub fn pieces(&self, piece: Piece) -> Vec<Square> {
        Square::all().filter(|&sq| self.get(sq) == piece).collect()
    }

    /// True iff the piece on `from` belongs to the side to move.
    pub fn is_legal_origin(&self, from: Square) -> bool {
        self.get(from).side() == Some(self.turn)
    }

    /// True iff `from`-`to` is a rook move whose intermediate squares are
    /// empty, and `to` is the throne only when the king is moving.
    pub fn is_unblocked_move(&self, from: Square, to: Square) -> bool {
        let Some(mv) = Move::new(from, to) else {
            return false;
        };
        if to.is_throne() && self.get(from) != Piece::King {
            return false;
        }
        mv.between().all(|sq| self.get(sq) == Piece::Empty)
    }

    pub fn is_legal_move(&self, from: Square, to: Square) -> bool {
        self.is_legal_origin(from)
            && self.get(to) == Piece::Empty
            && self.is_unblocked_move(from, to)
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.is_legal_move(mv.from, mv.to)
    }

    /// Destinations reachable by the piece on `from`, ignoring whose turn it is.
    pub fn moves_from(&self, from: Square) -> Vec<Move> {
        self.grid.moves_from(from)
    }

    /// All moves for `side`, ignoring whose turn it is.
    pub fn legal_moves(&self, side: Side) -> Vec<Move> {
        Square::all()
            .filter(|&sq| self.get(sq).side() == Some(side))
            .flat_map(|sq| self.grid.moves_from(sq))
            .collect()
    }

    pub fn has_move(&self, side: Side) -> bool {
        Square::all()
            .filter(|&sq| self.get(sq).side() == Some(side))
            .any(|sq| !self.grid.moves_from(sq).is_empty())
    }

    /// Squares that `mv` would capture, evaluated on a scratch copy of the
    /// position. Legality of `mv` is not checked.
    pub fn captures_for(&self, mv: Move) -> Vec<Square> {
        let mut grid = self.grid;
        grid.relocate(mv);
        grid.captures_at(mv.to)
    }

    /// Apply `mv`, which must be legal.
    pub fn make_move(&mut self, mv: Move) {
        assert!(self.is_legal(mv), "illegal move {mv}");

        self.history.push(self.snapshot());
        self.grid.relocate(mv);
        self.move_count += 1;
        self.turn = self.turn.opponent();

        self.resolve(mv.to);
        self.check_repeated();
    }

    /// Checked variant of [`Board::make_move`] for untrusted input.
    pub fn try_make_move(&mut self, mv: Move) -> Result<(), GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }
        if !self.is_legal(mv) {
            return Err(GameError::IllegalMove(mv));
        }
        self.make_move(mv);
        Ok(())
    }

    /// Undo one move. Has no effect on a board with no recorded moves.
    pub fn undo(&mut self) {
        if self.move_count == 0 {
            return;
        }
        if let Some(snapshot) = self.history.pop() {
            self.grid = snapshot.grid;
            self.turn = snapshot.turn;
            self.move_count -= 1;
            self.repeated = false;
        }
    }

    /// Forget recorded positions. Position and winner are kept.
    pub fn clear_undo(&mut self) {
        self.history.clear();
    }

    /// Side to move followed by every square in canonical order.
    pub fn encoded(&self) -> String {
        std::iter::once(self.turn.letter())
            .chain(Square::all().map(|sq| self.get(sq).letter()))
            .collect()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.grid,
            turn: self.turn,
        }
    }

    fn declare(&mut self, side: Side, reason: WinReason) {
        if self.winner.is_none() {
            self.winner = Some(side);
            self.win_reason = Some(reason);
        }
    }

    fn moves_made_by(&self, side: Side) -> usize {
        if side == self.opening {
            (self.move_count + 1) / 2
        } else {
            self.move_count / 2
        }
    }

    /// Win conditions and captures after a piece has landed on `to`.
    fn resolve(&mut self, to: Square) {
        let piece = self.grid.get(to);
        let Some(mover) = piece.side() else {
            return;
        };

        if piece == Piece::King && to.is_edge() {
            self.declare(Side::Defending, WinReason::KingEscaped);
            return;
        }

        if !self.has_move(self.turn) {
            self.declare(mover, WinReason::NoMoves);
            return;
        }

        if let Some(limit) = self.move_limit {
            if self.moves_made_by(mover) > limit {
                self.declare(mover.opponent(), WinReason::MoveLimit);
                return;
            }
        }

        for sq in self.grid.captures_at(to) {
            if self.grid.get(sq) == Piece::King {
                self.declare(Side::Attacking, WinReason::KingCaptured);
            }
            self.grid.set(sq, Piece::Empty);
        }
    }

    fn check_repeated(&mut self) {
        if self.history.iter().any(|past| past.grid == self.grid) {
            self.repeated = true;
            self.declare(self.turn, WinReason::Repetition);
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..SIZE).rev() {
            write!(f, "{:2}", row + 1)?;
            for col in 0..SIZE {
                write!(f, " {}", self.get(Square::new(col, row)).letter())?;
            }
            writeln!(f)?;
        }
        write!(f, "  ")?;
        for col in 0..SIZE {
            write!(f, " {}", (b'a' + col as u8) as char)?;
        }
        writeln!(f)
    }
}
