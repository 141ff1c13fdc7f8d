// Rules engine consumed by the session controller
// Features:
// - 0x88 board representation with FEN input/output
// - Legal move generation (castling through check, en passant, promotions)
// - Standard Algebraic Notation for the move log
// - Terminal status: checkmate, stalemate, fifty-move rule, insufficient material,
//   threefold repetition

use crate::error::{FenError, IllegalMoveReason, SquareParseError};
use crate::zobrist::Zobrist;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// =====================
// 0x88 Board Utilities
// =====================
pub type Sq = usize; // 0..127, off-board squares fail the 0x88 test
const BOARD_SIZE: usize = 128;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    fn from_white(white: bool) -> Color {
        if white { Color::White } else { Color::Black }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => f.write_str("White"),
            Color::Black => f.write_str("Black"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    /// Promotion suffix as typed by a player (`q`, `r`, `b`, `n`).
    pub fn from_promotion_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'q' => Some(PieceKind::Queen),
            'r' => Some(PieceKind::Rook),
            'b' => Some(PieceKind::Bishop),
            'n' => Some(PieceKind::Knight),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Piece {
    Empty,
    WP,
    WN,
    WB,
    WR,
    WQ,
    WK,
    BP,
    BN,
    BB,
    BR,
    BQ,
    BK,
}

impl Piece {
    pub fn new(color: Color, kind: PieceKind) -> Piece {
        match (color, kind) {
            (Color::White, PieceKind::Pawn) => Piece::WP,
            (Color::White, PieceKind::Knight) => Piece::WN,
            (Color::White, PieceKind::Bishop) => Piece::WB,
            (Color::White, PieceKind::Rook) => Piece::WR,
            (Color::White, PieceKind::Queen) => Piece::WQ,
            (Color::White, PieceKind::King) => Piece::WK,
            (Color::Black, PieceKind::Pawn) => Piece::BP,
            (Color::Black, PieceKind::Knight) => Piece::BN,
            (Color::Black, PieceKind::Bishop) => Piece::BB,
            (Color::Black, PieceKind::Rook) => Piece::BR,
            (Color::Black, PieceKind::Queen) => Piece::BQ,
            (Color::Black, PieceKind::King) => Piece::BK,
        }
    }

    pub fn from_char(c: char) -> Piece {
        match c {
            'P' => Piece::WP,
            'N' => Piece::WN,
            'B' => Piece::WB,
            'R' => Piece::WR,
            'Q' => Piece::WQ,
            'K' => Piece::WK,
            'p' => Piece::BP,
            'n' => Piece::BN,
            'b' => Piece::BB,
            'r' => Piece::BR,
            'q' => Piece::BQ,
            'k' => Piece::BK,
            _ => Piece::Empty,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Piece::WP => 'P',
            Piece::WN => 'N',
            Piece::WB => 'B',
            Piece::WR => 'R',
            Piece::WQ => 'Q',
            Piece::WK => 'K',
            Piece::BP => 'p',
            Piece::BN => 'n',
            Piece::BB => 'b',
            Piece::BR => 'r',
            Piece::BQ => 'q',
            Piece::BK => 'k',
            Piece::Empty => '.',
        }
    }

    pub fn kind(self) -> Option<PieceKind> {
        match self {
            Piece::WP | Piece::BP => Some(PieceKind::Pawn),
            Piece::WN | Piece::BN => Some(PieceKind::Knight),
            Piece::WB | Piece::BB => Some(PieceKind::Bishop),
            Piece::WR | Piece::BR => Some(PieceKind::Rook),
            Piece::WQ | Piece::BQ => Some(PieceKind::Queen),
            Piece::WK | Piece::BK => Some(PieceKind::King),
            Piece::Empty => None,
        }
    }

    pub fn color(self) -> Option<Color> {
        if self.is_white() {
            Some(Color::White)
        } else if self.is_black() {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn is_white(self) -> bool {
        matches!(
            self,
            Piece::WP | Piece::WN | Piece::WB | Piece::WR | Piece::WQ | Piece::WK
        )
    }

    pub fn is_black(self) -> bool {
        matches!(
            self,
            Piece::BP | Piece::BN | Piece::BB | Piece::BR | Piece::BQ | Piece::BK
        )
    }

    pub fn is_empty(self) -> bool {
        self == Piece::Empty
    }
}

// 0x88 helpers
fn on_board(s: Sq) -> bool {
    (s & 0x88) == 0
}
fn sq(rank: i32, file: i32) -> Sq {
    ((rank << 4) | file) as usize
}
fn file_of(s: Sq) -> i32 {
    (s & 15) as i32
}
fn rank_of(s: Sq) -> i32 {
    (s >> 4) as i32
}

// Convert 0x88 square to human algebraic like e2
fn sq_to_alg(s: Sq) -> String {
    let r = rank_of(s);
    let f = file_of(s);
    if !(0..=7).contains(&r) || !(0..=7).contains(&f) {
        return String::from("??");
    }
    let file = (b'a' + f as u8) as char;
    let rank = (1 + r).to_string();
    format!("{}{}", file, rank)
}

fn alg_to_sq(s: &str) -> Option<Sq> {
    let s = s.trim();
    if s.len() != 2 {
        return None;
    }
    let bytes = s.as_bytes();
    let f = (bytes[0] as char).to_ascii_lowercase();
    let rch = bytes[1] as char;
    if !('a'..='h').contains(&f) || !('1'..='8').contains(&rch) {
        return None;
    }
    let file = (f as u8 - b'a') as i32;
    let rank = (rch as u8 - b'1') as i32;
    Some(sq(rank, file))
}

/// A square on the 8x8 board, named a1..h8.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(Sq);

impl Square {
    pub fn new(file: u8, rank: u8) -> Option<Square> {
        (file < 8 && rank < 8).then(|| Square(sq(rank as i32, file as i32)))
    }

    /// 0 = a-file
    pub fn file(self) -> u8 {
        file_of(self.0) as u8
    }

    /// 0 = first rank
    pub fn rank(self) -> u8 {
        rank_of(self.0) as u8
    }

    pub fn is_light(self) -> bool {
        (self.file() + self.rank()) % 2 == 1
    }

    pub fn index(self) -> Sq {
        self.0
    }
}

impl FromStr for Square {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        alg_to_sq(s)
            .map(Square)
            .ok_or_else(|| SquareParseError::Invalid(s.to_string()))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&sq_to_alg(self.0))
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

// =====================
// Board State
// =====================

/// Immutable-by-convention position snapshot. Moves produce a new `Board`
/// via [`Board::play`]; nothing in the session mutates one in place.
#[derive(Clone, Debug)]
pub struct Board {
    pub cells: [Piece; BOARD_SIZE],
    pub side_white: bool, // true if white to move
    pub castling: u8,     // bits: 1 white K, 2 white Q, 4 black k, 8 black q
    pub ep: Option<Sq>,   // en passant square
    pub halfmove_clock: u32,
    pub fullmove: u32,
    // position keys since the last pawn move or capture, current position last
    seen: Arc<[u64]>,
}

impl Board {
    fn empty() -> Board {
        Board {
            cells: [Piece::Empty; BOARD_SIZE],
            side_white: true,
            castling: 0,
            ep: None,
            halfmove_clock: 0,
            fullmove: 1,
            seen: Arc::from(Vec::new()),
        }
    }

    /// Standard initial position.
    pub fn start() -> Board {
        let mut b = Board::empty();
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (f, kind) in back.iter().enumerate() {
            let f = f as i32;
            b.cells[sq(0, f)] = Piece::new(Color::White, *kind);
            b.cells[sq(1, f)] = Piece::WP;
            b.cells[sq(6, f)] = Piece::BP;
            b.cells[sq(7, f)] = Piece::new(Color::Black, *kind);
        }
        b.castling = 1 | 2 | 4 | 8;
        b.seen = Arc::from(vec![b.key()]);
        b
    }

    pub fn from_fen(fen: &str) -> Result<Board, FenError> {
        let mut b = Board::empty();
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.is_empty() {
            return Err(FenError::Empty);
        }

        // board
        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::RankCount(ranks.len()));
        }
        for (r, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - r as i32;
            let mut file = 0i32;
            for ch in rank_str.chars() {
                if let Some(d) = ch.to_digit(10) {
                    if d == 0 || d > 8 {
                        return Err(FenError::RankWidth { rank: rank + 1, files: file + d as i32 });
                    }
                    file += d as i32;
                } else {
                    let p = Piece::from_char(ch);
                    if p.is_empty() {
                        return Err(FenError::PieceChar(ch));
                    }
                    if file >= 8 {
                        return Err(FenError::RankWidth { rank: rank + 1, files: file + 1 });
                    }
                    b.cells[sq(rank, file)] = p;
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::RankWidth { rank: rank + 1, files: file });
            }
        }

        // side
        b.side_white = match parts.get(1) {
            None | Some(&"w") => true,
            Some(&"b") => false,
            Some(other) => return Err(FenError::SideToMove(other.to_string())),
        };

        // castling
        if let Some(&c) = parts.get(2) {
            if c != "-" {
                for ch in c.chars() {
                    b.castling |= match ch {
                        'K' => 1,
                        'Q' => 2,
                        'k' => 4,
                        'q' => 8,
                        _ => return Err(FenError::Castling(c.to_string())),
                    };
                }
            }
        }
        b.drop_stale_castling_rights();

        // ep
        if let Some(&e) = parts.get(3) {
            if e != "-" {
                let ep = alg_to_sq(e).ok_or_else(|| FenError::EnPassant(e.to_string()))?;
                let expected_rank = if b.side_white { 5 } else { 2 };
                if rank_of(ep) != expected_rank {
                    return Err(FenError::EnPassant(e.to_string()));
                }
                b.ep = Some(ep);
            }
        }

        if let Some(&h) = parts.get(4) {
            b.halfmove_clock = h.parse().map_err(|_| FenError::Counter(h.to_string()))?;
        }
        if let Some(&n) = parts.get(5) {
            let n: u32 = n.parse().map_err(|_| FenError::Counter(n.to_string()))?;
            b.fullmove = n.max(1);
        }

        b.validate()?;
        b.seen = Arc::from(vec![b.key()]);
        Ok(b)
    }

    fn validate(&self) -> Result<(), FenError> {
        let mut white_kings = 0;
        let mut black_kings = 0;
        for s in (0..BOARD_SIZE).filter(|s| on_board(*s)) {
            match self.cells[s] {
                Piece::WK => white_kings += 1,
                Piece::BK => black_kings += 1,
                Piece::WP | Piece::BP if rank_of(s) == 0 || rank_of(s) == 7 => {
                    return Err(FenError::PawnOnBackRank);
                }
                _ => {}
            }
        }
        if white_kings != 1 || black_kings != 1 {
            return Err(FenError::Kings);
        }
        if is_king_attacked(self, !self.side_white) {
            return Err(FenError::OpponentInCheck);
        }
        Ok(())
    }

    // A right is only meaningful while king and rook are still at home.
    fn drop_stale_castling_rights(&mut self) {
        if self.cells[sq(0, 4)] != Piece::WK {
            self.castling &= !(1 | 2);
        }
        if self.cells[sq(0, 7)] != Piece::WR {
            self.castling &= !1;
        }
        if self.cells[sq(0, 0)] != Piece::WR {
            self.castling &= !2;
        }
        if self.cells[sq(7, 4)] != Piece::BK {
            self.castling &= !(4 | 8);
        }
        if self.cells[sq(7, 7)] != Piece::BR {
            self.castling &= !4;
        }
        if self.cells[sq(7, 0)] != Piece::BR {
            self.castling &= !8;
        }
    }

    pub fn to_fen(&self) -> String {
        let mut s = String::new();
        for r in (0..8).rev() {
            let mut empty = 0;
            for f in 0..8 {
                let p = self.cells[sq(r, f)];
                if p.is_empty() {
                    empty += 1;
                } else {
                    if empty > 0 {
                        s.push_str(&empty.to_string());
                        empty = 0;
                    }
                    s.push(p.to_char());
                }
            }
            if empty > 0 {
                s.push_str(&empty.to_string());
            }
            if r > 0 {
                s.push('/')
            }
        }
        s.push(' ');
        s.push(if self.side_white { 'w' } else { 'b' });
        s.push(' ');
        let mut cast = String::new();
        if self.castling & 1 != 0 {
            cast.push('K')
        }
        if self.castling & 2 != 0 {
            cast.push('Q')
        }
        if self.castling & 4 != 0 {
            cast.push('k')
        }
        if self.castling & 8 != 0 {
            cast.push('q')
        }
        if cast.is_empty() {
            cast.push('-')
        }
        s.push_str(&cast);
        s.push(' ');
        if let Some(e) = self.ep {
            s.push_str(&sq_to_alg(e));
        } else {
            s.push('-')
        }
        s.push(' ');
        s.push_str(&self.halfmove_clock.to_string());
        s.push(' ');
        s.push_str(&self.fullmove.to_string());
        s
    }

    pub fn piece_at(&self, square: Square) -> Piece {
        self.cells[square.index()]
    }

    fn at(&self, s: Sq) -> Piece {
        self.cells[s]
    }

    pub fn side_to_move(&self) -> Color {
        Color::from_white(self.side_white)
    }

    pub fn in_check(&self) -> bool {
        is_king_attacked(self, self.side_white)
    }

    /// Zobrist key of this position (placement, side, castling, en passant).
    pub fn key(&self) -> u64 {
        Zobrist::shared().hash_board(self)
    }

    /// How many times the current position has occurred since the last
    /// irreversible move, counting the current occurrence.
    pub fn repetitions(&self) -> usize {
        match self.seen.last() {
            Some(current) => self.seen.iter().filter(|k| *k == current).count(),
            None => 1,
        }
    }

    fn find_king(&self, white: bool) -> Option<Sq> {
        let king = if white { Piece::WK } else { Piece::BK };
        (0..BOARD_SIZE).find(|s| on_board(*s) && self.cells[*s] == king)
    }

    fn insufficient_material(&self) -> bool {
        let mut minors = 0;
        let mut knights = 0;
        let mut bishop_on = [false; 2]; // [dark, light]
        for s in (0..BOARD_SIZE).filter(|s| on_board(*s)) {
            match self.cells[s].kind() {
                None | Some(PieceKind::King) => {}
                Some(PieceKind::Knight) => {
                    minors += 1;
                    knights += 1;
                }
                Some(PieceKind::Bishop) => {
                    minors += 1;
                    bishop_on[Square(s).is_light() as usize] = true;
                }
                Some(_) => return false,
            }
        }
        minors <= 1 || (knights == 0 && !(bishop_on[0] && bishop_on[1]))
    }

    // Make a move (no validation here)
    fn make_move(&mut self, from: Sq, to: Sq, promotion: Option<Piece>) {
        let moved_piece = self.cells[from];
        let mut captured = self.cells[to];

        // handle special: en passant capture
        if let Some(ep_sq) = self.ep {
            if moved_piece == Piece::WP && to == ep_sq && rank_of(from) == 4 {
                let cap_sq = to - 16;
                captured = self.cells[cap_sq];
                self.cells[cap_sq] = Piece::Empty;
            } else if moved_piece == Piece::BP && to == ep_sq && rank_of(from) == 3 {
                let cap_sq = to + 16;
                captured = self.cells[cap_sq];
                self.cells[cap_sq] = Piece::Empty;
            }
        }

        // move piece, promoting if asked
        self.cells[from] = Piece::Empty;
        self.cells[to] = promotion.unwrap_or(moved_piece);

        // castling rights: king moved, or a rook left / was taken on its corner
        if moved_piece == Piece::WK {
            self.castling &= !(1 | 2);
        }
        if moved_piece == Piece::BK {
            self.castling &= !(4 | 8);
        }
        if from == sq(0, 0) || to == sq(0, 0) {
            self.castling &= !2;
        }
        if from == sq(0, 7) || to == sq(0, 7) {
            self.castling &= !1;
        }
        if from == sq(7, 0) || to == sq(7, 0) {
            self.castling &= !8;
        }
        if from == sq(7, 7) || to == sq(7, 7) {
            self.castling &= !4;
        }

        // castling move proper: move the rook
        if moved_piece == Piece::WK && from == sq(0, 4) && to == sq(0, 6) {
            self.cells[sq(0, 7)] = Piece::Empty;
            self.cells[sq(0, 5)] = Piece::WR;
        } else if moved_piece == Piece::WK && from == sq(0, 4) && to == sq(0, 2) {
            self.cells[sq(0, 0)] = Piece::Empty;
            self.cells[sq(0, 3)] = Piece::WR;
        }
        if moved_piece == Piece::BK && from == sq(7, 4) && to == sq(7, 6) {
            self.cells[sq(7, 7)] = Piece::Empty;
            self.cells[sq(7, 5)] = Piece::BR;
        } else if moved_piece == Piece::BK && from == sq(7, 4) && to == sq(7, 2) {
            self.cells[sq(7, 0)] = Piece::Empty;
            self.cells[sq(7, 3)] = Piece::BR;
        }

        // update en passant target
        self.ep = None;
        if moved_piece == Piece::WP && rank_of(to) - rank_of(from) == 2 {
            self.ep = Some(from + 16);
        }
        if moved_piece == Piece::BP && rank_of(from) - rank_of(to) == 2 {
            self.ep = Some(from - 16);
        }

        // halfmove clock
        if moved_piece == Piece::WP || moved_piece == Piece::BP || !captured.is_empty() {
            self.halfmove_clock = 0
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1)
        }

        if !self.side_white {
            self.fullmove = self.fullmove.saturating_add(1)
        }

        // flip side
        self.side_white = !self.side_white;
    }

    // Cheap successor used by legality checks; repetition keys untouched.
    fn make_move_clone(&self, mv: Move) -> Board {
        let mut b = self.clone();
        b.make_move(mv.from, mv.to, mv.promotion);
        b
    }

    /// Successor position after `mv`, with repetition bookkeeping.
    fn play(&self, mv: Move) -> Board {
        let mut b = self.make_move_clone(mv);
        let mut seen = if b.halfmove_clock == 0 {
            Vec::new()
        } else {
            self.seen.to_vec()
        };
        seen.push(b.key());
        b.seen = Arc::from(seen);
        b
    }
}

// =====================
// Move Representation
// =====================
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    pub from: Sq,
    pub to: Sq,
    pub promotion: Option<Piece>,
}

impl Move {
    fn quiet(from: Sq, to: Sq) -> Move {
        Move {
            from,
            to,
            promotion: None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = self.promotion {
            write!(
                f,
                "{}{}{}",
                sq_to_alg(self.from),
                sq_to_alg(self.to),
                p.to_char().to_ascii_lowercase()
            )
        } else {
            write!(f, "{}{}", sq_to_alg(self.from), sq_to_alg(self.to))
        }
    }
}

bitflags! {
    /// Special-move markers attached to every legal move.
    pub struct MoveFlags: u8 {
        const QUIET = 0;
        const CAPTURE = 1 << 0;
        const PROMOTION = 1 << 1;
        const CASTLE = 1 << 2;
        const EN_PASSANT = 1 << 3;
        const DOUBLE_PUSH = 1 << 4;
    }
}

/// A legal move as reported to callers of [`RulesEngine::legal_moves`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LegalMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub flags: MoveFlags,
}

impl fmt::Display for LegalMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter().to_ascii_lowercase())?;
        }
        Ok(())
    }
}

fn describe(board: &Board, mv: Move) -> LegalMove {
    let piece = board.at(mv.from);
    let mut flags = MoveFlags::QUIET;
    let is_pawn = piece.kind() == Some(PieceKind::Pawn);
    if !board.at(mv.to).is_empty() {
        flags |= MoveFlags::CAPTURE;
    }
    if is_pawn && file_of(mv.from) != file_of(mv.to) && board.at(mv.to).is_empty() {
        flags |= MoveFlags::CAPTURE | MoveFlags::EN_PASSANT;
    }
    if is_pawn && (rank_of(mv.to) - rank_of(mv.from)).abs() == 2 {
        flags |= MoveFlags::DOUBLE_PUSH;
    }
    if piece.kind() == Some(PieceKind::King) && (file_of(mv.to) - file_of(mv.from)).abs() == 2 {
        flags |= MoveFlags::CASTLE;
    }
    if mv.promotion.is_some() {
        flags |= MoveFlags::PROMOTION;
    }
    LegalMove {
        from: Square(mv.from),
        to: Square(mv.to),
        promotion: mv.promotion.and_then(Piece::kind),
        flags,
    }
}

// =====================
// Move Generation
// =====================
// knight jumps and king deltas
const KNIGHT_DELTAS: [i32; 8] = [33, 31, 18, 14, -33, -31, -18, -14];
const KING_DELTAS: [i32; 8] = [16, 1, -16, -1, 17, 15, -15, -17];
const ROOK_DELTAS: [i32; 4] = [16, 1, -16, -1];
const BISHOP_DELTAS: [i32; 4] = [17, 15, -17, -15];

fn offset(s: Sq, d: i32) -> Option<Sq> {
    let t = s as i32 + d;
    (t >= 0 && on_board(t as usize)).then_some(t as usize)
}

/// All legal moves for the side to move.
pub fn gen_moves(board: &Board, moves: &mut Vec<Move>) {
    moves.clear();
    let white = board.side_white;
    for s in (0..BOARD_SIZE).filter(|s| on_board(*s)) {
        let p = board.at(s);
        if p.is_empty() || p.is_white() != white {
            continue;
        }
        match p {
            Piece::WP => gen_pawn_moves(board, s, true, moves),
            Piece::BP => gen_pawn_moves(board, s, false, moves),
            Piece::WN | Piece::BN => gen_leaper_moves(board, s, &KNIGHT_DELTAS, moves),
            Piece::WB | Piece::BB => gen_slider_moves(board, s, &BISHOP_DELTAS, moves),
            Piece::WR | Piece::BR => gen_slider_moves(board, s, &ROOK_DELTAS, moves),
            Piece::WQ | Piece::BQ => {
                gen_slider_moves(board, s, &ROOK_DELTAS, moves);
                gen_slider_moves(board, s, &BISHOP_DELTAS, moves);
            }
            Piece::WK | Piece::BK => gen_leaper_moves(board, s, &KING_DELTAS, moves),
            Piece::Empty => {}
        }
    }
    gen_castling(board, moves);
    // filter illegal by checking the mover's king after the move
    moves.retain(|m| !is_king_attacked(&board.make_move_clone(*m), white));
}

fn is_enemy(board: &Board, p: Piece) -> bool {
    if board.side_white { p.is_black() } else { p.is_white() }
}

fn gen_leaper_moves(board: &Board, s: Sq, deltas: &[i32], moves: &mut Vec<Move>) {
    for &d in deltas.iter() {
        if let Some(ns) = offset(s, d) {
            let p = board.at(ns);
            if p.is_empty() || is_enemy(board, p) {
                moves.push(Move::quiet(s, ns));
            }
        }
    }
}

fn gen_slider_moves(board: &Board, s: Sq, deltas: &[i32], moves: &mut Vec<Move>) {
    for &d in deltas.iter() {
        let mut cur = offset(s, d);
        while let Some(ns) = cur {
            let p = board.at(ns);
            if p.is_empty() {
                moves.push(Move::quiet(s, ns));
            } else {
                if is_enemy(board, p) {
                    moves.push(Move::quiet(s, ns));
                }
                break;
            }
            cur = offset(ns, d);
        }
    }
}

fn push_pawn_move(from: Sq, to: Sq, white: bool, moves: &mut Vec<Move>) {
    let last_rank = if white { 7 } else { 0 };
    if rank_of(to) != last_rank {
        moves.push(Move::quiet(from, to));
        return;
    }
    let color = Color::from_white(white);
    for kind in [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ] {
        moves.push(Move {
            from,
            to,
            promotion: Some(Piece::new(color, kind)),
        });
    }
}

fn gen_pawn_moves(board: &Board, s: Sq, white: bool, moves: &mut Vec<Move>) {
    let dir = if white { 16 } else { -16 };
    let start_rank = if white { 1 } else { 6 };
    let ep_rank = if white { 5 } else { 2 };

    // pushes
    if let Some(one) = offset(s, dir) {
        if board.at(one).is_empty() {
            push_pawn_move(s, one, white, moves);
            if rank_of(s) == start_rank {
                if let Some(two) = offset(one, dir) {
                    if board.at(two).is_empty() {
                        moves.push(Move::quiet(s, two));
                    }
                }
            }
        }
    }

    // captures, en passant included
    for cap_dir in [dir + 1, dir - 1] {
        let Some(t) = offset(s, cap_dir) else {
            continue;
        };
        let target = board.at(t);
        if !target.is_empty() && is_enemy(board, target) {
            push_pawn_move(s, t, white, moves);
        } else if target.is_empty() && board.ep == Some(t) && rank_of(t) == ep_rank {
            moves.push(Move::quiet(s, t));
        }
    }
}

fn gen_castling(board: &Board, moves: &mut Vec<Move>) {
    let white = board.side_white;
    let (rank, king, rook, king_bit, queen_bit) = if white {
        (0, Piece::WK, Piece::WR, 1, 2)
    } else {
        (7, Piece::BK, Piece::BR, 4, 8)
    };
    let home = sq(rank, 4);
    if board.at(home) != king || is_square_attacked(board, home, !white) {
        return;
    }
    // landing square safety is left to the legality filter
    if board.castling & king_bit != 0
        && board.at(sq(rank, 7)) == rook
        && board.at(sq(rank, 5)).is_empty()
        && board.at(sq(rank, 6)).is_empty()
        && !is_square_attacked(board, sq(rank, 5), !white)
    {
        moves.push(Move::quiet(home, sq(rank, 6)));
    }
    if board.castling & queen_bit != 0
        && board.at(sq(rank, 0)) == rook
        && board.at(sq(rank, 3)).is_empty()
        && board.at(sq(rank, 2)).is_empty()
        && board.at(sq(rank, 1)).is_empty()
        && !is_square_attacked(board, sq(rank, 3), !white)
    {
        moves.push(Move::quiet(home, sq(rank, 2)));
    }
}

// =====================
// Attack Detection
// =====================
fn is_square_attacked(board: &Board, s: Sq, by_white: bool) -> bool {
    // pawns
    let (pawn, pawn_deltas) = if by_white {
        (Piece::WP, [-17, -15])
    } else {
        (Piece::BP, [17, 15])
    };
    if pawn_deltas
        .iter()
        .any(|&d| offset(s, d).is_some_and(|a| board.at(a) == pawn))
    {
        return true;
    }
    // knights
    let knight = if by_white { Piece::WN } else { Piece::BN };
    if KNIGHT_DELTAS
        .iter()
        .any(|&d| offset(s, d).is_some_and(|a| board.at(a) == knight))
    {
        return true;
    }
    // sliders
    let (rook, bishop, queen) = if by_white {
        (Piece::WR, Piece::WB, Piece::WQ)
    } else {
        (Piece::BR, Piece::BB, Piece::BQ)
    };
    let first_hit = |d: i32| -> Piece {
        let mut cur = offset(s, d);
        while let Some(a) = cur {
            let p = board.at(a);
            if !p.is_empty() {
                return p;
            }
            cur = offset(a, d);
        }
        Piece::Empty
    };
    if ROOK_DELTAS.iter().any(|&d| {
        let p = first_hit(d);
        p == rook || p == queen
    }) {
        return true;
    }
    if BISHOP_DELTAS.iter().any(|&d| {
        let p = first_hit(d);
        p == bishop || p == queen
    }) {
        return true;
    }
    // king
    let king = if by_white { Piece::WK } else { Piece::BK };
    KING_DELTAS
        .iter()
        .any(|&d| offset(s, d).is_some_and(|a| board.at(a) == king))
}

pub fn is_king_attacked(board: &Board, white_king: bool) -> bool {
    if let Some(kpos) = board.find_king(white_king) {
        is_square_attacked(board, kpos, !white_king)
    } else {
        true
    }
}

// =====================
// Notation
// =====================
fn file_char(s: Sq) -> char {
    (b'a' + file_of(s) as u8) as char
}

fn rank_char(s: Sq) -> char {
    (b'1' + rank_of(s) as u8) as char
}

/// Standard Algebraic Notation for `mv`, which must be in `legal`.
fn san(board: &Board, mv: Move, legal: &[Move]) -> String {
    let piece = board.at(mv.from);
    let kind = piece.kind().unwrap_or(PieceKind::Pawn);
    let mut out = String::new();

    if kind == PieceKind::King && (file_of(mv.to) - file_of(mv.from)).abs() == 2 {
        out.push_str(if file_of(mv.to) == 6 { "O-O" } else { "O-O-O" });
    } else {
        let capture = !board.at(mv.to).is_empty()
            || (kind == PieceKind::Pawn && file_of(mv.from) != file_of(mv.to));
        if kind == PieceKind::Pawn {
            if capture {
                out.push(file_char(mv.from));
            }
        } else {
            out.push(kind.letter());
            let rivals: Vec<&Move> = legal
                .iter()
                .filter(|m| m.to == mv.to && m.from != mv.from && board.at(m.from) == piece)
                .collect();
            if !rivals.is_empty() {
                let same_file = rivals.iter().any(|m| file_of(m.from) == file_of(mv.from));
                let same_rank = rivals.iter().any(|m| rank_of(m.from) == rank_of(mv.from));
                if !same_file {
                    out.push(file_char(mv.from));
                } else if !same_rank {
                    out.push(rank_char(mv.from));
                } else {
                    out.push(file_char(mv.from));
                    out.push(rank_char(mv.from));
                }
            }
        }
        if capture {
            out.push('x');
        }
        out.push_str(&sq_to_alg(mv.to));
        if let Some(kind) = mv.promotion.and_then(Piece::kind) {
            out.push('=');
            out.push(kind.letter());
        }
    }

    let after = board.make_move_clone(mv);
    if after.in_check() {
        let mut replies = Vec::new();
        gen_moves(&after, &mut replies);
        out.push(if replies.is_empty() { '#' } else { '+' });
    }
    out
}

fn strip_annotations(san: &str) -> &str {
    san.trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'))
}

// =====================
// Rules Engine Contract
// =====================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawReason {
    FiftyMoveRule,
    InsufficientMaterial,
    ThreefoldRepetition,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalStatus {
    NotTerminal,
    Checkmate,
    Stalemate,
    Draw(DrawReason),
    /// Game over through a condition the engine does not classify.
    Other,
}

impl TerminalStatus {
    pub fn is_terminal(self) -> bool {
        self != TerminalStatus::NotTerminal
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalStatus::NotTerminal => f.write_str("in progress"),
            TerminalStatus::Checkmate => f.write_str("checkmate"),
            TerminalStatus::Stalemate => f.write_str("stalemate"),
            TerminalStatus::Draw(DrawReason::FiftyMoveRule) => f.write_str("fifty-move rule"),
            TerminalStatus::Draw(DrawReason::InsufficientMaterial) => {
                f.write_str("insufficient material")
            }
            TerminalStatus::Draw(DrawReason::ThreefoldRepetition) => {
                f.write_str("threefold repetition")
            }
            TerminalStatus::Other => f.write_str("game over"),
        }
    }
}

/// Result of a successful [`RulesEngine::apply_move`].
#[derive(Clone, Debug)]
pub struct AppliedMove<P> {
    pub position: P,
    pub notation: String,
    pub moved_color: Color,
    pub mv: LegalMove,
}

/// The narrow interface the session controller uses to talk to chess rules.
///
/// Positions are opaque values: `apply_move` never touches its input and
/// hands back a fresh successor instead.
pub trait RulesEngine {
    type Position: Clone + fmt::Debug;

    fn initial_position(&self) -> Self::Position;

    /// Legal moves for the side to move, optionally restricted to one origin.
    fn legal_moves(&self, position: &Self::Position, from: Option<Square>) -> Vec<LegalMove>;

    /// Validate and apply `from -> to`. `promotion` only matters for pawn
    /// promotions; `None` promotes to a queen.
    fn apply_move(
        &self,
        position: &Self::Position,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<AppliedMove<Self::Position>, IllegalMoveReason>;

    fn terminal_status(&self, position: &Self::Position) -> TerminalStatus;

    fn side_to_move(&self, position: &Self::Position) -> Color;

    /// Full-move number shown in front of White's move in the log.
    fn fullmove_number(&self, _position: &Self::Position) -> u32 {
        1
    }
}

/// Standard chess over the 0x88 [`Board`].
#[derive(Clone, Debug)]
pub struct StandardRules {
    start: Board,
}

impl Default for StandardRules {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardRules {
    pub fn new() -> Self {
        Self {
            start: Board::start(),
        }
    }

    /// Rules whose initial position (and reset target) is `fen`.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Ok(Self {
            start: Board::from_fen(fen)?,
        })
    }

    /// Find the legal move written as `san` (check/mate suffixes optional).
    pub fn find_san(&self, board: &Board, san_text: &str) -> Option<LegalMove> {
        let wanted = strip_annotations(san_text.trim());
        let mut moves = Vec::new();
        gen_moves(board, &mut moves);
        moves
            .iter()
            .find(|m| strip_annotations(&san(board, **m, &moves)) == wanted)
            .map(|m| describe(board, *m))
    }
}

impl RulesEngine for StandardRules {
    type Position = Board;

    fn initial_position(&self) -> Board {
        self.start.clone()
    }

    fn legal_moves(&self, board: &Board, from: Option<Square>) -> Vec<LegalMove> {
        let mut moves = Vec::new();
        gen_moves(board, &mut moves);
        moves
            .into_iter()
            .filter(|m| from.is_none_or(|f| f.index() == m.from))
            .map(|m| describe(board, m))
            .collect()
    }

    fn apply_move(
        &self,
        board: &Board,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<AppliedMove<Board>, IllegalMoveReason> {
        if self.terminal_status(board).is_terminal() {
            return Err(IllegalMoveReason::GameAlreadyOver);
        }
        let mover = board.side_to_move();
        if board.piece_at(from).color() == Some(mover.opponent()) {
            return Err(IllegalMoveReason::WrongTurn);
        }

        let mut legal = Vec::new();
        gen_moves(board, &mut legal);
        let wanted = promotion.unwrap_or(PieceKind::Queen);
        let mv = legal
            .iter()
            .copied()
            .find(|m| {
                m.from == from.index()
                    && m.to == to.index()
                    && m.promotion.is_none_or(|p| p.kind() == Some(wanted))
            })
            .ok_or(IllegalMoveReason::NoSuchMove)?;

        Ok(AppliedMove {
            notation: san(board, mv, &legal),
            mv: describe(board, mv),
            position: board.play(mv),
            moved_color: mover,
        })
    }

    fn terminal_status(&self, board: &Board) -> TerminalStatus {
        let mut moves = Vec::new();
        gen_moves(board, &mut moves);
        if moves.is_empty() {
            return if board.in_check() {
                TerminalStatus::Checkmate
            } else {
                TerminalStatus::Stalemate
            };
        }
        if board.halfmove_clock >= 100 {
            TerminalStatus::Draw(DrawReason::FiftyMoveRule)
        } else if board.insufficient_material() {
            TerminalStatus::Draw(DrawReason::InsufficientMaterial)
        } else if board.repetitions() >= 3 {
            TerminalStatus::Draw(DrawReason::ThreefoldRepetition)
        } else {
            TerminalStatus::NotTerminal
        }
    }

    fn side_to_move(&self, board: &Board) -> Color {
        board.side_to_move()
    }

    fn fullmove_number(&self, board: &Board) -> u32 {
        board.fullmove
    }
}

// =====================
// Tests
// =====================

#[cfg(test)]
mod tests {
    use super::*;

    fn s(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn play_all(rules: &StandardRules, moves: &[(&str, &str)]) -> (Board, Vec<String>) {
        let mut board = rules.initial_position();
        let mut notation = Vec::new();
        for (from, to) in moves {
            let applied = rules.apply_move(&board, s(from), s(to), None).unwrap();
            notation.push(applied.notation);
            board = applied.position;
        }
        (board, notation)
    }

    #[test]
    fn test_start_position() {
        let rules = StandardRules::new();
        let board = rules.initial_position();
        assert_eq!(board.to_fen(), START_FEN);
        assert_eq!(rules.legal_moves(&board, None).len(), 20);
        assert_eq!(rules.side_to_move(&board), Color::White);
        assert_eq!(rules.terminal_status(&board), TerminalStatus::NotTerminal);
    }

    #[test]
    fn test_fen_round_trip() {
        let fen = "r3k2r/pp1n1ppp/2p5/3pP3/8/2N2N2/PPP2PPP/R3K2R b KQkq - 3 11";
        assert_eq!(Board::from_fen(fen).unwrap().to_fen(), fen);
    }

    #[test]
    fn test_invalid_fen() {
        assert!(matches!(Board::from_fen(""), Err(FenError::Empty)));
        assert!(matches!(
            Board::from_fen("8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::RankCount(7))
        ));
        assert!(matches!(
            Board::from_fen("4k3/8/8/8/8/8/8/4K2X w - - 0 1"),
            Err(FenError::PieceChar('X'))
        ));
        assert!(matches!(
            Board::from_fen("4k3/8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::Kings)
        ));
        assert!(matches!(
            Board::from_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1"),
            Err(FenError::SideToMove(_))
        ));
        // white to move while black is already in check
        assert!(matches!(
            Board::from_fen("4k3/4R3/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::OpponentInCheck)
        ));
        assert!(matches!(
            Board::from_fen("4k3/8/8/8/8/8/8/P3K3 w - - 0 1"),
            Err(FenError::PawnOnBackRank)
        ));
    }

    #[test]
    fn test_square_parsing() {
        assert_eq!(s("a1"), Square::new(0, 0).unwrap());
        assert_eq!(s("h8").to_string(), "h8");
        assert_eq!(s("E4"), s("e4"));
        assert!("e9".parse::<Square>().is_err());
        assert!("z1".parse::<Square>().is_err());
        assert!("e2e4".parse::<Square>().is_err());
        assert!(!s("a1").is_light());
        assert!(s("h1").is_light());
    }

    #[test]
    fn test_apply_leaves_input_untouched() {
        let rules = StandardRules::new();
        let board = rules.initial_position();
        let before = board.to_fen();
        let applied = rules.apply_move(&board, s("e2"), s("e4"), None).unwrap();
        assert_eq!(board.to_fen(), before);
        assert_eq!(applied.notation, "e4");
        assert_eq!(applied.moved_color, Color::White);
        assert!(applied.mv.flags.contains(MoveFlags::DOUBLE_PUSH));
        assert_eq!(
            applied.position.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }

    #[test]
    fn test_fullmove_counter_saturates() {
        let rules = StandardRules::new();
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 4294967295").unwrap();
        let applied = rules.apply_move(&board, s("e8"), s("d8"), None).unwrap();
        assert_eq!(rules.fullmove_number(&applied.position), u32::MAX);
    }

    #[test]
    fn test_illegal_move_reasons() {
        let rules = StandardRules::new();
        let board = rules.initial_position();
        assert_eq!(
            rules.apply_move(&board, s("e7"), s("e5"), None).unwrap_err(),
            IllegalMoveReason::WrongTurn
        );
        assert_eq!(
            rules.apply_move(&board, s("e2"), s("e5"), None).unwrap_err(),
            IllegalMoveReason::NoSuchMove
        );
        assert_eq!(
            rules.apply_move(&board, s("e4"), s("e5"), None).unwrap_err(),
            IllegalMoveReason::NoSuchMove
        );

        let (mated, _) = play_all(&rules, &[("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")]);
        assert_eq!(
            rules.apply_move(&mated, s("a2"), s("a3"), None).unwrap_err(),
            IllegalMoveReason::GameAlreadyOver
        );
    }

    #[test]
    fn test_fools_mate() {
        let rules = StandardRules::new();
        let (board, notation) =
            play_all(&rules, &[("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")]);
        assert_eq!(notation, vec!["f3", "e5", "g4", "Qh4#"]);
        assert_eq!(rules.terminal_status(&board), TerminalStatus::Checkmate);
        assert_eq!(rules.side_to_move(&board), Color::White);
        assert!(rules.legal_moves(&board, None).is_empty());
    }

    #[test]
    fn test_stalemate() {
        let rules = StandardRules::from_fen("7k/8/6K1/8/8/8/5Q2/8 w - - 0 1").unwrap();
        let board = rules.initial_position();
        let applied = rules.apply_move(&board, s("f2"), s("f7"), None).unwrap();
        assert_eq!(applied.notation, "Qf7");
        assert_eq!(rules.terminal_status(&applied.position), TerminalStatus::Stalemate);
    }

    #[test]
    fn test_insufficient_material() {
        let rules = StandardRules::from_fen("8/8/8/4k3/8/8/3rK3/8 w - - 0 1").unwrap();
        let board = rules.initial_position();
        assert_eq!(rules.terminal_status(&board), TerminalStatus::NotTerminal);
        let applied = rules.apply_move(&board, s("e2"), s("d2"), None).unwrap();
        assert_eq!(applied.notation, "Kxd2");
        assert_eq!(
            rules.terminal_status(&applied.position),
            TerminalStatus::Draw(DrawReason::InsufficientMaterial)
        );

        // same-coloured bishops cannot mate either
        let bishops = Board::from_fen("4k3/8/8/4b3/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert!(bishops.insufficient_material());
        let opposite = Board::from_fen("4k3/8/8/3b4/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert!(!opposite.insufficient_material());
    }

    #[test]
    fn test_fifty_move_rule() {
        let rules = StandardRules::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 80").unwrap();
        let board = rules.initial_position();
        let applied = rules.apply_move(&board, s("a1"), s("a2"), None).unwrap();
        assert_eq!(applied.position.halfmove_clock, 100);
        assert_eq!(
            rules.terminal_status(&applied.position),
            TerminalStatus::Draw(DrawReason::FiftyMoveRule)
        );
    }

    #[test]
    fn test_threefold_repetition() {
        let rules = StandardRules::new();
        let shuffle = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];
        let (twice, _) = play_all(&rules, &shuffle);
        assert_eq!(twice.repetitions(), 2);
        assert_eq!(rules.terminal_status(&twice), TerminalStatus::NotTerminal);

        let both: Vec<_> = shuffle.iter().chain(shuffle.iter()).copied().collect();
        let (thrice, _) = play_all(&rules, &both);
        assert_eq!(thrice.repetitions(), 3);
        assert_eq!(
            rules.terminal_status(&thrice),
            TerminalStatus::Draw(DrawReason::ThreefoldRepetition)
        );
    }

    #[test]
    fn test_castling() {
        let rules = StandardRules::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let board = rules.initial_position();
        let king_moves = rules.legal_moves(&board, Some(s("e1")));
        let castle = king_moves.iter().find(|m| m.to == s("g1")).unwrap();
        assert!(castle.flags.contains(MoveFlags::CASTLE));

        let applied = rules.apply_move(&board, s("e1"), s("g1"), None).unwrap();
        assert_eq!(applied.notation, "O-O");
        assert_eq!(applied.position.piece_at(s("f1")), Piece::WR);
        assert_eq!(applied.position.piece_at(s("h1")), Piece::Empty);
        assert_eq!(applied.position.castling, 0);
    }

    #[test]
    fn test_no_castling_through_check() {
        let rules = StandardRules::from_fen("4k3/8/8/8/8/8/5r2/4K2R w K - 0 1").unwrap();
        let board = rules.initial_position();
        let king_moves = rules.legal_moves(&board, Some(s("e1")));
        assert!(king_moves.iter().all(|m| m.to != s("g1")));
    }

    #[test]
    fn test_en_passant() {
        let rules = StandardRules::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        let board = rules.initial_position();
        let ep = rules
            .legal_moves(&board, Some(s("e5")))
            .into_iter()
            .find(|m| m.to == s("d6"))
            .unwrap();
        assert!(ep.flags.contains(MoveFlags::EN_PASSANT | MoveFlags::CAPTURE));

        let applied = rules.apply_move(&board, s("e5"), s("d6"), None).unwrap();
        assert_eq!(applied.notation, "exd6");
        assert_eq!(applied.position.piece_at(s("d5")), Piece::Empty);
        assert_eq!(applied.position.piece_at(s("d6")), Piece::WP);
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let rules = StandardRules::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        let board = rules.initial_position();
        assert_eq!(rules.legal_moves(&board, Some(s("e7"))).len(), 4);

        let queen = rules.apply_move(&board, s("e7"), s("e8"), None).unwrap();
        assert_eq!(queen.notation, "e8=Q");
        assert_eq!(queen.position.piece_at(s("e8")), Piece::WQ);

        let knight = rules
            .apply_move(&board, s("e7"), s("e8"), Some(PieceKind::Knight))
            .unwrap();
        assert_eq!(knight.notation, "e8=N");
        assert_eq!(
            rules
                .apply_move(&board, s("e7"), s("e8"), Some(PieceKind::King))
                .unwrap_err(),
            IllegalMoveReason::NoSuchMove
        );
    }

    #[test]
    fn test_san_disambiguation() {
        let rules = StandardRules::from_fen("4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1").unwrap();
        let board = rules.initial_position();
        let applied = rules.apply_move(&board, s("b1"), s("d2"), None).unwrap();
        assert_eq!(applied.notation, "Nbd2");

        let rules = StandardRules::from_fen("4k3/8/8/R7/8/8/8/R3K3 w - - 0 1").unwrap();
        let board = rules.initial_position();
        let applied = rules.apply_move(&board, s("a1"), s("a3"), None).unwrap();
        assert_eq!(applied.notation, "R1a3");
    }

    #[test]
    fn test_find_san() {
        let rules = StandardRules::new();
        let board = rules.initial_position();
        let mv = rules.find_san(&board, "Nf3").unwrap();
        assert_eq!((mv.from, mv.to), (s("g1"), s("f3")));
        assert!(rules.find_san(&board, "Qh5").is_none());
    }
}
