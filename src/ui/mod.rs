// Terminal front-end for a chess session
// Features: Colored board, legal-destination highlighting, pre-move markers,
// status line, move history, command parsing

pub mod integration;
use crate::engine::{Board, Color, Piece, PieceKind, Square};
use crate::history::MoveHistory;
use crate::session::{Mode, SessionView};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::{self, Write};

pub use integration::TerminalApp;

// ============================================================================
// COLOR CODES & STYLING
// ============================================================================

pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const BRIGHT_BLACK: &str = "\x1b[90m";
    pub const BRIGHT_RED: &str = "\x1b[91m";
    pub const BRIGHT_GREEN: &str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const BRIGHT_BLUE: &str = "\x1b[94m";
    pub const BRIGHT_MAGENTA: &str = "\x1b[95m";
    pub const BRIGHT_CYAN: &str = "\x1b[96m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";

    pub const BG_LIGHT: &str = "\x1b[48;5;252m"; // Light square
    pub const BG_DARK: &str = "\x1b[48;5;240m"; // Dark square
    pub const BG_HIGHLIGHT: &str = "\x1b[48;5;226m"; // Legal destination
    pub const BG_PRE_MOVE: &str = "\x1b[48;5;117m"; // Queued pre-move
    pub const BG_CHECK: &str = "\x1b[48;5;196m"; // King in check
}

// ============================================================================
// UNICODE CHESS PIECES
// ============================================================================

pub mod symbols {
    use crate::engine::Piece;

    pub const WHITE_KING: &str = "♔";
    pub const WHITE_QUEEN: &str = "♕";
    pub const WHITE_ROOK: &str = "♖";
    pub const WHITE_BISHOP: &str = "♗";
    pub const WHITE_KNIGHT: &str = "♘";
    pub const WHITE_PAWN: &str = "♙";

    pub const BLACK_KING: &str = "♚";
    pub const BLACK_QUEEN: &str = "♛";
    pub const BLACK_ROOK: &str = "♜";
    pub const BLACK_BISHOP: &str = "♝";
    pub const BLACK_KNIGHT: &str = "♞";
    pub const BLACK_PAWN: &str = "♟";

    /// Marks an empty highlighted square.
    pub const TARGET: &str = "·";

    pub fn piece_symbol(piece: Piece) -> &'static str {
        match piece {
            Piece::WK => WHITE_KING,
            Piece::WQ => WHITE_QUEEN,
            Piece::WR => WHITE_ROOK,
            Piece::WB => WHITE_BISHOP,
            Piece::WN => WHITE_KNIGHT,
            Piece::WP => WHITE_PAWN,
            Piece::BK => BLACK_KING,
            Piece::BQ => BLACK_QUEEN,
            Piece::BR => BLACK_ROOK,
            Piece::BB => BLACK_BISHOP,
            Piece::BN => BLACK_KNIGHT,
            Piece::BP => BLACK_PAWN,
            Piece::Empty => " ",
        }
    }
}

// ============================================================================
// BOARD DISPLAY
// ============================================================================

/// Square styling hints for one frame.
#[derive(Debug, Default, Clone)]
pub struct Marks {
    pub highlighted: BTreeSet<Square>,
    pub pre_move: Option<(Square, Square)>,
    pub check: Option<Square>,
}

pub struct BoardDisplay {
    pub show_coords: bool,
    pub use_unicode: bool,
    pub use_color: bool,
    pub flip_board: bool,
}

impl Default for BoardDisplay {
    fn default() -> Self {
        Self {
            show_coords: true,
            use_unicode: true,
            use_color: true,
            flip_board: false,
        }
    }
}

impl BoardDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain ASCII rendering without escape codes.
    pub fn plain() -> Self {
        Self {
            use_unicode: false,
            use_color: false,
            ..Self::default()
        }
    }

    pub fn draw_board(&self, board: &Board, marks: &Marks) -> String {
        let mut out = String::new();
        let ranks: Vec<u8> = if self.flip_board {
            (0..8).collect()
        } else {
            (0..8).rev().collect()
        };
        let files: Vec<u8> = if self.flip_board {
            (0..8).rev().collect()
        } else {
            (0..8).collect()
        };

        for &rank in &ranks {
            if self.show_coords {
                let _ = write!(out, "  {} ", rank + 1);
            }
            for &file in &files {
                let Some(square) = Square::new(file, rank) else {
                    continue;
                };
                out.push_str(&self.draw_square(board.piece_at(square), square, marks));
            }
            out.push('\n');
        }

        if self.show_coords {
            let labels: String = files
                .iter()
                .map(|f| format!(" {} ", (b'a' + f) as char))
                .collect();
            let _ = writeln!(out, "    {}", labels);
        }
        out
    }

    fn draw_square(&self, piece: Piece, square: Square, marks: &Marks) -> String {
        use colors::*;

        let highlighted = marks.highlighted.contains(&square);
        let symbol = if self.use_unicode {
            symbols::piece_symbol(piece).to_string()
        } else {
            piece.to_char().to_string()
        };
        let symbol = if piece.is_empty() && highlighted {
            if self.use_unicode { symbols::TARGET.to_string() } else { "*".to_string() }
        } else {
            symbol
        };

        if !self.use_color {
            return format!(" {} ", symbol);
        }

        let bg = self.square_background(square, marks);
        let fg = if piece.is_white() {
            BRIGHT_WHITE
        } else if piece.is_black() {
            BRIGHT_BLACK
        } else {
            ""
        };
        format!("{}{}{} {} {}", bg, BOLD, fg, symbol, RESET)
    }

    fn square_background(&self, square: Square, marks: &Marks) -> &'static str {
        use colors::*;

        if marks.check == Some(square) {
            return BG_CHECK;
        }
        if marks.highlighted.contains(&square) {
            return BG_HIGHLIGHT;
        }
        if let Some((from, to)) = marks.pre_move {
            if square == from || square == to {
                return BG_PRE_MOVE;
            }
        }
        if square.is_light() { BG_LIGHT } else { BG_DARK }
    }

    pub fn draw_move_list(&self, history: &MoveHistory) -> String {
        let mut out = String::new();
        if history.is_empty() {
            return out;
        }
        let _ = writeln!(out, "═══ Move History ═══");
        for entry in history.numbered() {
            match entry.color {
                Color::White => {
                    let _ = write!(out, "{:>3}. {:<8}", entry.move_number, entry.san);
                }
                Color::Black if entry.ply == 1 => {
                    let _ = writeln!(out, "{:>3}... {}", entry.move_number, entry.san);
                }
                Color::Black => {
                    let _ = writeln!(out, "{}", entry.san);
                }
            }
        }
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

// ============================================================================
// GAME INTERFACE
// ============================================================================

pub struct GameInterface {
    pub display: BoardDisplay,
}

impl Default for GameInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl GameInterface {
    pub fn new() -> Self {
        Self {
            display: BoardDisplay::new(),
        }
    }

    pub fn with_display(display: BoardDisplay) -> Self {
        Self { display }
    }

    /// Full screen for one session snapshot.
    pub fn draw_screen(&self, view: &SessionView<Board>) -> String {
        let mut out = String::new();
        out.push_str(&self.draw_header());
        out.push_str(&self.display.draw_board(&view.position, &Self::marks(view)));
        out.push('\n');
        out.push_str(&self.status_line(view));
        out.push('\n');
        if let Some(pre_move) = view.pre_move {
            let _ = writeln!(out, "Scheduled Pre-Move: {}", pre_move);
        }
        out.push_str(&self.display.draw_move_list(&view.history));
        out
    }

    pub fn show_game_screen(&self, view: &SessionView<Board>) {
        if self.display.use_color {
            print!("\x1b[2J\x1b[H"); // Clear screen and move to top
        }
        print!("{}", self.draw_screen(view));
        let _ = io::stdout().flush();
    }

    fn marks(view: &SessionView<Board>) -> Marks {
        let check = if view.outcome.is_none() && view.position.in_check() {
            Self::king_square(&view.position, view.turn)
        } else {
            None
        };
        Marks {
            highlighted: view.highlighted.clone(),
            pre_move: view.pre_move.map(|p| (p.from, p.to)),
            check,
        }
    }

    fn king_square(board: &Board, color: Color) -> Option<Square> {
        let king = Piece::new(color, PieceKind::King);
        (0..8u8)
            .flat_map(|rank| (0..8u8).filter_map(move |file| Square::new(file, rank)))
            .find(|sq| board.piece_at(*sq) == king)
    }

    fn draw_header(&self) -> String {
        use colors::*;
        if self.display.use_color {
            format!("{}{}♟  RUST CHESS SESSION  ♟{}\n\n", BOLD, BRIGHT_CYAN, RESET)
        } else {
            "RUST CHESS SESSION\n\n".to_string()
        }
    }

    pub fn status_line(&self, view: &SessionView<Board>) -> String {
        if let Some(outcome) = view.outcome {
            return outcome.to_string();
        }

        let mut line = format!("Turn: {}", view.turn);
        match view.mode {
            Mode::Human => line.push_str("  |  Mode: human vs human"),
            Mode::Bot => {
                let _ = write!(line, "  |  Mode: vs bot ({})", view.bot_color);
            }
        }
        if view.position.in_check() {
            line.push_str("  |  Check!");
        }
        if view.bot_thinking {
            line.push_str("  |  Bot is thinking...");
        }
        line
    }

    /// Command reference, printed below the board after a redraw.
    pub fn help_text(&self) -> String {
        use colors::*;

        let commands = [
            ("<from><to>[promo]", "Make a move (e.g., e2e4, e7e8n)"),
            ("select <square>", "Highlight legal destinations"),
            ("clear", "Clear highlights"),
            ("mode human|bot", "Switch game mode"),
            ("reset", "Start a new game"),
            ("history", "Show movetext"),
            ("fen", "Display current position as FEN"),
            ("flip", "Flip the board orientation"),
            ("help", "Show this help"),
            ("quit", "Exit"),
        ];
        let (bold, yellow, green, dim, reset) = if self.display.use_color {
            (BOLD, BRIGHT_YELLOW, BRIGHT_GREEN, DIM, RESET)
        } else {
            ("", "", "", "", "")
        };

        let mut out = format!("\n{}{}▶ COMMANDS{}\n\n", bold, yellow, reset);
        for (cmd, desc) in commands {
            let _ = writeln!(out, "  {}{:<20}{} {}", green, cmd, reset, desc);
        }
        let _ = writeln!(
            out,
            "\n{}Moves for the side not to move are queued as pre-moves.{}",
            dim, reset
        );
        out
    }
}

// ============================================================================
// NOTIFICATION SYSTEM
// ============================================================================

pub struct Notification {
    message: String,
    kind: NotificationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl Notification {
    pub fn new(message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Error)
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn text(&self) -> String {
        use colors::*;

        let (icon, color) = match self.kind {
            NotificationKind::Info => ("ℹ️", BRIGHT_BLUE),
            NotificationKind::Success => ("✅", BRIGHT_GREEN),
            NotificationKind::Warning => ("⚠️", BRIGHT_YELLOW),
            NotificationKind::Error => ("❌", BRIGHT_RED),
        };
        format!("{}{} {}{}", color, icon, self.message, RESET)
    }

    pub fn show(&self) {
        println!("{}", self.text());
    }
}

// ============================================================================
// INPUT VALIDATOR
// ============================================================================

pub struct InputValidator;

impl InputValidator {
    /// Parse coordinate input such as `e2e4` or `e7e8n`.
    pub fn validate_move(input: &str) -> Result<(Square, Square, Option<PieceKind>), String> {
        let input = input.trim().to_lowercase();

        if !input.is_ascii() || input.len() < 4 || input.len() > 5 {
            return Err("Move format: e2e4 or e7e8q".to_string());
        }

        let from: Square = input[0..2]
            .parse()
            .map_err(|_| format!("Invalid source square: {}", &input[0..2]))?;
        let to: Square = input[2..4]
            .parse()
            .map_err(|_| format!("Invalid destination square: {}", &input[2..4]))?;

        let promotion = match input[4..].chars().next() {
            None => None,
            Some(c) => Some(PieceKind::from_promotion_char(c).ok_or_else(|| {
                format!("Invalid promotion piece: {}. Use q, r, b, or n", c)
            })?),
        };

        Ok((from, to, promotion))
    }

    pub fn is_valid_square(sq: &str) -> bool {
        sq.parse::<Square>().is_ok()
    }
}

// ============================================================================
// MODULE TESTS
// ============================================================================
