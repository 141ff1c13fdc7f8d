//! Game session state and the controller that drives it.
//!
//! A [`GameSession`] is the per-game snapshot: position, mode, move log,
//! outcome, pre-move slot and highlighted squares. It is only ever changed
//! through a [`SessionController`], and a reset replaces it wholesale.
//!
//! ```text
//! submit_move ──► RulesEngine::apply_move ──► commit ──► termination check
//!      │                                         │
//!      └─ WrongTurn ─► pre-move slot             ├─► queued pre-move (once)
//!                                                └─► bot ticket (delayed)
//! ```

mod controller;
mod scheduler;

pub use controller::{BotTicket, SessionController};
pub use scheduler::SessionHandle;

use crate::engine::{Color, PieceKind, Square, TerminalStatus};
use crate::error::{IllegalMoveReason, ParseModeError};
use crate::history::MoveHistory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Who drives the pieces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Both sides are moved by players.
    #[default]
    Human,
    /// One side is moved by the bot move selector.
    Bot,
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "pvp" => Ok(Mode::Human),
            "bot" | "ai" => Ok(Mode::Bot),
            _ => Err(ParseModeError::Unknown(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Human => f.write_str("human"),
            Mode::Bot => f.write_str("bot"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Winner {
    White,
    Black,
    Draw,
    /// The game ended through a condition the rules engine did not classify.
    Unknown,
}

impl From<Color> for Winner {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Winner::White,
            Color::Black => Winner::Black,
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::White => f.write_str("White"),
            Winner::Black => f.write_str("Black"),
            Winner::Draw => f.write_str("Draw"),
            Winner::Unknown => f.write_str("Unknown"),
        }
    }
}

/// How a finished game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameOutcome {
    pub winner: Winner,
    pub status: TerminalStatus,
}

impl GameOutcome {
    /// Classify a terminal status. `side_to_move` is the side that has the
    /// move in the terminal position, i.e. the mated side on checkmate.
    pub fn classify(status: TerminalStatus, side_to_move: Color) -> Option<GameOutcome> {
        let winner = match status {
            TerminalStatus::NotTerminal => return None,
            TerminalStatus::Checkmate => Winner::from(side_to_move.opponent()),
            TerminalStatus::Stalemate | TerminalStatus::Draw(_) => Winner::Draw,
            TerminalStatus::Other => Winner::Unknown,
        };
        Some(GameOutcome { winner, status })
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.winner {
            Winner::Draw => write!(f, "The game ended in a draw! ({})", self.status),
            winner => write!(f, "Winner: {} ({})", winner, self.status),
        }
    }
}

/// A move queued during the opponent's turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    /// Side the move is for; never the side currently to move.
    pub color: Color,
}

impl fmt::Display for PreMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}

/// Why a submission did not change the position.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("the game is over")]
    GameOver,

    #[error("illegal move: {0}")]
    Illegal(IllegalMoveReason),

    #[error("those pieces are moved by the bot")]
    BotControlled,
}

/// Result of a move submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub accepted: bool,
    pub is_pre_move: bool,
    pub rejection: Option<Rejection>,
}

impl SubmitOutcome {
    pub(crate) fn applied() -> Self {
        Self {
            accepted: true,
            is_pre_move: false,
            rejection: None,
        }
    }

    pub(crate) fn queued() -> Self {
        Self {
            accepted: false,
            is_pre_move: true,
            rejection: None,
        }
    }

    pub(crate) fn rejected(reason: Rejection) -> Self {
        Self {
            accepted: false,
            is_pre_move: false,
            rejection: Some(reason),
        }
    }
}

/// State of one game, from creation to reset.
#[derive(Clone, Debug)]
pub struct GameSession<P> {
    position: P,
    turn: Color,
    mode: Mode,
    history: MoveHistory,
    outcome: Option<GameOutcome>,
    pre_move: Option<PreMove>,
    highlighted: BTreeSet<Square>,
}

impl<P> GameSession<P> {
    pub(crate) fn new(position: P, turn: Color, fullmove: u32, mode: Mode) -> Self {
        Self {
            position,
            turn,
            mode,
            history: MoveHistory::new(turn, fullmove),
            outcome: None,
            pre_move: None,
            highlighted: BTreeSet::new(),
        }
    }

    pub fn position(&self) -> &P {
        &self.position
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn winner(&self) -> Option<Winner> {
        self.outcome.map(|o| o.winner)
    }

    pub fn pre_move(&self) -> Option<PreMove> {
        self.pre_move
    }

    pub fn highlighted(&self) -> &BTreeSet<Square> {
        &self.highlighted
    }
}

/// Cloneable snapshot of everything a front-end renders.
#[derive(Clone, Debug)]
pub struct SessionView<P> {
    pub position: P,
    pub turn: Color,
    pub mode: Mode,
    pub bot_color: Color,
    pub history: MoveHistory,
    pub outcome: Option<GameOutcome>,
    pub pre_move: Option<PreMove>,
    pub highlighted: BTreeSet<Square>,
    /// Incremented on every reset.
    pub generation: u64,
    /// A bot move is scheduled and has not fired yet.
    pub bot_thinking: bool,
}
