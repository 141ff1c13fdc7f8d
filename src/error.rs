//! Error types shared by the rules engine, the session controller and the
//! configuration layer.
//!
//! None of these are fatal to a running session: an illegal move leaves the
//! session exactly as it was, and configuration errors surface before a
//! session exists.

use std::path::PathBuf;
use thiserror::Error;

/// Why the rules engine refused to apply a move.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalMoveReason {
    /// The origin square holds a piece of the side that is not to move.
    #[error("it is not that side's turn to move")]
    WrongTurn,

    /// Any other illegality: empty origin, unreachable destination,
    /// leaving the king in check, impossible promotion piece.
    #[error("no such legal move in this position")]
    NoSuchMove,

    /// The position is already terminal.
    #[error("the game is already over")]
    GameAlreadyOver,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SquareParseError {
    #[error("invalid square name {0:?} (expected a1..h8)")]
    Invalid(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("empty FEN string")]
    Empty,

    #[error("FEN must have 8 ranks separated by '/', found {0}")]
    RankCount(usize),

    #[error("rank {rank} describes {files} files instead of 8")]
    RankWidth { rank: i32, files: i32 },

    #[error("unknown piece character {0:?}")]
    PieceChar(char),

    #[error("side to move must be 'w' or 'b', found {0:?}")]
    SideToMove(String),

    #[error("invalid castling field {0:?}")]
    Castling(String),

    #[error("invalid en passant square {0:?}")]
    EnPassant(String),

    #[error("invalid move counter {0:?}")]
    Counter(String),

    #[error("each side needs exactly one king")]
    Kings,

    #[error("pawns cannot stand on the first or last rank")]
    PawnOnBackRank,

    #[error("the side not to move is in check")]
    OpponentInCheck,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseModeError {
    #[error("unknown mode {0:?} (expected 'human' or 'bot')")]
    Unknown(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid start position: {0}")]
    StartPosition(#[from] FenError),
}
