// Position keys for repetition detection
// Features:
// - Seeded, reproducible key tables over the 0x88 board
// - Full-board hashing of placement, side to move, castling rights and en passant file
// - Process-wide shared instance so every Board hashes with the same keys

use crate::engine::{Board, Piece};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::OnceLock;

// =====================
// Core Zobrist Structure
// =====================

#[derive(Clone)]
pub struct Zobrist {
    // Piece placement keys: [square][piece_type]
    pub pieces: [[u64; 12]; 128],

    // XORed in when white is to move
    pub side: u64,

    // Castling rights keys (16 possible combinations)
    pub castling: [u64; 16],

    // En passant file keys (indexed by file 0-7)
    pub ep_file: [u64; 8],

    seed: u64,
}

impl Default for Zobrist {
    fn default() -> Self {
        Self::new()
    }
}

impl Zobrist {
    /// Create a new Zobrist instance with the default seed
    pub fn new() -> Self {
        Self::with_seed(2024)
    }

    /// Create a new Zobrist instance with a custom seed for reproducibility
    pub fn with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut pieces = [[0u64; 12]; 128];
        for (sq, keys) in pieces.iter_mut().enumerate() {
            // Only generate for valid 0x88 squares
            if (sq & 0x88) == 0 {
                for key in keys.iter_mut() {
                    *key = rng.r#gen();
                }
            }
        }

        let mut castling = [0u64; 16];
        for key in castling.iter_mut() {
            *key = rng.r#gen();
        }

        let mut ep_file = [0u64; 8];
        for key in ep_file.iter_mut() {
            *key = rng.r#gen();
        }

        let side = rng.r#gen();

        Self {
            pieces,
            side,
            castling,
            ep_file,
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Convert a Piece enum to an index (0-11)
    pub fn piece_index(piece: Piece) -> Option<usize> {
        match piece {
            Piece::WP => Some(0),
            Piece::WN => Some(1),
            Piece::WB => Some(2),
            Piece::WR => Some(3),
            Piece::WQ => Some(4),
            Piece::WK => Some(5),
            Piece::BP => Some(6),
            Piece::BN => Some(7),
            Piece::BB => Some(8),
            Piece::BR => Some(9),
            Piece::BQ => Some(10),
            Piece::BK => Some(11),
            Piece::Empty => None,
        }
    }

    /// Compute the full Zobrist hash for a board position
    pub fn hash_board(&self, board: &Board) -> u64 {
        let mut h = 0u64;

        for sq in 0..128 {
            if (sq & 0x88) != 0 {
                continue;
            }
            if let Some(idx) = Self::piece_index(board.cells[sq]) {
                h ^= self.pieces[sq][idx];
            }
        }

        h ^= self.castling[(board.castling & 15) as usize];

        if let Some(ep_sq) = board.ep {
            let file = ep_sq & 15;
            if file < 8 {
                h ^= self.ep_file[file];
            }
        }

        if board.side_white {
            h ^= self.side;
        }

        h
    }
}

// =====================
// Shared Instance
// =====================

static SHARED_ZOBRIST: OnceLock<Zobrist> = OnceLock::new();

impl Zobrist {
    /// Keys used by [`Board::key`]; initialised on first use.
    pub fn shared() -> &'static Zobrist {
        SHARED_ZOBRIST.get_or_init(Zobrist::new)
    }
}

// =====================
// Tests
// =====================
