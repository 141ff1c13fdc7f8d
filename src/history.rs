//! Move log kept by a game session.
//!
//! Entries are SAN strings in play order. The log only grows while a game is
//! in progress; a reset replaces it with an empty one.

use crate::engine::Color;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveHistory {
    moves: Vec<String>,
    first_mover: Color,
    first_move_number: u32,
}

/// One numbered row of the log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry<'a> {
    /// 1-based half-move index.
    pub ply: usize,
    pub move_number: u32,
    pub color: Color,
    pub san: &'a str,
}

impl Default for MoveHistory {
    fn default() -> Self {
        Self::new(Color::White, 1)
    }
}

impl MoveHistory {
    /// Empty log for a game whose first move is made by `first_mover` on
    /// full-move `first_move_number`.
    pub fn new(first_mover: Color, first_move_number: u32) -> Self {
        Self {
            moves: Vec::new(),
            first_mover,
            first_move_number: first_move_number.max(1),
        }
    }

    pub(crate) fn push(&mut self, san: impl Into<String>) {
        self.moves.push(san.into());
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.moves.last().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.moves
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.moves.iter().map(String::as_str)
    }

    pub fn numbered(&self) -> impl Iterator<Item = HistoryEntry<'_>> {
        let offset = match self.first_mover {
            Color::White => 0,
            Color::Black => 1,
        };
        self.moves.iter().enumerate().map(move |(i, san)| {
            let half = i + offset;
            HistoryEntry {
                ply: i + 1,
                move_number: self
                    .first_move_number
                    .saturating_add(u32::try_from(half / 2).unwrap_or(u32::MAX)),
                color: if half % 2 == 0 { Color::White } else { Color::Black },
                san,
            }
        })
    }

    /// PGN-style movetext, e.g. `1. e4 e5 2. Nf3`.
    pub fn movetext(&self) -> String {
        let mut out = String::new();
        for entry in self.numbered() {
            if !out.is_empty() {
                out.push(' ');
            }
            match entry.color {
                Color::White => out.push_str(&format!("{}. ", entry.move_number)),
                Color::Black if entry.ply == 1 => {
                    out.push_str(&format!("{}... ", entry.move_number))
                }
                Color::Black => {}
            }
            out.push_str(entry.san);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history() {
        let history = MoveHistory::default();
        assert!(history.is_empty());
        assert_eq!(history.last(), None);
        assert_eq!(history.movetext(), "");
    }

    #[test]
    fn test_movetext_from_white() {
        let mut history = MoveHistory::default();
        for san in ["e4", "e5", "Nf3"] {
            history.push(san);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.last(), Some("Nf3"));
        assert_eq!(history.movetext(), "1. e4 e5 2. Nf3");
    }

    #[test]
    fn test_movetext_from_black() {
        let mut history = MoveHistory::new(Color::Black, 5);
        for san in ["e5", "Nf3", "Nc6"] {
            history.push(san);
        }
        assert_eq!(history.movetext(), "5... e5 6. Nf3 Nc6");

        let rows: Vec<_> = history.numbered().collect();
        assert_eq!(rows[0].color, Color::Black);
        assert_eq!(rows[1].move_number, 6);
        assert_eq!(rows[2].ply, 3);
    }

    #[test]
    fn test_move_numbers_saturate() {
        let mut history = MoveHistory::new(Color::White, u32::MAX);
        for san in ["Kd1", "Kd8", "Ke1"] {
            history.push(san);
        }
        let numbers: Vec<u32> = history.numbered().map(|e| e.move_number).collect();
        assert_eq!(numbers, [u32::MAX; 3]);
    }
}
