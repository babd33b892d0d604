//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Standard chess rules backed by the `chess` crate

use crate::{RulesEngine, RulesError, RulesResult};
use chess::{BitBoard, Board, BoardStatus, ChessMove, File, Piece, Rank, Square};
use std::str::FromStr;
use tracing::trace;

/// Squares of the light colour (b1, a2, ...)
const LIGHT_SQUARES: BitBoard = BitBoard(0x55AA_55AA_55AA_55AA);

/// Half-moves without capture or pawn move that end the game automatically
const DEFAULT_MOVE_COUNT_LIMIT: u32 = 150;

/// Occurrences of one position that end the game automatically
const DEFAULT_REPETITION_LIMIT: usize = 5;

/// A chess position plus the history the draw rules need
#[derive(Debug, Clone)]
pub struct ChessBoard {
    position: Board,
    halfmove_clock: u32,
    /// Position hashes since the last irreversible move, current one included
    history: Vec<u64>,
}

impl Default for ChessBoard {
    fn default() -> Self {
        let position = Board::default();
        Self {
            history: vec![position.get_hash()],
            position,
            halfmove_clock: 0,
        }
    }
}

impl ChessBoard {
    /// Create a board in the standard starting position
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a board from a FEN string
    ///
    /// The half-move clock field is honoured; the repetition history starts
    /// fresh at the loaded position.
    pub fn from_fen(fen: &str) -> RulesResult<Self> {
        let position =
            Board::from_str(fen).map_err(|_| RulesError::InvalidPosition(fen.to_string()))?;
        let halfmove_clock = fen
            .split_whitespace()
            .nth(4)
            .and_then(|field| field.parse().ok())
            .unwrap_or(0);
        Ok(Self {
            history: vec![position.get_hash()],
            position,
            halfmove_clock,
        })
    }

    /// Get the underlying position
    pub fn position(&self) -> &Board {
        &self.position
    }

    /// Get the number of half-moves since the last capture or pawn move
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// Count how often the current position has occurred
    pub fn repetitions(&self) -> usize {
        let current = self.position.get_hash();
        self.history.iter().filter(|&&hash| hash == current).count()
    }

    fn push(&mut self, mv: ChessMove) {
        let irreversible = self.position.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || self.position.piece_on(mv.get_dest()).is_some();

        self.position = self.position.make_move_new(mv);

        if irreversible {
            self.halfmove_clock = 0;
            self.history.clear();
        } else {
            self.halfmove_clock += 1;
        }
        self.history.push(self.position.get_hash());
    }
}

/// Standard chess rules
///
/// Moves are written in coordinate notation: source square, destination
/// square, optional promotion piece (`e2e4`, `e7e8q`). Draws are the
/// automatic ones: seventy-five-move rule and fivefold repetition by default.
#[derive(Debug, Clone)]
pub struct ChessRules {
    move_count_limit: u32,
    repetition_limit: usize,
}

impl Default for ChessRules {
    fn default() -> Self {
        Self {
            move_count_limit: DEFAULT_MOVE_COUNT_LIMIT,
            repetition_limit: DEFAULT_REPETITION_LIMIT,
        }
    }
}

impl ChessRules {
    /// Create the rules with the automatic draw thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the half-move count that triggers the move-count draw
    pub fn with_move_count_limit(mut self, half_moves: u32) -> Self {
        self.move_count_limit = half_moves;
        self
    }

    /// Set the occurrence count that triggers the repetition draw
    pub fn with_repetition_limit(mut self, occurrences: usize) -> Self {
        self.repetition_limit = occurrences;
        self
    }

    /// Parse coordinate notation into a move
    pub fn parse_move(notation: &str) -> RulesResult<ChessMove> {
        let invalid = || RulesError::InvalidNotation(notation.to_string());
        let text = notation.trim().to_ascii_lowercase();
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(invalid());
        }

        let bytes = text.as_bytes();
        let source = parse_square(bytes[0], bytes[1]).ok_or_else(invalid)?;
        let dest = parse_square(bytes[2], bytes[3]).ok_or_else(invalid)?;
        let promotion = match text.get(4..5) {
            None => None,
            Some("q") => Some(Piece::Queen),
            Some("r") => Some(Piece::Rook),
            Some("b") => Some(Piece::Bishop),
            Some("n") => Some(Piece::Knight),
            Some(_) => return Err(invalid()),
        };

        Ok(ChessMove::new(source, dest, promotion))
    }
}

fn parse_square(file: u8, rank: u8) -> Option<Square> {
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return None;
    }
    Some(Square::make_square(
        Rank::from_index((rank - b'1') as usize),
        File::from_index((file - b'a') as usize),
    ))
}

impl RulesEngine for ChessRules {
    type Board = ChessBoard;

    fn new_board(&self) -> ChessBoard {
        ChessBoard::new()
    }

    fn is_legal(&self, board: &ChessBoard, notation: &str) -> bool {
        Self::parse_move(notation)
            .map(|mv| board.position.legal(mv))
            .unwrap_or(false)
    }

    fn apply(&self, board: &mut ChessBoard, notation: &str) -> RulesResult<()> {
        let mv = Self::parse_move(notation)?;
        if !board.position.legal(mv) {
            return Err(RulesError::IllegalMove(notation.to_string()));
        }
        board.push(mv);
        trace!(notation, halfmove_clock = board.halfmove_clock, "Move applied");
        Ok(())
    }

    fn is_check(&self, board: &ChessBoard) -> bool {
        board.position.checkers().popcnt() > 0
    }

    fn is_checkmate(&self, board: &ChessBoard) -> bool {
        board.position.status() == BoardStatus::Checkmate
    }

    fn is_stalemate(&self, board: &ChessBoard) -> bool {
        board.position.status() == BoardStatus::Stalemate
    }

    fn is_insufficient_material(&self, board: &ChessBoard) -> bool {
        let position = &board.position;
        let heavy = *position.pieces(Piece::Pawn)
            | *position.pieces(Piece::Rook)
            | *position.pieces(Piece::Queen);
        if heavy.popcnt() > 0 {
            return false;
        }

        let knights = position.pieces(Piece::Knight).popcnt();
        let bishops = *position.pieces(Piece::Bishop);
        if knights + bishops.popcnt() <= 1 {
            return true;
        }
        if knights > 0 {
            return false;
        }

        // Bishops only: a mate needs bishops on both square colours.
        let light = (bishops & LIGHT_SQUARES).popcnt();
        light == 0 || light == bishops.popcnt()
    }

    fn is_move_count_draw(&self, board: &ChessBoard) -> bool {
        board.halfmove_clock >= self.move_count_limit
    }

    fn is_repetition_draw(&self, board: &ChessBoard) -> bool {
        board.repetitions() >= self.repetition_limit
    }

    fn render(&self, board: &ChessBoard) -> String {
        let position = &board.position;
        (0..8)
            .rev()
            .map(|rank| {
                (0..8)
                    .map(|file| {
                        let square =
                            Square::make_square(Rank::from_index(rank), File::from_index(file));
                        match (position.piece_on(square), position.color_on(square)) {
                            (Some(piece), Some(color)) => piece.to_string(color),
                            _ => ".".to_string(),
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move() {
        let mv = ChessRules::parse_move("e2e4").unwrap();
        assert_eq!(mv.get_source(), Square::E2);
        assert_eq!(mv.get_dest(), Square::E4);
        assert_eq!(mv.get_promotion(), None);

        let mv = ChessRules::parse_move("E7E8Q").unwrap();
        assert_eq!(mv.get_promotion(), Some(Piece::Queen));
    }

    #[test]
    fn test_parse_move_rejects_garbage() {
        for text in ["", "e2", "e2e", "e2e4e5", "i2e4", "e9e4", "e7e8k", "é2e4"] {
            assert!(
                matches!(
                    ChessRules::parse_move(text),
                    Err(RulesError::InvalidNotation(_))
                ),
                "{text:?} should not parse"
            );
        }
    }

    #[test]
    fn test_halfmove_clock_resets() {
        let rules = ChessRules::new();
        let mut board = rules.new_board();
        rules.apply(&mut board, "g1f3").unwrap();
        rules.apply(&mut board, "g8f6").unwrap();
        assert_eq!(board.halfmove_clock(), 2);
        rules.apply(&mut board, "e2e4").unwrap();
        assert_eq!(board.halfmove_clock(), 0);
    }

    #[test]
    fn test_render_start_position() {
        let rules = ChessRules::new();
        let rendered = rules.render(&rules.new_board());
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "r n b q k b n r");
        assert_eq!(lines[1], "p p p p p p p p");
        assert_eq!(lines[4], ". . . . . . . .");
        assert_eq!(lines[7], "R N B Q K B N R");
    }

    #[test]
    fn test_from_fen_reads_halfmove_clock() {
        let board = ChessBoard::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 42 90").unwrap();
        assert_eq!(board.halfmove_clock(), 42);
        assert!(ChessBoard::from_fen("not a fen").is_err());
    }
}
