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

//! The rules engine capability interface

use crate::RulesResult;
use std::fmt;

/// A condition that ends the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalCondition {
    /// The side to move is in check and has no legal move
    Checkmate,
    /// The side to move is not in check and has no legal move
    Stalemate,
    /// Neither side has enough material left to deliver mate
    InsufficientMaterial,
    /// Too many moves without a capture or pawn move
    MoveCountDraw,
    /// The same position occurred too many times
    RepetitionDraw,
}

impl TerminalCondition {
    /// Check if the condition produces a winner
    pub fn is_decisive(self) -> bool {
        matches!(self, Self::Checkmate)
    }

    /// Check if the condition is a drawn result
    pub fn is_draw(self) -> bool {
        !self.is_decisive()
    }
}

impl fmt::Display for TerminalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkmate => write!(f, "checkmate"),
            Self::Stalemate => write!(f, "draw by stalemate"),
            Self::InsufficientMaterial => write!(f, "draw by insufficient material"),
            Self::MoveCountDraw => write!(f, "draw by the seventy-five-move rule"),
            Self::RepetitionDraw => write!(f, "draw by fivefold repetition"),
        }
    }
}

/// Board semantics consumed by the relay core
///
/// The core never looks inside [`RulesEngine::Board`]. It only asks the engine
/// questions about it, always while holding the lock of the room that owns it.
///
/// # Example
///
/// ```rust
/// use gambit_rules::{ChessRules, RulesEngine};
///
/// let rules = ChessRules::new();
/// let mut board = rules.new_board();
/// assert!(!rules.is_legal(&board, "e2e5"));
/// rules.apply(&mut board, "e2e4").unwrap();
/// println!("{}", rules.render(&board));
/// ```
pub trait RulesEngine: Send + Sync + 'static {
    /// Engine-specific board state
    type Board: Send + 'static;

    /// Create a board in the starting position
    fn new_board(&self) -> Self::Board;

    /// Check whether `notation` is a legal move for the side to move
    fn is_legal(&self, board: &Self::Board, notation: &str) -> bool;

    /// Apply a move to the board
    ///
    /// Fails without touching the board if the move is unparseable or illegal.
    fn apply(&self, board: &mut Self::Board, notation: &str) -> RulesResult<()>;

    /// Check whether the side to move is in check
    fn is_check(&self, board: &Self::Board) -> bool;

    /// Check whether the side to move has been mated
    fn is_checkmate(&self, board: &Self::Board) -> bool;

    /// Check whether the side to move is stalemated
    fn is_stalemate(&self, board: &Self::Board) -> bool;

    /// Check whether neither side can possibly mate
    fn is_insufficient_material(&self, board: &Self::Board) -> bool;

    /// Check whether the automatic move-count draw applies
    fn is_move_count_draw(&self, board: &Self::Board) -> bool;

    /// Check whether the automatic repetition draw applies
    fn is_repetition_draw(&self, board: &Self::Board) -> bool;

    /// Render the board for human display
    fn render(&self, board: &Self::Board) -> String;

    /// Determine whether the game has ended
    ///
    /// Conditions are checked in a fixed priority order: checkmate, stalemate,
    /// insufficient material, move-count draw, repetition draw. The first
    /// match wins.
    fn terminal_condition(&self, board: &Self::Board) -> Option<TerminalCondition> {
        if self.is_checkmate(board) {
            Some(TerminalCondition::Checkmate)
        } else if self.is_stalemate(board) {
            Some(TerminalCondition::Stalemate)
        } else if self.is_insufficient_material(board) {
            Some(TerminalCondition::InsufficientMaterial)
        } else if self.is_move_count_draw(board) {
            Some(TerminalCondition::MoveCountDraw)
        } else if self.is_repetition_draw(board) {
            Some(TerminalCondition::RepetitionDraw)
        } else {
            None
        }
    }
}
