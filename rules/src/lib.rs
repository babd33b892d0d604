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

//! # Gambit Rules Engine
//!
//! The relay core treats board semantics as an opaque oracle. This crate defines
//! that oracle as the [`RulesEngine`] capability trait and ships [`ChessRules`],
//! a standard chess implementation backed by the `chess` crate.
//!
//! A rules engine answers four kinds of questions about a board it owns the
//! representation of:
//!
//! - **Legality**: is a move, given in coordinate notation, legal right now?
//! - **Application**: apply a legal move, producing the next position.
//! - **Status**: is the side to move in check, and has the game ended?
//! - **Display**: render the position for a human.
//!
//! ## Usage Example
//!
//! ```rust
//! use gambit_rules::{ChessRules, RulesEngine, TerminalCondition};
//!
//! let rules = ChessRules::new();
//! let mut board = rules.new_board();
//! for notation in ["f2f3", "e7e5", "g2g4", "d8h4"] {
//!     assert!(rules.is_legal(&board, notation));
//!     rules.apply(&mut board, notation).unwrap();
//! }
//! assert!(rules.is_check(&board));
//! assert_eq!(rules.terminal_condition(&board), Some(TerminalCondition::Checkmate));
//! ```

mod engine;
mod result;
mod standard;

pub use engine::{RulesEngine, TerminalCondition};
pub use result::{RulesError, RulesResult};
pub use standard::{ChessBoard, ChessRules};
