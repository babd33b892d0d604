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

//! Error types for rules engine operations

/// Result Type for Rules Engine Operations
pub type RulesResult<T> = Result<T, RulesError>;

/// Errors reported by a [`RulesEngine`](crate::RulesEngine)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// The move text could not be parsed as a move at all.
    #[error("invalid move notation: {0:?}")]
    InvalidNotation(String),

    /// The move parsed but is not legal in the current position.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// A position description (e.g. FEN) could not be loaded.
    #[error("invalid position: {0}")]
    InvalidPosition(String),
}
