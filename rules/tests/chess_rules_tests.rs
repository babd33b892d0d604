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

//! Game-ending and legality scenarios for the chess rules engine

use gambit_rules::{ChessBoard, ChessRules, RulesEngine, RulesError, TerminalCondition};

fn play(rules: &ChessRules, board: &mut ChessBoard, moves: &[&str]) {
    for notation in moves {
        rules
            .apply(board, notation)
            .unwrap_or_else(|e| panic!("{notation} failed: {e}"));
    }
}

#[test]
fn test_opening_move_is_legal() {
    let rules = ChessRules::new();
    let board = rules.new_board();
    assert!(rules.is_legal(&board, "e2e4"));
    assert!(rules.is_legal(&board, "g1f3"));
    assert!(!rules.is_legal(&board, "e2e5"));
    assert!(!rules.is_legal(&board, "e7e5"));
    assert!(!rules.is_legal(&board, "hello"));
}

#[test]
fn test_illegal_move_leaves_board_untouched() {
    let rules = ChessRules::new();
    let mut board = rules.new_board();
    let before = rules.render(&board);

    let result = rules.apply(&mut board, "e2e5");
    assert_eq!(result, Err(RulesError::IllegalMove("e2e5".to_string())));

    let result = rules.apply(&mut board, "xx");
    assert!(matches!(result, Err(RulesError::InvalidNotation(_))));

    assert_eq!(rules.render(&board), before);
    assert_eq!(board.halfmove_clock(), 0);
}

#[test]
fn test_fools_mate() {
    let rules = ChessRules::new();
    let mut board = rules.new_board();
    play(&rules, &mut board, &["f2f3", "e7e5", "g2g4"]);
    assert_eq!(rules.terminal_condition(&board), None);

    play(&rules, &mut board, &["d8h4"]);
    assert!(rules.is_check(&board));
    assert!(rules.is_checkmate(&board));
    assert!(!rules.is_stalemate(&board));
    assert_eq!(
        rules.terminal_condition(&board),
        Some(TerminalCondition::Checkmate)
    );
}

#[test]
fn test_check_is_not_terminal() {
    let rules = ChessRules::new();
    let mut board = rules.new_board();
    play(&rules, &mut board, &["e2e4", "f7f6", "d1h5"]);
    assert!(rules.is_check(&board));
    assert_eq!(rules.terminal_condition(&board), None);
}

#[test]
fn test_stalemate() {
    let rules = ChessRules::new();
    let mut board = ChessBoard::from_fen("7k/8/4Q1K1/8/8/8/8/8 w - - 0 1").unwrap();
    play(&rules, &mut board, &["e6f7"]);
    assert!(!rules.is_check(&board));
    assert_eq!(
        rules.terminal_condition(&board),
        Some(TerminalCondition::Stalemate)
    );
}

#[test]
fn test_insufficient_material_after_capture() {
    let rules = ChessRules::new();
    let mut board = ChessBoard::from_fen("8/8/8/4k3/8/8/3r4/4K3 w - - 0 1").unwrap();
    assert!(!rules.is_insufficient_material(&board));
    assert!(rules.is_insufficient_material(
        &ChessBoard::from_fen("8/8/8/4k3/8/8/8/3NK3 w - - 0 1").unwrap()
    ));

    play(&rules, &mut board, &["e1d2"]);
    assert_eq!(
        rules.terminal_condition(&board),
        Some(TerminalCondition::InsufficientMaterial)
    );
}

#[test]
fn test_insufficient_material_bishops() {
    let rules = ChessRules::new();
    // Bishops on c1 and f8 share the dark squares.
    let same_colour = ChessBoard::from_fen("5b2/8/8/4k3/8/8/8/2B1K3 w - - 0 1").unwrap();
    assert!(rules.is_insufficient_material(&same_colour));

    // Bishops on c1 and c8 stand on opposite colours.
    let opposite = ChessBoard::from_fen("2b5/8/8/4k3/8/8/8/2B1K3 w - - 0 1").unwrap();
    assert!(!rules.is_insufficient_material(&opposite));

    let knights = ChessBoard::from_fen("8/8/8/4k3/8/8/8/1NN1K3 w - - 0 1").unwrap();
    assert!(!rules.is_insufficient_material(&knights));
}

#[test]
fn test_move_count_draw() {
    let rules = ChessRules::new();
    let mut board = ChessBoard::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 149 90").unwrap();
    assert!(!rules.is_move_count_draw(&board));

    play(&rules, &mut board, &["a1a2"]);
    assert_eq!(board.halfmove_clock(), 150);
    assert_eq!(
        rules.terminal_condition(&board),
        Some(TerminalCondition::MoveCountDraw)
    );
}

#[test]
fn test_checkmate_outranks_move_count_draw() {
    let rules = ChessRules::new();
    let mut board = ChessBoard::from_fen("k7/8/1K6/8/8/8/8/7R w - - 149 90").unwrap();
    play(&rules, &mut board, &["h1h8"]);
    assert!(rules.is_move_count_draw(&board));
    assert_eq!(
        rules.terminal_condition(&board),
        Some(TerminalCondition::Checkmate)
    );
}

#[test]
fn test_fivefold_repetition() {
    let rules = ChessRules::new();
    let mut board = rules.new_board();
    let cycle = ["g1f3", "g8f6", "f3g1", "f6g8"];

    for _ in 0..3 {
        play(&rules, &mut board, &cycle);
    }
    assert_eq!(board.repetitions(), 4);
    assert_eq!(rules.terminal_condition(&board), None);

    play(&rules, &mut board, &cycle);
    assert_eq!(board.repetitions(), 5);
    assert_eq!(
        rules.terminal_condition(&board),
        Some(TerminalCondition::RepetitionDraw)
    );
}

#[test]
fn test_custom_draw_thresholds() {
    let rules = ChessRules::new()
        .with_repetition_limit(3)
        .with_move_count_limit(100);
    let mut board = rules.new_board();
    let cycle = ["b1c3", "b8c6", "c3b1", "c6b8"];
    play(&rules, &mut board, &cycle);
    play(&rules, &mut board, &cycle);
    assert_eq!(
        rules.terminal_condition(&board),
        Some(TerminalCondition::RepetitionDraw)
    );

    let board = ChessBoard::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 100 90").unwrap();
    assert!(rules.is_move_count_draw(&board));
}

#[test]
fn test_promotion() {
    let rules = ChessRules::new();
    let mut board = ChessBoard::from_fen("8/4P1k1/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    assert!(!rules.is_legal(&board, "e7e8"));
    play(&rules, &mut board, &["e7e8q"]);
    assert!(rules.render(&board).starts_with(". . . . Q"));
}
