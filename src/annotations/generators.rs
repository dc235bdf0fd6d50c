use chess::{Piece, Square};

use crate::annotations::arrow::{ArrowColor, StyledArrow};
use crate::board::{piece_value, Board};

/// Arrows for every piece attacking `square` (side not to move, green) and
/// every piece defending it (side to move, red). Defenders are suppressed
/// when the occupant is a king: a king cannot meaningfully be "defended" in
/// this visual language.
pub fn attackers_and_defenders(board: &Board, square: Square) -> Vec<StyledArrow> {
    let mut arrows = Vec::new();
    let occupant = board.piece_on(square);

    let attacker_color = !board.turn();
    let defender_color = board.turn();

    for attacker in board.attackers(attacker_color, square) {
        arrows.push(StyledArrow::new(attacker, square, ArrowColor::Green));
    }

    if occupant != Some(Piece::King) {
        for defender in board.attackers(defender_color, square) {
            arrows.push(StyledArrow::new(defender, square, ArrowColor::Red));
        }
    }

    arrows
}

/// Green arrows from `square` to the most valuable occupied squares it
/// attacks, at most `limit` of them, highest value first. Ties keep the
/// ascending-square enumeration order of the attack set, so output is
/// deterministic for a given position.
pub fn threatened_targets(board: &Board, square: Square, limit: usize) -> Vec<StyledArrow> {
    let mut targets: Vec<(Square, u8)> = board
        .attacks_from(square)
        .filter_map(|target| board.piece_on(target).map(|piece| (target, piece_value(piece))))
        .collect();

    targets.sort_by(|a, b| b.1.cmp(&a.1));

    targets
        .into_iter()
        .take(limit)
        .map(|(target, _)| StyledArrow::new(square, target, ArrowColor::Green))
        .collect()
}

/// A single manual pin marker.
pub fn pin_annotation(from: Square, to: Square) -> StyledArrow {
    StyledArrow::new(from, to, ArrowColor::Yellow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attackers_green_defenders_red() {
        // Black to move. White pawn d4 attacks e5, black pawn d6 defends it.
        let board = Board::from_fen("4k3/8/3p4/4p3/3P4/8/8/4K3 b - - 0 1").unwrap();
        let arrows = attackers_and_defenders(&board, Square::E5);

        assert_eq!(arrows.len(), 2);
        assert!(arrows.contains(&StyledArrow::new(Square::D4, Square::E5, ArrowColor::Green)));
        assert!(arrows.contains(&StyledArrow::new(Square::D6, Square::E5, ArrowColor::Red)));
    }

    #[test]
    fn king_defenders_are_suppressed() {
        // White queen e1 attacks the black king on e8; the rook on a8 would
        // "defend" it but king defenders are not drawn.
        let board = Board::from_fen("r3k3/8/8/8/8/8/8/4QK2 b - - 0 1").unwrap();
        let arrows = attackers_and_defenders(&board, Square::E8);

        assert_eq!(
            arrows,
            vec![StyledArrow::new(Square::E1, Square::E8, ArrowColor::Green)]
        );
    }

    #[test]
    fn threatened_targets_ranked_and_limited() {
        // Queen d4 attacks three occupied squares: rook d6, knight g4, pawn b4.
        let board = Board::from_fen("k7/8/3r4/8/1p1Q2n1/8/8/7K w - - 0 1").unwrap();

        let arrows = threatened_targets(&board, Square::D4, 2);
        assert_eq!(
            arrows,
            vec![
                StyledArrow::new(Square::D4, Square::D6, ArrowColor::Green),
                StyledArrow::new(Square::D4, Square::G4, ArrowColor::Green),
            ]
        );

        let all = threatened_targets(&board, Square::D4, 3);
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].head, Square::B4);
    }

    #[test]
    fn threatened_targets_skips_empty_squares() {
        let board = Board::from_fen("k7/8/8/8/3Q4/8/8/7K w - - 0 1").unwrap();
        assert!(threatened_targets(&board, Square::D4, 3).is_empty());
    }

    #[test]
    fn pin_is_yellow_passthrough() {
        let pin = pin_annotation(Square::A4, Square::A8);
        assert_eq!(pin.color, ArrowColor::Yellow);
        assert_eq!(pin.cal(), "Ya4a8");
    }
}
