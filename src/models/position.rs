use chess::ChessMove;
use log::error;

use crate::board::SharedBoard;

/// Scoped move application on the shared board.
///
/// Constructing the guard pushes the move; dropping it pops exactly one
/// move, on every exit path including unwinding. Guards follow stack
/// discipline: they must be dropped in reverse order of creation, which
/// lexical scopes give for free. Scenes snapshot the board at construction,
/// so a board reverted by a later drop never changes under a Scene.
///
/// ```no_run
/// # use zugzwang::board::Board;
/// # use zugzwang::models::Position;
/// # use std::str::FromStr;
/// let board = Board::shared_from_fen(
///     "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
/// ).unwrap();
/// {
///     let _guard = Position::play(&board, chess::ChessMove::from_str("e2e4").unwrap());
///     // board now has the move applied; build scenes against it here
/// }
/// // move reverted
/// ```
pub struct Position {
    board: SharedBoard,
}

impl Position {
    pub fn play(board: &SharedBoard, mv: ChessMove) -> Position {
        board.borrow_mut().push(mv);
        Position {
            board: SharedBoard::clone(board),
        }
    }
}

impl Drop for Position {
    fn drop(&mut self) {
        // A failed pop means the guard discipline was violated somewhere;
        // nothing sane can be done from a destructor, so it is only logged.
        if let Err(err) = self.board.borrow_mut().pop() {
            error!("position guard failed to revert move: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use std::str::FromStr;

    const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn mv(code: &str) -> ChessMove {
        ChessMove::from_str(code).unwrap()
    }

    #[test]
    fn guard_reverts_on_scope_exit() {
        let board = Board::shared_from_fen(STARTPOS).unwrap();
        let before = board.borrow().fen();

        {
            let _guard = Position::play(&board, mv("e2e4"));
            assert_ne!(board.borrow().fen(), before);
        }

        assert_eq!(board.borrow().fen(), before);
    }

    #[test]
    fn nested_guards_unwind_in_reverse_order() {
        let board = Board::shared_from_fen(STARTPOS).unwrap();
        let initial = board.borrow().fen();

        {
            let _white = Position::play(&board, mv("e2e4"));
            let after_white = board.borrow().fen();
            {
                let _black = Position::play(&board, mv("e7e5"));
                assert_eq!(board.borrow().last_move(), Some(mv("e7e5")));
            }
            assert_eq!(board.borrow().fen(), after_white);
        }

        assert_eq!(board.borrow().fen(), initial);
    }

    #[test]
    fn guard_reverts_during_unwinding() {
        let board = Board::shared_from_fen(STARTPOS).unwrap();
        let before = board.borrow().fen();

        let shared = SharedBoard::clone(&board);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = Position::play(&shared, mv("e2e4"));
            panic!("scene construction failed");
        }));

        assert!(result.is_err());
        assert_eq!(board.borrow().fen(), before);
    }
}
