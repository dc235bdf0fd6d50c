use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chess::{
    get_bishop_moves, get_king_moves, get_knight_moves, get_pawn_attacks, get_rook_moves,
    BitBoard, ChessMove, Color, Piece, Square, EMPTY,
};

/// One board instance shared by a whole puzzle narrative. Scenes snapshot it,
/// `Position` guards mutate it in place.
pub type SharedBoard = Rc<RefCell<Board>>;

/// Mutable board with python-chess style push/pop semantics on top of the
/// copy-on-write `chess::Board`.
///
/// Every `push` remembers the previous position, so `pop` restores it exactly,
/// including castling rights, en passant state, and the move counters.
/// `chess::Board` does not track the halfmove clock or fullmove number (its
/// `Display` always prints `0 1`), so they are carried here: `fen()` must
/// round-trip the input FEN because it feeds the scene cache keys.
#[derive(Debug, Clone)]
pub struct Board {
    current: chess::Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    stack: Vec<Frame>,
}

#[derive(Debug, Clone)]
struct Frame {
    previous: chess::Board,
    mv: ChessMove,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Board {
    pub fn from_fen(fen: &str) -> Result<Board> {
        let current = chess::Board::from_str(fen)
            .map_err(|err| anyhow!("invalid FEN '{fen}': {err}"))?;
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let halfmove_clock = fields
            .get(4)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0);
        let fullmove_number = fields
            .get(5)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(1);
        Ok(Board {
            current,
            halfmove_clock,
            fullmove_number,
            stack: Vec::new(),
        })
    }

    /// Convenience for the per-puzzle scripts: one board, shared by reference.
    pub fn shared_from_fen(fen: &str) -> Result<SharedBoard> {
        Ok(Rc::new(RefCell::new(Board::from_fen(fen)?)))
    }

    pub fn fen(&self) -> String {
        let base = self.current.to_string();
        let prefix = base.split_whitespace().take(4).collect::<Vec<_>>().join(" ");
        format!("{prefix} {} {}", self.halfmove_clock, self.fullmove_number)
    }

    pub fn turn(&self) -> Color {
        self.current.side_to_move()
    }

    pub fn piece_on(&self, square: Square) -> Option<Piece> {
        self.current.piece_on(square)
    }

    pub fn color_on(&self, square: Square) -> Option<Color> {
        self.current.color_on(square)
    }

    /// Apply a move in place. The move is assumed to come from a puzzle
    /// solution line, so legality is not re-checked. The halfmove clock
    /// resets on pawn moves and captures (a pawn landing on an empty square
    /// of a different file is an en passant capture), and the fullmove
    /// number advances after black's move.
    pub fn push(&mut self, mv: ChessMove) {
        let pawn_move = self.current.piece_on(mv.get_source()) == Some(Piece::Pawn);
        let capture = self.current.piece_on(mv.get_dest()).is_some()
            || (pawn_move && mv.get_source().get_file() != mv.get_dest().get_file());
        let mover = self.current.side_to_move();

        self.stack.push(Frame {
            previous: self.current,
            mv,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        });

        self.current = self.current.make_move_new(mv);
        self.halfmove_clock = if pawn_move || capture {
            0
        } else {
            self.halfmove_clock + 1
        };
        if mover == Color::Black {
            self.fullmove_number += 1;
        }
    }

    /// Undo the most recent `push`. Popping an empty stack is a programming
    /// error in the narrative script and surfaces loudly.
    pub fn pop(&mut self) -> Result<ChessMove> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| anyhow!("pop with no move applied"))?;
        self.current = frame.previous;
        self.halfmove_clock = frame.halfmove_clock;
        self.fullmove_number = frame.fullmove_number;
        Ok(frame.mv)
    }

    /// The most recently applied move, used for the last-move highlight.
    pub fn last_move(&self) -> Option<ChessMove> {
        self.stack.last().map(|frame| frame.mv)
    }

    /// All pieces of `color` that attack `square`. Iteration over the
    /// returned bitboard is ascending by square index, which keeps
    /// downstream annotation output deterministic.
    pub fn attackers(&self, color: Color, square: Square) -> BitBoard {
        let board = &self.current;
        let occupied = *board.combined();
        let ours = *board.color_combined(color);

        let rooks_queens = (*board.pieces(Piece::Rook) | *board.pieces(Piece::Queen)) & ours;
        let bishops_queens = (*board.pieces(Piece::Bishop) | *board.pieces(Piece::Queen)) & ours;
        let knights = *board.pieces(Piece::Knight) & ours;
        let kings = *board.pieces(Piece::King) & ours;
        let pawns = *board.pieces(Piece::Pawn) & ours;

        (get_rook_moves(square, occupied) & rooks_queens)
            | (get_bishop_moves(square, occupied) & bishops_queens)
            | (get_knight_moves(square) & knights)
            | (get_king_moves(square) & kings)
            | get_pawn_attacks(square, !color, pawns)
    }

    /// The attack set of the piece standing on `square`, or an empty board
    /// when the square is empty. Includes occupied squares of either color.
    pub fn attacks_from(&self, square: Square) -> BitBoard {
        let board = &self.current;
        let occupied = *board.combined();

        let (piece, color) = match (board.piece_on(square), board.color_on(square)) {
            (Some(piece), Some(color)) => (piece, color),
            _ => return EMPTY,
        };

        match piece {
            Piece::Pawn => get_pawn_attacks(square, color, !EMPTY),
            Piece::Knight => get_knight_moves(square),
            Piece::Bishop => get_bishop_moves(square, occupied),
            Piece::Rook => get_rook_moves(square, occupied),
            Piece::Queen => {
                get_rook_moves(square, occupied) | get_bishop_moves(square, occupied)
            }
            Piece::King => get_king_moves(square),
        }
    }
}

/// Material-ordered piece value, pawn lowest through king highest. Used to
/// rank annotation targets.
pub fn piece_value(piece: Piece) -> u8 {
    match piece {
        Piece::Pawn => 1,
        Piece::Knight => 2,
        Piece::Bishop => 3,
        Piece::Rook => 4,
        Piece::Queen => 5,
        Piece::King => 6,
    }
}

/// Lowercase English piece name for narration text ("knight to f3").
pub fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "pawn",
        Piece::Knight => "knight",
        Piece::Bishop => "bishop",
        Piece::Rook => "rook",
        Piece::Queen => "queen",
        Piece::King => "king",
    }
}

/// "{piece} to {square}" for the move most recently played on `board`.
/// The piece is read from the destination square, so this must be called
/// after the move was pushed.
pub fn describe_move(board: &Board, mv: ChessMove) -> Result<String> {
    let piece = board
        .piece_on(mv.get_dest())
        .ok_or_else(|| anyhow!("no piece on {} after move", mv.get_dest()))?;
    Ok(format!("{} to {}", piece_name(piece), mv.get_dest()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn push_then_pop_restores_fen() {
        let mut board = Board::from_fen(STARTPOS).unwrap();
        let before = board.fen();

        board.push(ChessMove::from_str("e2e4").unwrap());
        assert_ne!(board.fen(), before);

        board.pop().unwrap();
        assert_eq!(board.fen(), before);
    }

    #[test]
    fn fen_round_trips_move_counters() {
        let fen = "1r3k2/3R1ppp/p6P/4PpP1/P3pP2/8/8/6K1 b - - 0 31";
        let mut board = Board::from_fen(fen).unwrap();
        assert_eq!(board.fen(), fen);

        // Quiet king move: clock ticks, and black moving advances the
        // fullmove number.
        board.push(ChessMove::from_str("f8e8").unwrap());
        assert!(board.fen().ends_with("w - - 1 32"));

        board.pop().unwrap();
        assert_eq!(board.fen(), fen);
    }

    #[test]
    fn halfmove_clock_resets_on_pawn_moves_and_captures() {
        let mut board =
            Board::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3")
                .unwrap();

        // Knight takes the e5 pawn: capture resets the clock.
        board.push(ChessMove::from_str("f3e5").unwrap());
        assert!(board.fen().ends_with("b KQkq - 0 3"));

        // Pawn move also resets.
        board.push(ChessMove::from_str("d7d6").unwrap());
        assert!(board.fen().ends_with("w KQkq - 0 4"));

        // Quiet piece move ticks.
        board.push(ChessMove::from_str("e5f3").unwrap());
        assert!(board.fen().ends_with("b KQkq - 1 4"));
    }

    #[test]
    fn pop_on_empty_stack_errors() {
        let mut board = Board::from_fen(STARTPOS).unwrap();
        assert!(board.pop().is_err());
    }

    #[test]
    fn last_move_tracks_stack() {
        let mut board = Board::from_fen(STARTPOS).unwrap();
        assert!(board.last_move().is_none());

        let mv = ChessMove::from_str("g1f3").unwrap();
        board.push(mv);
        assert_eq!(board.last_move(), Some(mv));

        board.pop().unwrap();
        assert!(board.last_move().is_none());
    }

    #[test]
    fn attackers_finds_pawn_and_rook() {
        // White pawn d4 attacks e5; black rook e8 defends e5 down the open file.
        let board = Board::from_fen("4r1k1/8/8/4p3/3P4/8/8/6K1 w - - 0 1").unwrap();

        let white = board.attackers(Color::White, Square::E5);
        assert_eq!(white.collect::<Vec<_>>(), vec![Square::D4]);

        let black = board.attackers(Color::Black, Square::E5);
        assert_eq!(black.collect::<Vec<_>>(), vec![Square::E8]);
    }

    #[test]
    fn attacks_from_empty_square_is_empty() {
        let board = Board::from_fen(STARTPOS).unwrap();
        assert_eq!(board.attacks_from(Square::E4), EMPTY);
    }

    #[test]
    fn queen_attack_set_spans_rank_and_file() {
        let board = Board::from_fen("k7/8/3r4/8/1p1Q2n1/8/8/7K w - - 0 1").unwrap();
        let attacks = board.attacks_from(Square::D4);
        assert!(attacks & BitBoard::from_square(Square::D6) != EMPTY);
        assert!(attacks & BitBoard::from_square(Square::G4) != EMPTY);
        assert!(attacks & BitBoard::from_square(Square::B4) != EMPTY);
        // Blocked behind the pawn on b4.
        assert!(attacks & BitBoard::from_square(Square::A4) == EMPTY);
    }
}
