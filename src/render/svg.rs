use chess::{ChessMove, Color, Piece, Rank, Square};
use std::fmt::Write;

use crate::annotations::StyledArrow;
use crate::board::Board;

// Board colors: the classic brown set, with the margin forced to black so
// the board blends into the dark frame around it.
const LIGHT_SQUARE: &str = "#ffce9e";
const DARK_SQUARE: &str = "#d18b47";
const LAST_MOVE_LIGHT: &str = "#cdd26a";
const LAST_MOVE_DARK: &str = "#aaa23b";
const MARGIN_COLOR: &str = "#000000";
const COORD_COLOR: &str = "#e5e5e5";
const ARROW_OPACITY: &str = "0.75";

/// Render a position to SVG from the given perspective, with annotation
/// arrows and an optional last-move highlight. Output is deterministic for
/// identical inputs, which the image cache relies on.
pub fn board_svg(
    board: &Board,
    orientation: Color,
    arrows: &[StyledArrow],
    last_move: Option<ChessMove>,
    size: u32,
) -> String {
    let margin = size / 20;
    let square_px = (size - 2 * margin) / 8;
    let board_px = square_px * 8;
    let canvas = board_px + 2 * margin;

    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{canvas}\" height=\"{canvas}\" \
         viewBox=\"0 0 {canvas} {canvas}\">"
    );
    let _ = write!(
        svg,
        "<rect x=\"0\" y=\"0\" width=\"{canvas}\" height=\"{canvas}\" fill=\"{MARGIN_COLOR}\"/>"
    );

    let highlighted = last_move
        .map(|mv| [Some(mv.get_source()), Some(mv.get_dest())])
        .unwrap_or([None, None]);

    // Squares, drawn rank by rank in a fixed order.
    for rank in 0..8u8 {
        for file in 0..8u8 {
            let square = Square::make_square(
                Rank::from_index(rank as usize),
                chess::File::from_index(file as usize),
            );
            let (x, y) = square_origin(square, orientation, margin, square_px);
            let dark = (rank + file) % 2 == 0;
            let fill = if highlighted.contains(&Some(square)) {
                if dark {
                    LAST_MOVE_DARK
                } else {
                    LAST_MOVE_LIGHT
                }
            } else if dark {
                DARK_SQUARE
            } else {
                LIGHT_SQUARE
            };
            let _ = write!(
                svg,
                "<rect x=\"{x}\" y=\"{y}\" width=\"{square_px}\" height=\"{square_px}\" \
                 fill=\"{fill}\"/>"
            );
        }
    }

    // Pieces as text glyphs centered in their squares.
    for rank in 0..8u8 {
        for file in 0..8u8 {
            let square = Square::make_square(
                Rank::from_index(rank as usize),
                chess::File::from_index(file as usize),
            );
            let (piece, color) = match (board.piece_on(square), board.color_on(square)) {
                (Some(piece), Some(color)) => (piece, color),
                _ => continue,
            };
            let (x, y) = square_origin(square, orientation, margin, square_px);
            let cx = x + square_px / 2;
            let cy = y + square_px * 7 / 10;
            let _ = write!(
                svg,
                "<text x=\"{cx}\" y=\"{cy}\" font-size=\"{glyph_size}\" \
                 text-anchor=\"middle\">{glyph}</text>",
                glyph_size = square_px * 9 / 10,
                glyph = piece_glyph(piece, color),
            );
        }
    }

    // Coordinate labels in the margin.
    let coord_size = margin * 3 / 5;
    for file in 0..8u8 {
        let column = if orientation == Color::White { file } else { 7 - file };
        let x = margin + column as u32 * square_px + square_px / 2;
        let y = canvas - margin / 4;
        let _ = write!(
            svg,
            "<text x=\"{x}\" y=\"{y}\" font-size=\"{coord_size}\" fill=\"{COORD_COLOR}\" \
             text-anchor=\"middle\">{}</text>",
            (b'a' + file) as char
        );
    }
    for rank in 0..8u8 {
        let row = if orientation == Color::White { 7 - rank } else { rank };
        let x = margin / 2;
        let y = margin + row as u32 * square_px + square_px / 2;
        let _ = write!(
            svg,
            "<text x=\"{x}\" y=\"{y}\" font-size=\"{coord_size}\" fill=\"{COORD_COLOR}\" \
             text-anchor=\"middle\">{}</text>",
            rank + 1
        );
    }

    for arrow in arrows {
        draw_arrow(&mut svg, arrow, orientation, margin, square_px);
    }

    svg.push_str("</svg>");
    svg
}

fn square_origin(square: Square, orientation: Color, margin: u32, square_px: u32) -> (u32, u32) {
    let file = square.get_file().to_index() as u32;
    let rank = square.get_rank().to_index() as u32;
    let (column, row) = match orientation {
        Color::White => (file, 7 - rank),
        Color::Black => (7 - file, rank),
    };
    (margin + column * square_px, margin + row * square_px)
}

fn square_center(square: Square, orientation: Color, margin: u32, square_px: u32) -> (f64, f64) {
    let (x, y) = square_origin(square, orientation, margin, square_px);
    (
        x as f64 + square_px as f64 / 2.0,
        y as f64 + square_px as f64 / 2.0,
    )
}

/// An arrow is a polyline through its segment corners (knight arrows bend at
/// the intermediate square) with a triangular head on the final segment.
fn draw_arrow(
    svg: &mut String,
    arrow: &StyledArrow,
    orientation: Color,
    margin: u32,
    square_px: u32,
) {
    let segments = arrow.segments();
    let stroke = arrow.color.stroke();
    let stroke_width = square_px as f64 * 0.15;

    let mut points: Vec<(f64, f64)> =
        vec![square_center(segments[0].0, orientation, margin, square_px)];
    for (_, to) in &segments {
        points.push(square_center(*to, orientation, margin, square_px));
    }

    let (last_from, last_to) = (points[points.len() - 2], points[points.len() - 1]);
    let (dx, dy) = (last_to.0 - last_from.0, last_to.1 - last_from.1);
    let len = (dx * dx + dy * dy).sqrt().max(1.0);
    let (ux, uy) = (dx / len, dy / len);

    let head_len = square_px as f64 * 0.4;
    let head_width = square_px as f64 * 0.25;
    let base = (last_to.0 - ux * head_len, last_to.1 - uy * head_len);
    // Stop the shaft at the head base so it does not poke through the tip.
    let last = points.len() - 1;
    points[last] = base;

    let path = points
        .iter()
        .map(|(x, y)| format!("{x:.1},{y:.1}"))
        .collect::<Vec<_>>()
        .join(" ");
    let _ = write!(
        svg,
        "<polyline points=\"{path}\" fill=\"none\" stroke=\"{stroke}\" \
         stroke-width=\"{stroke_width:.1}\" stroke-linejoin=\"round\" \
         stroke-linecap=\"round\" opacity=\"{ARROW_OPACITY}\"/>"
    );

    let (px, py) = (-uy, ux);
    let left = (base.0 + px * head_width, base.1 + py * head_width);
    let right = (base.0 - px * head_width, base.1 - py * head_width);
    let _ = write!(
        svg,
        "<polygon points=\"{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}\" fill=\"{stroke}\" \
         opacity=\"{ARROW_OPACITY}\"/>",
        last_to.0, last_to.1, left.0, left.1, right.0, right.1
    );
}

fn piece_glyph(piece: Piece, color: Color) -> char {
    match (color, piece) {
        (Color::White, Piece::King) => '\u{2654}',
        (Color::White, Piece::Queen) => '\u{2655}',
        (Color::White, Piece::Rook) => '\u{2656}',
        (Color::White, Piece::Bishop) => '\u{2657}',
        (Color::White, Piece::Knight) => '\u{2658}',
        (Color::White, Piece::Pawn) => '\u{2659}',
        (Color::Black, Piece::King) => '\u{265A}',
        (Color::Black, Piece::Queen) => '\u{265B}',
        (Color::Black, Piece::Rook) => '\u{265C}',
        (Color::Black, Piece::Bishop) => '\u{265D}',
        (Color::Black, Piece::Knight) => '\u{265E}',
        (Color::Black, Piece::Pawn) => '\u{265F}',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::ArrowColor;
    use std::str::FromStr;

    const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn renders_all_squares_and_pieces() {
        let board = Board::from_fen(STARTPOS).unwrap();
        let svg = board_svg(&board, Color::White, &[], None, 1016);

        // 64 squares plus the margin rect.
        assert_eq!(svg.matches("<rect").count(), 65);
        // 32 pieces plus 16 coordinate labels.
        assert_eq!(svg.matches("<text").count(), 48);
        assert!(svg.contains('\u{2654}'));
        assert!(svg.contains('\u{265A}'));
    }

    #[test]
    fn output_is_deterministic() {
        let board = Board::from_fen(STARTPOS).unwrap();
        let arrows = vec![StyledArrow::new(
            Square::E2,
            Square::E4,
            ArrowColor::Green,
        )];
        let a = board_svg(&board, Color::White, &arrows, None, 1016);
        let b = board_svg(&board, Color::White, &arrows, None, 1016);
        assert_eq!(a, b);
    }

    #[test]
    fn orientation_flips_layout() {
        let board = Board::from_fen(STARTPOS).unwrap();
        let white = board_svg(&board, Color::White, &[], None, 1016);
        let black = board_svg(&board, Color::Black, &[], None, 1016);
        assert_ne!(white, black);
    }

    #[test]
    fn last_move_is_highlighted() {
        let mut board = Board::from_fen(STARTPOS).unwrap();
        let mv = ChessMove::from_str("e2e4").unwrap();
        board.push(mv);
        let svg = board_svg(&board, Color::White, &[], board.last_move(), 1016);
        assert!(svg.contains(LAST_MOVE_LIGHT) || svg.contains(LAST_MOVE_DARK));
    }

    #[test]
    fn knight_arrow_renders_as_bent_polyline() {
        let board = Board::from_fen(STARTPOS).unwrap();
        let arrows = vec![StyledArrow::new(
            Square::G1,
            Square::F3,
            ArrowColor::Green,
        )];
        let svg = board_svg(&board, Color::White, &arrows, None, 1016);
        let polyline = svg
            .split("<polyline points=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        // Three corner points: tail, bend, head.
        assert_eq!(polyline.split(' ').count(), 3);
    }
}
