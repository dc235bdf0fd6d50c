use std::cmp::Ordering;
use std::fmt;

use chess::{File, Rank, Square};

/// Arrow palette understood by the board renderer and the compact CAL
/// annotation format. Anything outside this set would fall back to green,
/// so the palette is a closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArrowColor {
    Green,
    Red,
    Yellow,
    Blue,
}

impl ArrowColor {
    fn code(self) -> char {
        match self {
            ArrowColor::Green => 'G',
            ArrowColor::Red => 'R',
            ArrowColor::Yellow => 'Y',
            ArrowColor::Blue => 'B',
        }
    }

    /// Stroke color used by the SVG renderer.
    pub fn stroke(self) -> &'static str {
        match self {
            ArrowColor::Green => "#15781b",
            ArrowColor::Red => "#882020",
            ArrowColor::Yellow => "#e68f00",
            ArrowColor::Blue => "#003088",
        }
    }
}

/// A colored directional marker between two squares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyledArrow {
    pub tail: Square,
    pub head: Square,
    pub color: ArrowColor,
}

impl StyledArrow {
    pub fn new(tail: Square, head: Square, color: ArrowColor) -> StyledArrow {
        StyledArrow { tail, head, color }
    }

    /// Sort key for canonical ordering: the sum of the two square indices.
    pub fn value(&self) -> usize {
        self.tail.to_index() + self.head.to_index()
    }

    /// The straight sub-segments this arrow serializes and renders as.
    ///
    /// A knight-shaped arrow (one axis off by two, the other by one) cannot
    /// be expressed as a single segment in the compact CAL format, so it is
    /// split in two at an intermediate square two steps out along each axis,
    /// matching the L-bend. Everything else is a single segment.
    pub fn segments(&self) -> Vec<(Square, Square)> {
        let (tail_rank, tail_file) = rank_file(self.tail);
        let (head_rank, head_file) = rank_file(self.head);
        let d_rank = head_rank - tail_rank;
        let d_file = head_file - tail_file;

        let knight_shaped = (d_rank.abs() == 2 && d_file.abs() == 1)
            || (d_rank.abs() == 1 && d_file.abs() == 2);
        if !knight_shaped {
            return vec![(self.tail, self.head)];
        }

        let mid_rank = tail_rank + 2 * d_rank.signum();
        let mid_file = tail_file + 2 * d_file.signum();
        let mid = square_at(mid_rank, mid_file);
        vec![(self.tail, mid), (mid, self.head)]
    }

    /// Compact `[%cal ...]` style serialization, e.g. `Ga1a4` or, for a
    /// knight-shaped arrow, two concatenated segments like `Ga1c3Gc3c2`.
    pub fn cal(&self) -> String {
        self.segments()
            .iter()
            .map(|(from, to)| format!("{}{}{}", self.color.code(), from, to))
            .collect()
    }
}

impl fmt::Display for StyledArrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cal())
    }
}

impl PartialOrd for StyledArrow {
    fn partial_cmp(&self, other: &StyledArrow) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StyledArrow {
    fn cmp(&self, other: &StyledArrow) -> Ordering {
        self.value()
            .cmp(&other.value())
            .then_with(|| self.tail.to_index().cmp(&other.tail.to_index()))
            .then_with(|| self.head.to_index().cmp(&other.head.to_index()))
            .then_with(|| self.color.cmp(&other.color))
    }
}

fn rank_file(square: Square) -> (i32, i32) {
    (
        square.get_rank().to_index() as i32,
        square.get_file().to_index() as i32,
    )
}

fn square_at(rank: i32, file: i32) -> Square {
    Square::make_square(
        Rank::from_index(rank as usize),
        File::from_index(file as usize),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::Square;

    #[test]
    fn straight_arrow_is_one_segment() {
        let arrow = StyledArrow::new(Square::A1, Square::A4, ArrowColor::Green);
        assert_eq!(arrow.cal(), "Ga1a4");
    }

    #[test]
    fn knight_arrow_splits_through_intermediate() {
        // a1 -> c2 bends at c3: two steps out along each axis from the tail.
        let arrow = StyledArrow::new(Square::A1, Square::C2, ArrowColor::Green);
        assert_eq!(arrow.segments(), vec![(Square::A1, Square::C3), (Square::C3, Square::C2)]);
        assert_eq!(arrow.cal(), "Ga1c3Gc3c2");
    }

    #[test]
    fn knight_arrow_other_axis() {
        let arrow = StyledArrow::new(Square::A1, Square::B3, ArrowColor::Yellow);
        assert_eq!(arrow.cal(), "Ya1c3Yc3b3");
    }

    #[test]
    fn color_codes() {
        for (color, code) in [
            (ArrowColor::Green, 'G'),
            (ArrowColor::Red, 'R'),
            (ArrowColor::Yellow, 'Y'),
            (ArrowColor::Blue, 'B'),
        ] {
            let arrow = StyledArrow::new(Square::E2, Square::E4, color);
            assert!(arrow.cal().starts_with(code));
        }
    }

    #[test]
    fn ordering_is_by_index_sum_then_squares() {
        let low = StyledArrow::new(Square::A1, Square::B1, ArrowColor::Green);
        let high = StyledArrow::new(Square::H8, Square::G8, ArrowColor::Green);
        assert!(low < high);

        // Same index sum, tie broken by tail then head.
        let left = StyledArrow::new(Square::A1, Square::D1, ArrowColor::Green);
        let right = StyledArrow::new(Square::B1, Square::C1, ArrowColor::Green);
        assert_eq!(left.value(), right.value());
        assert!(left < right);
    }

    #[test]
    fn sorting_is_input_order_independent() {
        let a = StyledArrow::new(Square::D4, Square::D6, ArrowColor::Green);
        let b = StyledArrow::new(Square::A1, Square::A2, ArrowColor::Red);
        let c = StyledArrow::new(Square::H7, Square::H8, ArrowColor::Yellow);

        let mut one = vec![a, b, c];
        let mut two = vec![c, a, b];
        one.sort();
        two.sort();
        assert_eq!(one, two);
    }
}
