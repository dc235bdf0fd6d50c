use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chess::{ChessMove, Color};

/// Rating tier, stepped at 1200 / 1800 / 2400 / 3000 / 4000.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Master,
    Grandmaster,
    Unknown,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Master => "master",
            Difficulty::Grandmaster => "grandmaster",
            Difficulty::Unknown => "?",
        };
        f.write_str(name)
    }
}

/// One chess puzzle: position, solution line, and rating metadata.
/// Constructed once per puzzle script and never mutated.
#[derive(Debug, Clone)]
pub struct Puzzle {
    pub id: String,
    pub fen: String,
    pub rating: u32,
    pub rating_deviation: u32,
    pub moves: Vec<String>,
    pub themes: Vec<String>,
}

impl Puzzle {
    pub fn difficulty(&self) -> Difficulty {
        match self.rating {
            0..=1199 => Difficulty::Easy,
            1200..=1799 => Difficulty::Medium,
            1800..=2399 => Difficulty::Hard,
            2400..=2999 => Difficulty::Master,
            3000..=3999 => Difficulty::Grandmaster,
            _ => Difficulty::Unknown,
        }
    }

    /// The camera perspective: the solver's side, which is the side that
    /// moves second in the solution line. White's perspective when the FEN
    /// has black to move, and vice versa.
    pub fn orientation(&self) -> Color {
        match self.fen.split_whitespace().nth(1) {
            Some("b") => Color::White,
            _ => Color::Black,
        }
    }

    /// Solution move at `index`, parsed from its UCI code.
    pub fn solution_move(&self, index: usize) -> Result<ChessMove> {
        let code = self
            .moves
            .get(index)
            .ok_or_else(|| anyhow!("puzzle {} has no solution move {index}", self.id))?;
        ChessMove::from_str(code).map_err(|err| anyhow!("invalid move code '{code}': {err}"))
    }

    /// Standard scene title: "Puzzle: hard (2040 elo)".
    pub fn scene_title(&self) -> String {
        format!("Puzzle: {} ({} elo)", self.difficulty(), self.rating)
    }
}
