pub mod narration;
pub mod position;
pub mod puzzle;
pub mod scene;
pub mod video;

pub use narration::Narration;
pub use position::Position;
pub use puzzle::{Difficulty, Puzzle};
pub use scene::Scene;
pub use video::PuzzleVideo;
