//! Rook sacrifice into an unstoppable promotion (lichess 4aKI1).

use std::path::Path;

use anyhow::Result;
use chess::Square;

use zugzwang::annotations::{pin_annotation, threatened_targets};
use zugzwang::board::{describe_move, Board};
use zugzwang::config::Config;
use zugzwang::media::BackgroundSource;
use zugzwang::models::{Puzzle, PuzzleVideo};
use zugzwang::Pipeline;

fn main() -> Result<()> {
    env_logger::init();

    let puzzle = Puzzle {
        id: "4aKI1".into(),
        fen: "1r3k2/3R1ppp/p6P/4PpP1/P3pP2/8/8/6K1 b - - 0 31".into(),
        rating: 2040,
        rating_deviation: 88,
        moves: vec!["f8e8".into(), "d7b7".into(), "b8b7".into(), "h6g7".into()],
        themes: vec![
            "advancedPawn".into(),
            "crushing".into(),
            "endgame".into(),
            "rookEndgame".into(),
            "sacrifice".into(),
            "short".into(),
        ],
    };
    let title = puzzle.scene_title();
    let board = Board::shared_from_fen(&puzzle.fen)?;

    let mut video = PuzzleVideo::new(
        Path::new("data/puzzles/puzzle_4aki1"),
        "Daily Chess Puzzle",
        "follow for daily puzzles, and leave a comment with suggestions!",
        vec!["chess".into(), "chesspuzzle".into(), "puzzle".into()],
        "20",
        puzzle.clone(),
        "7vsrRG6Gg5O5RWIv2i0J",
        BackgroundSource::Black {
            width: 1080,
            height: 1920,
        },
        Path::new("data/music/dark.mp3"),
    )?;

    video.add_scene(
        "Daily Chess Puzzle",
        "What are you willing to sacrifice?",
        &board,
        vec![],
    )?;

    // The opponent's move that sets the puzzle.
    let setup = puzzle.solution_move(0)?;
    let move_name = {
        let mut b = board.borrow_mut();
        b.push(setup);
        describe_move(&b, setup)?
    };
    video.add_scene(&title, &format!("Black plays {move_name}."), &board, vec![])?;

    video.add_scene(
        &title,
        "We have an advanced pawn 2 moves away from promoting, \
         but black's rook covers the 8th rank.",
        &board,
        {
            let b = board.borrow();
            let mut arrows = threatened_targets(&b, Square::G7, usize::MAX);
            arrows.push(pin_annotation(Square::B8, Square::G8));
            arrows
        },
    )?;

    video.add_scene(
        &title,
        "Our rook is under attack, we can move it and force black to respond.",
        &board,
        threatened_targets(&board.borrow(), Square::D7, usize::MAX),
    )?;

    board.borrow_mut().push(puzzle.solution_move(1)?);
    video.add_scene(
        &title,
        "Rook to b7. Black cannot save the rook and prevent our pawn from promotion.",
        &board,
        {
            let b = board.borrow();
            let mut arrows = threatened_targets(&b, Square::B7, usize::MAX);
            arrows.extend(threatened_targets(&b, Square::G7, usize::MAX));
            arrows
        },
    )?;

    board.borrow_mut().push(puzzle.solution_move(2)?);
    video.add_scene(&title, "Black takes the undefended rook.", &board, vec![])?;

    board.borrow_mut().push(puzzle.solution_move(3)?);
    video.add_scene(
        &title,
        "We take the pawn, and black cannot stop promotion. GG.",
        &board,
        {
            let b = board.borrow();
            let mut arrows = threatened_targets(&b, Square::F8, usize::MAX);
            arrows.push(pin_annotation(Square::G7, Square::G8));
            arrows
        },
    )?;

    let config = Config::load(Path::new("config.json"))?;
    let pipeline = Pipeline::from_config(&config)?;
    let clip = video.generate(&pipeline, false)?;
    println!("{} ({:.1}s)", clip.path.display(), clip.duration);
    Ok(())
}
