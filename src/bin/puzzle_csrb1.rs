//! Clearance sacrifice on g7 (lichess cSRB1), with side lines explored
//! through scoped position guards.

use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chess::{ChessMove, Square};

use zugzwang::annotations::{attackers_and_defenders, pin_annotation, threatened_targets};
use zugzwang::board::{describe_move, Board};
use zugzwang::config::Config;
use zugzwang::media::BackgroundSource;
use zugzwang::models::{Position, Puzzle, PuzzleVideo};
use zugzwang::Pipeline;

fn mv(code: &str) -> Result<ChessMove> {
    ChessMove::from_str(code).map_err(|err| anyhow!("invalid move code '{code}': {err}"))
}

fn main() -> Result<()> {
    env_logger::init();

    let puzzle = Puzzle {
        id: "cSRB1".into(),
        fen: "1r2r1k1/2q1bppp/2np1n2/2p2N2/2P1PP2/pP2BB1P/P6K/1R1Q2R1 b - - 1 23".into(),
        rating: 1946,
        rating_deviation: 111,
        moves: vec!["e7f8".into(), "g1g7".into(), "f8g7".into(), "d1g1".into()],
        themes: vec![
            "clearance".into(),
            "crushing".into(),
            "middlegame".into(),
            "sacrifice".into(),
            "short".into(),
        ],
    };
    let title = puzzle.scene_title();
    let board = Board::shared_from_fen(&puzzle.fen)?;

    let mut video = PuzzleVideo::new(
        Path::new("data/puzzles/puzzle_csrb1"),
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
        Path::new("data/music/dark_02.mp3"),
    )?;

    video.add_scene(
        "Daily Chess Puzzle",
        "Can you find the crushing move?",
        &board,
        vec![],
    )?;

    let setup = puzzle.solution_move(0)?;
    let move_name = {
        let mut b = board.borrow_mut();
        b.push(setup);
        describe_move(&b, setup)?
    };
    video.add_scene(&title, &format!("Black plays {move_name}."), &board, vec![])?;

    video.add_scene(
        &title,
        "Black reveals an attack on our pawn, and defends their own.",
        &board,
        {
            let b = board.borrow();
            let mut arrows = attackers_and_defenders(&b, Square::E4);
            arrows.extend(attackers_and_defenders(&b, Square::G7));
            arrows
        },
    )?;

    video.add_scene(
        &title,
        "But did they really defend it?",
        &board,
        vec![pin_annotation(Square::G1, Square::G8)],
    )?;

    {
        let _sac = Position::play(&board, puzzle.solution_move(1)?);
        video.add_scene(
            &title,
            "We take with check, sacrificing the rook.",
            &board,
            {
                let b = board.borrow();
                let mut arrows = threatened_targets(&b, Square::G7, usize::MAX);
                arrows.extend(attackers_and_defenders(&b, Square::G7));
                arrows
            },
        )?;

        {
            let _take = Position::play(&board, puzzle.solution_move(2)?);
            video.add_scene(
                &title,
                "Taking it seems like the obvious choice, but it's not great.",
                &board,
                vec![],
            )?;

            let _pin = Position::play(&board, puzzle.solution_move(3)?);
            video.add_scene(
                &title,
                "The queen returns to the g-file, and the bishop is pinned \
                 against the king.",
                &board,
                vec![pin_annotation(Square::G1, Square::G8)],
            )?;
        }

        video.add_scene(
            &title,
            "Black isn't forced to take the rook, but the alternatives are much worse.",
            &board,
            vec![],
        )?;

        {
            let _tuck = Position::play(&board, mv("g8h8")?);
            let scene = video.add_scene(
                &title,
                "Tucking the king into the corner leaves the rook loose on the 7th rank.",
                &board,
                vec![pin_annotation(Square::G7, Square::F7)],
            )?;
            scene.set_pause_duration(0.0);

            let _eat = Position::play(&board, mv("g7f7")?);
            video.add_scene(
                &title,
                "And it starts eating pawns with the king stuck in the corner.",
                &board,
                threatened_targets(&board.borrow(), Square::F7, 2),
            )?;
        }
    }

    let outro = video.add_scene("Follow For More", "Follow for daily puzzles.", &board, vec![])?;
    outro.set_pause_duration(0.5);

    let config = Config::load(Path::new("config.json"))?;
    let pipeline = Pipeline::from_config(&config)?;
    let clip = video.generate(&pipeline, false)?;
    println!("{} ({:.1}s)", clip.path.display(), clip.duration);
    Ok(())
}
