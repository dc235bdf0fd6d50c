use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chess::Color;
use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::annotations::StyledArrow;
use crate::board::{Board, SharedBoard};
use crate::media::{SceneComposition, VideoClip};
use crate::models::Narration;
use crate::render;
use crate::Pipeline;

/// Default gap of silence appended after each narrated line.
pub const DEFAULT_PAUSE: f64 = 0.25;

/// One narrated board snapshot rendered as a short clip.
///
/// The board is copied out of the shared cell at construction, so scenes
/// are unaffected by moves later reverted by `Position` guards. The clip is
/// cached on disk keyed by a digest of (narration, position, annotations).
#[derive(Debug, Clone)]
pub struct Scene {
    pub name: String,
    pub narration: Narration,
    board: Board,
    arrows: Vec<StyledArrow>,
    orientation: Color,
    output_dir: PathBuf,
    pause_duration: f64,
}

impl Scene {
    pub fn new(
        name: &str,
        narration: Narration,
        board: &SharedBoard,
        arrows: Vec<StyledArrow>,
        orientation: Color,
        output_dir: &Path,
    ) -> Result<Scene> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("creating scene output dir {}", output_dir.display()))?;
        Ok(Scene {
            name: name.to_string(),
            narration,
            board: board.borrow().clone(),
            arrows,
            orientation,
            output_dir: output_dir.to_path_buf(),
            pause_duration: DEFAULT_PAUSE,
        })
    }

    pub fn set_pause_duration(&mut self, seconds: f64) {
        self.pause_duration = seconds;
    }

    pub fn pause_duration(&self) -> f64 {
        self.pause_duration
    }

    pub fn fen(&self) -> String {
        self.board.fen()
    }

    /// Annotations in canonical order, so semantically identical scenes hash
    /// identically regardless of how their arrow lists were assembled.
    fn sorted_arrows(&self) -> Vec<StyledArrow> {
        let mut arrows = self.arrows.clone();
        arrows.sort();
        arrows
    }

    fn arrows_key(&self) -> String {
        self.sorted_arrows()
            .iter()
            .map(StyledArrow::cal)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Digest of (narration hash, position, canonical annotation set).
    pub fn video_hash(&self) -> String {
        let key = format!(
            "{}-{}-[{}]",
            self.narration.audio_hash(),
            self.board.fen(),
            self.arrows_key()
        );
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn video_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.mp4", self.video_hash()))
    }

    /// Digest of (position, canonical annotation set) only: identical boards
    /// with different narration share the same rendered image.
    fn board_image_hash(&self) -> String {
        let key = format!("{}-[{}]", self.board.fen(), self.arrows_key());
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn board_image_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.png", self.board_image_hash()))
    }

    fn ensure_board_image(&self, pipeline: &Pipeline, size: u32) -> Result<PathBuf> {
        let path = self.board_image_path();
        if path.exists() {
            debug!("board image cache hit: {}", path.display());
            return Ok(path);
        }

        // Canonical arrow order, same as the cache key: the rendered bytes
        // must be a pure function of the key, arrow z-order included.
        let svg = render::board_svg(
            &self.board,
            self.orientation,
            &self.sorted_arrows(),
            self.board.last_move(),
            size,
        );
        pipeline
            .rasterizer
            .rasterize(&svg, &path, size)
            .with_context(|| format!("rasterizing board to {}", path.display()))?;
        Ok(path)
    }

    /// Render (or reuse) this scene's clip at the target frame size and
    /// return a fresh handle to it.
    pub fn generate(&self, pipeline: &Pipeline, height: u32, width: u32) -> Result<VideoClip> {
        let video_path = self.video_path();
        if !video_path.exists() {
            info!("rendering scene '{}' -> {}", self.name, video_path.display());
            let audio = self.narration.generate(pipeline)?;
            let board_image = self.ensure_board_image(pipeline, width - BOARD_INSET)?;

            let spec = SceneComposition {
                board_image: &board_image,
                narration_audio: &audio.path,
                narration_duration: audio.duration,
                pause_duration: self.pause_duration,
                title: &self.name,
                caption: self.narration.text(),
                width,
                height,
            };
            pipeline
                .ffmpeg
                .compose_scene(&spec, &video_path)
                .with_context(|| format!("composing scene '{}'", self.name))?;
        } else {
            debug!("scene cache hit: {}", video_path.display());
        }

        Ok(VideoClip::open(&pipeline.ffmpeg, &video_path)?)
    }
}

/// Horizontal inset of the board within the frame.
const BOARD_INSET: u32 = 64;
