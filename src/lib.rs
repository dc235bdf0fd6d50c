//! Assembles narrated chess puzzle videos from scripted scenes.
//!
//! A puzzle script is a plain binary that builds a [`models::PuzzleVideo`]
//! scene by scene against a shared board, then calls `generate`. Every
//! expensive product (narration audio, board images, scene clips, the final
//! composite) is cached on disk under a content hash, so re-running a script
//! after editing one line of narration redoes only the work that line
//! touches.

pub mod annotations;
pub mod board;
pub mod config;
pub mod media;
pub mod models;
pub mod render;
pub mod tts;
pub mod upload;

use std::path::PathBuf;

use anyhow::Result;

use config::Config;
use media::Ffmpeg;
use render::{RsvgConvert, SvgRasterizer};
use tts::{ElevenLabs, SpeechSynthesizer};
use upload::YouTubeUploader;

/// The external collaborators every build step draws on.
///
/// Built once per script run from [`Config`]. The synthesizer and the
/// rasterizer are boxed so tests can substitute fakes that never touch the
/// network or spawn processes.
pub struct Pipeline {
    pub ffmpeg: Ffmpeg,
    pub rasterizer: Box<dyn SvgRasterizer>,
    pub tts: Box<dyn SpeechSynthesizer>,
    pub uploader: Option<YouTubeUploader>,
    pub narrations_dir: PathBuf,
}

impl Pipeline {
    pub fn from_config(config: &Config) -> Result<Pipeline> {
        Ok(Pipeline {
            ffmpeg: Ffmpeg::new(config.ffmpeg_bin.as_str(), config.ffprobe_bin.as_str()),
            rasterizer: Box::new(RsvgConvert::new(&config.rsvg_convert_bin)),
            tts: Box::new(ElevenLabs::new(config.elevenlabs_api_key.clone())),
            uploader: config
                .youtube_access_token
                .as_deref()
                .map(YouTubeUploader::new),
            narrations_dir: config.narrations_dir.clone(),
        })
    }
}
