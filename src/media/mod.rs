pub mod ffmpeg;

use std::path::{Path, PathBuf};

pub use ffmpeg::{BackgroundSource, Ffmpeg, FfmpegError, MediaInfo, SceneComposition, FRAME_RATE};

/// Handle to an audio file on disk with its probed duration.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub path: PathBuf,
    pub duration: f64,
}

impl AudioClip {
    pub fn open(ffmpeg: &Ffmpeg, path: &Path) -> Result<AudioClip, FfmpegError> {
        let info = ffmpeg.probe(path)?;
        Ok(AudioClip {
            path: path.to_path_buf(),
            duration: info.duration,
        })
    }
}

/// Handle to a video file on disk. Reopening after a write guarantees a
/// fresh handle with no dangling encoder state.
#[derive(Debug, Clone)]
pub struct VideoClip {
    pub path: PathBuf,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoClip {
    pub fn open(ffmpeg: &Ffmpeg, path: &Path) -> Result<VideoClip, FfmpegError> {
        let info = ffmpeg.probe(path)?;
        match (info.width, info.height) {
            (Some(width), Some(height)) => Ok(VideoClip {
                path: path.to_path_buf(),
                duration: info.duration,
                width,
                height,
            }),
            _ => Err(FfmpegError::MissingStream("video")),
        }
    }
}
