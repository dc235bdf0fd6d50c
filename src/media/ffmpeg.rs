//! Blocking ffmpeg/ffprobe command layer.
//!
//! Every operation the timeline assembler needs — probing, loudness
//! normalization, scene composition, concatenation, and the final background
//! mix — is a single external invocation built here. Failures carry the exit
//! code and stderr and propagate untouched.

use std::fs;
use std::path::Path;
use std::process::Command;

use log::debug;
use serde::Deserialize;

pub const FRAME_RATE: u32 = 24;

#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffmpeg/ffprobe binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffmpeg/ffprobe execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("media file not found: {0}")]
    MediaNotFound(String),

    #[error("no {0} stream in probed file")]
    MissingStream(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probed facts about a media file.
#[derive(Debug, Clone, Copy)]
pub struct MediaInfo {
    pub duration: f64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Everything needed to compose one scene clip: the board still, the
/// narration audio, the text overlays, and the fixed vertical layout.
#[derive(Debug)]
pub struct SceneComposition<'a> {
    pub board_image: &'a Path,
    pub narration_audio: &'a Path,
    pub narration_duration: f64,
    pub pause_duration: f64,
    pub title: &'a str,
    pub caption: &'a str,
    pub width: u32,
    pub height: u32,
}

// Fixed layout offsets, measured from the 1080x1920 target the original
// videos were produced at. The board is inset by half the margin and the
// text bands sit below it.
const BOARD_MARGIN: u32 = 64;
const TITLE_BAND_HEIGHT: u32 = 72;
const TITLE_FONT_SIZE: u32 = 54;
const CAPTION_FONT_SIZE: u32 = 36;

/// Volume applied to background music when mixed under narration.
pub const MUSIC_VOLUME: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

impl Ffmpeg {
    pub fn new(ffmpeg_bin: impl Into<String>, ffprobe_bin: impl Into<String>) -> Ffmpeg {
        Ffmpeg {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    fn run(&self, bin: &str, args: &[String]) -> Result<Vec<u8>, FfmpegError> {
        debug!("running {bin} {}", args.join(" "));
        let output = Command::new(bin)
            .args(args)
            .output()
            .map_err(FfmpegError::NotFound)?;

        if !output.status.success() {
            return Err(FfmpegError::ExecutionFailed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        Ok(output.stdout)
    }

    fn run_ffmpeg(&self, args: Vec<String>) -> Result<(), FfmpegError> {
        let bin = self.ffmpeg_bin.clone();
        self.run(&bin, &args).map(|_| ())
    }

    /// Run ffprobe and return duration plus video dimensions when present.
    pub fn probe(&self, path: &Path) -> Result<MediaInfo, FfmpegError> {
        if !path.exists() {
            return Err(FfmpegError::MediaNotFound(path.display().to_string()));
        }

        let args = vec![
            "-v".into(),
            "quiet".into(),
            "-print_format".into(),
            "json".into(),
            "-show_format".into(),
            "-show_streams".into(),
            path.display().to_string(),
        ];
        let bin = self.ffprobe_bin.clone();
        let stdout = self.run(&bin, &args)?;
        let parsed: FfprobeOutput = serde_json::from_slice(&stdout)
            .map_err(|err| FfmpegError::ParseError(err.to_string()))?;

        let duration = parsed
            .format
            .duration
            .as_deref()
            .or_else(|| {
                parsed
                    .streams
                    .iter()
                    .find_map(|stream| stream.duration.as_deref())
            })
            .and_then(|raw| raw.parse::<f64>().ok())
            .ok_or_else(|| FfmpegError::ParseError("no parseable duration".into()))?;

        let video = parsed
            .streams
            .iter()
            .find(|stream| stream.codec_type.as_deref() == Some("video"));

        Ok(MediaInfo {
            duration,
            width: video.and_then(|stream| stream.width),
            height: video.and_then(|stream| stream.height),
        })
    }

    pub fn video_dimensions(&self, path: &Path) -> Result<(u32, u32), FfmpegError> {
        let info = self.probe(path)?;
        match (info.width, info.height) {
            (Some(width), Some(height)) => Ok((width, height)),
            _ => Err(FfmpegError::MissingStream("video")),
        }
    }

    /// EBU R128 loudness normalization into a new file.
    pub fn normalize_audio(&self, input: &Path, output: &Path) -> Result<(), FfmpegError> {
        self.run_ffmpeg(vec![
            "-y".into(),
            "-i".into(),
            input.display().to_string(),
            "-af".into(),
            "loudnorm".into(),
            output.display().to_string(),
        ])
    }

    /// Compose one scene clip: black canvas, board still, title and caption
    /// bands, narration audio padded with the inter-scene pause. The clip
    /// duration is exactly narration + pause.
    pub fn compose_scene(&self, spec: &SceneComposition, output: &Path) -> Result<(), FfmpegError> {
        let (width, height) = (spec.width, spec.height);
        let (narration_duration, pause_duration) = (spec.narration_duration, spec.pause_duration);

        let board_x = BOARD_MARGIN / 2;
        let board_y = BOARD_MARGIN;
        let title_y = BOARD_MARGIN + width;
        let caption_y = title_y + BOARD_MARGIN + TITLE_BAND_HEIGHT + BOARD_MARGIN;
        let duration = narration_duration + pause_duration;

        let caption = wrap_text(spec.caption, 40);
        let filter = format!(
            "color=c=black:size={width}x{height}:rate={FRAME_RATE}[canvas];\
             [canvas][0:v]overlay=x={board_x}:y={board_y}[boarded];\
             [boarded]drawtext=text='{title}':font=sans:fontsize={TITLE_FONT_SIZE}:\
fontcolor=white:box=1:boxcolor=black:x=(w-text_w)/2:y={title_y}[titled];\
             [titled]drawtext=text='{caption}':font=sans:fontsize={CAPTION_FONT_SIZE}:\
fontcolor=white:box=1:boxcolor=black:x=(w-text_w)/2:y={caption_y}[v];\
             [1:a]apad=pad_dur={pause_duration}[a]",
            title = escape_drawtext(spec.title),
            caption = escape_drawtext(&caption),
        );

        self.run_ffmpeg(vec![
            "-y".into(),
            "-loop".into(),
            "1".into(),
            "-i".into(),
            spec.board_image.display().to_string(),
            "-i".into(),
            spec.narration_audio.display().to_string(),
            "-filter_complex".into(),
            filter,
            "-map".into(),
            "[v]".into(),
            "-map".into(),
            "[a]".into(),
            "-t".into(),
            format!("{duration:.3}"),
            "-r".into(),
            FRAME_RATE.to_string(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-c:a".into(),
            "aac".into(),
            output.display().to_string(),
        ])
    }

    /// Concatenate clips produced by this pipeline (identical encoder
    /// settings) with the concat demuxer, stream-copied.
    pub fn concat_clips(&self, clips: &[&Path], output: &Path) -> Result<(), FfmpegError> {
        let list_path = output.with_extension("txt");
        let mut list = String::new();
        for clip in clips {
            let absolute = fs::canonicalize(clip)?;
            list.push_str(&format!("file '{}'\n", absolute.display()));
        }
        fs::write(&list_path, list)?;

        self.run_ffmpeg(vec![
            "-y".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list_path.display().to_string(),
            "-c".into(),
            "copy".into(),
            output.display().to_string(),
        ])
    }

    /// Final assembly: loop the background video under the scene track,
    /// loop the music and truncate it to the narration duration, and mix it
    /// quietly under the narration. Output duration equals the scene track.
    pub fn composite_over_background(
        &self,
        background_video: &BackgroundSource,
        scene_track: &Path,
        background_music: &Path,
        duration: f64,
        output: &Path,
    ) -> Result<(), FfmpegError> {
        let mut args: Vec<String> = vec!["-y".into()];

        match background_video {
            BackgroundSource::File(path) => {
                args.extend([
                    "-stream_loop".into(),
                    "-1".into(),
                    "-i".into(),
                    path.display().to_string(),
                ]);
            }
            BackgroundSource::Black { width, height } => {
                args.extend([
                    "-f".into(),
                    "lavfi".into(),
                    "-i".into(),
                    format!("color=c=black:size={width}x{height}:rate={FRAME_RATE}"),
                ]);
            }
        }

        args.extend([
            "-i".into(),
            scene_track.display().to_string(),
            "-stream_loop".into(),
            "-1".into(),
            "-i".into(),
            background_music.display().to_string(),
        ]);

        let filter = format!(
            "[0:v][1:v]overlay=x=0:y=0[v];\
             [2:a]loudnorm,volume={MUSIC_VOLUME}[music];\
             [music][1:a]amix=inputs=2:duration=shortest:normalize=0[a]"
        );

        args.extend([
            "-filter_complex".into(),
            filter,
            "-map".into(),
            "[v]".into(),
            "-map".into(),
            "[a]".into(),
            "-t".into(),
            format!("{duration:.3}"),
            "-r".into(),
            FRAME_RATE.to_string(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-c:a".into(),
            "aac".into(),
            output.display().to_string(),
        ]);

        self.run_ffmpeg(args)
    }
}

/// Background video track: either a real file, looped, or a solid black
/// canvas of the target dimensions.
#[derive(Debug, Clone)]
pub enum BackgroundSource {
    File(std::path::PathBuf),
    Black { width: u32, height: u32 },
}

impl BackgroundSource {
    pub fn dimensions(&self, ffmpeg: &Ffmpeg) -> Result<(u32, u32), FfmpegError> {
        match self {
            BackgroundSource::File(path) => ffmpeg.video_dimensions(path),
            BackgroundSource::Black { width, height } => Ok((*width, *height)),
        }
    }
}

/// Escape text for a single-quoted drawtext value inside a filtergraph.
/// Quoting makes `:`, `,` and friends literal; only quotes themselves,
/// backslashes, and the `%` expansion marker need care. Newlines are kept:
/// drawtext renders them as line breaks.
fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\'' => escaped.push_str("'\\''"),
            '\\' => escaped.push_str("\\\\"),
            '%' => escaped.push_str("\\%"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Greedy word wrap so long captions fit the vertical frame. drawtext does
/// not wrap on its own.
fn wrap_text(text: &str, max_chars: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    for source_line in text.lines() {
        let mut current = String::new();
        for word in source_line.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.len() + 1 + word.len() <= max_chars {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        lines.push(current);
    }
    lines.join("\n")
}
