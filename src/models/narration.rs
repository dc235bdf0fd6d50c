use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::media::AudioClip;
use crate::tts::SpeechSynthesizer;
use crate::Pipeline;

/// One spoken line bound to a voice. The cache path is a pure function of
/// (voice, text): identical text in the same voice never synthesizes twice,
/// across runs included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narration {
    text: String,
    voice_id: String,
}

impl Narration {
    /// Narration scripts are indented multi-line literals; normalize them
    /// the way a docstring would be: trim, then strip the common leading
    /// whitespace from continuation lines.
    pub fn new(text: &str, voice_id: &str) -> Narration {
        Narration {
            text: cleandoc(text),
            voice_id: voice_id.to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    pub fn audio_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn audio_path(&self, narrations_dir: &Path) -> PathBuf {
        narrations_dir
            .join(&self.voice_id)
            .join(format!("{}.mp3", self.audio_hash()))
    }

    fn normalized_audio_path(&self, narrations_dir: &Path) -> PathBuf {
        narrations_dir
            .join(&self.voice_id)
            .join(format!("{}.norm.mp3", self.audio_hash()))
    }

    /// Make sure the raw synthesized audio exists, synthesizing only on a
    /// cache miss. Returns the cached path.
    pub fn ensure_audio(
        &self,
        tts: &dyn SpeechSynthesizer,
        narrations_dir: &Path,
    ) -> Result<PathBuf> {
        let path = self.audio_path(narrations_dir);
        let dir = path.parent().expect("narration path always has a parent");
        fs::create_dir_all(dir)
            .with_context(|| format!("creating narration cache dir {}", dir.display()))?;

        if path.exists() {
            debug!("narration cache hit: {}", path.display());
        } else {
            info!("narration cache miss, synthesizing: {:?}", self.text);
            tts.synthesize(&self.text, &path, &self.voice_id)?;
        }
        Ok(path)
    }

    /// Synthesize (if needed), loudness-normalize (if needed), and return a
    /// playable handle. Idempotent for unchanged (text, voice).
    pub fn generate(&self, pipeline: &Pipeline) -> Result<AudioClip> {
        let raw = self.ensure_audio(pipeline.tts.as_ref(), &pipeline.narrations_dir)?;

        let normalized = self.normalized_audio_path(&pipeline.narrations_dir);
        if !normalized.exists() {
            pipeline
                .ffmpeg
                .normalize_audio(&raw, &normalized)
                .with_context(|| format!("normalizing {}", raw.display()))?;
        }

        Ok(AudioClip::open(&pipeline.ffmpeg, &normalized)?)
    }
}

/// Equivalent of Python's `inspect.cleandoc`, which the narration literals
/// were written for: leading/trailing whitespace is trimmed and the common
/// indentation of continuation lines is removed.
fn cleandoc(text: &str) -> String {
    let text = text.trim();
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default().trim_end();

    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = String::from(first);
    for line in rest {
        out.push('\n');
        if line.len() >= indent {
            out.push_str(line[indent..].trim_end());
        } else {
            out.push_str(line.trim_end());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingSynth {
        calls: Cell<usize>,
    }

    impl CountingSynth {
        fn new() -> CountingSynth {
            CountingSynth { calls: Cell::new(0) }
        }
    }

    impl SpeechSynthesizer for CountingSynth {
        fn synthesize(&self, _text: &str, output: &Path, _voice_id: &str) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            fs::write(output, b"fake mp3")?;
            Ok(())
        }
    }

    #[test]
    fn cleandoc_strips_common_indentation() {
        let raw = "\n        What are you willing to sacrifice?\n    ";
        assert_eq!(cleandoc(raw), "What are you willing to sacrifice?");

        let multi = "\n        first line\n        second line\n            indented more\n    ";
        assert_eq!(cleandoc(multi), "first line\nsecond line\n    indented more");
    }

    #[test]
    fn audio_path_is_deterministic() {
        let dir = Path::new("/tmp/narrations");
        let a = Narration::new("Rook to b7.", "voice-1");
        let b = Narration::new("  Rook to b7.  ", "voice-1");

        assert_eq!(a.audio_path(dir), b.audio_path(dir));
        assert!(a
            .audio_path(dir)
            .starts_with("/tmp/narrations/voice-1"));
    }

    #[test]
    fn different_voice_different_path() {
        let dir = Path::new("/tmp/narrations");
        let a = Narration::new("Rook to b7.", "voice-1");
        let b = Narration::new("Rook to b7.", "voice-2");
        assert_ne!(a.audio_path(dir), b.audio_path(dir));
        assert_eq!(a.audio_hash(), b.audio_hash());
    }

    #[test]
    fn ensure_audio_synthesizes_at_most_once() {
        let dir = tempfile::tempdir().unwrap();
        let narration = Narration::new("Black takes the undefended rook.", "voice-1");
        let synth = CountingSynth::new();

        let first = narration.ensure_audio(&synth, dir.path()).unwrap();
        let second = narration.ensure_audio(&synth, dir.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(synth.calls.get(), 1);
    }

    #[test]
    fn changed_text_changes_hash() {
        let a = Narration::new("one", "v");
        let b = Narration::new("two", "v");
        assert_ne!(a.audio_hash(), b.audio_hash());
    }
}
