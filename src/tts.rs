//! Speech synthesis collaborator.
//!
//! The pipeline only needs "text in, mp3 at this path out"; the trait keeps
//! narration caching testable without network access.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;

const API_BASE: &str = "https://api.elevenlabs.io/v1/text-to-speech";
const MODEL_ID: &str = "eleven_monolingual_v1";

pub trait SpeechSynthesizer {
    /// Synthesize `text` in the given voice and write the audio to `output`.
    /// Any synthesis failure is fatal: there is no fallback voice.
    fn synthesize(&self, text: &str, output: &Path, voice_id: &str) -> Result<()>;
}

/// ElevenLabs text-to-speech over their blocking HTTP API.
pub struct ElevenLabs {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
}

impl ElevenLabs {
    pub fn new(api_key: Option<String>) -> ElevenLabs {
        ElevenLabs {
            client: reqwest::blocking::Client::new(),
            api_key,
        }
    }
}

impl SpeechSynthesizer for ElevenLabs {
    fn synthesize(&self, text: &str, output: &Path, voice_id: &str) -> Result<()> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("ELEVENLABS_API_KEY is not configured and narration is not cached");
        };

        info!("synthesizing {} chars with voice {voice_id}", text.len());
        let response = self
            .client
            .post(format!("{API_BASE}/{voice_id}"))
            .header("xi-api-key", api_key)
            .json(&serde_json::json!({
                "text": text,
                "model_id": MODEL_ID,
            }))
            .send()
            .context("speech synthesis request failed")?
            .error_for_status()
            .context("speech synthesis rejected")?;

        let audio = response.bytes().context("reading synthesized audio")?;
        fs::write(output, &audio)
            .with_context(|| format!("writing narration to {}", output.display()))?;
        Ok(())
    }
}
