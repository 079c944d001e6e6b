pub mod chunker;
pub mod session;
pub mod synthesizer;

use std::time::Duration;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Speech synthesis errors, surfaced to the UI as status messages
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("speech engine not available: {0}")]
    EngineNotAvailable(String),

    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error("voice not found: {0}")]
    VoiceNotFound(String),

    #[error("nothing to speak")]
    EmptyText,

    #[error("audio output error: {0}")]
    AudioOutput(String),

    #[error("failed to decode synthesized audio: {0}")]
    Decode(#[from] hound::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SpeechResult<T> = Result<T, SpeechError>;

/// A voice offered by the speech engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
    pub language: String,
    pub gender: VoiceGender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceGender {
    Male,
    Female,
    Unknown,
}

/// Parameters for one speech request: voice plus the three slider values.
///
/// Ranges match the UI: rate 0.5-2.0 (1.0 = normal), pitch 0.0-2.0,
/// volume 0.0-1.0. Backends map them to engine units at the seam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechParams {
    pub voice_id: Option<String>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechParams {
    fn default() -> Self {
        Self {
            voice_id: None,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// Decoded audio for one synthesized chunk
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioClip {
    /// Number of frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }
}

/// Words-per-minute at rate 1.0x; espeak's default speaking rate
pub const BASE_WORDS_PER_MINUTE: u32 = 175;

/// Filter voices to the preferred language, falling back to the full list
/// when nothing matches.
pub fn filter_voices(voices: &[VoiceInfo], preferred_language: &str) -> Vec<VoiceInfo> {
    let preferred: Vec<VoiceInfo> = voices
        .iter()
        .filter(|v| v.language.starts_with(preferred_language))
        .cloned()
        .collect();

    if preferred.is_empty() {
        voices.to_vec()
    } else {
        preferred
    }
}
