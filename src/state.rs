use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::speech::session::ReaderSession;
use crate::speech::{SpeechParams, VoiceInfo};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppStatus {
    Idle,
    Extracting,
    Speaking,
    Paused,
}

impl Default for AppStatus {
    fn default() -> Self {
        Self::Idle
    }
}

/// Spoken-position tracking for the active utterance.
///
/// Pause keeps the position; stop and natural completion reset it.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PlaybackProgress {
    pub char_index: usize,
    pub total_chars: usize,
}

impl PlaybackProgress {
    pub fn new(total_chars: usize) -> Self {
        Self {
            char_index: 0,
            total_chars,
        }
    }

    pub fn percent(&self) -> f32 {
        if self.total_chars == 0 {
            return 0.0;
        }
        (self.char_index as f32 / self.total_chars as f32) * 100.0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Summary of the currently loaded PDF, kept for the status surface
#[derive(Debug, Clone, Serialize)]
pub struct LoadedDocument {
    pub file_name: String,
    pub page_count: usize,
    pub char_count: usize,
}

pub struct AppState {
    pub status: Mutex<AppStatus>,
    pub settings: Mutex<Settings>,
    pub document: Mutex<Option<LoadedDocument>>,
    pub progress: Mutex<PlaybackProgress>,
    pub reader_session: Mutex<Option<ReaderSession>>,
    pub voice_cache: Mutex<Option<Vec<VoiceInfo>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            status: Mutex::new(AppStatus::default()),
            settings: Mutex::new(Settings::default()),
            document: Mutex::new(None),
            progress: Mutex::new(PlaybackProgress::default()),
            reader_session: Mutex::new(None),
            voice_cache: Mutex::new(None),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub speech: SpeechSettings,
    #[serde(default)]
    pub reader: ReaderSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speech: SpeechSettings::default(),
            reader: ReaderSettings::default(),
        }
    }
}

/// The voice picker and the three sliders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechSettings {
    pub voice_id: Option<String>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            voice_id: None,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

impl SpeechSettings {
    /// Clamp to the UI slider ranges: rate 0.5-2.0, pitch 0.0-2.0,
    /// volume 0.0-1.0
    pub fn clamped(mut self) -> Self {
        self.rate = self.rate.clamp(0.5, 2.0);
        self.pitch = self.pitch.clamp(0.0, 2.0);
        self.volume = self.volume.clamp(0.0, 1.0);
        self
    }

    pub fn to_params(&self) -> SpeechParams {
        let clamped = self.clone().clamped();
        SpeechParams {
            voice_id: clamped.voice_id,
            rate: clamped.rate,
            pitch: clamped.pitch,
            volume: clamped.volume,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderSettings {
    pub preferred_language: String,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            preferred_language: "en".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percent_is_zero_for_empty_text() {
        let progress = PlaybackProgress::default();
        assert_eq!(progress.percent(), 0.0);
    }

    #[test]
    fn progress_percent_tracks_position() {
        let progress = PlaybackProgress {
            char_index: 25,
            total_chars: 100,
        };
        assert_eq!(progress.percent(), 25.0);
    }

    #[test]
    fn progress_reset_zeroes_position() {
        let mut progress = PlaybackProgress {
            char_index: 42,
            total_chars: 100,
        };
        progress.reset();
        assert_eq!(progress.char_index, 0);
        assert_eq!(progress.total_chars, 0);
    }

    #[test]
    fn speech_settings_clamp_to_slider_ranges() {
        let settings = SpeechSettings {
            voice_id: None,
            rate: 3.5,
            pitch: -1.0,
            volume: 2.0,
        }
        .clamped();
        assert_eq!(settings.rate, 2.0);
        assert_eq!(settings.pitch, 0.0);
        assert_eq!(settings.volume, 1.0);
    }

    #[test]
    fn settings_deserialize_with_missing_sections() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.speech.rate, 1.0);
        assert_eq!(settings.reader.preferred_language, "en");
    }
}
