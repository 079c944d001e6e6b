use std::io::Cursor;
use std::process::Command;

use regex::Regex;

use super::{
    AudioClip, SpeechError, SpeechParams, SpeechResult, VoiceGender, VoiceInfo,
    BASE_WORDS_PER_MINUTE,
};

/// A speech synthesis backend: turns one chunk of text into audio.
pub trait Synthesizer: Send {
    fn name(&self) -> &str;

    /// List the voices the engine offers
    fn voices(&self) -> SpeechResult<Vec<VoiceInfo>>;

    /// Render one chunk of text with the given parameters
    fn synthesize(&self, text: &str, params: &SpeechParams) -> SpeechResult<AudioClip>;
}

/// Create the platform synthesizer.
pub fn create_synthesizer() -> SpeechResult<Box<dyn Synthesizer>> {
    match EspeakSynthesizer::locate() {
        Some(engine) => Ok(Box::new(engine)),
        None => Err(SpeechError::EngineNotAvailable(
            "espeak-ng not found. Please install espeak-ng or espeak.".to_string(),
        )),
    }
}

/// eSpeak NG driven as a child process: text in via argv, WAV out via stdout.
pub struct EspeakSynthesizer {
    command: String,
}

impl EspeakSynthesizer {
    /// Find a usable espeak binary, preferring espeak-ng
    pub fn locate() -> Option<Self> {
        ["espeak-ng", "espeak"]
            .iter()
            .find(|cmd| {
                Command::new(*cmd)
                    .arg("--version")
                    .output()
                    .map(|out| out.status.success())
                    .unwrap_or(false)
            })
            .map(|cmd| Self {
                command: cmd.to_string(),
            })
    }

    #[cfg(test)]
    fn with_command(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }

    /// Map slider-range parameters onto espeak's units.
    ///
    /// Rate 1.0x becomes 175 wpm (espeak's default), clamped to the 80-450
    /// range espeak accepts. Pitch 0.0-2.0 maps to 0-99, volume 0.0-1.0 to
    /// amplitude 0-200 with 1.0 at the engine default of 100.
    fn build_args(&self, text: &str, params: &SpeechParams) -> Vec<String> {
        let mut args = vec!["--stdout".to_string()];

        if let Some(voice_id) = &params.voice_id {
            args.push("-v".to_string());
            args.push(voice_id.clone());
        }

        let wpm = (BASE_WORDS_PER_MINUTE as f32 * params.rate).round() as i32;
        args.push("-s".to_string());
        args.push(wpm.clamp(80, 450).to_string());

        let pitch = (params.pitch * 50.0).round() as i32;
        args.push("-p".to_string());
        args.push(pitch.clamp(0, 99).to_string());

        let amplitude = (params.volume * 100.0).round() as i32;
        args.push("-a".to_string());
        args.push(amplitude.clamp(0, 200).to_string());

        args.push(text.to_string());
        args
    }
}

impl Synthesizer for EspeakSynthesizer {
    fn name(&self) -> &str {
        &self.command
    }

    fn voices(&self) -> SpeechResult<Vec<VoiceInfo>> {
        let output = Command::new(&self.command).arg("--voices").output()?;
        if !output.status.success() {
            return Err(SpeechError::Synthesis(format!(
                "{} --voices exited with {}",
                self.command, output.status
            )));
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        let voices = parse_voice_list(&listing);
        tracing::debug!("{} reported {} voices", self.command, voices.len());
        Ok(voices)
    }

    fn synthesize(&self, text: &str, params: &SpeechParams) -> SpeechResult<AudioClip> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let args = self.build_args(text, params);
        let output = Command::new(&self.command).args(&args).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::Synthesis(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(SpeechError::Synthesis(
                "engine produced no audio data".to_string(),
            ));
        }

        decode_wav(&output.stdout)
    }
}

/// Decode the WAV stream espeak writes to stdout.
///
/// espeak cannot seek a pipe, so the header carries a placeholder data
/// length; samples are read until the stream ends rather than trusting it.
fn decode_wav(bytes: &[u8]) -> SpeechResult<AudioClip> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map_while(Result::ok)
                .map(|s| s as f32 / max)
                .collect()
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map_while(Result::ok)
            .collect(),
    };

    if samples.is_empty() {
        return Err(SpeechError::Synthesis(
            "decoded audio contained no samples".to_string(),
        ));
    }

    Ok(AudioClip {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Parse `espeak --voices` output.
///
/// Columns: Pty Language Age/Gender VoiceName File. espeak-ng prints the
/// gender as `--/M`, older espeak as a bare `M`.
fn parse_voice_list(listing: &str) -> Vec<VoiceInfo> {
    let line_re = Regex::new(r"^\s*\d+\s+([a-zA-Z][a-zA-Z0-9-]*)\s+(\S+)\s+(\S+)").unwrap();

    let mut voices: Vec<VoiceInfo> = Vec::new();
    for line in listing.lines().skip(1) {
        let Some(captures) = line_re.captures(line) else {
            continue;
        };

        let language = captures[1].to_string();
        let gender = match &captures[2] {
            g if g.contains('M') => VoiceGender::Male,
            g if g.contains('F') => VoiceGender::Female,
            _ => VoiceGender::Unknown,
        };
        let name = captures[3].replace('_', " ");

        // One entry per language code; espeak lists variants separately
        if voices.iter().any(|v| v.id == language) {
            continue;
        }

        voices.push(VoiceInfo {
            id: language.clone(),
            name,
            language,
            gender,
        });
    }

    voices
}
