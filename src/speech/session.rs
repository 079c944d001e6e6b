use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use tauri::{AppHandle, Emitter, Manager};

use crate::audio::AudioPlayback;
use crate::state::{AppState, AppStatus, PlaybackProgress};

use super::chunker::{chunk_text, SpeechChunk};
use super::synthesizer::create_synthesizer;
use super::{SpeechError, SpeechParams, SpeechResult};

/// Control messages accepted by a running reader session
pub enum SessionControl {
    Pause,
    Resume,
    Stop,
}

/// Interval at which the session thread services control messages and
/// emits boundary events
const TICK: Duration = Duration::from_millis(25);

/// Keep roughly this much audio queued ahead of the device
const LOOKAHEAD_SECS: usize = 1;

/// One utterance being read aloud.
///
/// The session runs on its own thread: it synthesizes chunk by chunk,
/// feeds the audio sink, and mirrors engine callbacks to the webview as
/// `speech-started`, `speech-boundary`, `speech-ended` and `speech-error`
/// events, with `playback-status` tracking every state change.
pub struct ReaderSession {
    control_tx: Sender<SessionControl>,
    handle: Option<JoinHandle<()>>,
}

impl ReaderSession {
    /// Chunk the text and start reading it aloud. Fails without issuing a
    /// speech request when the text contains nothing speakable.
    pub fn spawn(
        app_handle: AppHandle,
        text: &str,
        params: SpeechParams,
    ) -> SpeechResult<Self> {
        let chunks = chunk_text(text);
        if chunks.is_empty() {
            return Err(SpeechError::EmptyText);
        }
        let total_chars = text.chars().count();

        let (control_tx, control_rx) = mpsc::channel();
        let handle = std::thread::spawn(move || {
            run_session(app_handle, chunks, total_chars, params, control_rx);
        });

        Ok(Self {
            control_tx,
            handle: Some(handle),
        })
    }

    pub fn pause(&self) {
        let _ = self.control_tx.send(SessionControl::Pause);
    }

    pub fn resume(&self) {
        let _ = self.control_tx.send(SessionControl::Resume);
    }

    /// Stop playback and wait for the session thread to wind down
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.control_tx.send(SessionControl::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ReaderSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A word due to be announced once playback reaches its frame
#[derive(Debug, Clone, PartialEq)]
struct ScheduledWord {
    start_frame: u64,
    char_index: usize,
    text: String,
}

/// Apportion a chunk's audio across its words by character weight.
///
/// Process-driven engines report no per-word marks, so boundary timing
/// interpolates within the real duration of each synthesized clip and
/// re-anchors at every chunk start.
fn word_schedule(chunk: &SpeechChunk, start_frame: u64, chunk_frames: u64) -> Vec<ScheduledWord> {
    let total_weight: u64 = chunk
        .words
        .iter()
        .map(|w| w.text.chars().count() as u64 + 1)
        .sum();
    if total_weight == 0 {
        return Vec::new();
    }

    let mut schedule = Vec::with_capacity(chunk.words.len());
    let mut acc = 0u64;
    for word in &chunk.words {
        schedule.push(ScheduledWord {
            start_frame: start_frame + chunk_frames * acc / total_weight,
            char_index: word.char_index,
            text: word.text.clone(),
        });
        acc += word.text.chars().count() as u64 + 1;
    }
    schedule
}

fn run_session(
    app_handle: AppHandle,
    chunks: Vec<SpeechChunk>,
    total_chars: usize,
    params: SpeechParams,
    control_rx: Receiver<SessionControl>,
) {
    let synthesizer = match create_synthesizer() {
        Ok(s) => s,
        Err(e) => {
            fail_session(&app_handle, &e);
            return;
        }
    };

    {
        let state = app_handle.state::<AppState>();
        *state.progress.lock().unwrap() = PlaybackProgress::new(total_chars);
    }
    set_status(&app_handle, AppStatus::Speaking);
    let _ = app_handle.emit(
        "speech-started",
        serde_json::json!({ "total_chars": total_chars }),
    );
    tracing::info!(
        "Reader session started: {} chunks, {} chars",
        chunks.len(),
        total_chars
    );

    let mut playback: Option<AudioPlayback> = None;
    let mut schedule: VecDeque<ScheduledWord> = VecDeque::new();
    let mut frames_queued = 0u64;
    let mut chunk_iter = chunks.into_iter();
    let mut done_synthesizing = false;

    loop {
        // Synthesize ahead of the device, one chunk at a time
        while !done_synthesizing && needs_more(&playback) {
            let Some(chunk) = chunk_iter.next() else {
                done_synthesizing = true;
                break;
            };

            let clip = match synthesizer.synthesize(&chunk.text, &params) {
                Ok(clip) => clip,
                Err(e) => {
                    fail_session(&app_handle, &e);
                    return;
                }
            };

            if playback.is_none() {
                match AudioPlayback::new(clip.sample_rate) {
                    Ok(p) => playback = Some(p),
                    Err(e) => {
                        fail_session(
                            &app_handle,
                            &SpeechError::AudioOutput(format!("{:#}", e)),
                        );
                        return;
                    }
                }
            }

            if let Some(pb) = playback.as_ref() {
                schedule.extend(word_schedule(&chunk, frames_queued, clip.frame_count() as u64));
                frames_queued += clip.frame_count() as u64;
                pb.enqueue(&clip);
            }
        }

        match control_rx.recv_timeout(TICK) {
            Ok(SessionControl::Pause) => {
                if let Some(pb) = playback.as_ref() {
                    pb.pause();
                }
                set_status(&app_handle, AppStatus::Paused);
                tracing::info!("Playback paused");
            }
            Ok(SessionControl::Resume) => {
                if let Some(pb) = playback.as_ref() {
                    pb.resume();
                }
                set_status(&app_handle, AppStatus::Speaking);
                tracing::info!("Playback resumed");
            }
            Ok(SessionControl::Stop) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(pb) = playback.as_ref() {
                    pb.pause();
                    pb.clear();
                }
                reset_progress(&app_handle);
                set_status(&app_handle, AppStatus::Idle);
                tracing::info!("Playback stopped");
                return;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        // Announce every word playback has reached since the last tick
        let position = playback.as_ref().map_or(0, |pb| pb.position());
        while schedule.front().map_or(false, |w| w.start_frame <= position) {
            if let Some(word) = schedule.pop_front() {
                let percent = {
                    let state = app_handle.state::<AppState>();
                    let mut progress = state.progress.lock().unwrap();
                    progress.char_index = word.char_index;
                    progress.percent()
                };
                let _ = app_handle.emit(
                    "speech-boundary",
                    serde_json::json!({
                        "char_index": word.char_index,
                        "word": word.text,
                        "percent": percent,
                    }),
                );
            }
        }

        let drained = playback
            .as_ref()
            .map_or(true, |pb| pb.queued_frames() == 0 && !pb.is_paused());
        if done_synthesizing && drained {
            // Give the device buffer a moment to play out the tail
            std::thread::sleep(Duration::from_millis(150));
            reset_progress(&app_handle);
            set_status(&app_handle, AppStatus::Idle);
            let _ = app_handle.emit("speech-ended", serde_json::json!({}));
            tracing::info!("Reader session completed");
            return;
        }
    }
}

fn needs_more(playback: &Option<AudioPlayback>) -> bool {
    playback.as_ref().map_or(true, |pb| {
        pb.queued_frames() < pb.sample_rate() as usize * LOOKAHEAD_SECS
    })
}

fn set_status(app_handle: &AppHandle, status: AppStatus) {
    {
        let state = app_handle.state::<AppState>();
        *state.status.lock().unwrap() = status.clone();
    }
    let _ = app_handle.emit("playback-status", serde_json::json!({ "status": status }));
}

fn reset_progress(app_handle: &AppHandle) {
    let state = app_handle.state::<AppState>();
    state.progress.lock().unwrap().reset();
}

fn fail_session(app_handle: &AppHandle, error: &SpeechError) {
    tracing::error!("Speech error: {}", error);
    set_status(app_handle, AppStatus::Idle);
    let _ = app_handle.emit(
        "speech-error",
        serde_json::json!({ "message": error.to_string() }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::chunker::chunk_text;

    #[test]
    fn schedule_starts_at_chunk_frame() {
        let chunks = chunk_text("hello world");
        let schedule = word_schedule(&chunks[0], 1000, 800);
        assert_eq!(schedule[0].start_frame, 1000);
        assert_eq!(schedule[0].text, "hello");
    }

    #[test]
    fn schedule_is_monotonic_and_within_chunk() {
        let chunks = chunk_text("the quick brown fox jumps over the lazy dog");
        let schedule = word_schedule(&chunks[0], 0, 22050);
        assert_eq!(schedule.len(), 9);
        for pair in schedule.windows(2) {
            assert!(pair[0].start_frame <= pair[1].start_frame);
        }
        assert!(schedule.iter().all(|w| w.start_frame < 22050));
    }

    #[test]
    fn schedule_weights_by_word_length() {
        let chunks = chunk_text("aa bbbbbb");
        let schedule = word_schedule(&chunks[0], 0, 1000);
        // weights 3 and 7: second word starts at 3/10 of the clip
        assert_eq!(schedule[1].start_frame, 300);
    }

    #[test]
    fn schedule_keeps_absolute_char_offsets() {
        let text = "One two. Three four.";
        let chunks = chunk_text(text);
        let schedule = word_schedule(&chunks[1], 5000, 1000);
        let word = &schedule[0];
        let from_source: String = text
            .chars()
            .skip(word.char_index)
            .take(word.text.chars().count())
            .collect();
        assert_eq!(from_source, word.text);
    }
}
