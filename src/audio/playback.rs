use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};

use crate::speech::AudioClip;

/// Mono output sink for synthesized speech.
///
/// Synthesized clips are queued as f32 frames; the cpal callback drains the
/// queue and counts frames actually handed to the device, which is what the
/// reader session paces word boundaries against. While paused the stream
/// keeps running but emits silence without consuming, so the position
/// counter freezes with playback.
pub struct AudioPlayback {
    queue: Arc<Mutex<VecDeque<f32>>>,
    paused: Arc<AtomicBool>,
    frames_played: Arc<AtomicU64>,
    sample_rate: u32,
    _stream: cpal::Stream,
}

impl AudioPlayback {
    /// Open the default output device at the synthesis sample rate
    pub fn new(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("No output device available")?;

        let default_config = device
            .default_output_config()
            .context("Failed to get default output config")?;

        tracing::info!(
            "Output device: {} ({:?}, {}Hz)",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            default_config.sample_format(),
            default_config.sample_rate().0,
        );

        let config = StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let queue: Arc<Mutex<VecDeque<f32>>> = Arc::new(Mutex::new(VecDeque::new()));
        let paused = Arc::new(AtomicBool::new(false));
        let frames_played = Arc::new(AtomicU64::new(0));

        let stream = match default_config.sample_format() {
            SampleFormat::F32 => {
                build_stream::<f32>(&device, &config, &queue, &paused, &frames_played)?
            }
            SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, &queue, &paused, &frames_played)?
            }
            SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, &queue, &paused, &frames_played)?
            }
            other => anyhow::bail!("Unsupported output sample format: {:?}", other),
        };

        stream.play().context("Failed to start output stream")?;

        Ok(Self {
            queue,
            paused,
            frames_played,
            sample_rate,
            _stream: stream,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Queue a synthesized clip for playback
    pub fn enqueue(&self, clip: &AudioClip) {
        if clip.sample_rate != self.sample_rate {
            tracing::warn!(
                "Clip sample rate {}Hz differs from stream rate {}Hz",
                clip.sample_rate,
                self.sample_rate
            );
        }

        let mono = mixdown(&clip.samples, clip.channels);
        self.queue.lock().unwrap().extend(mono);
    }

    /// Frames handed to the device since the stream started
    pub fn position(&self) -> u64 {
        self.frames_played.load(Ordering::SeqCst)
    }

    pub fn queued_frames(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Drop any queued audio
    pub fn clear(&self) {
        self.queue.lock().unwrap().clear();
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    queue: &Arc<Mutex<VecDeque<f32>>>,
    paused: &Arc<AtomicBool>,
    frames_played: &Arc<AtomicU64>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32> + Send + 'static,
{
    let queue = Arc::clone(queue);
    let paused = Arc::clone(paused);
    let frames_played = Arc::clone(frames_played);

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if paused.load(Ordering::SeqCst) {
                    data.fill(Sample::EQUILIBRIUM);
                    return;
                }

                let mut queue = queue.lock().unwrap();
                let mut consumed = 0u64;
                for slot in data.iter_mut() {
                    match queue.pop_front() {
                        Some(sample) => {
                            *slot = T::from_sample(sample);
                            consumed += 1;
                        }
                        None => *slot = Sample::EQUILIBRIUM,
                    }
                }
                drop(queue);

                if consumed > 0 {
                    frames_played.fetch_add(consumed, Ordering::SeqCst);
                }
            },
            |err| {
                tracing::error!("Output stream error: {}", err);
            },
            None,
        )
        .context("Failed to build output stream")?;

    Ok(stream)
}

/// Average interleaved channels down to mono
fn mixdown(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    let channels = channels as usize;
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixdown_passes_mono_through() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(mixdown(&samples, 1), samples);
    }

    #[test]
    fn mixdown_averages_stereo_pairs() {
        let samples = vec![1.0, 0.0, 0.5, 0.5];
        let mono = mixdown(&samples, 2);
        assert_eq!(mono, vec![0.5, 0.5]);
    }

    #[test]
    fn mixdown_handles_trailing_partial_frame() {
        let samples = vec![1.0, 0.0, 1.0];
        let mono = mixdown(&samples, 2);
        assert_eq!(mono.len(), 2);
        assert_eq!(mono[1], 1.0);
    }
}
