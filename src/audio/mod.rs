pub mod playback;

pub use playback::AudioPlayback;
