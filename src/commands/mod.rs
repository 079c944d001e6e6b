pub mod document;
pub mod playback;
pub mod settings;
pub mod voices;
