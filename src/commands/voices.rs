use anyhow::Result;
use tauri::{AppHandle, Manager};

use crate::speech::synthesizer::create_synthesizer;
use crate::speech::{filter_voices, VoiceInfo};
use crate::state::AppState;

/// Tauri command: voices offered by the speech engine, narrowed to the
/// preferred language when any match
#[tauri::command]
pub fn list_voices(app_handle: AppHandle) -> Result<Vec<VoiceInfo>, String> {
    do_list_voices(&app_handle).map_err(|e| e.to_string())
}

pub fn do_list_voices(app_handle: &AppHandle) -> Result<Vec<VoiceInfo>> {
    let state = app_handle.state::<AppState>();

    // Enumerating voices spawns the engine; do it once per run
    let cached = state.voice_cache.lock().unwrap().clone();
    let all = match cached {
        Some(voices) => voices,
        None => {
            let synthesizer = create_synthesizer()?;
            let voices = synthesizer.voices()?;
            tracing::info!("Speech engine offers {} voices", voices.len());
            *state.voice_cache.lock().unwrap() = Some(voices.clone());
            voices
        }
    };

    let language = {
        let settings = state.settings.lock().unwrap();
        settings.reader.preferred_language.clone()
    };

    Ok(filter_voices(&all, &language))
}
