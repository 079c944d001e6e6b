use tauri::{AppHandle, Manager};

use crate::state::{AppState, Settings};

#[tauri::command]
pub fn get_settings(app_handle: AppHandle) -> Result<Settings, String> {
    let state = app_handle.state::<AppState>();
    let settings = state.settings.lock().unwrap().clone();
    Ok(settings)
}

#[tauri::command]
pub fn update_settings(app_handle: AppHandle, settings: Settings) -> Result<(), String> {
    let clamped = Settings {
        speech: settings.speech.clamped(),
        reader: settings.reader,
    };

    {
        let state = app_handle.state::<AppState>();
        *state.settings.lock().unwrap() = clamped;
    }
    crate::persistence::save_settings(&app_handle);

    Ok(())
}

#[tauri::command]
pub fn get_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
