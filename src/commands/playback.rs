use anyhow::Result;
use serde::Serialize;
use tauri::{AppHandle, Manager};

use crate::speech::session::ReaderSession;
use crate::state::{AppState, AppStatus, LoadedDocument};

/// Tauri command: speak the editor text, or resume a paused utterance
#[tauri::command]
pub fn play(app_handle: AppHandle, text: String) -> Result<(), String> {
    do_play(&app_handle, &text).map_err(|e| e.to_string())
}

/// Tauri command: pause the current utterance, keeping its position
#[tauri::command]
pub fn pause(app_handle: AppHandle) -> Result<(), String> {
    do_pause(&app_handle).map_err(|e| e.to_string())
}

/// Tauri command: resume a paused utterance
#[tauri::command]
pub fn resume(app_handle: AppHandle) -> Result<(), String> {
    do_resume(&app_handle).map_err(|e| e.to_string())
}

/// Tauri command: stop speaking and reset progress
#[tauri::command]
pub fn stop(app_handle: AppHandle) -> Result<(), String> {
    do_stop(&app_handle).map_err(|e| e.to_string())
}

/// Tauri command: current status, progress and loaded document
#[tauri::command]
pub fn get_status(app_handle: AppHandle) -> Result<StatusPayload, String> {
    let state = app_handle.state::<AppState>();
    let status = state.status.lock().unwrap().clone();
    let progress = *state.progress.lock().unwrap();
    let document = state.document.lock().unwrap().clone();

    Ok(StatusPayload {
        status,
        progress: ProgressPayload {
            char_index: progress.char_index,
            total_chars: progress.total_chars,
            percent: progress.percent(),
        },
        document,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload {
    pub status: AppStatus,
    pub progress: ProgressPayload,
    pub document: Option<LoadedDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressPayload {
    pub char_index: usize,
    pub total_chars: usize,
    pub percent: f32,
}

/// Internal: start (or resume) reading
pub fn do_play(app_handle: &AppHandle, text: &str) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("Please enter or upload text to speak");
    }

    let state = app_handle.state::<AppState>();

    // Play while paused resumes instead of restarting
    {
        let status = state.status.lock().unwrap().clone();
        if status == AppStatus::Paused {
            if let Some(session) = state.reader_session.lock().unwrap().as_ref() {
                session.resume();
                return Ok(());
            }
        }
    }

    // Replace any utterance already in flight
    let previous = state.reader_session.lock().unwrap().take();
    if let Some(session) = previous {
        session.stop();
    }

    let params = state.settings.lock().unwrap().speech.to_params();
    let session = ReaderSession::spawn(app_handle.clone(), text, params)?;
    *state.reader_session.lock().unwrap() = Some(session);

    Ok(())
}

/// Internal: pause if something is being spoken
pub fn do_pause(app_handle: &AppHandle) -> Result<()> {
    let state = app_handle.state::<AppState>();

    let status = state.status.lock().unwrap().clone();
    if status != AppStatus::Speaking {
        return Ok(());
    }

    if let Some(session) = state.reader_session.lock().unwrap().as_ref() {
        session.pause();
    }
    Ok(())
}

/// Internal: resume if paused
pub fn do_resume(app_handle: &AppHandle) -> Result<()> {
    let state = app_handle.state::<AppState>();

    let status = state.status.lock().unwrap().clone();
    if status != AppStatus::Paused {
        return Ok(());
    }

    if let Some(session) = state.reader_session.lock().unwrap().as_ref() {
        session.resume();
    }
    Ok(())
}

/// Internal: stop and tear down the session
pub fn do_stop(app_handle: &AppHandle) -> Result<()> {
    let state = app_handle.state::<AppState>();

    let session = state.reader_session.lock().unwrap().take();
    if let Some(session) = session {
        session.stop();
    }
    Ok(())
}
