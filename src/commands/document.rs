use std::path::Path;

use anyhow::Result;
use tauri::{AppHandle, Emitter, Manager};

use crate::document::{pdf, ExtractedDocument};
use crate::state::{AppState, AppStatus, LoadedDocument};

/// Tauri command: extract the text of a PDF for the editor pane
#[tauri::command]
pub async fn load_pdf(app_handle: AppHandle, path: String) -> Result<ExtractedDocument, String> {
    do_load_pdf(&app_handle, &path).map_err(|e| e.to_string())
}

/// Tauri command: forget the loaded document
#[tauri::command]
pub fn clear_document(app_handle: AppHandle) -> Result<(), String> {
    let state = app_handle.state::<AppState>();
    *state.document.lock().unwrap() = None;
    tracing::info!("Document cleared");
    Ok(())
}

/// Internal: run the extraction and publish progress
pub fn do_load_pdf(app_handle: &AppHandle, path: &str) -> Result<ExtractedDocument> {
    let state = app_handle.state::<AppState>();

    // Loading while speech plays is allowed and leaves playback alone;
    // only an idle app shows the extracting status.
    let was_idle = {
        let mut status = state.status.lock().unwrap();
        if *status == AppStatus::Extracting {
            anyhow::bail!("An extraction is already running");
        }
        let was_idle = *status == AppStatus::Idle;
        if was_idle {
            *status = AppStatus::Extracting;
        }
        was_idle
    };

    let result = pdf::extract_file(Path::new(path), |page, total| {
        let _ = app_handle.emit(
            "extraction-progress",
            serde_json::json!({ "page": page, "total": total }),
        );
    });

    if was_idle {
        *state.status.lock().unwrap() = AppStatus::Idle;
    }

    let document = result?;
    {
        let mut loaded = state.document.lock().unwrap();
        *loaded = Some(LoadedDocument {
            file_name: document.file_name.clone(),
            page_count: document.page_count,
            char_count: document.char_count(),
        });
    }

    tracing::info!(
        "Extracted {} page(s), {} chars from {}",
        document.page_count,
        document.char_count(),
        document.file_name
    );

    Ok(document)
}
