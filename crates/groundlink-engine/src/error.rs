// ── Engine error types ──
//
// Failures surfaced by the device registry and the persisted settings
// store. Protocol oddities never become errors; controllers log and skip.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    // ── Registry ─────────────────────────────────────────────────────
    #[error("Device not found: {uid}")]
    DeviceNotFound { uid: String },

    // ── Settings store ───────────────────────────────────────────────
    #[error("Cannot read settings store {path}: {source}")]
    StoreRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write settings store {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Settings store {path} is not valid JSON: {source}")]
    StoreFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Cannot encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}
