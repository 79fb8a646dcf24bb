//! fbconv Core Library
//!
//! This crate provides the job queues, batch orchestration service,
//! settings persistence and collaborator seams for the fbconv e-book
//! conversion frontend. It is UI-agnostic and can be used with any
//! frontend (CLI, GTK, Qt, etc.): the conversion engine and the cover
//! thumbnail generator stay behind traits.

pub mod convert;
pub mod db;
pub mod device;
pub mod error;
pub mod queue;
pub mod service;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use convert::{destination_path, ConvertConfig, ConvertProcessor, Converter};
pub use db::{
    config_dir, get_db_path, init_database, init_database_at, Database, HistoryDb, HistoryEntry,
    SettingsDb,
};
pub use device::{
    is_device_connected, probe_thumbnail_dir, CopyProcessor, CoverSync, NoopCoverSync,
    SIDECAR_SUFFIX, THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH,
};
pub use error::{Error, Result};
pub use queue::{JobProcessor, JobQueue, QueueEvent};
pub use service::{ControllerCommand, ConvertService, UiMessage};
pub use types::*;
pub use utils::{collect_book_files, is_supported_book};
