//! Database module - SQLite persistence for settings and conversion history

mod connection;
mod history;
mod settings;

pub use connection::{config_dir, get_db_path, init_database, init_database_at, Database};
pub use history::{HistoryDb, HistoryEntry};
pub use settings::SettingsDb;
