//! Database connection management

use crate::error::{Error, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const SCHEMA: &str = include_str!("../../../../migrations/001_initial.sql");

/// Per-user configuration directory (`~/.config/fbconv` or equivalent).
/// Also holds generated profile assets such as the font stylesheet.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fbconv")
}

/// Get the database path
pub fn get_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fbconv");

    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("fbconv.db")
}

/// Initialize the database at the default per-user location
pub fn init_database() -> Result<Database> {
    init_database_at(&get_db_path())
}

/// Initialize a database at an explicit path, running the schema
pub fn init_database_at(path: &Path) -> Result<Database> {
    log::info!("Initializing database at: {:?}", path);

    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;

    Ok(Database {
        conn: Arc::new(Mutex::new(conn)),
    })
}

/// Database wrapper with thread-safe connection
#[derive(Clone, Debug)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Execute a function with the database connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::Database(format!("Failed to lock database: {}", e)))?;
        f(&conn).map_err(Into::into)
    }

    /// Execute a function with mutable database connection
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| Error::Database(format!("Failed to lock database: {}", e)))?;
        f(&mut conn).map_err(Into::into)
    }
}
