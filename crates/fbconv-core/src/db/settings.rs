//! Settings database operations

use crate::db::Database;
use crate::error::Result;
use crate::types::{Settings, WindowGeometry};
use rusqlite::params;

/// Settings database operations
pub struct SettingsDb;

impl SettingsDb {
    /// Load all settings from the database. Missing or unparsable values
    /// fall back to defaults; unknown keys are ignored.
    pub fn load(db: &Database) -> Result<Settings> {
        let mut settings = Settings::default();

        db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            for row in rows {
                let (key, value) = row?;
                match key.as_str() {
                    "output_format" => {
                        settings.output_format = value.parse().unwrap_or_default();
                    }
                    "output_folder" => settings.output_folder = value,
                    "convert_to_source_dir" => {
                        settings.convert_to_source_dir = value == "true";
                    }
                    "current_profile" => settings.current_profile = value,
                    "hyphens" => {
                        settings.hyphens = value.parse().unwrap_or_default();
                    }
                    "embed_font_family" => {
                        settings.embed_font_family = Some(value).filter(|s| !s.is_empty());
                    }
                    "device_path" => settings.device_path = value,
                    "copy_to_device" => {
                        settings.copy_to_device = value == "true";
                    }
                    "sync_covers" => {
                        settings.sync_covers = value == "true";
                    }
                    "write_log" => {
                        settings.write_log = value == "true";
                    }
                    "last_used_path" => settings.last_used_path = value,
                    "geometry" => {
                        settings.geometry = serde_json::from_str::<WindowGeometry>(&value)
                            .unwrap_or_default();
                    }
                    "column_widths" => {
                        settings.column_widths =
                            serde_json::from_str::<[u32; 3]>(&value).unwrap_or_default();
                    }
                    _ => {}
                }
            }

            Ok(())
        })?;

        Ok(settings)
    }

    /// Save a single setting
    pub fn set(db: &Database, key: &str, value: &str) -> Result<()> {
        db.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)",
                params![key, value],
            )?;
            Ok(())
        })
    }

    /// Save all settings
    pub fn save(db: &Database, settings: &Settings) -> Result<()> {
        Self::set(db, "output_format", &settings.output_format.to_string())?;
        Self::set(db, "output_folder", &settings.output_folder)?;
        Self::set(db, "convert_to_source_dir", bool_str(settings.convert_to_source_dir))?;
        Self::set(db, "current_profile", &settings.current_profile)?;
        Self::set(db, "hyphens", &settings.hyphens.to_string())?;
        Self::set(
            db,
            "embed_font_family",
            settings.embed_font_family.as_deref().unwrap_or(""),
        )?;
        Self::set(db, "device_path", &settings.device_path)?;
        Self::set(db, "copy_to_device", bool_str(settings.copy_to_device))?;
        Self::set(db, "sync_covers", bool_str(settings.sync_covers))?;
        Self::set(db, "write_log", bool_str(settings.write_log))?;
        Self::set(db, "last_used_path", &settings.last_used_path)?;
        Self::set(db, "geometry", &serde_json::to_string(&settings.geometry)?)?;
        Self::set(
            db,
            "column_widths",
            &serde_json::to_string(&settings.column_widths)?,
        )?;
        Ok(())
    }

    /// Get a single setting value
    pub fn get(db: &Database, key: &str) -> Result<Option<String>> {
        db.with_conn(|conn| {
            let result = conn.query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            );

            match result {
                Ok(value) => Ok(Some(value)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
