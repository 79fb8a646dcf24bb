//! Conversion history operations

use crate::db::Database;
use crate::error::Result;
use crate::types::{ConversionOutcome, OutputFormat};
use chrono::Utc;
use rusqlite::params;

/// One finished conversion, as stored
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub source: String,
    pub destination: Option<String>,
    pub format: String,
    pub success: bool,
    pub finished_at: String,
}

/// Conversion history database operations
pub struct HistoryDb;

impl HistoryDb {
    /// Record one finished conversion
    pub fn append(db: &Database, outcome: &ConversionOutcome, format: OutputFormat) -> Result<()> {
        let finished_at = Utc::now().to_rfc3339();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversion_history (source, destination, format, success, finished_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    outcome.source.to_string_lossy().to_string(),
                    outcome
                        .destination
                        .as_ref()
                        .map(|d| d.to_string_lossy().to_string()),
                    format.to_string(),
                    outcome.success,
                    finished_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Most recent conversions, newest first
    pub fn recent(db: &Database, limit: usize) -> Result<Vec<HistoryEntry>> {
        db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT source, destination, format, success, finished_at
                 FROM conversion_history
                 ORDER BY finished_at DESC, id DESC
                 LIMIT ?1",
            )?;
            let entries = stmt
                .query_map(params![limit as i64], |row| {
                    Ok(HistoryEntry {
                        source: row.get(0)?,
                        destination: row.get(1)?,
                        format: row.get(2)?,
                        success: row.get(3)?,
                        finished_at: row.get(4)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database_at;
    use std::path::PathBuf;

    #[test]
    fn test_history_append_and_recent() {
        let dir = tempfile::tempdir().unwrap();
        let db = init_database_at(&dir.path().join("fbconv.db")).unwrap();

        HistoryDb::append(
            &db,
            &ConversionOutcome {
                source: PathBuf::from("/books/one.fb2"),
                success: true,
                destination: Some(PathBuf::from("/out/one.mobi")),
            },
            OutputFormat::Mobi,
        )
        .unwrap();
        HistoryDb::append(
            &db,
            &ConversionOutcome {
                source: PathBuf::from("/books/two.fb2"),
                success: false,
                destination: None,
            },
            OutputFormat::Mobi,
        )
        .unwrap();

        let entries = HistoryDb::recent(&db, 10).unwrap();
        assert_eq!(entries.len(), 2);
        // newest first
        assert_eq!(entries[0].source, "/books/two.fb2");
        assert!(!entries[0].success);
        assert_eq!(entries[0].destination, None);
        assert_eq!(entries[1].destination.as_deref(), Some("/out/one.mobi"));

        let limited = HistoryDb::recent(&db, 1).unwrap();
        assert_eq!(limited.len(), 1);
    }
}
