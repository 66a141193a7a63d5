use crate::error::{LecternError, Result};
use crate::storage::migrations;
use crate::storage::{TranscriptId, TranscriptRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;

const IN_MEMORY: &str = ":memory:";

/// Append-only transcript store. Dropping it closes the connection.
pub struct TranscriptDb {
    conn: Connection,
}

impl TranscriptDb {
    /// Open from a connection string: a filesystem path, `sqlite://path`, or `:memory:`.
    pub fn connect(connection_string: &str) -> Result<Self> {
        let target = connection_string.trim();
        let target = target.strip_prefix("sqlite://").unwrap_or(target);

        if target.is_empty() {
            return Err(LecternError::Config(
                "A valid connection string must be provided".to_string(),
            ));
        }

        if target == IN_MEMORY {
            return Self::open_in_memory();
        }
        Self::open(target)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Persist a transcript and return its new id.
    ///
    /// Empty or whitespace-only transcripts are rejected without touching the store.
    /// Backend failures are logged; both cases yield `None`.
    pub fn insert(
        &self,
        transcript: &str,
        file_name: &str,
        course_name: &str,
    ) -> Option<TranscriptId> {
        if transcript.trim().is_empty() {
            tracing::warn!("Transcript for {} is empty, not storing it", file_name);
            return None;
        }

        match self.try_insert(transcript, file_name, course_name) {
            Ok(id) => {
                tracing::info!("Inserted transcript {} for {}", id, file_name);
                Some(id)
            }
            Err(e) => {
                tracing::error!("Error inserting transcript for {}: {}", file_name, e);
                None
            }
        }
    }

    fn try_insert(
        &self,
        transcript: &str,
        file_name: &str,
        course_name: &str,
    ) -> Result<TranscriptId> {
        let id = TranscriptId::new();
        self.conn.execute(
            "INSERT INTO transcripts (id, file_name, transcript, course_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.0,
                file_name,
                transcript,
                course_name,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(id)
    }

    /// Look up a transcript. Malformed ids, unknown ids and backend errors all yield `None`.
    pub fn get_by_id(&self, id: &str) -> Option<TranscriptRecord> {
        let Some(id) = TranscriptId::parse(id) else {
            tracing::warn!("Malformed transcript id: {}", id);
            return None;
        };

        match self.try_get(&id) {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                tracing::info!("No transcript found with id {}", id);
                None
            }
            Err(e) => {
                tracing::error!("Error retrieving transcript {}: {}", id, e);
                None
            }
        }
    }

    fn try_get(&self, id: &TranscriptId) -> Result<Option<TranscriptRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, file_name, transcript, course_name, created_at
             FROM transcripts WHERE id = ?1",
        )?;

        let record = stmt.query_row([&id.0], row_to_record).optional()?;
        Ok(record)
    }

    /// Most recent transcripts first
    pub fn list(&self, limit: usize) -> Result<Vec<TranscriptRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, file_name, transcript, course_name, created_at
             FROM transcripts ORDER BY created_at DESC LIMIT ?1",
        )?;

        let records = stmt
            .query_map([limit as i64], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM transcripts", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Release the connection, surfacing any error the implicit drop would swallow.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| LecternError::Database(e))
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<TranscriptRecord> {
    Ok(TranscriptRecord {
        id: TranscriptId(row.get(0)?),
        file_name: row.get(1)?,
        transcript: row.get(2)?,
        course_name: row.get(3)?,
        created_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(4)?)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

trait OptionalExt<T> {
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = TranscriptDb::connect(":memory:");
        assert!(db.is_ok());
    }

    #[test]
    fn test_empty_connection_string_rejected() {
        assert!(TranscriptDb::connect("  ").is_err());
    }

    #[test]
    fn test_insert_and_get_roundtrip() {
        let db = TranscriptDb::open_in_memory().unwrap();

        let id = db.insert("hello world", "lec1.mp4", "CS101").unwrap();
        assert!(!id.0.is_empty());

        let record = db.get_by_id(&id.0).unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.transcript, "hello world");
        assert_eq!(record.file_name, "lec1.mp4");
        assert_eq!(record.course_name, "CS101");
    }

    #[test]
    fn test_blank_transcripts_not_persisted() {
        let db = TranscriptDb::open_in_memory().unwrap();
        db.insert("kept", "a.mp4", "CS101").unwrap();
        let before = db.count().unwrap();

        for blank in ["", " ", "\n\t  "] {
            assert!(db.insert(blank, "b.mp4", "CS101").is_none());
        }

        assert_eq!(db.count().unwrap(), before);
    }

    #[test]
    fn test_get_unknown_or_malformed_id() {
        let db = TranscriptDb::open_in_memory().unwrap();
        db.insert("text", "a.mp4", "CS101").unwrap();

        assert!(db.get_by_id(&TranscriptId::new().0).is_none());
        assert!(db.get_by_id("507f1f77bcf86cd799439011").is_none());
        assert!(db.get_by_id("").is_none());
    }

    #[test]
    fn test_each_insert_gets_new_id() {
        let db = TranscriptDb::open_in_memory().unwrap();
        let a = db.insert("same", "a.mp4", "CS101").unwrap();
        let b = db.insert("same", "a.mp4", "CS101").unwrap();
        assert_ne!(a, b);
        assert_eq!(db.count().unwrap(), 2);
        assert_eq!(db.list(10).unwrap().len(), 2);
    }

    #[test]
    fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("lectern.db");
        let conn_str = format!("sqlite://{}", path.display());

        let db = TranscriptDb::connect(&conn_str).unwrap();
        let id = db.insert("persisted", "lec2.mp4", "CS102").unwrap();
        db.close().unwrap();

        let reopened = TranscriptDb::connect(&conn_str).unwrap();
        assert_eq!(reopened.get_by_id(&id.0).unwrap().transcript, "persisted");
        reopened.close().unwrap();
    }
}
