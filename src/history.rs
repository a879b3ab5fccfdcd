use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use std::path::Path;
use thiserror::Error;

use crate::api::PdfId;
use crate::quiz::Score;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to create directory: {0}")]
    Io(#[from] std::io::Error),
}

/// One finished quiz attempt, as kept on this machine
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub pdf_id: PdfId,
    pub finished_at: DateTime<Local>,
    pub correct: u32,
    pub total: u32,
}

impl HistoryEntry {
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            ((self.correct as f64 / self.total as f64) * 100.0).round() as u32
        }
    }
}

/// Local log of completed quizzes backing the score history table
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, HistoryError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS quiz_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pdf_id TEXT NOT NULL,
                finished_at TEXT NOT NULL,
                correct INTEGER NOT NULL,
                total INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_quiz_history_pdf ON quiz_history(pdf_id, finished_at)",
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    pub fn record(&self, pdf_id: PdfId, score: Score) -> Result<HistoryEntry, HistoryError> {
        let entry = HistoryEntry {
            pdf_id,
            finished_at: Local::now(),
            correct: score.correct as u32,
            total: score.total as u32,
        };
        self.conn.execute(
            "INSERT INTO quiz_history (pdf_id, finished_at, correct, total) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.pdf_id.to_string(),
                entry.finished_at.to_rfc3339(),
                entry.correct,
                entry.total,
            ],
        )?;
        Ok(entry)
    }

    /// Most recent attempts for a PDF, newest first
    pub fn recent(&self, pdf_id: PdfId, limit: usize) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT finished_at, correct, total
            FROM quiz_history
            WHERE pdf_id = ?1
            ORDER BY finished_at DESC, id DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![pdf_id.to_string(), limit as i64], |row| {
            let finished_at: String = row.get(0)?;
            let finished_at = DateTime::parse_from_rfc3339(&finished_at)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        "finished_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);
            Ok(HistoryEntry {
                pdf_id,
                finished_at,
                correct: row.get(1)?,
                total: row.get(2)?,
            })
        })?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    /// Drop history for a PDF that was deleted on the server
    pub fn forget(&self, pdf_id: PdfId) -> Result<usize, HistoryError> {
        Ok(self.conn.execute(
            "DELETE FROM quiz_history WHERE pdf_id = ?1",
            params![pdf_id.to_string()],
        )?)
    }
}
