//! SQLite-backed job store.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::store::{JobFilter, JobStore, JobStoreError};
use super::types::{Job, JobId, JobStatus, StageFailure};

const COLUMNS: &str = "id, input_ref, context_hint, status, created_at, updated_at, \
                       stage_error, result_artifact_ref, cancel_requested, progress, \
                       segments_translated, segments_total";

/// SQLite-backed job store.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

/// A row as stored, before parsing.
struct JobRow {
    id: String,
    input_ref: String,
    context_hint: String,
    status: String,
    created_at: String,
    updated_at: String,
    stage_error: Option<String>,
    result_artifact_ref: Option<String>,
    cancel_requested: bool,
    progress: f64,
    segments_translated: u32,
    segments_total: u32,
}

impl SqliteJobStore {
    /// Opens (or creates) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, JobStoreError> {
        let conn = Connection::open(path).map_err(|e| JobStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, JobStoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| JobStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), JobStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                input_ref TEXT NOT NULL,
                context_hint TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                stage_error TEXT,
                result_artifact_ref TEXT,
                cancel_requested INTEGER NOT NULL DEFAULT 0,
                progress REAL NOT NULL DEFAULT 0,
                segments_translated INTEGER NOT NULL DEFAULT 0,
                segments_total INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
            CREATE INDEX IF NOT EXISTS idx_jobs_created_at ON jobs(created_at);
            "#,
        )
        .map_err(|e| JobStoreError::Database(e.to_string()))?;

        // Migration: progress columns for databases created without them
        for column in [
            "progress REAL NOT NULL DEFAULT 0",
            "segments_translated INTEGER NOT NULL DEFAULT 0",
            "segments_total INTEGER NOT NULL DEFAULT 0",
        ] {
            let _ = conn.execute(&format!("ALTER TABLE jobs ADD COLUMN {}", column), []);
        }

        Ok(())
    }

    fn read_row(row: &rusqlite::Row) -> rusqlite::Result<JobRow> {
        Ok(JobRow {
            id: row.get(0)?,
            input_ref: row.get(1)?,
            context_hint: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
            stage_error: row.get(6)?,
            result_artifact_ref: row.get(7)?,
            cancel_requested: row.get(8)?,
            progress: row.get(9)?,
            segments_translated: row.get(10)?,
            segments_total: row.get(11)?,
        })
    }

    fn row_to_job(row: JobRow) -> Result<Job, JobStoreError> {
        let corrupt = |message: String| JobStoreError::Corrupt {
            id: row.id.clone(),
            message,
        };

        let id: JobId = row.id.parse().map_err(|e| corrupt(format!("id: {}", e)))?;
        let status: JobStatus = row.status.parse().map_err(corrupt)?;
        let created_at = parse_time(&row.created_at).map_err(corrupt)?;
        let updated_at = parse_time(&row.updated_at).map_err(corrupt)?;
        let stage_error: Option<StageFailure> = row
            .stage_error
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| corrupt(format!("stage_error: {}", e)))?;

        Ok(Job {
            id,
            input_ref: row.input_ref,
            context_hint: row.context_hint,
            status,
            created_at,
            updated_at,
            stage_error,
            result_artifact_ref: row.result_artifact_ref,
            cancel_requested: row.cancel_requested,
            progress: row.progress,
            segments_translated: row.segments_translated,
            segments_total: row.segments_total,
        })
    }
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("timestamp {}: {}", s, e))
}

impl JobStore for SqliteJobStore {
    fn save(&self, job: &Job) -> Result<(), JobStoreError> {
        let stage_error = job
            .stage_error
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| JobStoreError::Database(e.to_string()))?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO jobs ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(id) DO UPDATE SET
                    status = excluded.status,
                    updated_at = excluded.updated_at,
                    stage_error = excluded.stage_error,
                    result_artifact_ref = excluded.result_artifact_ref,
                    cancel_requested = excluded.cancel_requested,
                    progress = excluded.progress,
                    segments_translated = excluded.segments_translated,
                    segments_total = excluded.segments_total",
                COLUMNS
            ),
            params![
                job.id.to_string(),
                job.input_ref,
                job.context_hint,
                job.status.as_str(),
                job.created_at.to_rfc3339(),
                job.updated_at.to_rfc3339(),
                stage_error,
                job.result_artifact_ref,
                job.cancel_requested,
                job.progress,
                job.segments_translated,
                job.segments_total,
            ],
        )
        .map_err(|e| JobStoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn get(&self, id: &JobId) -> Result<Option<Job>, JobStoreError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!("SELECT {} FROM jobs WHERE id = ?", COLUMNS),
            params![id.to_string()],
            Self::read_row,
        );

        match result {
            Ok(row) => Self::row_to_job(row).map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(JobStoreError::Database(e.to_string())),
        }
    }

    fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, JobStoreError> {
        let conn = self.conn.lock().unwrap();

        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        let where_clause = if filter.statuses.is_empty() {
            String::new()
        } else {
            let placeholders = vec!["?"; filter.statuses.len()].join(", ");
            for status in &filter.statuses {
                params.push(Box::new(status.as_str()));
            }
            format!("WHERE status IN ({})", placeholders)
        };
        params.push(Box::new(filter.limit));

        let sql = format!(
            "SELECT {} FROM jobs {} ORDER BY created_at ASC LIMIT ?",
            COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| JobStoreError::Database(e.to_string()))?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt
            .query_map(param_refs.as_slice(), Self::read_row)
            .map_err(|e| JobStoreError::Database(e.to_string()))?;

        let mut jobs = Vec::new();
        for row_result in rows {
            let row = row_result.map_err(|e| JobStoreError::Database(e.to_string()))?;
            jobs.push(Self::row_to_job(row)?);
        }
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{ErrorKind, JobRequest};
    use tempfile::TempDir;

    fn create_test_store() -> SqliteJobStore {
        SqliteJobStore::in_memory().unwrap()
    }

    #[test]
    fn test_save_and_get() {
        let store = create_test_store();
        let job = Job::new(JobRequest::new("https://v/1").with_context_hint("a talk"));
        store.save(&job).unwrap();

        let loaded = store.get(&job.id).unwrap().unwrap();
        assert_eq!(loaded.id, job.id);
        assert_eq!(loaded.input_ref, "https://v/1");
        assert_eq!(loaded.context_hint, "a talk");
        assert_eq!(loaded.status, JobStatus::Queued);
    }

    #[test]
    fn test_get_nonexistent() {
        let store = create_test_store();
        assert!(store.get(&JobId::new()).unwrap().is_none());
    }

    #[test]
    fn test_save_updates_existing_row() {
        let store = create_test_store();
        let mut job = Job::new(JobRequest::new("https://v/1"));
        store.save(&job).unwrap();

        job.advance(JobStatus::Fetching).unwrap();
        job.fail(StageFailure::new(
            JobStatus::Fetching,
            "yt-dlp",
            ErrorKind::Permanent,
            "private video",
        ))
        .unwrap();
        store.save(&job).unwrap();

        let loaded = store.get(&job.id).unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Failed);
        let failure = loaded.stage_error.unwrap();
        assert_eq!(failure.stage, "Fetching");
        assert_eq!(failure.collaborator, "yt-dlp");
        assert_eq!(store.list(&JobFilter::new()).unwrap().len(), 1);
    }

    #[test]
    fn test_translation_progress_is_stored() {
        let store = create_test_store();
        let mut job = Job::new(JobRequest::new("https://v/1"));
        for status in [
            JobStatus::Fetching,
            JobStatus::Transcribing,
            JobStatus::Translating,
        ] {
            job.advance(status).unwrap();
        }
        job.record_translation(3, 12);
        store.save(&job).unwrap();

        let loaded = store.get(&job.id).unwrap().unwrap();
        assert_eq!(loaded.segments_translated, 3);
        assert_eq!(loaded.segments_total, 12);
        assert!((loaded.progress - job.progress).abs() < 1e-9);
        assert!(loaded.progress > 0.5 && loaded.progress < 0.85);
    }

    #[test]
    fn test_list_with_status_filter() {
        let store = create_test_store();
        let queued = Job::new(JobRequest::new("a"));
        let mut running = Job::new(JobRequest::new("b"));
        running.advance(JobStatus::Fetching).unwrap();
        let mut done = Job::new(JobRequest::new("c"));
        done.cancel().unwrap();
        for job in [&queued, &running, &done] {
            store.save(job).unwrap();
        }

        let unfinished = store.list(&JobFilter::new().unfinished()).unwrap();
        assert_eq!(unfinished.len(), 2);
        let cancelled = store
            .list(&JobFilter::new().with_status(JobStatus::Cancelled))
            .unwrap();
        assert_eq!(cancelled.len(), 1);
        assert!(cancelled[0].cancel_requested);
        assert_eq!(store.list(&JobFilter::new().with_limit(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_opens_database_without_progress_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.db");
        let job = Job::new(JobRequest::new("https://v/1"));
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE jobs (
                    id TEXT PRIMARY KEY,
                    input_ref TEXT NOT NULL,
                    context_hint TEXT NOT NULL DEFAULT '',
                    status TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    stage_error TEXT,
                    result_artifact_ref TEXT,
                    cancel_requested INTEGER NOT NULL DEFAULT 0
                );",
            )
            .unwrap();
            conn.execute(
                "INSERT INTO jobs (id, input_ref, status, created_at, updated_at)
                 VALUES (?1, ?2, 'Queued', ?3, ?3)",
                params![
                    job.id.to_string(),
                    job.input_ref,
                    job.created_at.to_rfc3339()
                ],
            )
            .unwrap();
        }

        let store = SqliteJobStore::new(&path).unwrap();
        let loaded = store.get(&job.id).unwrap().unwrap();
        assert_eq!(loaded.progress, 0.0);
        assert_eq!(loaded.segments_total, 0);
    }

    #[test]
    fn test_file_based_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.db");
        let job = Job::new(JobRequest::new("a"));
        {
            let store = SqliteJobStore::new(&path).unwrap();
            store.save(&job).unwrap();
        }

        let reopened = SqliteJobStore::new(&path).unwrap();
        assert!(reopened.get(&job.id).unwrap().is_some());
    }
}
