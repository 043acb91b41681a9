//! SQLite-based session storage and statistics.
//!
//! Provides persistent storage for:
//! - Completed study sessions (one row per session, JSON payload)
//! - The aggregate stats record
//! - The achievement list
//! - A key-value store for application state (active session)
//!
//! Each logical record is read and written as a whole; there is no
//! partial-field update. A malformed record is logged and replaced with
//! its default value rather than failing the read: history is
//! non-critical data and availability wins.

use std::path::PathBuf;

use chrono::Utc;
use rusqlite::{params, Connection};

use super::data_dir;
use crate::achievements::{self, Achievement};
use crate::error::{CoreError, DatabaseError};
use crate::session::{Session, SessionStatus, SESSION_SCHEMA_VERSION};
use crate::stats::{compute_streak, Stats, STATS_SCHEMA_VERSION};

const KV_STATS: &str = "stats";
const KV_ACHIEVEMENTS: &str = "achievements";

/// Everything derived from recording one session.
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub stats: Stats,
    pub newly_unlocked: Vec<Achievement>,
}

/// SQLite store for sessions, stats, and achievements.
///
/// Single-writer by design: one user, one open session at a time, so
/// updates are last-writer-wins with no concurrency check.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the store at `~/.config/studyroom/studyroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        Self::open_at(data_dir()?.join("studyroom.db"))
    }

    /// Open the store at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self, CoreError> {
        let conn =
            Connection::open(&path).map_err(|source| DatabaseError::OpenFailed { path, source })?;
        let store = Self { conn };
        store
            .migrate()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let store = Self { conn };
        store
            .migrate()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id         TEXT PRIMARY KEY,
                subject    TEXT NOT NULL,
                started_at TEXT NOT NULL,
                payload    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON sessions(started_at);",
        )?;
        Ok(())
    }

    /// Record a completed session and update every derived record.
    ///
    /// Accepts only sessions with `Completed` status; anything else is
    /// logged and ignored (`Ok(None)`), as is a session that was already
    /// recorded, which makes a retry after an earlier failure safe.
    ///
    /// All writes happen in one transaction, so stats are updated
    /// exactly once per session or not at all.
    ///
    /// # Errors
    /// Returns an error if the store is unreadable or unwritable; the
    /// caller still holds the session and may retry.
    pub fn record_session(&mut self, session: &Session) -> Result<Option<RecordOutcome>, CoreError> {
        if session.status != SessionStatus::Completed {
            tracing::warn!(
                session_id = %session.id,
                status = ?session.status,
                "refusing to record a session that is not completed"
            );
            return Ok(None);
        }

        let tx = self.conn.transaction().map_err(DatabaseError::from)?;

        let already_recorded: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sessions WHERE id = ?1)",
                params![session.id.to_string()],
                |row| row.get(0),
            )
            .map_err(DatabaseError::from)?;
        if already_recorded {
            tracing::warn!(session_id = %session.id, "session already recorded, skipping");
            return Ok(None);
        }

        tx.execute(
            "INSERT INTO sessions (id, subject, started_at, payload) VALUES (?1, ?2, ?3, ?4)",
            params![
                session.id.to_string(),
                session.subject,
                session.started_at.to_rfc3339(),
                serde_json::to_string(session)?,
            ],
        )
        .map_err(DatabaseError::from)?;

        let mut stats = load_stats(&tx)?;
        stats.fold_session(session);

        // Streak and completion rate are recomputed from the full
        // history each time, which stays correct for out-of-order or
        // backfilled entries.
        let history = load_sessions(&tx)?;
        let today = Utc::now().date_naive();
        stats.current_streak = compute_streak(history.iter().map(|s| s.started_at.date_naive()), today);
        stats.longest_streak = stats.longest_streak.max(stats.current_streak);
        stats.completion_rate = completion_rate(&history);

        kv_set(&tx, KV_STATS, &serde_json::to_string(&stats)?)?;

        let achievements = load_achievements(&tx)?;
        let evaluation = achievements::evaluate(&stats, achievements, Utc::now());
        kv_set(
            &tx,
            KV_ACHIEVEMENTS,
            &serde_json::to_string(&evaluation.achievements)?,
        )?;

        tx.commit().map_err(DatabaseError::from)?;

        Ok(Some(RecordOutcome {
            stats,
            newly_unlocked: evaluation.newly_unlocked,
        }))
    }

    /// All recorded sessions, most recent first. Corrupt rows are
    /// logged and skipped.
    pub fn sessions(&self) -> Result<Vec<Session>, CoreError> {
        load_sessions(&self.conn)
    }

    /// The aggregate stats record, or the empty default if missing or
    /// corrupt.
    pub fn stats(&self) -> Result<Stats, CoreError> {
        load_stats(&self.conn)
    }

    /// The achievement list, seeded from the built-in catalog when
    /// missing.
    pub fn achievements(&self) -> Result<Vec<Achievement>, CoreError> {
        load_achievements(&self.conn)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, CoreError> {
        kv_get(&self.conn, key)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        kv_set(&self.conn, key, value)
    }

    /// Delete a key from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<(), CoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}

fn kv_get(conn: &Connection, key: &str) -> Result<Option<String>, CoreError> {
    let mut stmt = conn
        .prepare("SELECT value FROM kv WHERE key = ?1")
        .map_err(DatabaseError::from)?;
    match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DatabaseError::from(e).into()),
    }
}

fn kv_set(conn: &Connection, key: &str, value: &str) -> Result<(), CoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
        params![key, value],
    )
    .map_err(DatabaseError::from)?;
    Ok(())
}

fn load_stats(conn: &Connection) -> Result<Stats, CoreError> {
    let Some(json) = kv_get(conn, KV_STATS)? else {
        return Ok(Stats::default());
    };
    match serde_json::from_str::<Stats>(&json) {
        Ok(stats) if stats.schema_version == STATS_SCHEMA_VERSION => Ok(stats),
        Ok(stats) => {
            tracing::warn!(
                version = stats.schema_version,
                "unsupported stats schema version, starting from empty stats"
            );
            Ok(Stats::default())
        }
        Err(e) => {
            tracing::warn!(error = %e, "corrupt stats record, starting from empty stats");
            Ok(Stats::default())
        }
    }
}

fn load_achievements(conn: &Connection) -> Result<Vec<Achievement>, CoreError> {
    let Some(json) = kv_get(conn, KV_ACHIEVEMENTS)? else {
        return Ok(achievements::default_achievements());
    };
    match serde_json::from_str(&json) {
        Ok(list) => Ok(list),
        Err(e) => {
            tracing::warn!(error = %e, "corrupt achievements record, reseeding catalog");
            Ok(achievements::default_achievements())
        }
    }
}

fn load_sessions(conn: &Connection) -> Result<Vec<Session>, CoreError> {
    let mut stmt = conn
        .prepare("SELECT id, payload FROM sessions ORDER BY started_at DESC")
        .map_err(DatabaseError::from)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(DatabaseError::from)?;

    let mut sessions = Vec::new();
    for row in rows {
        let (id, payload) = row.map_err(DatabaseError::from)?;
        match serde_json::from_str::<Session>(&payload) {
            Ok(session) if session.schema_version == SESSION_SCHEMA_VERSION => {
                sessions.push(session)
            }
            Ok(session) => {
                tracing::warn!(
                    session_id = %id,
                    version = session.schema_version,
                    "skipping session with unsupported schema version"
                );
            }
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "skipping corrupt session record");
            }
        }
    }
    Ok(sessions)
}

/// Percentage of budgeted minutes actually spent, averaged over the
/// whole history. Skipped cycles credit only elapsed time, so early
/// skips pull this down.
fn completion_rate(history: &[Session]) -> f64 {
    let budgeted: u64 = history.iter().map(|s| s.total_budget_min).sum();
    if budgeted == 0 {
        return 0.0;
    }
    let spent: u64 = history.iter().map(|s| s.study_min + s.break_min).sum();
    (spent as f64 / budgeted as f64 * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use uuid::Uuid;

    use crate::session::{Settings, SessionController};

    fn run_session(subject: &str, budget: u64) -> Session {
        let settings = Settings {
            study_minutes: 1,
            short_break_minutes: 1,
            auto_start_breaks: true,
            auto_start_next: true,
            ..Settings::default()
        };
        let (mut controller, _) = SessionController::start(subject, budget, &settings).unwrap();
        while !controller.is_terminal() {
            controller.skip();
        }
        controller.session().clone()
    }

    fn completed_session_on(started_at: DateTime<Utc>) -> Session {
        let mut session = run_session("history", 3);
        session.id = Uuid::new_v4();
        session.started_at = started_at;
        session
    }

    #[test]
    fn record_updates_stats_and_achievements() {
        let mut store = Store::open_memory().unwrap();
        let session = run_session("math", 3);
        let outcome = store.record_session(&session).unwrap().unwrap();

        assert_eq!(outcome.stats.total_sessions, 1);
        assert_eq!(outcome.stats.current_streak, 1);
        assert_eq!(outcome.stats.subjects["math"].sessions, 1);
        assert!(outcome
            .newly_unlocked
            .iter()
            .any(|a| a.id == "first_session"));

        // Persisted records match the outcome.
        assert_eq!(store.stats().unwrap(), outcome.stats);
        assert!(store
            .achievements()
            .unwrap()
            .iter()
            .find(|a| a.id == "first_session")
            .unwrap()
            .unlocked);
        assert_eq!(store.sessions().unwrap().len(), 1);
    }

    #[test]
    fn rejects_non_completed_sessions() {
        let mut store = Store::open_memory().unwrap();
        let settings = Settings::default();
        let (mut controller, _) = SessionController::start("math", 60, &settings).unwrap();
        controller.cancel();

        let outcome = store
            .record_session(controller.session())
            .unwrap();
        assert!(outcome.is_none());

        // Cancellation never changes totals.
        let stats = store.stats().unwrap();
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.total_points, 0);
        assert!(store.sessions().unwrap().is_empty());
    }

    #[test]
    fn duplicate_record_is_a_noop() {
        let mut store = Store::open_memory().unwrap();
        let session = run_session("math", 3);
        assert!(store.record_session(&session).unwrap().is_some());
        assert!(store.record_session(&session).unwrap().is_none());
        assert_eq!(store.stats().unwrap().total_sessions, 1);
    }

    #[test]
    fn streak_spans_consecutive_days() {
        let mut store = Store::open_memory().unwrap();
        let now = Utc::now();
        store
            .record_session(&completed_session_on(now - Duration::days(1)))
            .unwrap();
        let outcome = store
            .record_session(&completed_session_on(now))
            .unwrap()
            .unwrap();
        assert_eq!(outcome.stats.current_streak, 2);
        assert_eq!(outcome.stats.longest_streak, 2);
    }

    #[test]
    fn gap_before_today_restarts_streak() {
        let mut store = Store::open_memory().unwrap();
        let now = Utc::now();
        store
            .record_session(&completed_session_on(now - Duration::days(3)))
            .unwrap();
        let outcome = store
            .record_session(&completed_session_on(now))
            .unwrap()
            .unwrap();
        assert_eq!(outcome.stats.current_streak, 1);
    }

    #[test]
    fn corrupt_stats_record_falls_back_to_default() {
        let store = Store::open_memory().unwrap();
        store.kv_set(KV_STATS, "not valid json").unwrap();
        assert_eq!(store.stats().unwrap(), Stats::default());
    }

    #[test]
    fn corrupt_achievements_record_reseeds_catalog() {
        let store = Store::open_memory().unwrap();
        store.kv_set(KV_ACHIEVEMENTS, "[{\"broken\":").unwrap();
        let list = store.achievements().unwrap();
        assert!(!list.is_empty());
        assert!(list.iter().all(|a| !a.unlocked));
    }

    #[test]
    fn corrupt_session_row_is_skipped() {
        let store = Store::open_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO sessions (id, subject, started_at, payload) VALUES ('x', 'math', '2024-01-01T00:00:00+00:00', 'garbage')",
                [],
            )
            .unwrap();
        assert!(store.sessions().unwrap().is_empty());
    }

    #[test]
    fn records_survive_reopen() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("studyroom.db");

        let session = run_session("math", 3);
        {
            let mut store = Store::open_at(path.clone()).unwrap();
            store.record_session(&session).unwrap().unwrap();
        }

        let store = Store::open_at(path).unwrap();
        assert_eq!(store.stats().unwrap().total_sessions, 1);
        assert_eq!(store.sessions().unwrap()[0].id, session.id);
    }

    #[test]
    fn kv_store_roundtrip() {
        let store = Store::open_memory().unwrap();
        assert!(store.kv_get("test").unwrap().is_none());
        store.kv_set("test", "hello").unwrap();
        assert_eq!(store.kv_get("test").unwrap().unwrap(), "hello");
        store.kv_delete("test").unwrap();
        assert!(store.kv_get("test").unwrap().is_none());
    }
}
