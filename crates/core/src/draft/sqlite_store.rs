//! SQLite-backed draft store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    CastawayPoolEntry, DraftFilter, DraftPick, DraftReader, DraftSession, DraftStatus,
    DraftStore, ParticipantRanking, PickCommit, PickMethod, SessionStart, SnakeOrder, StoreError,
};

const SESSION_COLUMNS: &str = "id, participants, roster_size, turn_duration_secs, pick_index, \
     version, status, current_deadline, created_at, updated_at";

/// SQLite-backed draft store.
pub struct SqliteDraftStore {
    conn: Mutex<Connection>,
}

impl SqliteDraftStore {
    /// Open (or create) a database file and its tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.busy_timeout(Duration::from_secs(5)).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS draft_sessions (
                id TEXT PRIMARY KEY,
                participants TEXT NOT NULL,
                roster_size INTEGER NOT NULL DEFAULT 0,
                turn_duration_secs INTEGER NOT NULL DEFAULT 0,
                pick_index INTEGER NOT NULL DEFAULT 0,
                version INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                current_deadline TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_draft_sessions_status ON draft_sessions(status);

            CREATE TABLE IF NOT EXISTS draft_pool (
                session_id TEXT NOT NULL,
                castaway_id TEXT NOT NULL,
                available INTEGER NOT NULL DEFAULT 1,
                PRIMARY KEY (session_id, castaway_id)
            );

            CREATE TABLE IF NOT EXISTS draft_picks (
                session_id TEXT NOT NULL,
                pick_index INTEGER NOT NULL,
                participant_id TEXT NOT NULL,
                castaway_id TEXT NOT NULL,
                method TEXT NOT NULL,
                committed_at TEXT NOT NULL,
                UNIQUE (session_id, pick_index),
                UNIQUE (session_id, castaway_id)
            );

            CREATE TABLE IF NOT EXISTS draft_rankings (
                session_id TEXT NOT NULL,
                participant_id TEXT NOT NULL,
                castaway_ids TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (session_id, participant_id)
            );
            "#,
        )
        .map_err(db_err)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection mutex poisoned".to_string()))
    }

    fn load_session(conn: &Connection, id: &str) -> Result<DraftSession, StoreError> {
        conn.query_row(
            &format!("SELECT {} FROM draft_sessions WHERE id = ?", SESSION_COLUMNS),
            params![id],
            Self::row_to_session,
        )
        .optional()
        .map_err(db_err)?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<DraftSession> {
        let participants_json: String = row.get(1)?;
        let status_str: String = row.get(6)?;
        let deadline_str: Option<String> = row.get(7)?;
        let created_at_str: String = row.get(8)?;
        let updated_at_str: String = row.get(9)?;

        let participants: Vec<String> = serde_json::from_str(&participants_json)
            .map_err(|e| conversion_error(1, e.to_string()))?;
        let status = DraftStatus::parse(&status_str)
            .ok_or_else(|| conversion_error(6, format!("unknown status {}", status_str)))?;
        let current_deadline = deadline_str
            .map(|s| parse_timestamp(7, &s))
            .transpose()?;

        Ok(DraftSession {
            id: row.get(0)?,
            participants,
            roster_size: row.get(2)?,
            turn_duration_secs: row.get(3)?,
            pick_index: row.get(4)?,
            version: row.get(5)?,
            status,
            current_deadline,
            created_at: parse_timestamp(8, &created_at_str)?,
            updated_at: parse_timestamp(9, &updated_at_str)?,
        })
    }

    fn row_to_pick(row: &rusqlite::Row) -> rusqlite::Result<DraftPick> {
        let method_str: String = row.get(4)?;
        let committed_at_str: String = row.get(5)?;

        let method = PickMethod::parse(&method_str)
            .ok_or_else(|| conversion_error(4, format!("unknown pick method {}", method_str)))?;

        Ok(DraftPick {
            session_id: row.get(0)?,
            pick_index: row.get(1)?,
            participant_id: row.get(2)?,
            castaway_id: row.get(3)?,
            method,
            committed_at: parse_timestamp(5, &committed_at_str)?,
        })
    }

    fn build_where_clause(filter: &DraftFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        let where_clause = match filter.status {
            Some(status) => {
                params.push(Box::new(status.as_str()));
                "WHERE status = ?".to_string()
            }
            None => String::new(),
        };
        (where_clause, params)
    }
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn conversion_error(column: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, msg.into())
}

fn parse_timestamp(column: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e.to_string()))
}

impl DraftReader for SqliteDraftStore {
    fn get_session(&self, id: &str) -> Result<Option<DraftSession>, StoreError> {
        let conn = self.lock()?;
        match Self::load_session(&conn, id) {
            Ok(session) => Ok(Some(session)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn list_sessions(&self, filter: &DraftFilter) -> Result<Vec<DraftSession>, StoreError> {
        let conn = self.lock()?;
        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM draft_sessions {} ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?",
            SESSION_COLUMNS, where_clause
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;

        let mut all_params = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));
        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_session)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn count_sessions(&self, filter: &DraftFilter) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM draft_sessions {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(db_err)
    }

    fn pool(&self, session_id: &str) -> Result<Vec<CastawayPoolEntry>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT castaway_id, available FROM draft_pool WHERE session_id = ? ORDER BY castaway_id ASC",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![session_id], |row| {
                Ok(CastawayPoolEntry {
                    castaway_id: row.get(0)?,
                    available: row.get(1)?,
                })
            })
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn ledger(&self, session_id: &str) -> Result<Vec<DraftPick>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT session_id, pick_index, participant_id, castaway_id, method, committed_at \
                 FROM draft_picks WHERE session_id = ? ORDER BY pick_index ASC",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![session_id], Self::row_to_pick)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn ranking(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<Option<ParticipantRanking>, StoreError> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT castaway_ids FROM draft_rankings WHERE session_id = ? AND participant_id = ?",
                params![session_id, participant_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;

        json.map(|json| {
            serde_json::from_str(&json)
                .map(|castaway_ids| ParticipantRanking {
                    participant_id: participant_id.to_string(),
                    castaway_ids,
                })
                .map_err(|e| StoreError::Database(e.to_string()))
        })
        .transpose()
    }
}

impl DraftStore for SqliteDraftStore {
    fn create_session(
        &self,
        id: &str,
        castaway_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<DraftSession, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let exists: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM draft_sessions WHERE id = ?)",
                params![id],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        if exists {
            return Err(StoreError::AlreadyExists(id.to_string()));
        }

        tx.execute(
            "INSERT INTO draft_sessions (id, participants, status, created_at, updated_at) VALUES (?, '[]', ?, ?, ?)",
            params![id, DraftStatus::NotStarted.as_str(), now.to_rfc3339(), now.to_rfc3339()],
        )
        .map_err(db_err)?;

        {
            let mut stmt = tx
                .prepare("INSERT INTO draft_pool (session_id, castaway_id, available) VALUES (?, ?, 1)")
                .map_err(db_err)?;
            for castaway_id in castaway_ids {
                stmt.execute(params![id, castaway_id]).map_err(db_err)?;
            }
        }

        let session = Self::load_session(&tx, id)?;
        tx.commit().map_err(db_err)?;
        Ok(session)
    }

    fn start_session(&self, start: &SessionStart) -> Result<DraftSession, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let current = Self::load_session(&tx, &start.session_id)?;
        if current.status != DraftStatus::NotStarted {
            return Err(StoreError::AlreadyStarted {
                status: current.status,
            });
        }

        let participants_json = serde_json::to_string(&start.participants)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.execute(
            "UPDATE draft_sessions SET participants = ?, roster_size = ?, turn_duration_secs = ?, \
             pick_index = 0, version = 0, status = ?, current_deadline = ?, updated_at = ? WHERE id = ?",
            params![
                participants_json,
                start.roster_size,
                start.turn_duration_secs,
                DraftStatus::InProgress.as_str(),
                start.first_deadline.to_rfc3339(),
                start.started_at.to_rfc3339(),
                start.session_id,
            ],
        )
        .map_err(db_err)?;

        let session = Self::load_session(&tx, &start.session_id)?;
        tx.commit().map_err(db_err)?;
        Ok(session)
    }

    fn transition(
        &self,
        id: &str,
        allowed_from: &[DraftStatus],
        to: DraftStatus,
        deadline: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<DraftSession, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let current = Self::load_session(&tx, id)?;
        if !allowed_from.contains(&current.status) {
            return Err(StoreError::InvalidTransition {
                from: current.status,
                to,
            });
        }

        tx.execute(
            "UPDATE draft_sessions SET status = ?, current_deadline = ?, updated_at = ? WHERE id = ?",
            params![
                to.as_str(),
                deadline.map(|d| d.to_rfc3339()),
                now.to_rfc3339(),
                id
            ],
        )
        .map_err(db_err)?;

        let session = Self::load_session(&tx, id)?;
        tx.commit().map_err(db_err)?;
        Ok(session)
    }

    fn put_ranking(
        &self,
        session_id: &str,
        ranking: &ParticipantRanking,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        Self::load_session(&conn, session_id)?;

        let json = serde_json::to_string(&ranking.castaway_ids)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO draft_rankings (session_id, participant_id, castaway_ids, updated_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT (session_id, participant_id) DO UPDATE SET \
             castaway_ids = excluded.castaway_ids, updated_at = excluded.updated_at",
            params![session_id, ranking.participant_id, json, now.to_rfc3339()],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn commit_pick(&self, commit: &PickCommit) -> Result<DraftSession, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let current = Self::load_session(&tx, &commit.session_id)?;
        if current.status != DraftStatus::InProgress {
            return Err(StoreError::NotActive {
                status: current.status,
            });
        }
        if current.pick_index != commit.expected_pick_index {
            return Err(StoreError::StaleVersion {
                expected: commit.expected_pick_index,
                actual: current.pick_index,
            });
        }
        let owner = SnakeOrder::new(&current.participants).picker_at(current.pick_index);
        if owner != Some(commit.participant_id.as_str()) {
            return Err(StoreError::WrongPicker {
                pick_index: current.pick_index,
                expected: owner.unwrap_or_default().to_string(),
                actual: commit.participant_id.clone(),
            });
        }

        let available: Option<bool> = tx
            .query_row(
                "SELECT available FROM draft_pool WHERE session_id = ? AND castaway_id = ?",
                params![commit.session_id, commit.castaway_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        match available {
            None => return Err(StoreError::UnknownCastaway(commit.castaway_id.clone())),
            Some(false) => return Err(StoreError::CastawayUnavailable(commit.castaway_id.clone())),
            Some(true) => {}
        }

        tx.execute(
            "INSERT INTO draft_picks (session_id, pick_index, participant_id, castaway_id, method, committed_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                commit.session_id,
                commit.expected_pick_index,
                commit.participant_id,
                commit.castaway_id,
                commit.method.as_str(),
                commit.committed_at.to_rfc3339(),
            ],
        )
        .map_err(db_err)?;

        tx.execute(
            "UPDATE draft_pool SET available = 0 WHERE session_id = ? AND castaway_id = ?",
            params![commit.session_id, commit.castaway_id],
        )
        .map_err(db_err)?;

        let next_index = current.pick_index + 1;
        let completes = next_index >= current.total_picks();
        let (status, deadline) = if completes {
            (DraftStatus::Completed, None)
        } else {
            (DraftStatus::InProgress, Some(commit.next_deadline.to_rfc3339()))
        };

        let updated = tx
            .execute(
                "UPDATE draft_sessions SET pick_index = ?, version = version + 1, status = ?, \
                 current_deadline = ?, updated_at = ? WHERE id = ? AND pick_index = ?",
                params![
                    next_index,
                    status.as_str(),
                    deadline,
                    commit.committed_at.to_rfc3339(),
                    commit.session_id,
                    commit.expected_pick_index,
                ],
            )
            .map_err(db_err)?;
        if updated != 1 {
            return Err(StoreError::StaleVersion {
                expected: commit.expected_pick_index,
                actual: current.pick_index,
            });
        }

        let session = Self::load_session(&tx, &commit.session_id)?;
        tx.commit().map_err(db_err)?;
        Ok(session)
    }
}
