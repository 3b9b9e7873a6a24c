//! SQLite persistence for recorded playbook runs.
//!
//! The schema mirrors the entity hierarchy: every row transitively references
//! exactly one playbook, and all child tables cascade on playbook deletion.
//! Listing with filters lives in [`crate::query`]; this module owns the
//! schema, row mapping, inserts and point lookups.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{File, Host, Play, Playbook, Record, Status, Task, TaskResult};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS playbooks (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    path       TEXT NOT NULL,
    started_at TEXT NOT NULL,
    ended_at   TEXT,
    completed  INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS plays (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    playbook_id INTEGER NOT NULL REFERENCES playbooks(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    started_at  TEXT NOT NULL,
    ended_at    TEXT
);
CREATE TABLE IF NOT EXISTS tasks (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    playbook_id INTEGER NOT NULL REFERENCES playbooks(id) ON DELETE CASCADE,
    play_id     INTEGER NOT NULL REFERENCES plays(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    action      TEXT NOT NULL,
    path        TEXT NOT NULL,
    lineno      INTEGER NOT NULL,
    started_at  TEXT NOT NULL,
    ended_at    TEXT
);
CREATE TABLE IF NOT EXISTS hosts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    playbook_id INTEGER NOT NULL REFERENCES playbooks(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    facts       TEXT,
    UNIQUE(playbook_id, name)
);
CREATE TABLE IF NOT EXISTS results (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    playbook_id   INTEGER NOT NULL REFERENCES playbooks(id) ON DELETE CASCADE,
    play_id       INTEGER NOT NULL REFERENCES plays(id) ON DELETE CASCADE,
    task_id       INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    host_id       INTEGER NOT NULL REFERENCES hosts(id) ON DELETE CASCADE,
    status        TEXT NOT NULL
        CHECK (status IN ('ok', 'failed', 'skipped', 'unreachable', 'changed')),
    ignore_errors INTEGER NOT NULL DEFAULT 0,
    started_at    TEXT NOT NULL,
    ended_at      TEXT,
    result        TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS files (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    playbook_id INTEGER NOT NULL REFERENCES playbooks(id) ON DELETE CASCADE,
    path        TEXT NOT NULL,
    content     TEXT NOT NULL,
    is_playbook INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS records (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    playbook_id INTEGER NOT NULL REFERENCES playbooks(id) ON DELETE CASCADE,
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    UNIQUE(playbook_id, key)
);
";

/// Handle over the SQLite database holding recorded runs.
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Open (and initialize if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Store> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("Opening database at {}", path.display());
        Store::from_connection(Connection::open(path)?)
    }

    /// Open a throwaway in-memory database. Used by the test fixtures.
    pub fn open_in_memory() -> Result<Store> {
        Store::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Store> {
        // Cascading deletes depend on this pragma being set per connection.
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Store { conn })
    }

    // Recording ------------------------------------------------------------

    pub fn create_playbook(&self, path: &str, started_at: DateTime<Utc>) -> Result<Playbook> {
        self.conn.execute(
            "INSERT INTO playbooks (path, started_at) VALUES (?1, ?2)",
            params![path, started_at],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("Recorded playbook {} ({})", id, path);
        self.get_playbook(id)
    }

    /// Mark a playbook as completed and stamp its end time.
    pub fn complete_playbook(&self, id: i64, ended_at: DateTime<Utc>) -> Result<()> {
        let n = self.conn.execute(
            "UPDATE playbooks SET ended_at = ?2, completed = 1 WHERE id = ?1",
            params![id, ended_at],
        )?;
        if n == 0 {
            return Err(Error::not_found("playbook", id));
        }
        Ok(())
    }

    pub fn create_play(
        &self,
        playbook_id: i64,
        name: &str,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
    ) -> Result<Play> {
        self.conn.execute(
            "INSERT INTO plays (playbook_id, name, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![playbook_id, name, started_at, ended_at],
        )?;
        self.get_play(self.conn.last_insert_rowid())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_task(
        &self,
        play: &Play,
        name: &str,
        action: &str,
        path: &str,
        lineno: i64,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
    ) -> Result<Task> {
        self.conn.execute(
            "INSERT INTO tasks (playbook_id, play_id, name, action, path, lineno,
                                started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![play.playbook_id, play.id, name, action, path, lineno, started_at, ended_at],
        )?;
        self.get_task(self.conn.last_insert_rowid())
    }

    pub fn create_host(&self, playbook_id: i64, name: &str, facts: Option<&Value>) -> Result<Host> {
        self.conn.execute(
            "INSERT INTO hosts (playbook_id, name, facts) VALUES (?1, ?2, ?3)",
            params![playbook_id, name, facts],
        )?;
        self.get_host(self.conn.last_insert_rowid())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_result(
        &self,
        task: &Task,
        host_id: i64,
        status: Status,
        ignore_errors: bool,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
        result: &Value,
    ) -> Result<TaskResult> {
        self.conn.execute(
            "INSERT INTO results (playbook_id, play_id, task_id, host_id, status,
                                  ignore_errors, started_at, ended_at, result)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                task.playbook_id,
                task.play_id,
                task.id,
                host_id,
                status.as_str(),
                ignore_errors,
                started_at,
                ended_at,
                result
            ],
        )?;
        self.get_result(self.conn.last_insert_rowid())
    }

    pub fn create_file(
        &self,
        playbook_id: i64,
        path: &str,
        content: &str,
        is_playbook: bool,
    ) -> Result<File> {
        self.conn.execute(
            "INSERT INTO files (playbook_id, path, content, is_playbook)
             VALUES (?1, ?2, ?3, ?4)",
            params![playbook_id, path, content, is_playbook],
        )?;
        self.get_file(self.conn.last_insert_rowid())
    }

    pub fn create_record(&self, playbook_id: i64, key: &str, value: &Value) -> Result<Record> {
        self.conn.execute(
            "INSERT INTO records (playbook_id, key, value) VALUES (?1, ?2, ?3)",
            params![playbook_id, key, value],
        )?;
        self.get_record(self.conn.last_insert_rowid())
    }

    // Point lookups --------------------------------------------------------

    pub fn get_playbook(&self, id: i64) -> Result<Playbook> {
        self.conn
            .query_row(
                "SELECT id, path, started_at, ended_at, completed
                 FROM playbooks WHERE id = ?1",
                params![id],
                map_playbook,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("playbook", id))
    }

    pub fn get_play(&self, id: i64) -> Result<Play> {
        self.conn
            .query_row(
                "SELECT id, playbook_id, name, started_at, ended_at
                 FROM plays WHERE id = ?1",
                params![id],
                map_play,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("play", id))
    }

    pub fn get_task(&self, id: i64) -> Result<Task> {
        self.conn
            .query_row(
                "SELECT id, playbook_id, play_id, name, action, path, lineno,
                        started_at, ended_at
                 FROM tasks WHERE id = ?1",
                params![id],
                map_task,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("task", id))
    }

    pub fn get_host(&self, id: i64) -> Result<Host> {
        self.conn
            .query_row(
                "SELECT id, playbook_id, name, facts FROM hosts WHERE id = ?1",
                params![id],
                map_host,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("host", id))
    }

    /// Resolve a host by name within one playbook.
    pub fn get_host_by_name(&self, playbook_id: i64, name: &str) -> Result<Host> {
        self.conn
            .query_row(
                "SELECT id, playbook_id, name, facts
                 FROM hosts WHERE playbook_id = ?1 AND name = ?2",
                params![playbook_id, name],
                map_host,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("host", name))
    }

    pub fn get_result(&self, id: i64) -> Result<TaskResult> {
        self.conn
            .query_row(
                "SELECT id, playbook_id, play_id, task_id, host_id, status,
                        ignore_errors, started_at, ended_at, result
                 FROM results WHERE id = ?1",
                params![id],
                map_result,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("result", id))
    }

    pub fn get_file(&self, id: i64) -> Result<File> {
        self.conn
            .query_row(
                "SELECT id, playbook_id, path, content, is_playbook
                 FROM files WHERE id = ?1",
                params![id],
                map_file,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("file", id))
    }

    pub fn get_record(&self, id: i64) -> Result<Record> {
        self.conn
            .query_row(
                "SELECT id, playbook_id, key, value FROM records WHERE id = ?1",
                params![id],
                map_record,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("record", id))
    }

    /// Resolve a record by key within one playbook. Keys are unique per
    /// playbook so this returns at most one row.
    pub fn get_record_by_key(&self, playbook_id: i64, key: &str) -> Result<Record> {
        self.conn
            .query_row(
                "SELECT id, playbook_id, key, value
                 FROM records WHERE playbook_id = ?1 AND key = ?2",
                params![playbook_id, key],
                map_record,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("record", key))
    }

    // Deletion -------------------------------------------------------------

    /// Delete a playbook and, through the cascading foreign keys, every
    /// play, task, host, result, file and record that belongs to it.
    pub fn delete_playbook(&self, id: i64) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM playbooks WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(Error::not_found("playbook", id));
        }
        info!("Deleted playbook {} and all dependent rows", id);
        Ok(())
    }
}

// Row mapping -------------------------------------------------------------

pub(crate) fn map_playbook(row: &Row<'_>) -> rusqlite::Result<Playbook> {
    Ok(Playbook {
        id: row.get(0)?,
        path: row.get(1)?,
        started_at: row.get(2)?,
        ended_at: row.get(3)?,
        completed: row.get(4)?,
    })
}

pub(crate) fn map_play(row: &Row<'_>) -> rusqlite::Result<Play> {
    Ok(Play {
        id: row.get(0)?,
        playbook_id: row.get(1)?,
        name: row.get(2)?,
        started_at: row.get(3)?,
        ended_at: row.get(4)?,
    })
}

pub(crate) fn map_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        playbook_id: row.get(1)?,
        play_id: row.get(2)?,
        name: row.get(3)?,
        action: row.get(4)?,
        path: row.get(5)?,
        lineno: row.get(6)?,
        started_at: row.get(7)?,
        ended_at: row.get(8)?,
    })
}

pub(crate) fn map_host(row: &Row<'_>) -> rusqlite::Result<Host> {
    Ok(Host {
        id: row.get(0)?,
        playbook_id: row.get(1)?,
        name: row.get(2)?,
        facts: row.get(3)?,
    })
}

pub(crate) fn map_result(row: &Row<'_>) -> rusqlite::Result<TaskResult> {
    let status: String = row.get(5)?;
    let status = status.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })?;
    Ok(TaskResult {
        id: row.get(0)?,
        playbook_id: row.get(1)?,
        play_id: row.get(2)?,
        task_id: row.get(3)?,
        host_id: row.get(4)?,
        status,
        ignore_errors: row.get(6)?,
        started_at: row.get(7)?,
        ended_at: row.get(8)?,
        result: row.get(9)?,
    })
}

pub(crate) fn map_file(row: &Row<'_>) -> rusqlite::Result<File> {
    Ok(File {
        id: row.get(0)?,
        playbook_id: row.get(1)?,
        path: row.get(2)?,
        content: row.get(3)?,
        is_playbook: row.get(4)?,
    })
}

pub(crate) fn map_record(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        id: row.get(0)?,
        playbook_id: row.get(1)?,
        key: row.get(2)?,
        value: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_playbook_lifecycle() {
        let store = Store::open_in_memory().unwrap();
        let playbook = store
            .create_playbook("/tmp/site.yml", Utc::now())
            .unwrap();
        assert!(!playbook.completed);
        assert!(playbook.ended_at.is_none());

        store.complete_playbook(playbook.id, Utc::now()).unwrap();
        let playbook = store.get_playbook(playbook.id).unwrap();
        assert!(playbook.completed);
        assert!(playbook.ended_at.is_some());
    }

    #[test]
    fn test_get_missing_playbook_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err = store.get_playbook(42).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_record_key_unique_per_playbook() {
        let store = Store::open_in_memory().unwrap();
        let p1 = store.create_playbook("/tmp/a.yml", Utc::now()).unwrap();
        let p2 = store.create_playbook("/tmp/b.yml", Utc::now()).unwrap();

        store.create_record(p1.id, "log_url", &json!("http://a")).unwrap();
        // Same key on another playbook is fine.
        store.create_record(p2.id, "log_url", &json!("http://b")).unwrap();
        // Duplicate key on the same playbook is a constraint violation.
        assert!(store
            .create_record(p1.id, "log_url", &json!("http://c"))
            .is_err());
    }

    #[test]
    fn test_result_status_check_constraint() {
        let store = Store::open_in_memory().unwrap();
        let p = store.create_playbook("/tmp/a.yml", Utc::now()).unwrap();
        let play = store.create_play(p.id, "play", Utc::now(), None).unwrap();
        let task = store
            .create_task(&play, "t", "debug", "/tmp/a.yml", 1, Utc::now(), None)
            .unwrap();
        let host = store.create_host(p.id, "localhost", None).unwrap();

        let n = store.conn.execute(
            "INSERT INTO results (playbook_id, play_id, task_id, host_id, status,
                                  started_at, result)
             VALUES (?1, ?2, ?3, ?4, 'exploded', ?5, '{}')",
            params![p.id, play.id, task.id, host.id, Utc::now()],
        );
        assert!(n.is_err());
    }

    #[test]
    fn test_host_lookup_by_name() {
        let store = Store::open_in_memory().unwrap();
        let p = store.create_playbook("/tmp/a.yml", Utc::now()).unwrap();
        let host = store
            .create_host(p.id, "web01", Some(&json!({"os": "linux"})))
            .unwrap();

        let found = store.get_host_by_name(p.id, "web01").unwrap();
        assert_eq!(found.id, host.id);
        assert!(store.get_host_by_name(p.id, "db01").unwrap_err().is_not_found());
    }
}
