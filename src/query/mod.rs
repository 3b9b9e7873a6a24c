//! Turns list-command filters into ordered entity sequences.
//!
//! Every function here returns rows in insertion order. A filter that names a
//! parent with no matching rows (including a parent id that does not exist)
//! yields an empty Vec, never an error; NotFound is reserved for the point
//! lookups in [`crate::store`].

use log::debug;
use rusqlite::params;

use crate::error::Result;
use crate::models::{File, Host, Play, Playbook, Record, Task, TaskResult};
use crate::store::{
    map_file, map_host, map_play, map_playbook, map_record, map_result, map_task, Store,
};

/// Completion selector for `playbook list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    All,
    Complete,
    Incomplete,
}

/// Filters accepted by `task list`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub playbook: Option<i64>,
    pub play: Option<i64>,
}

/// Filters accepted by `result list`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultFilter {
    pub playbook: Option<i64>,
    pub play: Option<i64>,
    pub task: Option<i64>,
}

pub fn playbooks(store: &Store, completion: Completion) -> Result<Vec<Playbook>> {
    let sql = match completion {
        Completion::All => {
            "SELECT id, path, started_at, ended_at, completed
             FROM playbooks ORDER BY id"
        }
        Completion::Complete => {
            "SELECT id, path, started_at, ended_at, completed
             FROM playbooks WHERE completed = 1 ORDER BY id"
        }
        Completion::Incomplete => {
            "SELECT id, path, started_at, ended_at, completed
             FROM playbooks WHERE completed = 0 ORDER BY id"
        }
    };
    let mut stmt = store.conn.prepare(sql)?;
    let rows = stmt
        .query_map([], map_playbook)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    debug!("playbook list matched {} rows", rows.len());
    Ok(rows)
}

pub fn plays(store: &Store, playbook: Option<i64>) -> Result<Vec<Play>> {
    let mut stmt = store.conn.prepare(
        "SELECT id, playbook_id, name, started_at, ended_at
         FROM plays
         WHERE (?1 IS NULL OR playbook_id = ?1)
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![playbook], map_play)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn tasks(store: &Store, filter: &TaskFilter) -> Result<Vec<Task>> {
    let mut stmt = store.conn.prepare(
        "SELECT id, playbook_id, play_id, name, action, path, lineno,
                started_at, ended_at
         FROM tasks
         WHERE (?1 IS NULL OR playbook_id = ?1)
           AND (?2 IS NULL OR play_id = ?2)
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![filter.playbook, filter.play], map_task)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn hosts(store: &Store, playbook: Option<i64>) -> Result<Vec<Host>> {
    let mut stmt = store.conn.prepare(
        "SELECT id, playbook_id, name, facts
         FROM hosts
         WHERE (?1 IS NULL OR playbook_id = ?1)
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![playbook], map_host)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn results(store: &Store, filter: &ResultFilter) -> Result<Vec<TaskResult>> {
    let mut stmt = store.conn.prepare(
        "SELECT id, playbook_id, play_id, task_id, host_id, status,
                ignore_errors, started_at, ended_at, result
         FROM results
         WHERE (?1 IS NULL OR playbook_id = ?1)
           AND (?2 IS NULL OR play_id = ?2)
           AND (?3 IS NULL OR task_id = ?3)
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![filter.playbook, filter.play, filter.task], map_result)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    debug!("result list matched {} rows", rows.len());
    Ok(rows)
}

pub fn files(store: &Store, playbook: Option<i64>) -> Result<Vec<File>> {
    let mut stmt = store.conn.prepare(
        "SELECT id, playbook_id, path, content, is_playbook
         FROM files
         WHERE (?1 IS NULL OR playbook_id = ?1)
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![playbook], map_file)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn records(store: &Store, playbook: Option<i64>) -> Result<Vec<Record>> {
    let mut stmt = store.conn.prepare(
        "SELECT id, playbook_id, key, value
         FROM records
         WHERE (?1 IS NULL OR playbook_id = ?1)
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![playbook], map_record)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRun;

    #[test]
    fn test_list_for_non_existing_playbook_is_empty() {
        let store = Store::open_in_memory().unwrap();
        FakeRun::record(&store).unwrap();

        assert!(plays(&store, Some(999)).unwrap().is_empty());
        assert!(hosts(&store, Some(999)).unwrap().is_empty());
        assert!(files(&store, Some(999)).unwrap().is_empty());
        assert!(records(&store, Some(999)).unwrap().is_empty());
        let filter = TaskFilter { playbook: Some(999), play: None };
        assert!(tasks(&store, &filter).unwrap().is_empty());
        let filter = ResultFilter { playbook: Some(999), ..Default::default() };
        assert!(results(&store, &filter).unwrap().is_empty());
    }

    #[test]
    fn test_list_scoped_to_playbook() {
        let store = Store::open_in_memory().unwrap();
        let run = FakeRun::record(&store).unwrap();
        let other = FakeRun::record(&store).unwrap();

        let scoped = results(
            &store,
            &ResultFilter { playbook: Some(run.playbook.id), ..Default::default() },
        )
        .unwrap();
        assert!(!scoped.is_empty());
        assert!(scoped.iter().all(|r| r.playbook_id == run.playbook.id));

        let all = results(&store, &ResultFilter::default()).unwrap();
        assert_eq!(all.len(), scoped.len() * 2);
        assert!(all.iter().any(|r| r.playbook_id == other.playbook.id));
    }

    #[test]
    fn test_completion_selector() {
        let store = Store::open_in_memory().unwrap();
        FakeRun::builder().completed(false).record_with(&store).unwrap();

        assert!(playbooks(&store, Completion::Complete).unwrap().is_empty());
        assert_eq!(playbooks(&store, Completion::Incomplete).unwrap().len(), 1);
        assert_eq!(playbooks(&store, Completion::All).unwrap().len(), 1);
    }

    #[test]
    fn test_results_by_play_and_task() {
        let store = Store::open_in_memory().unwrap();
        let run = FakeRun::record(&store).unwrap();

        let by_play = results(
            &store,
            &ResultFilter { play: Some(run.play.id), ..Default::default() },
        )
        .unwrap();
        assert!(by_play.iter().all(|r| r.play_id == run.play.id));

        let by_task = results(
            &store,
            &ResultFilter { task: Some(run.task_ok.id), ..Default::default() },
        )
        .unwrap();
        assert_eq!(by_task.len(), 1);
        assert_eq!(by_task[0].task_id, run.task_ok.id);
    }

    #[test]
    fn test_insertion_order_is_stable() {
        let store = Store::open_in_memory().unwrap();
        FakeRun::record(&store).unwrap();
        FakeRun::record(&store).unwrap();

        let ids: Vec<i64> = playbooks(&store, Completion::All)
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}
