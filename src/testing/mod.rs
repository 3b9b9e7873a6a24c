//! Shared fixtures for playback tests.
//!
//! [`FakeRun`] records one complete playbook run into a store: a play, three
//! tasks, two hosts, six results covering every status, the playbook file and
//! a key/value record. Unit and integration tests use it instead of each
//! assembling their own rows.

use chrono::{Duration, Utc};
use serde_json::json;

use crate::error::Result;
use crate::models::{File, Host, Play, Playbook, Record, Status, Task, TaskResult};
use crate::store::Store;

pub struct FakeRun {
    pub playbook: Playbook,
    pub play: Play,
    pub task_ok: Task,
    pub task_failed: Task,
    pub task_skipped: Task,
    pub hosts: Vec<Host>,
    pub results: Vec<TaskResult>,
    pub file: File,
    pub record: Record,
}

impl FakeRun {
    /// Record a completed run with default settings.
    pub fn record(store: &Store) -> Result<FakeRun> {
        FakeRun::builder().record_with(store)
    }

    pub fn builder() -> FakeRunBuilder {
        FakeRunBuilder { completed: true }
    }

    /// Count of results that a report must classify as failures: one
    /// `failed` and one `unreachable`, neither with ignore_errors.
    pub fn expected_failures() -> usize {
        2
    }
}

pub struct FakeRunBuilder {
    completed: bool,
}

impl FakeRunBuilder {
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn record_with(self, store: &Store) -> Result<FakeRun> {
        let started = Utc::now() - Duration::seconds(90);
        let ended = Utc::now();

        let playbook = store.create_playbook("/var/lib/playback/site.yml", started)?;

        let file = store.create_file(
            playbook.id,
            "/var/lib/playback/site.yml",
            "---\n- hosts: all\n  tasks:\n    - debug: msg=test\n",
            true,
        )?;

        let web = store.create_host(
            playbook.id,
            "web01.example.org",
            Some(&json!({"ansible_system": "Linux"})),
        )?;
        let db = store.create_host(playbook.id, "db01.example.org", None)?;

        let play = store.create_play(playbook.id, "site deployment", started, Some(ended))?;

        let task_ok = store.create_task(
            &play,
            "Gather service facts",
            "setup",
            &playbook.path,
            4,
            started,
            Some(ended),
        )?;
        let task_failed = store.create_task(
            &play,
            "Restart the service",
            "service",
            &playbook.path,
            9,
            started,
            Some(ended),
        )?;
        let task_skipped = store.create_task(
            &play,
            "Conditional cleanup",
            "file",
            &playbook.path,
            15,
            started,
            Some(ended),
        )?;

        let mut results = Vec::new();
        results.push(store.create_result(
            &task_ok,
            web.id,
            Status::Ok,
            false,
            started,
            Some(ended),
            &json!({"changed": false, "msg": "All assertions passed"}),
        )?);
        results.push(store.create_result(
            &task_ok,
            db.id,
            Status::Changed,
            false,
            started,
            Some(ended),
            &json!({"changed": true, "msg": "Configuration updated"}),
        )?);
        results.push(store.create_result(
            &task_failed,
            web.id,
            Status::Failed,
            false,
            started,
            Some(ended),
            &json!({"changed": false, "msg": "Unable to restart service"}),
        )?);
        results.push(store.create_result(
            &task_failed,
            db.id,
            Status::Unreachable,
            false,
            started,
            Some(ended),
            &json!({"changed": false, "msg": "Failed to connect to the host"}),
        )?);
        results.push(store.create_result(
            &task_skipped,
            web.id,
            Status::Skipped,
            false,
            started,
            Some(ended),
            &json!({"changed": false, "skip_reason": "Conditional check failed"}),
        )?);
        results.push(store.create_result(
            &task_skipped,
            db.id,
            Status::Skipped,
            true,
            started,
            Some(ended),
            &json!({"changed": false, "skip_reason": "Conditional check failed"}),
        )?);

        let record = store.create_record(
            playbook.id,
            "log_url",
            &json!("http://logs.example.org/run/1"),
        )?;

        if self.completed {
            store.complete_playbook(playbook.id, ended)?;
        }
        let playbook = store.get_playbook(playbook.id)?;

        Ok(FakeRun {
            playbook,
            play,
            task_ok,
            task_failed,
            task_skipped,
            hosts: vec![web, db],
            results,
            file,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_run_shape() {
        let store = Store::open_in_memory().unwrap();
        let run = FakeRun::record(&store).unwrap();

        assert!(run.playbook.completed);
        assert_eq!(run.hosts.len(), 2);
        assert_eq!(run.results.len(), 6);
        let failures = run.results.iter().filter(|r| r.counts_as_failure()).count();
        assert_eq!(failures, FakeRun::expected_failures());
    }

    #[test]
    fn test_incomplete_fake_run() {
        let store = Store::open_in_memory().unwrap();
        let run = FakeRun::builder().completed(false).record_with(&store).unwrap();
        assert!(!run.playbook.completed);
        assert!(run.playbook.ended_at.is_none());
    }
}
