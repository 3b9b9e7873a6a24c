use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single task on a single host.
///
/// The set is fixed; the database enforces it with a CHECK constraint and
/// [`Status::from_str`] is the only way rows come back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Failed,
    Skipped,
    Unreachable,
    Changed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Failed => "failed",
            Status::Skipped => "skipped",
            Status::Unreachable => "unreachable",
            Status::Changed => "changed",
        }
    }

    /// Whether this status counts as a failure for reporting purposes.
    pub fn is_failure(&self) -> bool {
        matches!(self, Status::Failed | Status::Unreachable)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(Status::Ok),
            "failed" => Ok(Status::Failed),
            "skipped" => Ok(Status::Skipped),
            "unreachable" => Ok(Status::Unreachable),
            "changed" => Ok(Status::Changed),
            other => Err(format!("unknown result status: {}", other)),
        }
    }
}

/// One recorded playbook run.
#[derive(Debug, Clone, Serialize)]
pub struct Playbook {
    pub id: i64,
    pub path: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub completed: bool,
}

/// A play within a playbook run.
#[derive(Debug, Clone, Serialize)]
pub struct Play {
    pub id: i64,
    pub playbook_id: i64,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// A task within a play. `path` and `lineno` point at the source file the
/// task was loaded from.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: i64,
    pub playbook_id: i64,
    pub play_id: i64,
    pub name: String,
    pub action: String,
    pub path: String,
    pub lineno: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// A host that took part in a playbook run.
#[derive(Debug, Clone, Serialize)]
pub struct Host {
    pub id: i64,
    pub playbook_id: i64,
    pub name: String,
    pub facts: Option<Value>,
}

/// The outcome of one task on one host, with the module's structured output.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    pub id: i64,
    pub playbook_id: i64,
    pub play_id: i64,
    pub task_id: i64,
    pub host_id: i64,
    pub status: Status,
    pub ignore_errors: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub result: Value,
}

impl TaskResult {
    /// Failures that were recorded with `ignore_errors` do not count against
    /// the run.
    pub fn counts_as_failure(&self) -> bool {
        self.status.is_failure() && !self.ignore_errors
    }
}

/// A file that was involved in a playbook run, content included.
#[derive(Debug, Clone, Serialize)]
pub struct File {
    pub id: i64,
    pub playbook_id: i64,
    pub path: String,
    pub content: String,
    pub is_playbook: bool,
}

/// An arbitrary key/value pair saved against a playbook run. Keys are unique
/// within a playbook.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub id: i64,
    pub playbook_id: i64,
    pub key: String,
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in ["ok", "failed", "skipped", "unreachable", "changed"] {
            let status: Status = s.parse().unwrap();
            assert_eq!(status.as_str(), s);
        }
        assert!("bogus".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_failure_classification() {
        assert!(Status::Failed.is_failure());
        assert!(Status::Unreachable.is_failure());
        assert!(!Status::Ok.is_failure());
        assert!(!Status::Changed.is_failure());
        assert!(!Status::Skipped.is_failure());
    }
}
