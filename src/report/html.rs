//! Static HTML site generation.
//!
//! Renders a navigable tree rooted at the destination directory: a playbook
//! index, per-entity listing and detail pages, a per-run report summary and a
//! static asset directory. When restricted to one playbook, only that
//! playbook's entities appear anywhere in the generated tree.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::Config;
use crate::error::Result;
use crate::models::{Playbook, Status, TaskResult};
use crate::query::{self, ResultFilter, TaskFilter};
use crate::store::Store;

use super::templates;

#[derive(Serialize)]
struct PlaybookRow {
    id: i64,
    path: String,
    status: &'static str,
    started_at: String,
    duration: String,
}

#[derive(Serialize)]
struct ResultRow {
    id: i64,
    status: &'static str,
    task: String,
    action: String,
    host: String,
    duration: String,
}

#[derive(Serialize, Default)]
struct ReportRow {
    id: i64,
    path: String,
    ok: usize,
    changed: usize,
    failed: usize,
    skipped: usize,
    unreachable: usize,
}

/// Generate the site for one playbook or for every recorded playbook.
pub fn generate(store: &Store, playbook: Option<i64>, dest: &Path, config: &Config) -> Result<()> {
    let playbooks = super::scoped_playbooks(store, playbook)?;
    let results = query::results(store, &ResultFilter { playbook, ..Default::default() })?;
    super::warn_if_empty(&results, config, "HTML");

    let multi = playbook.is_none();
    let tera = templates::engine()?;

    for dir in ["static", "file", "host", "result", "reports"] {
        fs::create_dir_all(dest.join(dir))?;
    }
    fs::write(dest.join("static").join("style.css"), templates::STYLESHEET)?;

    let playbook_rows: Vec<PlaybookRow> = playbooks.iter().map(playbook_row).collect();
    let mut ctx = Context::new();
    ctx.insert("root", ".");
    ctx.insert("multi", &multi);
    ctx.insert("playbooks", &playbook_rows);
    render(&tera, "index.html", &ctx, &dest.join("index.html"))?;

    write_files(store, playbook, dest, &tera)?;
    write_hosts(store, playbook, dest, &tera)?;
    write_results(store, playbook, &results, dest, &tera)?;
    write_reports(&playbooks, &results, dest, &tera)?;

    if multi {
        for pb in &playbooks {
            write_playbook_page(store, pb, dest, &tera)?;
        }
    }

    info!(
        "Generated HTML report for {} playbook(s) at {}",
        playbooks.len(),
        dest.display()
    );
    Ok(())
}

fn write_files(store: &Store, playbook: Option<i64>, dest: &Path, tera: &Tera) -> Result<()> {
    let files = query::files(store, playbook)?;

    let mut ctx = Context::new();
    ctx.insert("root", "..");
    ctx.insert("files", &files);
    render(tera, "file_index.html", &ctx, &dest.join("file").join("index.html"))?;

    for file in &files {
        let mut ctx = Context::new();
        ctx.insert("root", "..");
        ctx.insert("file", file);
        render(tera, "file.html", &ctx, &dest.join("file").join(file.id.to_string()))?;
    }
    Ok(())
}

fn write_hosts(store: &Store, playbook: Option<i64>, dest: &Path, tera: &Tera) -> Result<()> {
    let hosts = query::hosts(store, playbook)?;

    let mut ctx = Context::new();
    ctx.insert("root", "..");
    ctx.insert("hosts", &hosts);
    render(tera, "host_index.html", &ctx, &dest.join("host").join("index.html"))?;

    for host in &hosts {
        let facts = host
            .facts
            .as_ref()
            .map(serde_json::to_string_pretty)
            .transpose()?;
        let mut ctx = Context::new();
        ctx.insert("root", "..");
        ctx.insert("host", host);
        ctx.insert("facts", &facts);
        render(tera, "host.html", &ctx, &dest.join("host").join(host.id.to_string()))?;
    }
    Ok(())
}

fn write_results(
    store: &Store,
    playbook: Option<i64>,
    results: &[TaskResult],
    dest: &Path,
    tera: &Tera,
) -> Result<()> {
    let tasks: HashMap<i64, _> = query::tasks(store, &TaskFilter { playbook, play: None })?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();
    let hosts: HashMap<i64, _> = query::hosts(store, playbook)?
        .into_iter()
        .map(|h| (h.id, h))
        .collect();

    let rows: Vec<ResultRow> = results
        .iter()
        .map(|r| ResultRow {
            id: r.id,
            status: r.status.as_str(),
            task: tasks.get(&r.task_id).map(|t| t.name.clone()).unwrap_or_default(),
            action: tasks.get(&r.task_id).map(|t| t.action.clone()).unwrap_or_default(),
            host: hosts.get(&r.host_id).map(|h| h.name.clone()).unwrap_or_default(),
            duration: duration(r.started_at, r.ended_at),
        })
        .collect();

    let mut ctx = Context::new();
    ctx.insert("root", "..");
    ctx.insert("results", &rows);
    render(tera, "result_index.html", &ctx, &dest.join("result").join("index.html"))?;

    for (result, row) in results.iter().zip(&rows) {
        let mut ctx = Context::new();
        ctx.insert("root", "..");
        ctx.insert("result", row);
        ctx.insert("payload", &serde_json::to_string_pretty(&result.result)?);
        render(tera, "result.html", &ctx, &dest.join("result").join(result.id.to_string()))?;
    }
    Ok(())
}

fn write_reports(
    playbooks: &[Playbook],
    results: &[TaskResult],
    dest: &Path,
    tera: &Tera,
) -> Result<()> {
    let rows: Vec<ReportRow> = playbooks
        .iter()
        .map(|pb| {
            let mut row = ReportRow {
                id: pb.id,
                path: pb.path.clone(),
                ..Default::default()
            };
            for result in results.iter().filter(|r| r.playbook_id == pb.id) {
                match result.status {
                    Status::Ok => row.ok += 1,
                    Status::Changed => row.changed += 1,
                    Status::Failed => row.failed += 1,
                    Status::Skipped => row.skipped += 1,
                    Status::Unreachable => row.unreachable += 1,
                }
            }
            row
        })
        .collect();

    let mut ctx = Context::new();
    ctx.insert("root", "..");
    ctx.insert("reports", &rows);
    render(tera, "reports.html", &ctx, &dest.join("reports").join("index.html"))
}

fn write_playbook_page(store: &Store, pb: &Playbook, dest: &Path, tera: &Tera) -> Result<()> {
    let dir = dest.join("playbook").join(pb.id.to_string());
    fs::create_dir_all(&dir)?;

    let plays = query::plays(store, Some(pb.id))?;
    let tasks = query::tasks(store, &TaskFilter { playbook: Some(pb.id), play: None })?;

    let mut ctx = Context::new();
    ctx.insert("root", "../..");
    ctx.insert("playbook", &playbook_row(pb));
    ctx.insert("plays", &plays);
    ctx.insert("tasks", &tasks);
    render(tera, "playbook.html", &ctx, &dir.join("index.html"))
}

fn playbook_row(pb: &Playbook) -> PlaybookRow {
    PlaybookRow {
        id: pb.id,
        path: pb.path.clone(),
        status: if pb.completed { "complete" } else { "incomplete" },
        started_at: pb.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        duration: duration(pb.started_at, pb.ended_at),
    }
}

fn duration(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> String {
    match end {
        Some(end) => format!("{:.3}s", (end - start).num_milliseconds() as f64 / 1000.0),
        None => "-".to_string(),
    }
}

fn render(tera: &Tera, template: &str, ctx: &Context, path: &Path) -> Result<()> {
    debug!("Rendering {} to {}", template, path.display());
    let page = tera.render(template, ctx)?;
    fs::write(path, page)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRun;
    use tempfile::TempDir;

    #[test]
    fn test_empty_store_still_emits_skeleton() {
        let store = Store::open_in_memory().unwrap();
        let dest = TempDir::new().unwrap();

        generate(&store, None, dest.path(), &Config::default()).unwrap();

        for path in ["index.html", "static/style.css", "file/index.html",
                     "host/index.html", "result/index.html", "reports/index.html"] {
            assert!(dest.path().join(path).exists(), "missing {}", path);
        }
    }

    #[test]
    fn test_full_tree_for_recorded_run() {
        let store = Store::open_in_memory().unwrap();
        let run = FakeRun::record(&store).unwrap();
        let dest = TempDir::new().unwrap();

        generate(&store, None, dest.path(), &Config::default()).unwrap();

        assert!(dest.path().join("file").join(run.file.id.to_string()).exists());
        assert!(dest.path().join("host").join(run.hosts[0].id.to_string()).exists());
        assert!(dest.path().join("result").join(run.results[0].id.to_string()).exists());
        assert!(dest
            .path()
            .join("playbook")
            .join(run.playbook.id.to_string())
            .join("index.html")
            .exists());
    }

    #[test]
    fn test_scoped_generation_excludes_other_playbooks() {
        let store = Store::open_in_memory().unwrap();
        let run = FakeRun::record(&store).unwrap();
        let other = FakeRun::record(&store).unwrap();
        let dest = TempDir::new().unwrap();

        generate(&store, Some(run.playbook.id), dest.path(), &Config::default()).unwrap();

        // No per-playbook pages at all in scoped mode.
        assert!(!dest.path().join("playbook").exists());
        // None of the other playbook's entities leak into the tree.
        for host in &other.hosts {
            assert!(!dest.path().join("host").join(host.id.to_string()).exists());
        }
        for result in &other.results {
            assert!(!dest.path().join("result").join(result.id.to_string()).exists());
        }
        assert!(!dest.path().join("file").join(other.file.id.to_string()).exists());
    }

    #[test]
    fn test_scoped_generation_for_missing_playbook_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let dest = TempDir::new().unwrap();
        let err = generate(&store, Some(99), dest.path(), &Config::default()).unwrap_err();
        assert!(err.is_not_found());
    }
}
