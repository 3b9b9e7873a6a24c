//! JUnit XML generation.
//!
//! One `testsuite` per play, one `testcase` per result. The root element
//! carries exact counts: `tests` equals the number of results matched by the
//! filter and `failures` the number of failed or unreachable results that
//! were not recorded with ignore_errors.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::config::Config;
use crate::error::Result;
use crate::models::{Play, Status, Task, TaskResult};
use crate::query::{self, ResultFilter, TaskFilter};
use crate::store::Store;

/// Write the JUnit document for the given scope to `path`.
pub fn write(store: &Store, playbook: Option<i64>, path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    generate(store, playbook, config, &mut out)?;
    out.flush()?;
    info!("Wrote JUnit report to {}", path.display());
    Ok(())
}

/// Stream the document into `out`, one testsuite at a time.
pub fn generate<W: Write>(
    store: &Store,
    playbook: Option<i64>,
    config: &Config,
    out: &mut W,
) -> Result<()> {
    super::scoped_playbooks(store, playbook)?;
    let results = query::results(store, &ResultFilter { playbook, ..Default::default() })?;
    super::warn_if_empty(&results, config, "JUnit");

    let plays = query::plays(store, playbook)?;
    let tasks: HashMap<i64, Task> = query::tasks(store, &TaskFilter { playbook, play: None })?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let tests = results.len();
    let failures = results.iter().filter(|r| r.counts_as_failure()).count();

    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<testsuites tests="{}" failures="{}">"#, tests, failures)?;

    for play in plays_with_results(&plays, &results) {
        let suite: Vec<&TaskResult> =
            results.iter().filter(|r| r.play_id == play.id).collect();
        let suite_failures = suite.iter().filter(|r| r.counts_as_failure()).count();
        writeln!(
            out,
            r#"  <testsuite name="{}" tests="{}" failures="{}">"#,
            escape(&play.name),
            suite.len(),
            suite_failures
        )?;
        for result in suite {
            write_testcase(out, result, &tasks)?;
        }
        writeln!(out, "  </testsuite>")?;
    }

    writeln!(out, "</testsuites>")?;
    Ok(())
}

fn plays_with_results<'a>(plays: &'a [Play], results: &[TaskResult]) -> Vec<&'a Play> {
    plays
        .iter()
        .filter(|p| results.iter().any(|r| r.play_id == p.id))
        .collect()
}

fn write_testcase<W: Write>(
    out: &mut W,
    result: &TaskResult,
    tasks: &HashMap<i64, Task>,
) -> Result<()> {
    let (name, classname) = match tasks.get(&result.task_id) {
        Some(task) => (task.name.as_str(), task.action.as_str()),
        None => ("unknown task", "unknown"),
    };
    let time = result
        .ended_at
        .map(|end| (end - result.started_at).num_milliseconds() as f64 / 1000.0)
        .unwrap_or(0.0);

    write!(
        out,
        r#"    <testcase name="{}" classname="{}" time="{:.3}""#,
        escape(name),
        escape(classname),
        time
    )?;

    if result.counts_as_failure() {
        let payload = serde_json::to_string_pretty(&result.result)?;
        writeln!(out, ">")?;
        writeln!(
            out,
            r#"      <failure message="{}">{}</failure>"#,
            escape(result.status.as_str()),
            escape(&payload)
        )?;
        writeln!(out, "    </testcase>")?;
    } else if result.status == Status::Skipped {
        writeln!(out, ">")?;
        writeln!(out, "      <skipped/>")?;
        writeln!(out, "    </testcase>")?;
    } else {
        writeln!(out, "/>")?;
    }
    Ok(())
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRun;

    fn render(store: &Store, playbook: Option<i64>) -> String {
        let mut buf = Vec::new();
        generate(store, playbook, &Config::default(), &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_counts_match_result_rows() {
        let store = Store::open_in_memory().unwrap();
        let run = FakeRun::record(&store).unwrap();

        let doc = render(&store, None);
        let expected = format!(
            r#"<testsuites tests="{}" failures="{}">"#,
            run.results.len(),
            FakeRun::expected_failures()
        );
        assert!(doc.contains(&expected), "unexpected root element in {}", doc);
    }

    #[test]
    fn test_scoped_to_one_playbook() {
        let store = Store::open_in_memory().unwrap();
        let run = FakeRun::record(&store).unwrap();
        FakeRun::record(&store).unwrap();

        let doc = render(&store, Some(run.playbook.id));
        let expected = format!(r#"<testsuites tests="{}""#, run.results.len());
        assert!(doc.contains(&expected));
        // One play in scope, one testsuite.
        assert_eq!(doc.matches("<testsuite ").count(), 1);
    }

    #[test]
    fn test_testcase_maps_task_name_and_action() {
        let store = Store::open_in_memory().unwrap();
        let run = FakeRun::record(&store).unwrap();

        let doc = render(&store, None);
        assert!(doc.contains(&format!(
            r#"name="{}" classname="{}""#,
            run.task_ok.name, run.task_ok.action
        )));
        assert!(doc.contains("<skipped/>"));
        assert!(doc.contains(r#"<failure message="failed">"#));
        assert!(doc.contains(r#"<failure message="unreachable">"#));
    }

    #[test]
    fn test_empty_store_renders_empty_document() {
        let store = Store::open_in_memory().unwrap();
        let doc = render(&store, None);
        assert!(doc.contains(r#"<testsuites tests="0" failures="0">"#));
        assert!(!doc.contains("<testsuite "));
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape(r#"a <b> & "c""#), "a &lt;b&gt; &amp; &quot;c&quot;");
    }
}
