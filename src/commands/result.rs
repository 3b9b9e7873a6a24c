use clap::ArgMatches;

use crate::error::Result;
use crate::query::{self, ResultFilter};
use crate::store::Store;

use super::{colorize_status, duration, format_time, print_table};

pub fn list(store: &Store, matches: &ArgMatches) -> Result<()> {
    let filter = ResultFilter {
        playbook: matches.get_one::<i64>("playbook").copied(),
        play: matches.get_one::<i64>("play").copied(),
        task: matches.get_one::<i64>("task").copied(),
    };
    let results = query::results(store, &filter)?;

    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.status.to_string(),
                r.task_id.to_string(),
                r.host_id.to_string(),
                duration(r.started_at, r.ended_at),
            ]
        })
        .collect();
    print_table(&["ID", "Status", "Task", "Host", "Duration"], &rows);
    Ok(())
}

pub fn show(store: &Store, matches: &ArgMatches) -> Result<()> {
    let id = *matches.get_one::<i64>("id").unwrap();
    let result = store.get_result(id)?;
    let task = store.get_task(result.task_id)?;
    let host = store.get_host(result.host_id)?;

    println!("Result {}", result.id);
    println!("  Status:   {}", colorize_status(result.status));
    println!("  Task:     {} ({})", task.name, task.action);
    println!("  Host:     {}", host.name);
    println!("  Playbook: {}", result.playbook_id);
    println!("  Started:  {}", format_time(Some(result.started_at)));
    println!("  Duration: {}", duration(result.started_at, result.ended_at));
    if result.ignore_errors {
        println!("  Errors ignored for this task");
    }
    if matches.get_flag("long") {
        println!("  Output:\n{}", serde_json::to_string_pretty(&result.result)?);
    }
    Ok(())
}
